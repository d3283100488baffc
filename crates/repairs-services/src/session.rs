//! Scoped database sessions

use std::future::Future;
use std::sync::Arc;

use repairs_core::{ConnectionConfig, DatabaseDriver};

use crate::error::DataAccessError;
use crate::procedures::Procedures;

/// Opens one connection per interaction and releases it afterwards
///
/// There is no pooling: every `scoped` call connects, runs its body and
/// closes the connection again, whatever the body returned.
#[derive(Clone)]
pub struct Session {
    driver: Arc<dyn DatabaseDriver>,
    config: ConnectionConfig,
}

impl Session {
    pub fn new(driver: Arc<dyn DatabaseDriver>, config: ConnectionConfig) -> Self {
        Self { driver, config }
    }

    /// Connection target for log and status messages, without secrets
    pub fn describe(&self) -> String {
        self.driver.build_connection_string(&self.config)
    }

    /// Run `body` against a fresh connection.
    ///
    /// Connect failures are classified as network, login or unexpected
    /// and converted into the body's error type.
    pub async fn scoped<T, E, F, Fut>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(Procedures) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DataAccessError>,
    {
        let connection = match self.driver.connect(&self.config).await {
            Ok(connection) => connection,
            Err(err) => {
                let err = DataAccessError::from_connect(err);
                tracing::error!(target_db = %self.describe(), error = %err, "failed to connect");
                return Err(err.into());
            }
        };
        tracing::debug!(driver = connection.driver_name(), "session opened");

        let result = body(Procedures::new(Arc::clone(&connection))).await;

        if connection.is_closed() {
            tracing::debug!("connection already closed");
        } else if let Err(err) = connection.close().await {
            tracing::warn!(error = %err, "failed to close connection");
        }
        tracing::debug!("session closed");
        result
    }

    /// Round-trip a trivial query to prove the server answers
    pub async fn ping(&self) -> Result<bool, DataAccessError> {
        self.scoped(|sql| async move {
            let rows = sql.raw_query("select 42").await?;
            Ok(rows
                .first()
                .and_then(|row| row.value(0).as_i64())
                .is_some_and(|answer| answer == 42))
        })
        .await
    }
}
