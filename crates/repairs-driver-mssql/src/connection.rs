//! MS SQL Server connection implementation using tiberius

use crate::errors::{ConnectPhase, to_core_error};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use repairs_core::{
    Connection, QueryResult, RepairsError, Result, Row, SqlState, Value,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tiberius::{AuthMethod, Client, ColumnData, Config, EncryptionLevel, Row as TiberiusRow};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

/// MS SQL Server connection errors
#[derive(Debug, thiserror::Error)]
pub enum MssqlConnectionError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Tiberius error: {0}")]
    Tiberius(#[from] tiberius::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MssqlConnectionError> for RepairsError {
    fn from(err: MssqlConnectionError) -> Self {
        match err {
            MssqlConnectionError::Tiberius(e) => to_core_error(e, ConnectPhase::Connecting),
            MssqlConnectionError::ConnectionFailed(msg) => {
                RepairsError::driver(SqlState::UNABLE_TO_CONNECT, msg)
            }
            MssqlConnectionError::Io(e) => {
                RepairsError::driver(SqlState::UNABLE_TO_CONNECT, e.to_string())
            }
            MssqlConnectionError::AuthenticationFailed(msg) => {
                RepairsError::driver(SqlState::INVALID_AUTHORIZATION, msg)
            }
        }
    }
}

type TdsClient = Client<Compat<TcpStream>>;

/// MS SQL Server connection using tiberius
pub struct MssqlConnection {
    client: Mutex<Option<TdsClient>>,
    closed: AtomicBool,
    database: Option<String>,
}

impl MssqlConnection {
    /// Create a new MS SQL Server connection
    ///
    /// # Arguments
    /// * `host` - Server hostname
    /// * `port` - Server port (default 1433)
    /// * `database` - Database name (optional)
    /// * `username` - Username (None for Windows auth)
    /// * `password` - Password
    /// * `trust_cert` - Whether to trust server certificate
    /// * `encrypt` - TLS requirement, see [`encryption_level`]
    #[tracing::instrument(skip(password))]
    pub async fn connect(
        host: &str,
        port: u16,
        database: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
        trust_cert: bool,
        encrypt: Option<bool>,
    ) -> std::result::Result<Self, MssqlConnectionError> {
        tracing::debug!("connecting to MS SQL Server at {}:{}", host, port);

        let mut config = Config::new();
        config.host(host);
        config.port(port);

        if let Some(db) = database {
            config.database(db);
        }

        if trust_cert {
            config.trust_cert();
        }

        config.encryption(encryption_level(encrypt));

        match (username, password) {
            (Some(user), Some(pass)) => {
                config.authentication(AuthMethod::sql_server(user, pass));
            }
            (Some(user), None) => {
                config.authentication(AuthMethod::sql_server(user, ""));
            }
            (None, _) => {
                #[cfg(windows)]
                {
                    config.authentication(AuthMethod::Integrated);
                }
                #[cfg(not(windows))]
                {
                    return Err(MssqlConnectionError::AuthenticationFailed(
                        "trusted connection is only supported on Windows; set `user` and `password`"
                            .to_string(),
                    ));
                }
            }
        }

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| MssqlConnectionError::ConnectionFailed(e.to_string()))?;

        tcp.set_nodelay(true)?;
        let compat_stream = tcp.compat_write();

        let client = Client::connect(config, compat_stream).await?;

        tracing::debug!("successfully connected to MS SQL Server");

        Ok(Self {
            client: Mutex::new(Some(client)),
            closed: AtomicBool::new(false),
            database: database.map(String::from),
        })
    }

    /// Create connection from config with standard keys
    pub async fn from_config(
        config: &repairs_core::ConnectionConfig,
    ) -> std::result::Result<Self, MssqlConnectionError> {
        let host = config
            .get_string("host")
            .unwrap_or_else(|| "localhost".to_string());
        let port = if config.port > 0 { config.port } else { 1433 };
        let database = config.get_string("database");
        let username = config.get_string("user");
        let password = config.get_string("password");
        let trust_cert = config.get_bool("trust_cert");
        let encrypt = config.get_flag("encrypt");

        Self::connect(
            &host,
            port,
            database.as_deref(),
            username.as_deref(),
            password.as_deref(),
            trust_cert,
            encrypt,
        )
        .await
    }
}

#[async_trait]
impl Connection for MssqlConnection {
    fn driver_name(&self) -> &str {
        "mssql"
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start = std::time::Instant::now();

        let mut guard = self.client.lock().await;
        let client = guard.as_mut().ok_or(RepairsError::ConnectionClosed)?;

        let tiberius_params = values_to_tiberius_params(params);
        let param_refs: Vec<&dyn tiberius::ToSql> = tiberius_params
            .iter()
            .map(|p| p as &dyn tiberius::ToSql)
            .collect();

        let stream = match client.query(sql, &param_refs[..]).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, "query failed");
                return Err(to_core_error(e, ConnectPhase::Executing));
            }
        };

        let tib_rows = stream
            .into_first_result()
            .await
            .map_err(|e| to_core_error(e, ConnectPhase::Executing))?;

        let mut rows: Vec<Row> = Vec::with_capacity(tib_rows.len());
        for tib_row in tib_rows {
            rows.push(Row::new(tiberius_row_to_values(tib_row)?));
        }

        tracing::debug!(
            row_count = rows.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "query completed"
        );

        Ok(QueryResult { rows })
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        let client = self.client.lock().await.take();
        if let Some(client) = client {
            client
                .close()
                .await
                .map_err(|e| to_core_error(e, ConnectPhase::Executing))?;
        }
        tracing::debug!("MS SQL Server connection closed");
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// TLS level for the `encrypt` setting.
///
/// Unset negotiates: TLS when the server offers it, plain otherwise.
pub(crate) fn encryption_level(encrypt: Option<bool>) -> EncryptionLevel {
    match encrypt {
        Some(true) => EncryptionLevel::Required,
        Some(false) => EncryptionLevel::NotSupported,
        None => EncryptionLevel::On,
    }
}

/// Convert a tiberius row to a vector of Values by consuming the row
fn tiberius_row_to_values(row: TiberiusRow) -> Result<Vec<Value>> {
    row.into_iter().map(column_data_to_value).collect()
}

fn sql_epoch() -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .ok_or_else(|| RepairsError::Conversion("invalid SQL Server epoch".into()))
}

fn day_one() -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .ok_or_else(|| RepairsError::Conversion("invalid date origin".into()))
}

fn time_from_increments(increments: u64, scale: u8) -> chrono::NaiveTime {
    // `increments` counts units of 10^-scale seconds since midnight
    let per_second = 10u64.pow(u32::from(scale));
    let secs = (increments / per_second) as u32;
    let nanos = ((increments % per_second) * 10u64.pow(9 - u32::from(scale).min(9))) as u32;
    chrono::NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).unwrap_or_default()
}

/// Convert tiberius ColumnData to a core Value
pub(crate) fn column_data_to_value(col_data: ColumnData<'static>) -> Result<Value> {
    match col_data {
        ColumnData::Bit(None) => Ok(Value::Null),
        ColumnData::Bit(Some(v)) => Ok(Value::Bool(v)),
        ColumnData::U8(None) => Ok(Value::Null),
        ColumnData::U8(Some(v)) => Ok(Value::Int16(i16::from(v))),
        ColumnData::I16(None) => Ok(Value::Null),
        ColumnData::I16(Some(v)) => Ok(Value::Int16(v)),
        ColumnData::I32(None) => Ok(Value::Null),
        ColumnData::I32(Some(v)) => Ok(Value::Int32(v)),
        ColumnData::I64(None) => Ok(Value::Null),
        ColumnData::I64(Some(v)) => Ok(Value::Int64(v)),
        ColumnData::F32(None) => Ok(Value::Null),
        ColumnData::F32(Some(v)) => Ok(Value::Float32(v)),
        ColumnData::F64(None) => Ok(Value::Null),
        ColumnData::F64(Some(v)) => Ok(Value::Float64(v)),
        ColumnData::String(None) => Ok(Value::Null),
        ColumnData::String(Some(v)) => Ok(Value::String(v.into_owned())),
        ColumnData::Guid(None) => Ok(Value::Null),
        ColumnData::Guid(Some(v)) => Ok(Value::String(v.to_string())),
        ColumnData::Binary(None) => Ok(Value::Null),
        ColumnData::Binary(Some(_)) => Err(RepairsError::Conversion(
            "binary columns are not supported".into(),
        )),
        ColumnData::Numeric(None) => Ok(Value::Null),
        ColumnData::Numeric(Some(v)) => Ok(Value::Decimal(v.to_string())),
        ColumnData::DateTime(None) => Ok(Value::Null),
        ColumnData::DateTime(Some(v)) => {
            // seconds_fragments are 1/300 s
            let fragments = u64::from(v.seconds_fragments());
            let dt = chrono::NaiveDateTime::new(
                sql_epoch()? + chrono::Duration::days(i64::from(v.days())),
                chrono::NaiveTime::from_num_seconds_from_midnight_opt(
                    (fragments / 300) as u32,
                    ((fragments % 300) * 1_000_000_000 / 300) as u32,
                )
                .unwrap_or_default(),
            );
            Ok(Value::DateTime(dt))
        }
        ColumnData::SmallDateTime(None) => Ok(Value::Null),
        ColumnData::SmallDateTime(Some(v)) => {
            let dt = chrono::NaiveDateTime::new(
                sql_epoch()? + chrono::Duration::days(i64::from(v.days())),
                chrono::NaiveTime::from_num_seconds_from_midnight_opt(
                    u32::from(v.seconds_fragments()) * 60,
                    0,
                )
                .unwrap_or_default(),
            );
            Ok(Value::DateTime(dt))
        }
        ColumnData::DateTime2(None) => Ok(Value::Null),
        ColumnData::DateTime2(Some(v)) => {
            let date = v.date();
            let time = v.time();
            let dt = chrono::NaiveDateTime::new(
                day_one()? + chrono::Duration::days(date.days() as i64),
                time_from_increments(time.increments(), time.scale()),
            );
            Ok(Value::DateTime(dt))
        }
        ColumnData::DateTimeOffset(None) => Ok(Value::Null),
        ColumnData::DateTimeOffset(Some(v)) => {
            let dt2 = v.datetime2();
            let date = dt2.date();
            let time = dt2.time();
            let naive = chrono::NaiveDateTime::new(
                day_one()? + chrono::Duration::days(date.days() as i64),
                time_from_increments(time.increments(), time.scale()),
            );
            let utc =
                chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(naive, chrono::Utc);
            Ok(Value::DateTimeUtc(utc))
        }
        ColumnData::Date(None) => Ok(Value::Null),
        ColumnData::Date(Some(v)) => {
            let date = day_one()? + chrono::Duration::days(v.days() as i64);
            Ok(Value::Date(date))
        }
        ColumnData::Time(None) => Ok(Value::Null),
        ColumnData::Time(Some(v)) => Ok(Value::Time(time_from_increments(v.increments(), v.scale()))),
        ColumnData::Xml(None) => Ok(Value::Null),
        ColumnData::Xml(Some(v)) => Ok(Value::String(v.into_owned().into_string())),
    }
}

/// Container for tiberius parameter values
#[derive(Debug)]
pub(crate) enum TiberiusParam {
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl tiberius::ToSql for TiberiusParam {
    fn to_sql(&self) -> ColumnData<'_> {
        match self {
            // nvarchar NULL converts implicitly to every parameter type
            TiberiusParam::Null => ColumnData::String(None),
            TiberiusParam::Bool(v) => ColumnData::Bit(Some(*v)),
            TiberiusParam::I16(v) => ColumnData::I16(Some(*v)),
            TiberiusParam::I32(v) => ColumnData::I32(Some(*v)),
            TiberiusParam::I64(v) => ColumnData::I64(Some(*v)),
            TiberiusParam::F32(v) => ColumnData::F32(Some(*v)),
            TiberiusParam::F64(v) => ColumnData::F64(Some(*v)),
            TiberiusParam::String(v) => {
                ColumnData::String(Some(std::borrow::Cow::Borrowed(v.as_str())))
            }
            TiberiusParam::Date(v) => tiberius::ToSql::to_sql(v),
            TiberiusParam::DateTime(v) => tiberius::ToSql::to_sql(v),
        }
    }
}

/// Convert core Values to tiberius parameters
pub(crate) fn values_to_tiberius_params(values: &[Value]) -> Vec<TiberiusParam> {
    values
        .iter()
        .map(|v| match v {
            Value::Null => TiberiusParam::Null,
            Value::Bool(b) => TiberiusParam::Bool(*b),
            Value::Int16(i) => TiberiusParam::I16(*i),
            Value::Int32(i) => TiberiusParam::I32(*i),
            Value::Int64(i) => TiberiusParam::I64(*i),
            Value::Float32(f) => TiberiusParam::F32(*f),
            Value::Float64(f) => TiberiusParam::F64(*f),
            Value::Decimal(d) => TiberiusParam::String(d.clone()),
            Value::String(s) => TiberiusParam::String(s.clone()),
            Value::Date(d) => TiberiusParam::Date(*d),
            Value::Time(t) => TiberiusParam::String(t.to_string()),
            Value::DateTime(dt) => TiberiusParam::DateTime(*dt),
            Value::DateTimeUtc(dt) => TiberiusParam::DateTime(dt.naive_utc()),
        })
        .collect()
}

impl std::fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("database", &self.database)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}
