//! Database driver trait and connection configuration

use crate::{AppConfig, Connection, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Factory for connections to one kind of database server
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Unique identifier for this driver (e.g., "mssql")
    fn id(&self) -> &'static str;

    /// Display name for messages
    fn display_name(&self) -> &'static str {
        self.id()
    }

    /// Default connection port
    fn default_port(&self) -> Option<u16> {
        None
    }

    /// Open a new connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;

    /// Build a human-readable connection string (no secrets)
    fn build_connection_string(&self, config: &ConnectionConfig) -> String;
}

/// Connection configuration
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Driver ID (e.g., "mssql")
    pub driver: String,
    /// Host address
    pub host: String,
    /// Port number (0 for the driver default)
    pub port: u16,
    /// Database name
    pub database: Option<String>,
    /// Username (None for integrated authentication)
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Additional connection parameters
    pub params: HashMap<String, String>,
}

impl ConnectionConfig {
    /// Create a new configuration with default values
    pub fn new(driver: &str, host: &str) -> Self {
        Self {
            driver: driver.to_string(),
            host: host.to_string(),
            port: 0,
            database: None,
            username: None,
            password: None,
            params: HashMap::new(),
        }
    }

    /// Configuration for the server named in the application config file
    pub fn from_app_config(config: &AppConfig) -> Self {
        let mut conn = Self::new("mssql", &config.server);
        conn.port = config.port.unwrap_or(0);
        conn.database = Some(config.database.clone());
        conn.username = config.user.clone();
        conn.password = config.password.clone();
        if config.trust_cert {
            conn.params.insert("trust_cert".into(), "true".into());
        }
        if let Some(encrypt) = config.encrypt {
            conn.params.insert("encrypt".into(), encrypt.to_string());
        }
        conn
    }

    /// Set a connection parameter
    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// Get a string parameter, falling back to the typed fields
    pub fn get_string(&self, key: &str) -> Option<String> {
        match key {
            "host" if !self.host.is_empty() => Some(self.host.clone()),
            "database" => self.database.clone(),
            "user" | "username" => self.username.clone(),
            "password" => self.password.clone(),
            _ => self.params.get(key).cloned(),
        }
    }

    /// Get a boolean parameter (`true`/`1`)
    pub fn get_bool(&self, key: &str) -> bool {
        self.get_flag(key).unwrap_or(false)
    }

    /// Get a boolean parameter, `None` when it is not set
    pub fn get_flag(&self, key: &str) -> Option<bool> {
        self.params.get(key).map(|v| v == "true" || v == "1")
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}
