//! Application configuration file
//!
//! The file is line oriented: every non-blank line that does not start
//! with `#` is `key: value`, split on the first colon. Any other line makes
//! the whole file unusable.

use crate::ConfigError;
use indexmap::IndexMap;
use std::path::Path;

/// Default file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Settings read from the configuration file
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQL Server host
    pub server: String,
    /// Database name
    pub database: String,
    pub port: Option<u16>,
    /// SQL login; integrated authentication when absent
    pub user: Option<String>,
    pub password: Option<String>,
    pub trust_cert: bool,
    /// TLS on the wire: `Some(true)` requires it, `Some(false)` disables
    /// it, unset negotiates with the server
    pub encrypt: Option<bool>,
    /// Every key in file order, including ones not interpreted above
    pub entries: IndexMap<String, String>,
}

impl AppConfig {
    /// Read and parse the file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::parse(&contents)?;
        tracing::debug!(path = %path.display(), server = %config.server, db = %config.database, "configuration loaded");
        Ok(config)
    }

    /// Parse configuration text
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut entries = IndexMap::new();

        for (idx, line) in contents.lines().enumerate() {
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| ConfigError::MalformedLine {
                    line_no: idx + 1,
                    line: line.to_string(),
                })?;
            entries.insert(key.trim().to_string(), value.trim().to_string());
        }

        let required = |key: &'static str| {
            entries
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .ok_or(ConfigError::MissingKey(key))
        };
        let server = required("server")?;
        let database = required("db")?;

        let port = match entries.get("port") {
            Some(raw) => Some(raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: "port",
                value: raw.clone(),
            })?),
            None => None,
        };
        let optional = |key: &str| entries.get(key).filter(|v| !v.is_empty()).cloned();
        let user = optional("user");
        let password = optional("password");
        let trust_cert = entries
            .get("trust_cert")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let encrypt = match entries.get("encrypt").map(|v| v.to_ascii_lowercase()) {
            None => None,
            Some(v) if v == "true" || v == "1" => Some(true),
            Some(v) if v == "false" || v == "0" => Some(false),
            Some(v) => {
                return Err(ConfigError::InvalidValue {
                    key: "encrypt",
                    value: v,
                });
            }
        };

        Ok(Self {
            server,
            database,
            port,
            user,
            password,
            trust_cert,
            encrypt,
            entries,
        })
    }

    /// Raw value of any key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("trust_cert", &self.trust_cert)
            .field("encrypt", &self.encrypt)
            .finish_non_exhaustive()
    }
}
