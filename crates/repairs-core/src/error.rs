//! Error types for the repairs client

use std::fmt;
use thiserror::Error;

/// Five-character SQLSTATE code reported by the database driver.
///
/// The classification helpers follow the ODBC codes the server-side
/// deployment has always reported: `01000`, `08S01` and `08001` mean the
/// network dropped out, `28000` and `42000` at login mean the user was
/// refused, and class `42` after login means a malformed procedure call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqlState(String);

impl SqlState {
    /// General warning, raised by the driver when the link is lost mid-call
    pub const GENERAL_WARNING: &'static str = "01000";
    /// Communication link failure
    pub const LINK_FAILURE: &'static str = "08S01";
    /// Client unable to establish connection
    pub const UNABLE_TO_CONNECT: &'static str = "08001";
    /// Invalid authorization specification
    pub const INVALID_AUTHORIZATION: &'static str = "28000";
    /// Syntax error or access violation
    pub const SYNTAX_OR_ACCESS: &'static str = "42000";
    /// Fallback when the driver gives no better code
    pub const GENERAL_ERROR: &'static str = "HY000";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-character class prefix (e.g. `08` for connection exceptions)
    pub fn class(&self) -> &str {
        self.0.get(..2).unwrap_or(&self.0)
    }

    /// Transient network condition; the current operation is aborted.
    pub fn is_network(&self) -> bool {
        matches!(
            self.0.as_str(),
            Self::GENERAL_WARNING | Self::LINK_FAILURE | Self::UNABLE_TO_CONNECT
        )
    }

    /// Login refused while opening a connection.
    pub fn is_login_failure(&self) -> bool {
        matches!(
            self.0.as_str(),
            Self::INVALID_AUTHORIZATION | Self::SYNTAX_OR_ACCESS
        )
    }

    /// Malformed statement or procedure call on an open connection.
    pub fn is_programming(&self) -> bool {
        self.class() == "42"
    }
}

impl fmt::Display for SqlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SqlState {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Core error type for repairs operations
#[derive(Error, Debug)]
pub enum RepairsError {
    /// Error reported by the database driver, tagged with its SQLSTATE
    #[error("Driver error [{state}]: {message}")]
    Driver { state: SqlState, message: String },

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Type conversion error: {0}")]
    Conversion(String),

}

impl RepairsError {
    pub fn driver(state: impl Into<SqlState>, message: impl Into<String>) -> Self {
        Self::Driver {
            state: state.into(),
            message: message.into(),
        }
    }

    /// SQLSTATE of a driver error, if this is one
    pub fn sql_state(&self) -> Option<&SqlState> {
        match self {
            Self::Driver { state, .. } => Some(state),
            _ => None,
        }
    }

    /// Whether the error is a transient network condition.
    ///
    /// A connection closed underneath the caller counts as one.
    pub fn is_network(&self) -> bool {
        match self {
            Self::Driver { state, .. } => state.is_network(),
            Self::ConnectionClosed => true,
            _ => false,
        }
    }
}

/// Errors raised while reading the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config file has an inappropriate line {line_no}: {line}")]
    MalformedLine { line_no: usize, line: String },

    #[error("config file lacks required key `{0}`")]
    MissingKey(&'static str),

    #[error("config key `{key}` has an invalid value `{value}`")]
    InvalidValue { key: &'static str, value: String },
}

/// Result type alias for repairs operations
pub type Result<T> = std::result::Result<T, RepairsError>;
