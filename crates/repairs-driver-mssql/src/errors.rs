//! Translation of tiberius failures into SQLSTATE codes
//!
//! The server and its deployment scripts speak in ODBC SQLSTATEs, so the
//! native error numbers TDS reports are folded onto the same codes an ODBC
//! driver would have produced for them.

use repairs_core::{RepairsError, SqlState};
use tiberius::error::Error as TiberiusError;

/// Where in the connection lifecycle an error was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectPhase {
    /// TCP connect, TLS handshake, prelogin and login
    Connecting,
    /// Statement execution on an open connection
    Executing,
}

/// SQLSTATE for a server error number and severity class
pub(crate) fn sql_state_for_server_error(code: u32, class: u8) -> &'static str {
    match code {
        // Login failed / password expired / must change password
        18452 | 18456 | 18486 | 18487 | 18488 => SqlState::INVALID_AUTHORIZATION,
        // Cannot open database requested by the login
        4060 => SqlState::SYNTAX_OR_ACCESS,
        // Permission denied on object / column
        229 | 230 => SqlState::SYNTAX_OR_ACCESS,
        // Could not find stored procedure
        2812 => SqlState::SYNTAX_OR_ACCESS,
        // Procedure expects a parameter that was not supplied / too many arguments
        201 | 8144 | 8145 => SqlState::SYNTAX_OR_ACCESS,
        // Incorrect syntax
        102 | 156 => SqlState::SYNTAX_OR_ACCESS,
        // Invalid column name / invalid object name
        207 => "42S22",
        208 => "42S02",
        // Deadlock victim
        1205 => "40001",
        // Severity 20 and above terminates the connection
        _ if class >= 20 => SqlState::LINK_FAILURE,
        _ => SqlState::GENERAL_ERROR,
    }
}

/// SQLSTATE an ODBC driver would have reported for `err`
pub fn sql_state_for(err: &TiberiusError, phase: ConnectPhase) -> SqlState {
    let code = match err {
        TiberiusError::Server(token) => sql_state_for_server_error(token.code(), token.class()),
        TiberiusError::Io { .. } | TiberiusError::Tls(_) | TiberiusError::Routing { .. } => {
            match phase {
                ConnectPhase::Connecting => SqlState::UNABLE_TO_CONNECT,
                ConnectPhase::Executing => SqlState::LINK_FAILURE,
            }
        }
        _ => SqlState::GENERAL_ERROR,
    };
    SqlState::new(code)
}

/// Convert a tiberius failure into a SQLSTATE-tagged core error
pub(crate) fn to_core_error(err: TiberiusError, phase: ConnectPhase) -> RepairsError {
    let state = sql_state_for(&err, phase);
    let message = match &err {
        TiberiusError::Server(token) => token.message().to_string(),
        other => other.to_string(),
    };
    RepairsError::Driver { state, message }
}
