use repairs_core::{RepairsError, SqlState};
use thiserror::Error;

use crate::form::FormError;

pub type DataResult<T> = Result<T, DataAccessError>;

/// Classified failure of a stored-procedure round trip
///
/// Programming-level errors never show up here: they are swallowed by
/// `Procedures` and surface as "no result" instead.
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("Network error ({state}): {message}")]
    Network { state: SqlState, message: String },

    #[error("Login failed ({state}): {message}")]
    Login { state: SqlState, message: String },

    #[error("Unexpected database error: {0}")]
    Unexpected(String),
}

impl DataAccessError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Classify an error raised while opening the connection.
    ///
    /// Authorization codes only mean "login failed" at this point; after
    /// login the same class is a programming error.
    pub(crate) fn from_connect(err: RepairsError) -> Self {
        match err.sql_state() {
            Some(state) if state.is_network() => Self::network(state.clone(), &err),
            Some(state) if state.is_login_failure() => Self::Login {
                state: state.clone(),
                message: driver_message(&err),
            },
            _ if err.is_network() => Self::network(SqlState::new(SqlState::LINK_FAILURE), &err),
            _ => Self::Unexpected(err.to_string()),
        }
    }

    /// Classify an error raised by a statement on an open connection.
    ///
    /// Returns `None` for programming errors, which callers swallow.
    pub(crate) fn from_execute(err: RepairsError) -> Option<Self> {
        match err.sql_state() {
            Some(state) if state.is_network() => Some(Self::network(state.clone(), &err)),
            Some(state) if state.is_programming() => None,
            _ if err.is_network() => Some(Self::network(
                SqlState::new(SqlState::LINK_FAILURE),
                &err,
            )),
            _ => Some(Self::Unexpected(err.to_string())),
        }
    }

    fn network(state: SqlState, err: &RepairsError) -> Self {
        Self::Network {
            state,
            message: driver_message(err),
        }
    }
}

fn driver_message(err: &RepairsError) -> String {
    match err {
        RepairsError::Driver { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Failure of a user action such as saving a repair
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Data(#[from] DataAccessError),

    #[error("Repair {0} not found")]
    RepairNotFound(i64),
}
