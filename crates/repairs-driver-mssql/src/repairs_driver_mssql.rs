//! MS SQL Server driver for the technics repairs client
//!
//! Wraps `tiberius` behind the `repairs_core::Connection` trait and
//! translates driver failures into SQLSTATE-tagged errors so callers can
//! tell a dropped network from a refused login or a malformed call.

mod connection;
mod driver;
mod errors;

#[cfg(test)]
mod connection_tests;
#[cfg(test)]
mod driver_tests;
#[cfg(test)]
mod errors_tests;

pub use connection::{MssqlConnection, MssqlConnectionError};
pub use driver::MssqlDriver;
pub use errors::{ConnectPhase, sql_state_for};
