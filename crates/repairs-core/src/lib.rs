//! Repairs Core - shared abstractions for the technics repairs client
//!
//! This crate provides the fundamental traits and types the other
//! repairs crates depend on:
//!
//! - `DatabaseDriver` - Trait for opening connections from a `ConnectionConfig`
//! - `Connection` - Trait for a single open database connection
//! - `SqlState` - Driver error codes and their classification
//! - `AppConfig` - The line-oriented `key: value` configuration file
//! - Common types like `Value`, `Row`, `QueryResult`

mod config;
mod connection;
mod driver;
mod error;
mod types;
mod version;

pub use config::*;
pub use connection::*;
pub use driver::*;
pub use error::*;
pub use types::*;
pub use version::*;
