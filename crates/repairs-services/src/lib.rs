//! Repairs Services Layer
//!
//! This crate sits between a presentation front end and the database.
//! It never renders anything itself: front ends feed it user actions and
//! receive typed rows, rendered cells and `Notice`s back.
//!
//! # Architecture
//!
//! ```text
//! Front end (repairs-cli, or any other toolkit)
//!     ↓
//! RepairApp ← orchestration, notices, startup gate
//!     ↓
//! RepairTable / FilterSet / RepairForm ← in-memory state
//!     ↓
//! Session → Procedures ← one typed method per stored procedure
//!     ↓
//! repairs-core::Connection (repairs-driver-mssql)
//! ```

mod app;
mod error;
mod filters;
mod form;
mod models;
mod procedures;
mod references;
mod repair;
mod session;
mod table;

pub use app::{Notice, Notifier, RepairApp, SaveOutcome, StartupError};
pub use error::{ActionError, DataAccessError, DataResult};
pub use filters::{FilterSet, Selection};
pub use form::{FormError, RepairDraft, RepairForm, RepairStatus, parse_form_date, parse_form_number};
pub use models::{
    MeasureUnit, MovementRequest, ObjectRow, OwnerBinding, ReferenceRow, RepairSnapshot, TechnicsInfo,
    UserInfo,
};
pub use procedures::{ProcedureCall, Procedures};
pub use references::{ALL_LABEL, Dimension, FormReferences, ReferenceTable, References};
pub use repair::{RepairColumn, RepairRecord, StatusTag};
pub use session::Session;
pub use table::{ClickRegion, RenderedRow, RepairTable, SortState, format_decimal};
