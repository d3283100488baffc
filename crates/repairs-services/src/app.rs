//! Application orchestration
//!
//! `RepairApp` owns the session, the loaded references, the filter set and
//! the repair table. Front ends call its operations and show whatever it
//! sends to their `Notifier`.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use repairs_core::ClientVersion;
use thiserror::Error;

use crate::error::{ActionError, DataAccessError, DataResult};
use crate::filters::FilterSet;
use crate::form::{FormError, RepairDraft, RepairForm, RepairStatus};
use crate::models::{MovementRequest, OwnerBinding, UserInfo};
use crate::references::{Dimension, FormReferences, References};
use crate::repair::RepairColumn;
use crate::session::Session;
use crate::table::{ClickRegion, RenderedRow, RepairTable};

/// User-facing message raised by an operation
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    NetworkError,
    LoginFailed,
    AccessDenied,
    UpdateRequired {
        client: ClientVersion,
        server: Option<ClientVersion>,
    },
    Unexpected(String),
    InvalidForm(FormError),
    Saved,
    SaveFailed,
    NoObjectBinding,
    RepairNotFound(i64),
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Self::NetworkError => "Network error",
            Self::LoginFailed => "Connection error",
            Self::AccessDenied => "Access error",
            Self::UpdateRequired { .. } => "Update required",
            Self::Unexpected(_) => "Unexpected error",
            Self::InvalidForm(_) | Self::Saved | Self::SaveFailed => "Repair data",
            Self::NoObjectBinding => "No binding",
            Self::RepairNotFound(_) => "Repair",
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Saved)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkError => f.write_str("A general network error occurred. Try again later."),
            Self::LoginFailed => f.write_str("No permission to work with the server."),
            Self::AccessDenied => f.write_str("No permission to work with the application."),
            Self::UpdateRequired { client, server } => write!(
                f,
                "The application must be updated to continue (client {}, server {})",
                client,
                describe_version(server)
            ),
            Self::Unexpected(message) => write!(f, "An unexpected error occurred: {}", message),
            Self::InvalidForm(err) => write!(f, "{}", err),
            Self::Saved => f.write_str("Data saved"),
            Self::SaveFailed => f.write_str("The server rejected the changes"),
            Self::NoObjectBinding => {
                f.write_str("On the given date the equipment is not bound to any region")
            }
            Self::RepairNotFound(id) => write!(f, "Repair {} not found", id),
        }
    }
}

impl From<&DataAccessError> for Notice {
    fn from(err: &DataAccessError) -> Self {
        match err {
            DataAccessError::Network { .. } => Self::NetworkError,
            DataAccessError::Login { .. } => Self::LoginFailed,
            DataAccessError::Unexpected(message) => Self::Unexpected(message.clone()),
        }
    }
}

/// Receives the notices of a `RepairApp`
pub trait Notifier {
    fn notify(&self, notice: Notice);
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }
}

/// Reasons the application refuses to start
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Update required: client {client}, server {}", describe_version(.server))]
    UpdateRequired {
        client: ClientVersion,
        server: Option<ClientVersion>,
    },

    #[error("Access to the application is denied")]
    AccessDenied,

    #[error("Server returned no user information")]
    MissingUserInfo,

    #[error(transparent)]
    Data(#[from] DataAccessError),
}

impl From<&StartupError> for Notice {
    fn from(err: &StartupError) -> Self {
        match err {
            StartupError::UpdateRequired { client, server } => Notice::UpdateRequired {
                client: *client,
                server: *server,
            },
            StartupError::AccessDenied => Notice::AccessDenied,
            StartupError::MissingUserInfo => Notice::Unexpected(err.to_string()),
            StartupError::Data(data) => Notice::from(data),
        }
    }
}

fn describe_version(version: &Option<ClientVersion>) -> String {
    version.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

/// Result of a save that reached the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Rejected,
}

pub struct RepairApp<N: Notifier> {
    session: Session,
    notifier: N,
    user: UserInfo,
    references: References,
    filters: FilterSet,
    table: RepairTable,
}

impl<N: Notifier> RepairApp<N> {
    /// Gate and load the session.
    ///
    /// The version check runs before anything else is read; then access is
    /// checked, then user info and references are loaded, all on one
    /// connection. Failures are notified before they are returned.
    #[tracing::instrument(skip(session, notifier))]
    pub async fn start(
        session: Session,
        notifier: N,
        client_version: ClientVersion,
    ) -> Result<Self, StartupError> {
        let loaded = session
            .scoped(|sql| async move {
                let server = sql.get_version_for_comparison().await?;
                if !client_version.is_compatible_with(server) {
                    return Err(StartupError::UpdateRequired {
                        client: client_version,
                        server,
                    });
                }
                if !sql.access_check().await? {
                    return Err(StartupError::AccessDenied);
                }
                let user = sql
                    .get_user_info()
                    .await?
                    .ok_or(StartupError::MissingUserInfo)?;
                let references = References::from_rows(sql.get_references().await?);
                Ok::<_, StartupError>((user, references))
            })
            .await;

        match loaded {
            Ok((user, references)) => {
                tracing::info!(user = %user.short_user_name, "session started");
                Ok(Self {
                    session,
                    notifier,
                    user,
                    references,
                    filters: FilterSet::new(),
                    table: RepairTable::new(),
                })
            }
            Err(err) => {
                tracing::error!(error = %err, "startup refused");
                notifier.notify(Notice::from(&err));
                Err(err)
            }
        }
    }

    pub fn user(&self) -> &UserInfo {
        &self.user
    }

    pub fn references(&self) -> &References {
        &self.references
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn table(&self) -> &RepairTable {
        &self.table
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Re-query the repair list with the current filters
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&mut self) -> DataResult<()> {
        let filters = self.filters.clone();
        let fetched = self
            .session
            .scoped(|sql| async move { sql.get_repair_list(&filters).await })
            .await;

        match fetched {
            Ok(Some(rows)) => {
                tracing::info!(count = rows.len(), "repair list loaded");
                self.table.replace_rows(rows);
                Ok(())
            }
            Ok(None) => {
                tracing::warn!("repair list unavailable");
                self.table.replace_rows(Vec::new());
                Ok(())
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Select `label` in one dimension and reload
    pub async fn set_filter(&mut self, dimension: Dimension, label: &str) -> DataResult<()> {
        self.filters.set_label(&self.references, dimension, label);
        self.refresh().await
    }

    /// Select several dimensions at once, then reload a single time
    pub async fn apply_filters<'a>(
        &mut self,
        labels: impl IntoIterator<Item = (Dimension, &'a str)>,
    ) -> DataResult<()> {
        for (dimension, label) in labels {
            self.filters.set_label(&self.references, dimension, label);
        }
        self.refresh().await
    }

    /// Reset every dimension to "All" and reload
    pub async fn clear_filters(&mut self) -> DataResult<()> {
        self.filters.clear();
        self.refresh().await
    }

    pub fn click(&mut self, region: ClickRegion) -> bool {
        self.table.click(region)
    }

    /// Sort as if the heading named `heading` was clicked
    pub fn sort_by_heading(&mut self, heading: &str) -> bool {
        match RepairColumn::from_heading(heading) {
            Some(column) => self.table.sort_by(column),
            None => false,
        }
    }

    pub fn rendered_rows(&self) -> Vec<RenderedRow> {
        self.table.render()
    }

    /// Load the lookups the repair forms need
    #[tracing::instrument(skip(self))]
    pub async fn load_form_refs(&self) -> DataResult<FormReferences> {
        let loaded = self
            .session
            .scoped(|sql| async move {
                let technics = sql.get_technics_info().await?;
                let measure_units = sql.get_measure_units().await?;
                let objects = sql.get_objects().await?;
                Ok::<_, DataAccessError>(FormReferences::new(technics, measure_units, objects))
            })
            .await;
        loaded.inspect_err(|err| self.report(err))
    }

    /// Owner, region and store the equipment was bound to on `date`
    #[tracing::instrument(skip(self))]
    pub async fn lookup_binding(
        &self,
        serial_number: &str,
        date: NaiveDate,
    ) -> DataResult<Option<OwnerBinding>> {
        let serial_number = serial_number.to_string();
        let bindings = self
            .session
            .scoped(|sql| async move { sql.get_object_owner_info(&serial_number, date).await })
            .await
            .inspect_err(|err| self.report(err))?;

        let first = bindings.into_iter().next();
        if first.is_none() {
            self.notifier.notify(Notice::NoObjectBinding);
        }
        Ok(first)
    }

    /// Validate `form` and create a new repair
    #[tracing::instrument(skip(self, form, refs))]
    pub async fn create_repair(
        &mut self,
        form: &RepairForm,
        refs: &FormReferences,
        status: RepairStatus,
    ) -> Result<SaveOutcome, ActionError> {
        let draft = self.validated(form, refs, status)?;
        let user_id = self.user.user_id;
        let saved = self
            .session
            .scoped(|sql| async move { sql.create_repair(user_id, &draft).await })
            .await;
        self.finish_save(saved).await
    }

    /// Form pre-filled from an existing repair, for "create copy"
    #[tracing::instrument(skip(self))]
    pub async fn copy_repair(&self, repair_id: i64) -> Result<RepairForm, ActionError> {
        let snapshot = self
            .session
            .scoped(|sql| async move { sql.get_current_repair(repair_id).await })
            .await
            .inspect_err(|err| self.report(err))?;

        match snapshot {
            Some(snapshot) => Ok(RepairForm::from_snapshot(&snapshot)),
            None => {
                self.notifier.notify(Notice::RepairNotFound(repair_id));
                Err(ActionError::RepairNotFound(repair_id))
            }
        }
    }

    /// Validate `form` and overwrite repair `repair_id`
    #[tracing::instrument(skip(self, form, refs))]
    pub async fn update_repair(
        &mut self,
        repair_id: i64,
        form: &RepairForm,
        refs: &FormReferences,
        status: RepairStatus,
    ) -> Result<SaveOutcome, ActionError> {
        let draft = self.validated(form, refs, status)?;
        let user_id = self.user.user_id;
        let saved = self
            .session
            .scoped(|sql| async move { sql.update_repair(user_id, repair_id, &draft).await })
            .await;
        self.finish_save(saved).await
    }

    /// Record a movement of equipment to another object
    #[tracing::instrument(skip(self))]
    pub async fn move_technics(&mut self, movement: MovementRequest) -> Result<SaveOutcome, ActionError> {
        let user_id = self.user.user_id;
        let saved = self
            .session
            .scoped(|sql| async move { sql.add_movement(user_id, &movement).await })
            .await;
        self.finish_save(saved).await
    }

    fn validated(
        &self,
        form: &RepairForm,
        refs: &FormReferences,
        status: RepairStatus,
    ) -> Result<RepairDraft, ActionError> {
        form.validate(refs, status).map_err(|err| {
            tracing::debug!(error = %err, "repair form rejected");
            self.notifier.notify(Notice::InvalidForm(err.clone()));
            ActionError::Form(err)
        })
    }

    async fn finish_save(&mut self, saved: DataResult<Option<bool>>) -> Result<SaveOutcome, ActionError> {
        match saved {
            Ok(Some(true)) => {
                tracing::info!("changes saved");
                self.notifier.notify(Notice::Saved);
                if let Err(err) = self.refresh().await {
                    tracing::debug!(error = %err, "reload after save failed; the save stands");
                }
                Ok(SaveOutcome::Saved)
            }
            Ok(_) => {
                tracing::warn!("server rejected the changes");
                self.notifier.notify(Notice::SaveFailed);
                Ok(SaveOutcome::Rejected)
            }
            Err(err) => {
                self.report(&err);
                Err(err.into())
            }
        }
    }

    fn report(&self, err: &DataAccessError) {
        tracing::error!(error = %err, "database operation failed");
        self.notifier.notify(Notice::from(err));
    }
}
