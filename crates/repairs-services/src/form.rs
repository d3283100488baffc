//! Repair entry form: raw user input, validation and the validated draft

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{OwnerBinding, RepairSnapshot};
use crate::references::FormReferences;

/// Status a repair is saved with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepairStatus {
    /// Editable later
    #[default]
    Created,
    /// Final; the server refuses further edits
    Fixed,
}

impl RepairStatus {
    pub fn id(self) -> i64 {
        match self {
            Self::Created => 1,
            Self::Fixed => 2,
        }
    }
}

/// First problem found in a filled form
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("Serial number not found: {0}")]
    UnknownSerialNumber(String),

    #[error("Invalid value for hours: {0}")]
    InvalidHours(String),

    #[error("Invalid value for unit count: {0}")]
    InvalidUnitCount(String),

    #[error("Unit of measure is required when a unit count is given")]
    MissingUnitOfMeasure,

    #[error("Region is not set")]
    MissingRegion,

    #[error("Store is not set")]
    MissingStore,

    #[error("No object for region {region:?} and store {store:?}")]
    UnknownObject { region: String, store: String },

    #[error("Broken date is invalid or empty: {0:?}")]
    InvalidBrokenDate(String),

    #[error("Finished date is invalid: {0:?}")]
    InvalidFinishedDate(String),

    #[error("Unknown unit of measure: {0}")]
    UnknownUnitOfMeasure(String),
}

/// Validated payload of `CREATE_REPAIR` / `UPDATE_REPAIR`
#[derive(Debug, Clone, PartialEq)]
pub struct RepairDraft {
    pub serial_number: String,
    pub object_id: i64,
    pub broken_date: NaiveDate,
    pub finished_date: Option<NaiveDate>,
    pub work_order: Option<String>,
    pub hours: Option<f64>,
    pub unit_of_measure_id: Option<i64>,
    pub unit_count: Option<f64>,
    pub fault_description: Option<String>,
    pub performed_work: Option<String>,
    pub status: RepairStatus,
}

/// Raw contents of the repair form, as typed by the user
///
/// `finished_date` is `None` while the "repair finished" toggle is off.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepairForm {
    pub serial_number: String,
    pub work_order: String,
    pub broken_date: String,
    pub finished_date: Option<String>,
    pub hours: String,
    pub unit_count: String,
    pub unit_of_measure: String,
    pub region: String,
    pub store: String,
    pub fault_description: String,
    pub performed_work: String,
}

impl RepairForm {
    /// Pre-fill from a stored repair (copy and update)
    pub fn from_snapshot(snapshot: &RepairSnapshot) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        let number = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
        Self {
            serial_number: text(&snapshot.serial_number),
            work_order: text(&snapshot.work_order),
            broken_date: snapshot.broken_date.map(format_form_date).unwrap_or_default(),
            finished_date: snapshot.repair_finished_date.map(format_form_date),
            hours: number(snapshot.hours),
            unit_count: number(snapshot.unit_count),
            unit_of_measure: text(&snapshot.unit_of_measure),
            region: text(&snapshot.region),
            store: text(&snapshot.store),
            fault_description: text(&snapshot.fault_description),
            performed_work: text(&snapshot.performed_work),
        }
    }

    /// Take region and store from the equipment's binding on the broken date
    pub fn apply_binding(&mut self, binding: &OwnerBinding) {
        self.region = binding.region.clone().unwrap_or_default();
        self.store = binding.store.clone().unwrap_or_default();
    }

    /// Validate the form, stopping at the first problem
    pub fn validate(
        &self,
        refs: &FormReferences,
        status: RepairStatus,
    ) -> Result<RepairDraft, FormError> {
        let serial_number = self.serial_number.trim();
        if refs.technics(serial_number).is_none() {
            return Err(FormError::UnknownSerialNumber(serial_number.to_string()));
        }

        let hours = parse_form_number(&self.hours)
            .map_err(|_| FormError::InvalidHours(self.hours.clone()))?;
        let unit_count = parse_form_number(&self.unit_count)
            .map_err(|_| FormError::InvalidUnitCount(self.unit_count.clone()))?;

        let unit_label = self.unit_of_measure.trim();
        if unit_count.is_some_and(|n| n != 0.0) && unit_label.is_empty() {
            return Err(FormError::MissingUnitOfMeasure);
        }

        let region = self.region.trim();
        if region.is_empty() {
            return Err(FormError::MissingRegion);
        }
        let store = self.store.trim();
        if store.is_empty() {
            return Err(FormError::MissingStore);
        }
        let object_id = refs
            .object_id(region, store)
            .ok_or_else(|| FormError::UnknownObject {
                region: region.to_string(),
                store: store.to_string(),
            })?;

        let broken_date = parse_form_date(&self.broken_date)
            .ok_or_else(|| FormError::InvalidBrokenDate(self.broken_date.clone()))?;
        let finished_date = match &self.finished_date {
            Some(raw) => Some(
                parse_form_date(raw).ok_or_else(|| FormError::InvalidFinishedDate(raw.clone()))?,
            ),
            None => None,
        };

        let unit_of_measure_id = if unit_label.is_empty() {
            None
        } else {
            Some(
                refs.measure_unit_id(unit_label)
                    .ok_or_else(|| FormError::UnknownUnitOfMeasure(unit_label.to_string()))?,
            )
        };

        Ok(RepairDraft {
            serial_number: serial_number.to_string(),
            object_id,
            broken_date,
            finished_date,
            work_order: non_empty(&self.work_order),
            hours,
            unit_of_measure_id,
            unit_count,
            fault_description: non_empty(&self.fault_description),
            performed_work: non_empty(&self.performed_work),
            status,
        })
    }
}

/// Parse a number typed with spaces, line breaks or a comma decimal mark.
///
/// Empty input is `Ok(None)`.
pub fn parse_form_number(raw: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '\n'))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned.parse().map(Some)
}

/// Parse `dd.mm.yy` or `dd.mm.yyyy`; `/` is accepted as separator
pub fn parse_form_date(raw: &str) -> Option<NaiveDate> {
    let normalized = raw.trim().replace('/', ".");
    NaiveDate::parse_from_str(&normalized, "%d.%m.%y")
        .or_else(|_| NaiveDate::parse_from_str(&normalized, "%d.%m.%Y"))
        .ok()
}

fn format_form_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
