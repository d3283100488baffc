//! Typed records decoded from stored-procedure result rows
//!
//! Every procedure returns a fixed column order; decoders read by position
//! and reject a row whose required columns are missing or mistyped.

use chrono::{NaiveDate, NaiveDateTime};
use repairs_core::{Row, Value};

/// Current user as reported by `get_user_info`
#[derive(Debug, Clone, PartialEq)]
pub struct UserInfo {
    pub user_id: i64,
    pub short_user_name: String,
    pub access_type: Option<i64>,
    pub is_super_user: bool,
}

impl UserInfo {
    pub(crate) fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            user_id: row.value(0).as_i64()?,
            short_user_name: text(row, 1).unwrap_or_default(),
            access_type: row.value(2).as_i64(),
            is_super_user: flag(row, 3),
        })
    }
}

/// One `(ref_type, ref_id, ref_name)` row of `get_references`
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRow {
    pub ref_type: String,
    pub ref_id: i64,
    pub ref_name: String,
}

impl ReferenceRow {
    pub fn new(ref_type: impl Into<String>, ref_id: i64, ref_name: impl Into<String>) -> Self {
        Self {
            ref_type: ref_type.into(),
            ref_id,
            ref_name: ref_name.into(),
        }
    }

    pub(crate) fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            ref_type: text(row, 0)?,
            ref_id: row.value(1).as_i64()?,
            ref_name: text(row, 2)?,
        })
    }
}

/// Warehouse object: a store inside a region (distribution centre)
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRow {
    pub id: i64,
    pub region: String,
    pub store: String,
}

impl ObjectRow {
    pub(crate) fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            id: row.value(0).as_i64()?,
            region: text(row, 1)?,
            store: text(row, 2)?,
        })
    }
}

/// Equipment registered under a serial number
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TechnicsInfo {
    pub serial_number: String,
    pub equipment_type: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
}

impl TechnicsInfo {
    pub(crate) fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            serial_number: text(row, 0)?,
            equipment_type: text(row, 1),
            model: text(row, 2),
            manufacturer: text(row, 3),
        })
    }
}

/// Unit of measure for spare parts
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureUnit {
    pub label: String,
    pub id: i64,
}

impl MeasureUnit {
    pub(crate) fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            label: text(row, 0)?,
            id: row.value(1).as_i64()?,
        })
    }
}

/// Owner and location a piece of equipment was bound to on a given date
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerBinding {
    pub owner: Option<String>,
    pub region: Option<String>,
    pub store: Option<String>,
}

impl OwnerBinding {
    pub(crate) fn from_row(row: &Row) -> Self {
        Self {
            owner: text(row, 0),
            region: text(row, 1),
            store: text(row, 2),
        }
    }
}

/// Stored state of one repair, used to pre-fill the copy and update forms
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepairSnapshot {
    pub serial_number: Option<String>,
    pub work_order: Option<String>,
    pub equipment_type: Option<String>,
    pub model: Option<String>,
    pub owner: Option<String>,
    pub manufacturer: Option<String>,
    pub broken_date: Option<NaiveDate>,
    pub hours: Option<f64>,
    pub region: Option<String>,
    pub store: Option<String>,
    pub unit_count: Option<f64>,
    pub unit_of_measure: Option<String>,
    pub fault_description: Option<String>,
    pub performed_work: Option<String>,
    pub repair_finished_date: Option<NaiveDate>,
}

impl RepairSnapshot {
    pub(crate) fn from_row(row: &Row) -> Self {
        Self {
            serial_number: text(row, 0),
            work_order: text(row, 1),
            equipment_type: text(row, 2),
            model: text(row, 3),
            owner: text(row, 4),
            manufacturer: text(row, 5),
            broken_date: row.value(6).as_date(),
            hours: row.value(7).as_f64(),
            region: text(row, 8),
            store: text(row, 9),
            unit_count: row.value(10).as_f64(),
            unit_of_measure: text(row, 11),
            fault_description: text(row, 12),
            performed_work: text(row, 13),
            repair_finished_date: row.value(14).as_date(),
        }
    }
}

/// Request to move equipment to another warehouse object
#[derive(Debug, Clone, PartialEq)]
pub struct MovementRequest {
    pub technics_id: Option<i64>,
    pub serial_number: String,
    pub object_id: i64,
    pub date: NaiveDate,
}

pub(crate) fn text(row: &Row, index: usize) -> Option<String> {
    row.value(index).into_string()
}

pub(crate) fn flag(row: &Row, index: usize) -> bool {
    row.value(index).as_bool().unwrap_or(false)
}

pub(crate) fn timestamp(row: &Row, index: usize) -> Option<NaiveDateTime> {
    match row.value(index) {
        Value::DateTime(dt) => Some(dt),
        Value::DateTimeUtc(dt) => Some(dt.naive_utc()),
        Value::Date(d) => d.and_hms_opt(0, 0, 0),
        _ => None,
    }
}
