//! Repair records and the columns of the repair table

use chrono::{NaiveDate, NaiveDateTime};
use repairs_core::{Row, Value};
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};

use crate::models::{text, timestamp};

/// Column of the repair list, in the order `get_repair_list` returns them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RepairColumn {
    Id,
    CreatedBy,
    CreatedAt,
    StatusId,
    Status,
    Region,
    Store,
    WorkOrder,
    Owner,
    EquipmentType,
    Manufacturer,
    Model,
    SerialNumber,
    Hours,
    BrokenDate,
    RepairFinishedDate,
    FaultDescription,
    PerformedWork,
    UnitCount,
    UnitOfMeasure,
}

impl RepairColumn {
    pub fn heading(self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::CreatedBy => "Создал",
            Self::CreatedAt => "Дата/время создания",
            Self::StatusId => "StatusID",
            Self::Status => "Статус",
            Self::Region => "РЦ",
            Self::Store => "Склад",
            Self::WorkOrder => "Наряд-заказ",
            Self::Owner => "Собственник",
            Self::EquipmentType => "Вид техники",
            Self::Manufacturer => "Производитель",
            Self::Model => "Модель",
            Self::SerialNumber => "Серийный номер",
            Self::Hours => "Текущие моточасы",
            Self::BrokenDate => "Дата поломки",
            Self::RepairFinishedDate => "Дата завершения ремонта",
            Self::FaultDescription => "Описание неисправности",
            Self::PerformedWork => "Проведённые работы",
            Self::UnitCount => "Кол-во единиц",
            Self::UnitOfMeasure => "Ед. изм.",
        }
    }

    /// Display width in characters; zero hides the column
    pub fn width(self) -> u16 {
        match self {
            Self::CreatedAt | Self::StatusId => 0,
            Self::Id | Self::UnitOfMeasure => 8,
            Self::Status => 10,
            Self::Model => 12,
            Self::WorkOrder | Self::UnitCount => 14,
            Self::Owner => 15,
            Self::Manufacturer => 16,
            Self::CreatedBy
            | Self::Region
            | Self::Store
            | Self::EquipmentType
            | Self::SerialNumber
            | Self::Hours => 20,
            Self::BrokenDate => 23,
            Self::RepairFinishedDate => 25,
            Self::FaultDescription | Self::PerformedWork => 30,
        }
    }

    pub fn is_hidden(self) -> bool {
        self.width() == 0
    }

    /// Position in the server row
    pub fn index(self) -> usize {
        self as usize
    }

    /// Columns shown to the user, left to right
    pub fn displayed() -> impl Iterator<Item = RepairColumn> {
        Self::iter().filter(|c| !c.is_hidden())
    }

    /// Column behind a displayed position; hidden columns are skipped
    pub fn from_display_index(index: usize) -> Option<Self> {
        Self::displayed().nth(index)
    }

    /// Resolve a column by its heading or its snake_case key
    pub fn from_heading(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::iter()
            .find(|c| c.heading().eq_ignore_ascii_case(name))
            .or_else(|| name.parse().ok())
    }
}

/// Row-level status shown as a background colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTag {
    Created,
    Fixed,
    Deleted,
}

impl StatusTag {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Созд." => Some(Self::Created),
            "Фикс." => Some(Self::Fixed),
            "Удал." => Some(Self::Deleted),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "Созд.",
            Self::Fixed => "Фикс.",
            Self::Deleted => "Удал.",
        }
    }

    /// Background colour (Tk colour name or `#rrggbb`)
    pub fn background(self) -> &'static str {
        match self {
            Self::Created => "#ffffc8",
            Self::Fixed => "lightgreen",
            Self::Deleted => "#f66e6e",
        }
    }
}

/// One repair as listed by `get_repair_list`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepairRecord {
    pub id: i64,
    pub created_by: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub status_id: Option<i64>,
    pub status: Option<String>,
    pub region: Option<String>,
    pub store: Option<String>,
    pub work_order: Option<String>,
    pub owner: Option<String>,
    pub equipment_type: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub hours: Option<f64>,
    pub broken_date: Option<NaiveDate>,
    pub repair_finished_date: Option<NaiveDate>,
    pub fault_description: Option<String>,
    pub performed_work: Option<String>,
    pub unit_count: Option<f64>,
    pub unit_of_measure: Option<String>,
}

impl RepairRecord {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Decode a server row; `None` if the ID is missing
    pub fn from_row(row: &Row) -> Option<Self> {
        let col = |c: RepairColumn| c.index();
        Some(Self {
            id: row.value(col(RepairColumn::Id)).as_i64()?,
            created_by: text(row, col(RepairColumn::CreatedBy)),
            created_at: timestamp(row, col(RepairColumn::CreatedAt)),
            status_id: row.value(col(RepairColumn::StatusId)).as_i64(),
            status: text(row, col(RepairColumn::Status)),
            region: text(row, col(RepairColumn::Region)),
            store: text(row, col(RepairColumn::Store)),
            work_order: text(row, col(RepairColumn::WorkOrder)),
            owner: text(row, col(RepairColumn::Owner)),
            equipment_type: text(row, col(RepairColumn::EquipmentType)),
            manufacturer: text(row, col(RepairColumn::Manufacturer)),
            model: text(row, col(RepairColumn::Model)),
            serial_number: text(row, col(RepairColumn::SerialNumber)),
            hours: row.value(col(RepairColumn::Hours)).as_f64(),
            broken_date: row.value(col(RepairColumn::BrokenDate)).as_date(),
            repair_finished_date: row.value(col(RepairColumn::RepairFinishedDate)).as_date(),
            fault_description: text(row, col(RepairColumn::FaultDescription)),
            performed_work: text(row, col(RepairColumn::PerformedWork)),
            unit_count: row.value(col(RepairColumn::UnitCount)).as_f64(),
            unit_of_measure: text(row, col(RepairColumn::UnitOfMeasure)),
        })
    }

    /// Value of one column, `Value::Null` when absent
    pub fn value(&self, column: RepairColumn) -> Value {
        fn string(v: &Option<String>) -> Value {
            v.clone().map(Value::String).unwrap_or(Value::Null)
        }
        fn number(v: Option<f64>) -> Value {
            v.map(Value::Float64).unwrap_or(Value::Null)
        }
        fn date(v: Option<NaiveDate>) -> Value {
            v.map(Value::Date).unwrap_or(Value::Null)
        }

        match column {
            RepairColumn::Id => Value::Int64(self.id),
            RepairColumn::CreatedBy => string(&self.created_by),
            RepairColumn::CreatedAt => self.created_at.map(Value::DateTime).unwrap_or(Value::Null),
            RepairColumn::StatusId => self.status_id.map(Value::Int64).unwrap_or(Value::Null),
            RepairColumn::Status => string(&self.status),
            RepairColumn::Region => string(&self.region),
            RepairColumn::Store => string(&self.store),
            RepairColumn::WorkOrder => string(&self.work_order),
            RepairColumn::Owner => string(&self.owner),
            RepairColumn::EquipmentType => string(&self.equipment_type),
            RepairColumn::Manufacturer => string(&self.manufacturer),
            RepairColumn::Model => string(&self.model),
            RepairColumn::SerialNumber => string(&self.serial_number),
            RepairColumn::Hours => number(self.hours),
            RepairColumn::BrokenDate => date(self.broken_date),
            RepairColumn::RepairFinishedDate => date(self.repair_finished_date),
            RepairColumn::FaultDescription => string(&self.fault_description),
            RepairColumn::PerformedWork => string(&self.performed_work),
            RepairColumn::UnitCount => number(self.unit_count),
            RepairColumn::UnitOfMeasure => string(&self.unit_of_measure),
        }
    }

    pub fn status_tag(&self) -> Option<StatusTag> {
        self.status.as_deref().and_then(StatusTag::from_label)
    }
}
