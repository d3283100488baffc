//! Reference tables: server-supplied label → ID lookups
//!
//! `References` backs the filter controls of the repair list and is loaded
//! once at startup. `FormReferences` backs the create/copy/update forms and
//! is loaded each time a form opens.

use std::collections::HashMap;

use indexmap::IndexMap;
use strum::{EnumIter, IntoEnumIterator};

use crate::filters::Selection;
use crate::models::{MeasureUnit, ObjectRow, ReferenceRow, TechnicsInfo};

/// Choice that disables a filter dimension
pub const ALL_LABEL: &str = "Все";

/// Filterable dimension of the repair list, in `get_repair_list` parameter order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum Dimension {
    CreatedBy,
    Region,
    Store,
    Owner,
    Manufacturer,
    EquipmentType,
    Status,
}

impl Dimension {
    /// `ref_type` tag of this dimension in `get_references`
    pub fn ref_type(self) -> &'static str {
        match self {
            Self::CreatedBy => "People",
            Self::Region => "ListObjects",
            Self::Store => "TypeStore",
            Self::Owner => "ListTechnicsOwners",
            Self::Manufacturer => "ListMfrs",
            Self::EquipmentType => "ListTechnicsTypes",
            Self::Status => "status_list",
        }
    }

    pub fn from_ref_type(ref_type: &str) -> Option<Self> {
        Self::iter().find(|d| d.ref_type() == ref_type)
    }

    /// Procedure parameter bound to this dimension
    pub fn param_name(self) -> &'static str {
        match self {
            Self::CreatedBy => "created_by",
            Self::Region => "rc",
            Self::Store => "store",
            Self::Owner => "owner",
            Self::Manufacturer => "mfr",
            Self::EquipmentType => "tech_type",
            Self::Status => "status",
        }
    }

    /// Caption of the filter control
    pub fn label(self) -> &'static str {
        match self {
            Self::CreatedBy => "Создал",
            Self::Region => "РЦ",
            Self::Store => "Склад",
            Self::Owner => "Владелец",
            Self::Manufacturer => "Производитель",
            Self::EquipmentType => "Тип техники",
            Self::Status => "Статус",
        }
    }
}

/// Label → ID mapping of one dimension, in server order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    entries: IndexMap<String, i64>,
}

impl ReferenceTable {
    pub fn insert(&mut self, label: impl Into<String>, id: i64) {
        self.entries.insert(label.into(), id);
    }

    pub fn id(&self, label: &str) -> Option<i64> {
        self.entries.get(label).copied()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Choice list for the filter control: `ALL_LABEL` then every label
    pub fn choices(&self) -> Vec<&str> {
        std::iter::once(ALL_LABEL).chain(self.labels()).collect()
    }

    /// Resolve a chosen label; `ALL_LABEL` and unknown labels select everything
    pub fn selection(&self, label: &str) -> Selection {
        match self.id(label) {
            Some(id) if label != ALL_LABEL => Selection::Id(id),
            _ => Selection::All,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        let mut table = Self::default();
        for (label, id) in iter {
            table.insert(label, id);
        }
        table
    }
}

/// Every filter dimension's reference table
#[derive(Debug, Clone, Default)]
pub struct References {
    tables: HashMap<Dimension, ReferenceTable>,
}

impl References {
    /// Group `get_references` rows by dimension; unknown `ref_type`s are ignored
    pub fn from_rows(rows: impl IntoIterator<Item = ReferenceRow>) -> Self {
        let mut tables: HashMap<Dimension, ReferenceTable> = HashMap::new();
        for row in rows {
            match Dimension::from_ref_type(&row.ref_type) {
                Some(dimension) => tables
                    .entry(dimension)
                    .or_default()
                    .insert(row.ref_name, row.ref_id),
                None => tracing::debug!(ref_type = %row.ref_type, "ignoring unknown reference type"),
            }
        }
        Self { tables }
    }

    pub fn table(&self, dimension: Dimension) -> Option<&ReferenceTable> {
        self.tables.get(&dimension)
    }

    pub fn choices(&self, dimension: Dimension) -> Vec<&str> {
        match self.table(dimension) {
            Some(table) => table.choices(),
            None => vec![ALL_LABEL],
        }
    }

    pub fn selection(&self, dimension: Dimension, label: &str) -> Selection {
        self.table(dimension)
            .map(|table| table.selection(label))
            .unwrap_or(Selection::All)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(ReferenceTable::is_empty)
    }
}

/// Lookups used by the repair forms
#[derive(Debug, Clone, Default)]
pub struct FormReferences {
    technics: HashMap<String, TechnicsInfo>,
    measure_units: ReferenceTable,
    objects: HashMap<(String, String), i64>,
}

impl FormReferences {
    pub fn new(
        technics: impl IntoIterator<Item = TechnicsInfo>,
        measure_units: impl IntoIterator<Item = MeasureUnit>,
        objects: impl IntoIterator<Item = ObjectRow>,
    ) -> Self {
        Self {
            technics: technics
                .into_iter()
                .map(|t| (t.serial_number.clone(), t))
                .collect(),
            measure_units: measure_units.into_iter().map(|u| (u.label, u.id)).collect(),
            objects: objects
                .into_iter()
                .map(|o| ((o.region, o.store), o.id))
                .collect(),
        }
    }

    pub fn technics(&self, serial_number: &str) -> Option<&TechnicsInfo> {
        self.technics.get(serial_number)
    }

    /// Serial numbers starting with `prefix`, sorted
    pub fn serial_numbers_like(&self, prefix: &str) -> Vec<&str> {
        let mut found: Vec<&str> = self
            .technics
            .keys()
            .map(String::as_str)
            .filter(|sn| sn.starts_with(prefix))
            .collect();
        found.sort_unstable();
        found
    }

    pub fn measure_unit_id(&self, label: &str) -> Option<i64> {
        self.measure_units.id(label)
    }

    pub fn measure_units(&self) -> &ReferenceTable {
        &self.measure_units
    }

    pub fn object_id(&self, region: &str, store: &str) -> Option<i64> {
        self.objects
            .get(&(region.to_string(), store.to_string()))
            .copied()
    }

    /// Distinct regions, sorted
    pub fn regions(&self) -> Vec<&str> {
        let mut regions: Vec<&str> = self.objects.keys().map(|(r, _)| r.as_str()).collect();
        regions.sort_unstable();
        regions.dedup();
        regions
    }

    /// Stores of one region, sorted
    pub fn stores(&self, region: &str) -> Vec<&str> {
        let mut stores: Vec<&str> = self
            .objects
            .keys()
            .filter(|(r, _)| r == region)
            .map(|(_, s)| s.as_str())
            .collect();
        stores.sort_unstable();
        stores
    }
}
