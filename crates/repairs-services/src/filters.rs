//! Filter set of the repair list and its mapping onto procedure parameters

use std::collections::BTreeMap;

use repairs_core::Value;
use strum::IntoEnumIterator;

use crate::references::{Dimension, References};

/// Choice in one filter dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Match every row; sent as NULL
    #[default]
    All,
    Id(i64),
}

impl Selection {
    pub fn to_value(self) -> Value {
        match self {
            Self::All => Value::Null,
            Self::Id(id) => Value::Int64(id),
        }
    }
}

/// Current selection of every filter dimension
///
/// Filtering happens on the server: the set only decides which
/// parameters `get_repair_list` receives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    selections: BTreeMap<Dimension, Selection>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dimension: Dimension) -> Selection {
        self.selections.get(&dimension).copied().unwrap_or_default()
    }

    pub fn set(&mut self, dimension: Dimension, selection: Selection) {
        match selection {
            Selection::All => self.selections.remove(&dimension),
            Selection::Id(_) => self.selections.insert(dimension, selection),
        };
    }

    /// Select a dimension by its display label
    pub fn set_label(&mut self, references: &References, dimension: Dimension, label: &str) {
        self.set(dimension, references.selection(dimension, label));
    }

    /// Reset every dimension to `Selection::All`
    pub fn clear(&mut self) {
        self.selections.clear();
    }

    pub fn is_all(&self) -> bool {
        self.selections.is_empty()
    }

    /// `(parameter name, value)` pairs in procedure order
    pub fn params(&self) -> Vec<(&'static str, Value)> {
        Dimension::iter()
            .map(|d| (d.param_name(), self.get(d).to_value()))
            .collect()
    }
}
