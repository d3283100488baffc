//! In-memory repair table: click-to-sort and rendering
//!
//! The row set is replaced wholesale on every refresh and only ever
//! reordered afterwards, never patched.

use std::cmp::Ordering;

use repairs_core::Value;

use crate::repair::{RepairColumn, RepairRecord, StatusTag};

/// Last sort applied to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortState {
    #[default]
    Unsorted,
    Ascending(RepairColumn),
    Descending(RepairColumn),
}

impl SortState {
    /// State after a click on `column`'s heading.
    ///
    /// Only a second click on an ascending column reverses it; any other
    /// click starts ascending.
    pub fn next(self, column: RepairColumn) -> Self {
        match self {
            Self::Ascending(current) if current == column => Self::Descending(column),
            _ => Self::Ascending(column),
        }
    }

    pub fn column(self) -> Option<RepairColumn> {
        match self {
            Self::Unsorted => None,
            Self::Ascending(c) | Self::Descending(c) => Some(c),
        }
    }

    fn is_descending(self) -> bool {
        matches!(self, Self::Descending(_))
    }
}

/// Part of the table a click landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickRegion {
    /// Heading of the displayed column at this index
    Heading(usize),
    Cell,
    Separator,
    Nothing,
}

/// One row ready for display: displayed columns only, formatted
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRow {
    pub id: i64,
    pub cells: Vec<String>,
    pub tag: Option<StatusTag>,
}

#[derive(Debug, Clone, Default)]
pub struct RepairTable {
    rows: Vec<RepairRecord>,
    sort: SortState,
}

impl RepairTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[RepairRecord] {
        &self.rows
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    /// Replace the row set; the sort state is kept but not reapplied
    pub fn replace_rows(&mut self, rows: Vec<RepairRecord>) {
        self.rows = rows;
    }

    /// Headings of the displayed columns
    pub fn headings() -> Vec<&'static str> {
        RepairColumn::displayed().map(RepairColumn::heading).collect()
    }

    /// Handle a click; returns whether the rows were re-sorted
    pub fn click(&mut self, region: ClickRegion) -> bool {
        let ClickRegion::Heading(display_index) = region else {
            return false;
        };
        match RepairColumn::from_display_index(display_index) {
            Some(column) => self.sort_by(column),
            None => false,
        }
    }

    /// Sort by `column` as if its heading was clicked.
    ///
    /// No-op on an empty row set or a hidden column.
    pub fn sort_by(&mut self, column: RepairColumn) -> bool {
        if self.rows.is_empty() || column.is_hidden() {
            return false;
        }

        let next = self.sort.next(column);
        let descending = next.is_descending();
        self.rows.sort_by(|a, b| {
            compare_nulls_last(&a.value(column), &b.value(column), descending)
        });
        self.sort = next;

        tracing::debug!(column = column.as_ref(), descending, "sorted repair table");
        true
    }

    /// Full redraw of the current row order
    pub fn render(&self) -> Vec<RenderedRow> {
        self.rows.iter().map(render_row).collect()
    }
}

/// Present values first in the requested direction, NULLs always last
fn compare_nulls_last(a: &Value, b: &Value, descending: bool) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = a.total_cmp(b);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
    }
}

fn render_row(record: &RepairRecord) -> RenderedRow {
    RenderedRow {
        id: record.id,
        cells: RepairColumn::displayed()
            .map(|column| format_cell(&record.value(column), column))
            .collect(),
        tag: record.status_tag(),
    }
}

fn format_cell(value: &Value, column: RepairColumn) -> String {
    match value {
        Value::Null => String::new(),
        Value::Float32(_) | Value::Float64(_) | Value::Decimal(_) => {
            match (column, value.as_f64()) {
                (RepairColumn::Hours | RepairColumn::UnitCount, Some(v)) => format_decimal(v),
                _ => value.to_string(),
            }
        }
        Value::Date(d) => d.format("%d.%m.%Y").to_string(),
        Value::DateTime(dt) => dt.format("%d.%m.%Y %H:%M").to_string(),
        other => other.to_string(),
    }
}

/// Two decimals, space thousands separator, comma decimal mark: `1 234,50`
pub fn format_decimal(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    format!("{}{},{}", if negative { "-" } else { "" }, grouped, frac_part)
}
