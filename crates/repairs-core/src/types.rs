//! Core value and row types

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::cmp::Ordering;

/// A database value that can represent any SQL type the server returns
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean (SQL `bit`)
    Bool(bool),
    /// 16-bit signed integer
    Int16(i16),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 32-bit floating point
    Float32(f32),
    /// 64-bit floating point
    Float64(f64),
    /// Decimal/Numeric (stored as string for precision)
    Decimal(String),
    /// UTF-8 string
    String(String),
    /// Date (year, month, day)
    Date(NaiveDate),
    /// Time (hour, minute, second, nanosecond)
    Time(NaiveTime),
    /// DateTime without timezone
    DateTime(NaiveDateTime),
    /// DateTime with timezone (UTC)
    DateTimeUtc(DateTime<Utc>),
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(v) => Some(i64::from(*v)),
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            Value::Decimal(s) | Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int16(v) => Some(f64::from(*v)),
            Value::Int32(v) => Some(f64::from(*v)),
            Value::Int64(v) => Some(*v as f64),
            Value::Float32(v) => Some(f64::from(*v)),
            Value::Float64(v) => Some(*v),
            Value::Decimal(s) | Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int16(_) | Value::Int32(_) | Value::Int64(_) => self.as_i64().map(|v| v != 0),
            _ => None,
        }
    }

    /// Try to get as a calendar date, truncating timestamps
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            Value::DateTime(dt) => Some(dt.date()),
            Value::DateTimeUtc(dt) => Some(dt.date_naive()),
            _ => None,
        }
    }

    /// Take the value as an owned string, `None` for NULL
    pub fn into_string(self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::String(s) | Value::Decimal(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    fn is_integer(&self) -> bool {
        matches!(self, Value::Int16(_) | Value::Int32(_) | Value::Int64(_))
    }

    fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, Value::Float32(_) | Value::Float64(_) | Value::Decimal(_))
    }

    fn as_naive_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            Value::DateTime(dt) => Some(*dt),
            Value::DateTimeUtc(dt) => Some(dt.naive_utc()),
            _ => None,
        }
    }

    /// Total order between two values of one column.
    ///
    /// NULL orders after every present value. Integers compare exactly,
    /// mixed numerics compare as `f64`, dates and timestamps compare on
    /// the timeline, and values of unrelated kinds fall back to their
    /// display text.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Time(a), Value::Time(b)) => a.cmp(b),
            (a, b) if a.is_integer() && b.is_integer() => a.as_i64().cmp(&b.as_i64()),
            (a, b) if a.is_numeric() && b.is_numeric() => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.to_string().cmp(&b.to_string()),
            },
            (a, b) => match (a.as_naive_datetime(), b.as_naive_datetime()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => a.to_string().cmp(&b.to_string()),
            },
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
            Value::Time(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v),
            Value::DateTimeUtc(v) => write!(f, "{}", v),
        }
    }
}

impl From<Option<i64>> for Value {
    fn from(v: Option<i64>) -> Self {
        v.map_or(Value::Null, Value::Int64)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Value::Null, Value::Float64)
    }
}

impl From<Option<String>> for Value {
    fn from(v: Option<String>) -> Self {
        v.map_or(Value::Null, Value::String)
    }
}

impl From<Option<NaiveDate>> for Value {
    fn from(v: Option<NaiveDate>) -> Self {
        v.map_or(Value::Null, Value::Date)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// A row from a query result, decoded positionally
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Column values in select-list order
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Value at `index`, NULL when the row is shorter
    pub fn value(&self, index: usize) -> Value {
        self.values.get(index).cloned().unwrap_or(Value::Null)
    }
}

/// Rows of the first result set a statement produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Create a new empty query result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a result from raw value rows
    pub fn from_values(rows: Vec<Vec<Value>>) -> Self {
        Self {
            rows: rows.into_iter().map(Row::new).collect(),
        }
    }

    /// First row, consuming the result
    pub fn into_first_row(self) -> Option<Row> {
        self.rows.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_null_orders_last() {
        assert_eq!(Value::Null.total_cmp(&Value::Int32(1)), Ordering::Greater);
        assert_eq!(Value::Int32(1).total_cmp(&Value::Null), Ordering::Less);
        assert_eq!(Value::Null.total_cmp(&Value::Null), Ordering::Equal);
    }

    #[test]
    fn test_integers_compare_across_widths() {
        assert_eq!(Value::Int16(5).total_cmp(&Value::Int64(40)), Ordering::Less);
        assert_eq!(
            Value::Int64(i64::MAX).total_cmp(&Value::Int64(i64::MAX - 1)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_decimals_compare_numerically() {
        let a = Value::Decimal("9.50".into());
        let b = Value::Decimal("10.00".into());
        assert_eq!(a.total_cmp(&b), Ordering::Less);
        assert_eq!(Value::Int32(10).total_cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_dates_compare_with_timestamps() {
        let day = Value::Date(date(2019, 11, 20));
        let later = Value::DateTime(date(2019, 11, 20).and_hms_opt(8, 0, 0).unwrap());
        assert_eq!(day.total_cmp(&later), Ordering::Less);
    }

    #[test]
    fn test_mixed_kinds_fall_back_to_text() {
        let a = Value::String("abc".into());
        let b = Value::Int32(1);
        assert_eq!(a.total_cmp(&b), "abc".cmp("1"));
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(Value::Decimal(" 12 ".into()).as_i64(), Some(12));
        assert_eq!(Value::Bool(true).as_i64(), Some(1));
        assert_eq!(Value::Int32(0).as_bool(), Some(false));
        assert_eq!(Value::Float32(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::String("x".into()).as_f64(), None);
    }

    #[test]
    fn test_into_string() {
        assert_eq!(Value::Null.into_string(), None);
        assert_eq!(Value::Int32(7).into_string(), Some("7".into()));
        assert_eq!(Value::Decimal("1.25".into()).into_string(), Some("1.25".into()));
    }

    #[test]
    fn test_row_access() {
        let result = QueryResult::from_values(vec![
            vec![Value::Int32(1), Value::String("Alice".into())],
            vec![Value::Int32(2), Value::Null],
        ]);
        assert_eq!(result.rows.len(), 2);
        let row = result.into_first_row().unwrap();
        assert_eq!(row.value(1), Value::String("Alice".into()));
        assert_eq!(row.value(5), Value::Null);
        assert_eq!(QueryResult::empty().into_first_row(), None);
    }
}
