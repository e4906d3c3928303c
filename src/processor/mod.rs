use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use thiserror::Error;

pub mod analyzer;
pub mod column;
pub mod derived;
pub mod table;

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SVG error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid value in column '{column}': {reason}")]
    InvalidValue { column: String, reason: String },

    #[error("Cannot parse '{value}' in column '{column}': {reason}")]
    Parse {
        column: String,
        value: String,
        reason: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Schema error: {0}")]
    Schema(String),
}

/// A single cell of a table or derived table
#[derive(Debug, Clone)]
pub enum Value {
    /// Integer cell
    Int(i64),
    /// Float cell
    Float(f64),
    /// String cell
    Str(String),
    /// Calendar date cell
    Date(NaiveDate),
    /// Absent value
    Missing,
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the value, `None` for non-numeric and missing cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Missing => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Str(_) => 3,
            Value::Date(_) => 4,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Group keys come from a single typed column, so cross-variant ordering only
// has to be consistent, not meaningful.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Int(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Str(v) => v.hash(state),
            Value::Date(v) => v.hash(state),
            Value::Missing => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::Missing => f.write_str("null"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::Float(_) | Value::Missing => serializer.serialize_none(),
            Value::Str(v) => serializer.serialize_str(v),
            Value::Date(v) => serializer.collect_str(&v.format("%Y-%m-%d")),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Missing, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_ordering_within_variant() {
        assert!(Value::Int(2) < Value::Int(10));
        assert!(Value::Str("A".into()) < Value::Str("B".into()));
        assert!(Value::Float(-1.5) < Value::Float(0.0));
        let jan = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let feb = NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
        assert!(Value::Date(jan) < Value::Date(feb));
    }

    #[test]
    fn test_value_serializes_missing_as_null() {
        let json = serde_json::to_string(&vec![
            Value::Int(3),
            Value::Missing,
            Value::Float(f64::NAN),
            Value::from("x"),
        ])
        .unwrap();
        assert_eq!(json, r#"[3,null,null,"x"]"#);
    }
}
