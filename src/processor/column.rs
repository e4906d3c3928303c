use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::processor::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnType {
    Int64,
    Float64,
    Str,
    Date,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Int64 | ColumnType::Float64)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::Str => "string",
            ColumnType::Date => "date",
        };
        f.write_str(name)
    }
}

/// Typed column storage; `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Str(Vec<Option<String>>),
    Date(Vec<Option<NaiveDate>>),
}

impl Column {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Int64(_) => ColumnType::Int64,
            Column::Float64(_) => ColumnType::Float64,
            Column::Str(_) => ColumnType::Str,
            Column::Date(_) => ColumnType::Date,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int64(values) => values.len(),
            Column::Float64(values) => values.len(),
            Column::Str(values) => values.len(),
            Column::Date(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owned value at `idx`; out-of-range indices read as missing.
    pub fn get(&self, idx: usize) -> Value {
        match self {
            Column::Int64(values) => values.get(idx).copied().flatten().into(),
            Column::Float64(values) => values.get(idx).copied().flatten().into(),
            Column::Str(values) => values.get(idx).cloned().flatten().into(),
            Column::Date(values) => values.get(idx).copied().flatten().into(),
        }
    }

    pub fn is_missing(&self, idx: usize) -> bool {
        match self {
            Column::Int64(values) => values.get(idx).is_none_or(Option::is_none),
            Column::Float64(values) => values.get(idx).is_none_or(Option::is_none),
            Column::Str(values) => values.get(idx).is_none_or(Option::is_none),
            Column::Date(values) => values.get(idx).is_none_or(Option::is_none),
        }
    }

    /// New column holding the given rows, in the given order.
    pub fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Int64(values) => Column::Int64(rows.iter().map(|&i| values[i]).collect()),
            Column::Float64(values) => Column::Float64(rows.iter().map(|&i| values[i]).collect()),
            Column::Str(values) => Column::Str(rows.iter().map(|&i| values[i].clone()).collect()),
            Column::Date(values) => Column::Date(rows.iter().map(|&i| values[i]).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_missing() {
        let col = Column::Int64(vec![Some(1), None, Some(3)]);
        assert_eq!(col.get(0), Value::Int(1));
        assert!(col.get(1).is_missing());
        assert!(col.is_missing(1));
        assert!(col.is_missing(7));
        assert_eq!(col.column_type(), ColumnType::Int64);
    }

    #[test]
    fn test_take_preserves_order() {
        let col = Column::Str(vec![Some("a".into()), Some("b".into()), Some("c".into())]);
        assert_eq!(
            col.take(&[2, 0]),
            Column::Str(vec![Some("c".into()), Some("a".into())])
        );
    }
}
