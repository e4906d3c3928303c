use std::fmt;

use serde::Serialize;

use crate::processor::{AnalysisError, Value};

/// Result of an aggregation: ordered rows with named columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl DerivedTable {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        DerivedTable {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub(crate) fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, AnalysisError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AnalysisError::ColumnNotFound(name.to_string()))
    }

    /// Cell at (`row`, `column`), `None` if either is out of range
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column).ok()?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    pub fn column_values(&self, column: &str) -> Result<Vec<&Value>, AnalysisError> {
        let idx = self.column_index(column)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }
}

/// Numeric interval `(lo, hi]`, or `[lo, hi]` when `closed_left` is set
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
    pub closed_left: bool,
}

impl Interval {
    pub fn contains(&self, v: f64) -> bool {
        let above_lo = if self.closed_left { v >= self.lo } else { v > self.lo };
        above_lo && v <= self.hi
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.closed_left { '[' } else { '(' };
        write!(f, "{open}{}, {}]", format_edge(self.lo), format_edge(self.hi))
    }
}

fn format_edge(v: f64) -> String {
    let s = format!("{v:.3}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub interval: Interval,
    pub count: usize,
}

/// Equal-width histogram of one numeric column, ordered by lower bound
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub column: String,
    pub bins: Vec<Bin>,
}

impl Distribution {
    pub fn counts(&self) -> Vec<usize> {
        self.bins.iter().map(|b| b.count).collect()
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    /// Two-column view (`interval`, `count`) for charting
    pub fn to_table(&self) -> DerivedTable {
        let mut table = DerivedTable::new(["interval", "count"]);
        for bin in &self.bins {
            table.push_row(vec![
                Value::Str(bin.interval.to_string()),
                Value::Int(bin.count as i64),
            ]);
        }
        table
    }
}
