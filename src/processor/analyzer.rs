use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::Datelike;
use tracing::debug;

use crate::{
    helpers::{
        simd_helpers::{min_max_f64, sum_f64},
        stats,
    },
    processor::{
        AnalysisError, Value,
        column::Column,
        derived::{Bin, DerivedTable, Distribution, Interval},
        table::Table,
    },
};

/// Read-only analysis over one loaded [`Table`]
///
/// Every query is a pure function of the table and its arguments and returns a
/// fresh derived value; the table is never touched.
///
/// # Examples
///
/// ```rust
/// # use spend_analyzer::{AggregationEngine, Column, Table};
/// let table = Table::from_columns(vec![
///     ("category", Column::Str(vec![Some("A".into()), Some("B".into()), Some("A".into())])),
///     ("amount", Column::Int64(vec![Some(10), Some(20), Some(30)])),
/// ])
/// .unwrap();
/// let engine = AggregationEngine::new(&table);
/// let top = engine.top_spending_categories("category", "amount", 1).unwrap();
/// assert_eq!(top.row_count(), 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AggregationEngine<'a> {
    table: &'a Table,
}

/// Running sum that keeps integer columns integral
#[derive(Debug, Clone, Copy, PartialEq)]
enum Sum {
    Int(i128),
    Float(f64),
}

/// Value column already checked to be numeric and finite
#[derive(Debug, Clone, Copy)]
enum Numeric<'a> {
    Int(&'a [Option<i64>]),
    Float(&'a [Option<f64>]),
}

impl Numeric<'_> {
    fn sum_rows(self, rows: &[usize]) -> Sum {
        match self {
            Numeric::Int(values) => {
                Sum::Int(rows.iter().map(|&r| values[r].unwrap_or(0) as i128).sum())
            }
            Numeric::Float(values) => {
                Sum::Float(rows.iter().map(|&r| values[r].unwrap_or(0.0)).sum())
            }
        }
    }

    fn to_f64(self) -> Vec<Option<f64>> {
        match self {
            Numeric::Int(values) => values.iter().map(|v| v.map(|v| v as f64)).collect(),
            Numeric::Float(values) => values.to_vec(),
        }
    }
}

impl Sum {
    fn as_f64(self) -> f64 {
        match self {
            Sum::Int(v) => v as f64,
            Sum::Float(v) => v,
        }
    }

    fn cmp(&self, other: &Sum) -> Ordering {
        match (self, other) {
            (Sum::Int(a), Sum::Int(b)) => a.cmp(b),
            _ => self.as_f64().total_cmp(&other.as_f64()),
        }
    }

    fn into_value(self, column: &str) -> Result<Value, AnalysisError> {
        match self {
            Sum::Int(v) => i64::try_from(v)
                .map(Value::Int)
                .map_err(|_| AnalysisError::InvalidValue {
                    column: column.to_string(),
                    reason: "sum overflows a 64-bit integer".into(),
                }),
            Sum::Float(v) => Ok(Value::Float(v)),
        }
    }
}

impl<'a> AggregationEngine<'a> {
    pub fn new(table: &'a Table) -> Self {
        AggregationEngine { table }
    }

    /// Mean, median and sample standard deviation of `value_column` per
    /// distinct value of `category_column`
    ///
    /// Rows come out in ascending key order. A group with a single value has a
    /// missing `std_dev`.
    ///
    /// # Errors
    /// - [`AnalysisError::ColumnNotFound`] if either column is absent
    /// - [`AnalysisError::InvalidValue`] if `value_column` is not numeric
    pub fn summary_statistics(
        &self,
        category_column: &str,
        value_column: &str,
    ) -> Result<DerivedTable, AnalysisError> {
        let values = self.numeric_values(value_column)?;
        let groups = self.groups(category_column)?;

        let mut out = DerivedTable::new([category_column, "mean", "median", "std_dev"]);
        for (key, rows) in groups {
            let sample: Vec<f64> = rows.iter().filter_map(|&r| values[r]).collect();
            out.push_row(vec![
                key,
                stats::mean(&sample).into(),
                stats::median(&sample).into(),
                stats::sample_std(&sample).into(),
            ]);
        }

        debug!(
            category = category_column,
            value = value_column,
            groups = out.row_count(),
            "summary statistics"
        );
        Ok(out)
    }

    /// Sums `value_column` per calendar month of `date_column`
    ///
    /// Months render as `YYYY-MM` and come out in ascending order; months
    /// without records are not emitted.
    ///
    /// # Errors
    /// - [`AnalysisError::Parse`] if a date cannot be interpreted
    /// - [`AnalysisError::InvalidValue`] if `value_column` is not numeric
    pub fn time_series_analysis(
        &self,
        date_column: &str,
        value_column: &str,
    ) -> Result<DerivedTable, AnalysisError> {
        let value_col = self.numeric_column(value_column)?;
        let dates = self.table.dates(date_column)?;

        let mut months: BTreeMap<(i32, u32), Vec<usize>> = BTreeMap::new();
        for (row, date) in dates.iter().enumerate() {
            let Some(date) = date else { continue };
            months.entry((date.year(), date.month())).or_default().push(row);
        }

        let mut out = DerivedTable::new([date_column, value_column]);
        for ((year, month), rows) in months {
            out.push_row(vec![
                Value::Str(format!("{year:04}-{month:02}")),
                value_col.sum_rows(&rows).into_value(value_column)?,
            ]);
        }

        debug!(date = date_column, months = out.row_count(), "time series");
        Ok(out)
    }

    /// Counts values of `value_column` in `bins` equal-width intervals over
    /// `[min, max]`
    ///
    /// Intervals are right-closed; the first one is closed on both ends so the
    /// minimum is counted. Empty intervals are kept with a zero count.
    ///
    /// # Errors
    /// - [`AnalysisError::InvalidArgument`] if `bins` is zero or the column
    ///   has fewer than two distinct values
    pub fn spending_distribution(
        &self,
        value_column: &str,
        bins: usize,
    ) -> Result<Distribution, AnalysisError> {
        if bins < 1 {
            return Err(AnalysisError::InvalidArgument(
                "bin count must be at least 1".into(),
            ));
        }

        let values: Vec<f64> = self
            .numeric_values(value_column)?
            .into_iter()
            .flatten()
            .collect();
        let (min, max) = match min_max_f64(&values) {
            Some((min, max)) if min < max => (min, max),
            _ => {
                return Err(AnalysisError::InvalidArgument(format!(
                    "column '{value_column}' needs at least two distinct values to bin"
                )));
            }
        };

        let width = (max - min) / bins as f64;
        let edges: Vec<f64> = (0..=bins)
            .map(|i| if i == bins { max } else { min + width * i as f64 })
            .collect();

        let mut counts = vec![0usize; bins];
        for &v in &values {
            // First upper edge at or above `v`; `min` lands in bin 0
            let idx = edges[1..].partition_point(|&edge| edge < v);
            counts[idx.min(bins - 1)] += 1;
        }

        let bins = edges
            .windows(2)
            .zip(counts)
            .enumerate()
            .map(|(i, (edge, count))| Bin {
                interval: Interval {
                    lo: edge[0],
                    hi: edge[1],
                    closed_left: i == 0,
                },
                count,
            })
            .collect();

        let distribution = Distribution {
            column: value_column.to_string(),
            bins,
        };
        debug!(
            value = value_column,
            bins = distribution.bins.len(),
            total = distribution.total(),
            "spending distribution"
        );
        Ok(distribution)
    }

    /// The `top_n` groups of `category_column` with the largest sum of
    /// `value_column`, largest first
    ///
    /// Equal sums keep ascending key order. Asking for more groups than exist
    /// returns all of them.
    pub fn top_spending_categories(
        &self,
        category_column: &str,
        value_column: &str,
        top_n: usize,
    ) -> Result<DerivedTable, AnalysisError> {
        let mut sums = self.group_sums(category_column, value_column)?;
        // stable: ties stay in key order
        sums.sort_by(|(_, a), (_, b)| b.cmp(a));
        sums.truncate(top_n);

        let mut out = DerivedTable::new([category_column, value_column]);
        for (key, sum) in sums {
            out.push_row(vec![key, sum.into_value(value_column)?]);
        }

        debug!(
            category = category_column,
            top_n,
            returned = out.row_count(),
            "top spending categories"
        );
        Ok(out)
    }

    /// Assigns every customer a `Segment k` label from the quantiles of the
    /// per-customer sums
    ///
    /// The `bins + 1` edges are `quantile(sums, k / bins)`. A customer goes to
    /// the lowest segment whose upper edge is at or above its sum, so a sum
    /// sitting exactly on an edge belongs to the lower segment and the global
    /// minimum belongs to `Segment 1`. Rows come out in ascending customer
    /// order.
    ///
    /// # Errors
    /// - [`AnalysisError::InvalidArgument`] if `bins` is zero, exceeds the
    ///   number of distinct customers, or repeated sums collapse the edges so
    ///   that some segment gets no customer
    pub fn customer_segmentation(
        &self,
        customer_column: &str,
        value_column: &str,
        bins: usize,
    ) -> Result<DerivedTable, AnalysisError> {
        if bins < 1 {
            return Err(AnalysisError::InvalidArgument(
                "segment count must be at least 1".into(),
            ));
        }

        let sums = self.group_sums(customer_column, value_column)?;
        if bins > sums.len() {
            return Err(AnalysisError::InvalidArgument(format!(
                "{} segments requested but only {} distinct customers",
                bins,
                sums.len()
            )));
        }

        let mut sorted: Vec<f64> = sums.iter().map(|(_, s)| s.as_f64()).collect();
        sorted.sort_by(f64::total_cmp);
        let edges: Vec<f64> = (0..=bins)
            .filter_map(|k| stats::percentile(&sorted, k as f64 / bins as f64))
            .collect();

        let assigned: Vec<usize> = sums
            .iter()
            .map(|(_, sum)| {
                let v = sum.as_f64();
                edges[1..]
                    .iter()
                    .position(|&upper| v <= upper)
                    .unwrap_or(bins - 1)
            })
            .collect();

        let mut sizes = vec![0usize; bins];
        for &segment in &assigned {
            sizes[segment] += 1;
        }
        if let Some(empty) = sizes.iter().position(|&n| n == 0) {
            return Err(AnalysisError::InvalidArgument(format!(
                "quantile edges of '{value_column}' collapse: Segment {} would be empty",
                empty + 1
            )));
        }

        let mut out = DerivedTable::new([customer_column, value_column, "segment"]);
        for ((key, sum), segment) in sums.into_iter().zip(assigned) {
            out.push_row(vec![
                key,
                sum.into_value(value_column)?,
                Value::Str(format!("Segment {}", segment + 1)),
            ]);
        }

        debug!(
            customer = customer_column,
            segments = bins,
            customers = out.row_count(),
            "customer segmentation"
        );
        Ok(out)
    }

    /// Pearson correlation between each pair of `columns`
    ///
    /// An empty list means every numeric column of the table. Rows missing
    /// either value of a pair are skipped for that pair; undefined
    /// correlations are missing.
    pub fn correlation_matrix(&self, columns: &[&str]) -> Result<DerivedTable, AnalysisError> {
        let names: Vec<&str> = if columns.is_empty() {
            self.table
                .schema()
                .fields()
                .iter()
                .filter(|f| f.column_type.is_numeric())
                .map(|f| f.name.as_str())
                .collect()
        } else {
            columns.to_vec()
        };

        if names.len() < 2 {
            return Err(AnalysisError::InvalidArgument(
                "correlation needs at least two numeric columns".into(),
            ));
        }

        let series = names
            .iter()
            .map(|name| self.numeric_values(name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = DerivedTable::new(std::iter::once("column").chain(names.iter().copied()));
        for (i, xs) in series.iter().enumerate() {
            let mut row = vec![Value::from(names[i])];
            for ys in &series {
                let (a, b): (Vec<f64>, Vec<f64>) = xs
                    .iter()
                    .zip(ys)
                    .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                    .unzip();
                row.push(stats::pearson(&a, &b).into());
            }
            out.push_row(row);
        }

        debug!(columns = names.len(), "correlation matrix");
        Ok(out)
    }

    /// Row indices per distinct non-missing key, keys ascending, rows in table order
    fn groups(&self, column: &str) -> Result<BTreeMap<Value, Vec<usize>>, AnalysisError> {
        let col = self.table.column(column)?;
        let mut groups: BTreeMap<Value, Vec<usize>> = BTreeMap::new();
        for row in 0..self.table.row_count() {
            let key = col.get(row);
            if key.is_missing() {
                continue;
            }
            groups.entry(key).or_default().push(row);
        }
        Ok(groups)
    }

    /// Per-group sums of `value_column`, keys ascending
    fn group_sums(
        &self,
        group_column: &str,
        value_column: &str,
    ) -> Result<Vec<(Value, Sum)>, AnalysisError> {
        let value_col = self.numeric_column(value_column)?;
        let groups = self.groups(group_column)?;

        Ok(groups
            .into_iter()
            .map(|(key, rows)| {
                let sum = value_col.sum_rows(&rows);
                (key, sum)
            })
            .collect())
    }

    fn numeric_column(&self, name: &str) -> Result<Numeric<'a>, AnalysisError> {
        match self.table.column(name)? {
            Column::Int64(values) => Ok(Numeric::Int(values)),
            Column::Float64(values) => match values.iter().flatten().find(|v| !v.is_finite()) {
                Some(bad) => Err(AnalysisError::InvalidValue {
                    column: name.to_string(),
                    reason: format!("non-finite value {bad}"),
                }),
                None => Ok(Numeric::Float(values)),
            },
            other => Err(AnalysisError::InvalidValue {
                column: name.to_string(),
                reason: format!("expected a numeric column, found {}", other.column_type()),
            }),
        }
    }

    fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>, AnalysisError> {
        Ok(self.numeric_column(name)?.to_f64())
    }
}

/// Total of a numeric column, skipping missing values
pub fn column_total(table: &Table, column: &str) -> Result<f64, AnalysisError> {
    let values: Vec<f64> = AggregationEngine::new(table)
        .numeric_values(column)?
        .into_iter()
        .flatten()
        .collect();
    Ok(sum_f64(&values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn strs(values: &[&str]) -> Column {
        Column::Str(values.iter().map(|s| Some(s.to_string())).collect())
    }

    fn ints(values: &[i64]) -> Column {
        Column::Int64(values.iter().copied().map(Some).collect())
    }

    fn sample_table() -> Table {
        Table::from_columns(vec![
            ("Category", strs(&["A", "B", "A", "B", "C"])),
            ("Value", ints(&[10, 20, 30, 40, 50])),
            (
                "Date",
                strs(&[
                    "2023-01-01",
                    "2023-01-02",
                    "2023-02-01",
                    "2023-02-02",
                    "2023-03-01",
                ]),
            ),
            ("Customer", strs(&["X", "Y", "X", "Z", "Y"])),
        ])
        .unwrap()
    }

    fn close(v: &Value, expected: f64) -> bool {
        v.as_f64().is_some_and(|x| (x - expected).abs() < 1e-9)
    }

    #[test]
    fn test_summary_statistics() {
        let table = sample_table();
        let result = AggregationEngine::new(&table)
            .summary_statistics("Category", "Value")
            .unwrap();

        assert_eq!(result.columns(), ["Category", "mean", "median", "std_dev"]);
        let keys: Vec<String> = result
            .column_values("Category")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(keys, ["A", "B", "C"]);

        let std = 200f64.sqrt();
        assert!(close(result.value(0, "mean").unwrap(), 20.0));
        assert!(close(result.value(0, "median").unwrap(), 20.0));
        assert!(close(result.value(0, "std_dev").unwrap(), std));
        assert!(close(result.value(1, "mean").unwrap(), 30.0));
        assert!(close(result.value(1, "std_dev").unwrap(), std));
        assert!(close(result.value(2, "median").unwrap(), 50.0));
        assert!(result.value(2, "std_dev").unwrap().is_missing());
    }

    #[test]
    fn test_summary_statistics_errors() {
        let table = sample_table();
        let engine = AggregationEngine::new(&table);
        assert!(matches!(
            engine.summary_statistics("Nope", "Value"),
            Err(AnalysisError::ColumnNotFound(c)) if c == "Nope"
        ));
        assert!(matches!(
            engine.summary_statistics("Category", "Customer"),
            Err(AnalysisError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_time_series_analysis() {
        let table = sample_table();
        let result = AggregationEngine::new(&table)
            .time_series_analysis("Date", "Value")
            .unwrap();

        assert_eq!(result.columns(), ["Date", "Value"]);
        let expected = [("2023-01", 30), ("2023-02", 70), ("2023-03", 50)];
        for (i, (month, sum)) in expected.into_iter().enumerate() {
            assert_eq!(result.rows()[i], vec![Value::from(month), Value::Int(sum)]);
        }
    }

    #[test]
    fn test_time_series_skips_empty_months_and_sorts() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let may = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let dec = NaiveDate::from_ymd_opt(2023, 12, 9).unwrap();
        let table = Table::from_columns(vec![
            ("d", Column::Date(vec![Some(may), Some(jan), Some(dec)])),
            ("v", Column::Float64(vec![Some(1.5), Some(2.0), Some(4.0)])),
        ])
        .unwrap();

        let result = AggregationEngine::new(&table)
            .time_series_analysis("d", "v")
            .unwrap();
        let months: Vec<String> = result
            .column_values("d")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(months, ["2023-12", "2024-01", "2024-05"]);
    }

    #[test]
    fn test_time_series_unparseable_date() {
        let table = Table::from_columns(vec![
            ("d", strs(&["2023-01-01", "not a date"])),
            ("v", ints(&[1, 2])),
        ])
        .unwrap();
        let err = AggregationEngine::new(&table)
            .time_series_analysis("d", "v")
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { value, .. } if value == "not a date"));

        let numeric_dates =
            Table::from_columns(vec![("d", ints(&[20230101])), ("v", ints(&[1]))]).unwrap();
        assert!(matches!(
            AggregationEngine::new(&numeric_dates).time_series_analysis("d", "v"),
            Err(AnalysisError::Parse { .. })
        ));
    }

    #[test]
    fn test_spending_distribution() {
        let table = sample_table();
        let dist = AggregationEngine::new(&table)
            .spending_distribution("Value", 3)
            .unwrap();

        let labels: Vec<String> = dist.bins.iter().map(|b| b.interval.to_string()).collect();
        assert_eq!(labels, ["[10, 23.333]", "(23.333, 36.667]", "(36.667, 50]"]);
        assert_eq!(dist.counts(), vec![2, 1, 2]);
        assert_eq!(dist.total(), table.row_count());
    }

    #[test]
    fn test_spending_distribution_keeps_empty_bins() {
        let table = Table::from_columns(vec![("v", ints(&[0, 1, 100]))]).unwrap();
        let dist = AggregationEngine::new(&table)
            .spending_distribution("v", 4)
            .unwrap();
        assert_eq!(dist.counts(), vec![2, 0, 0, 1]);
        assert_eq!(dist.bins.last().unwrap().interval.hi, 100.0);
    }

    #[test]
    fn test_spending_distribution_invalid_arguments() {
        let table = sample_table();
        let engine = AggregationEngine::new(&table);
        assert!(matches!(
            engine.spending_distribution("Value", 0),
            Err(AnalysisError::InvalidArgument(_))
        ));

        let flat = Table::from_columns(vec![("v", ints(&[7, 7, 7]))]).unwrap();
        assert!(matches!(
            AggregationEngine::new(&flat).spending_distribution("v", 3),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_top_spending_categories() {
        let table = sample_table();
        let result = AggregationEngine::new(&table)
            .top_spending_categories("Category", "Value", 2)
            .unwrap();
        assert_eq!(
            result.rows(),
            [
                vec![Value::from("B"), Value::Int(60)],
                vec![Value::from("C"), Value::Int(50)],
            ]
        );
    }

    #[test]
    fn test_top_spending_categories_ties_and_overflowing_n() {
        let table = Table::from_columns(vec![
            ("c", strs(&["d", "b", "a", "c"])),
            ("v", ints(&[5, 9, 5, 1])),
        ])
        .unwrap();
        let result = AggregationEngine::new(&table)
            .top_spending_categories("c", "v", 10)
            .unwrap();
        let keys: Vec<String> = result
            .column_values("c")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(keys, ["b", "a", "d", "c"]);
    }

    #[test]
    fn test_customer_segmentation() {
        let table = sample_table();
        let result = AggregationEngine::new(&table)
            .customer_segmentation("Customer", "Value", 2)
            .unwrap();
        assert_eq!(result.columns(), ["Customer", "Value", "segment"]);
        assert_eq!(
            result.rows(),
            [
                vec![Value::from("X"), Value::Int(40), Value::from("Segment 1")],
                vec![Value::from("Y"), Value::Int(70), Value::from("Segment 2")],
                vec![Value::from("Z"), Value::Int(40), Value::from("Segment 1")],
            ]
        );
    }

    #[test]
    fn test_customer_segmentation_quartiles() {
        let customers: Vec<String> = (1..=8).map(|i| format!("c{i}")).collect();
        let names: Vec<&str> = customers.iter().map(String::as_str).collect();
        let table = Table::from_columns(vec![
            ("customer", strs(&names)),
            ("v", ints(&[10, 20, 30, 40, 50, 60, 70, 80])),
        ])
        .unwrap();
        let result = AggregationEngine::new(&table)
            .customer_segmentation("customer", "v", 4)
            .unwrap();
        let segments: Vec<String> = result
            .column_values("segment")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect();
        assert_eq!(
            segments,
            [
                "Segment 1", "Segment 1", "Segment 2", "Segment 2", "Segment 3", "Segment 3",
                "Segment 4", "Segment 4"
            ]
        );
    }

    #[test]
    fn test_customer_segmentation_too_many_bins() {
        let table = sample_table();
        let engine = AggregationEngine::new(&table);
        assert!(matches!(
            engine.customer_segmentation("Customer", "Value", 4),
            Err(AnalysisError::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.customer_segmentation("Customer", "Value", 0),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }

    fn segment_labels(table: &Table, bins: usize) -> Result<Vec<String>, AnalysisError> {
        let result = AggregationEngine::new(table).customer_segmentation("customer", "v", bins)?;
        Ok(result
            .column_values("segment")
            .unwrap()
            .iter()
            .map(|v| v.to_string())
            .collect())
    }

    fn customers_with(sums: &[i64]) -> Table {
        let customers: Vec<String> = (0..sums.len()).map(|i| format!("c{i}")).collect();
        let names: Vec<&str> = customers.iter().map(String::as_str).collect();
        Table::from_columns(vec![("customer", strs(&names)), ("v", ints(sums))]).unwrap()
    }

    #[test]
    fn test_customer_segmentation_sum_on_edge_goes_lower() {
        // median edge is exactly 30
        let table = customers_with(&[10, 20, 30, 40, 50]);
        assert_eq!(
            segment_labels(&table, 2).unwrap(),
            ["Segment 1", "Segment 1", "Segment 1", "Segment 2", "Segment 2"]
        );
    }

    #[test]
    fn test_customer_segmentation_repeated_minimum() {
        // edges 10, 10, 20: every segment still gets a customer
        let table = customers_with(&[10, 10, 10, 20]);
        assert_eq!(
            segment_labels(&table, 2).unwrap(),
            ["Segment 1", "Segment 1", "Segment 1", "Segment 2"]
        );
    }

    #[test]
    fn test_customer_segmentation_collapsed_edges() {
        let equal = customers_with(&[40, 40, 40]);
        assert!(matches!(
            segment_labels(&equal, 3),
            Err(AnalysisError::InvalidArgument(msg)) if msg.contains("Segment 2")
        ));

        // edges 1, 1, 1.667, 3 leave nothing between 1 and 1.667
        let skewed = customers_with(&[1, 1, 1, 2, 3]);
        assert!(matches!(
            segment_labels(&skewed, 3),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_correlation_matrix() {
        let table = Table::from_columns(vec![
            ("x", ints(&[1, 2, 3, 4])),
            ("y", Column::Float64(vec![Some(2.0), Some(4.0), Some(6.0), Some(8.0)])),
            ("z", ints(&[4, 3, 2, 1])),
            ("label", strs(&["a", "b", "c", "d"])),
        ])
        .unwrap();
        let result = AggregationEngine::new(&table).correlation_matrix(&[]).unwrap();
        assert_eq!(result.columns(), ["column", "x", "y", "z"]);
        assert!(close(result.value(0, "y").unwrap(), 1.0));
        assert!(close(result.value(2, "x").unwrap(), -1.0));

        assert!(matches!(
            AggregationEngine::new(&table).correlation_matrix(&["x", "label"]),
            Err(AnalysisError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_column_total() {
        let table = sample_table();
        assert_eq!(column_total(&table, "Value").unwrap(), 150.0);
    }
}
