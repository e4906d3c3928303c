//! # spend-analyzer
//!
//! `spend-analyzer` turns a CSV file of spending records into grouped
//! statistics and charts. It supports:
//!
//! - Memory-mapped CSV loading with per-column type inference (int, float, date, string)
//! - An immutable typed table; filters return new tables
//! - Summary statistics (mean, median, sample std dev) per category
//! - Monthly time series sums
//! - Equal-width spending distributions
//! - Top-N categories by total spend
//! - Quantile-based customer segmentation
//! - Correlation matrices
//! - SVG bar, line, pie and heatmap charts and a JSON report
//!
//! # Example
//!
//! ```rust,no_run
//! use spend_analyzer::{AggregationEngine, LoadOptions, Table};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = Table::load_csv(Path::new("transactions.csv"), &LoadOptions::default())?;
//!     let engine = AggregationEngine::new(&table);
//!
//!     // Per-category statistics
//!     let summary = engine.summary_statistics("category", "amount")?;
//!     println!("{:?}", summary.rows());
//!
//!     // Monthly totals
//!     let monthly = engine.time_series_analysis("date", "amount")?;
//!     println!("{:?}", monthly.rows());
//!
//!     // Customers split into quartiles of total spend
//!     let segments = engine.customer_segmentation("customer", "amount", 4)?;
//!     for row in segments.rows() {
//!         println!("{} => {}", row[0], row[2]);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod helpers;
pub mod pipeline;
pub mod processor;
pub mod render;
pub mod report;

pub use processor::{
    AnalysisError, Value,
    analyzer::{AggregationEngine, column_total},
    column::{Column, ColumnType},
    derived::{Bin, DerivedTable, Distribution, Interval},
    table::{Field, LoadOptions, Schema, Table},
};
pub use render::{Chart, ChartOptions};
pub use report::Report;
