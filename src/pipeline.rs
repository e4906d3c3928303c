//! One report run: load, clean, filter, analyse, chart, write.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::{
    processor::{
        AnalysisError,
        analyzer::{AggregationEngine, column_total},
        derived::DerivedTable,
        table::{LoadOptions, Table},
    },
    render::{Chart, ChartOptions},
    report::Report,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Summary statistics only
    Summary,
    /// Every analysis
    Detailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    /// Mean value per category
    Bar,
    /// Monthly totals
    Line,
    /// Share of the top categories
    Pie,
    /// Correlation between numeric columns
    Heatmap,
}

impl PlotKind {
    fn file_name(self) -> &'static str {
        match self {
            PlotKind::Bar => "bar_chart.svg",
            PlotKind::Line => "line_chart.svg",
            PlotKind::Pie => "pie_chart.svg",
            PlotKind::Heatmap => "heatmap.svg",
        }
    }
}

/// Everything a report run needs
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub analysis: AnalysisMode,
    pub plot: PlotKind,
    pub category_column: String,
    pub value_column: String,
    pub date_column: String,
    pub customer_column: String,
    pub bins: usize,
    pub top_n: usize,
    pub segments: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub categories: Vec<String>,
    pub load: LoadOptions,
}

impl ReportConfig {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        ReportConfig {
            input: input.into(),
            output_dir: output_dir.into(),
            analysis: AnalysisMode::Summary,
            plot: PlotKind::Bar,
            category_column: "category".to_string(),
            value_column: "amount".to_string(),
            date_column: "date".to_string(),
            customer_column: "customer".to_string(),
            bins: 10,
            top_n: 5,
            segments: 4,
            date_range: None,
            categories: Vec::new(),
            load: LoadOptions::default(),
        }
    }

    fn required_columns(&self) -> Vec<&str> {
        let mut required = vec![self.category_column.as_str(), self.value_column.as_str()];
        let detailed = self.analysis == AnalysisMode::Detailed;
        if detailed || self.plot == PlotKind::Line || self.date_range.is_some() {
            required.push(&self.date_column);
        }
        if detailed {
            required.push(&self.customer_column);
        }
        required
    }
}

/// What a run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub report: Report,
    pub report_path: PathBuf,
    pub chart_path: PathBuf,
}

pub fn run(config: &ReportConfig) -> Result<RunOutcome, AnalysisError> {
    let loaded = Table::load_csv(&config.input, &config.load)?;
    let table = prepare(&loaded, config)?;
    let engine = AggregationEngine::new(&table);

    info!(
        rows = table.row_count(),
        total = column_total(&table, &config.value_column)?,
        "analysing"
    );

    let mut report = Report::new(config.input.display().to_string(), table.row_count());
    let summary = engine.summary_statistics(&config.category_column, &config.value_column)?;
    report.add_table("summary_statistics", summary.clone());

    if config.analysis == AnalysisMode::Detailed {
        add_detailed_sections(&mut report, &engine, config)?;
    }

    let chart_path = config.output_dir.join(config.plot.file_name());
    render_plot(&engine, config, &summary)?.save(&chart_path)?;

    let report_path = config.output_dir.join("report.json");
    report.save(&report_path)?;

    Ok(RunOutcome {
        report,
        report_path,
        chart_path,
    })
}

/// Required-column check, missing-value cleanup and user filters
fn prepare(loaded: &Table, config: &ReportConfig) -> Result<Table, AnalysisError> {
    let mut table = loaded.validate(&config.required_columns())?;

    if let Some((start, end)) = config.date_range {
        table = table.filter_by_date_range(&config.date_column, start, end)?;
    }
    if !config.categories.is_empty() {
        table = table.filter_by_categories(&config.category_column, config.categories.as_slice())?;
    }
    Ok(table)
}

fn add_detailed_sections(
    report: &mut Report,
    engine: &AggregationEngine<'_>,
    config: &ReportConfig,
) -> Result<(), AnalysisError> {
    let value = config.value_column.as_str();

    report.add_table(
        "time_series",
        engine.time_series_analysis(&config.date_column, value)?,
    );
    report.add_distribution(
        "spending_distribution",
        engine.spending_distribution(value, config.bins)?,
    );
    report.add_table(
        "top_categories",
        engine.top_spending_categories(&config.category_column, value, config.top_n)?,
    );
    report.add_table(
        "customer_segmentation",
        engine.customer_segmentation(&config.customer_column, value, config.segments)?,
    );

    match engine.correlation_matrix(&[]) {
        Ok(matrix) => report.add_table("correlation", matrix),
        Err(AnalysisError::InvalidArgument(reason)) => {
            warn!(%reason, "skipping correlation matrix");
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

fn render_plot(
    engine: &AggregationEngine<'_>,
    config: &ReportConfig,
    summary: &DerivedTable,
) -> Result<Chart, AnalysisError> {
    let category = config.category_column.as_str();
    let value = config.value_column.as_str();

    match config.plot {
        PlotKind::Bar => Chart::bar(
            summary,
            category,
            "mean",
            &ChartOptions::titled(format!("Mean {value} by {category}")),
        ),
        PlotKind::Line => {
            let monthly = engine.time_series_analysis(&config.date_column, value)?;
            Chart::line(
                &monthly,
                &config.date_column,
                value,
                &ChartOptions::titled(format!("{value} per month")).with_color("green"),
            )
        }
        PlotKind::Pie => {
            let top = engine.top_spending_categories(category, value, config.top_n)?;
            Chart::pie(
                &top,
                category,
                value,
                &ChartOptions::titled(format!("Top {} {category} by {value}", config.top_n)),
            )
        }
        PlotKind::Heatmap => {
            let matrix = engine.correlation_matrix(&[])?;
            Chart::heatmap(&matrix, &ChartOptions::titled("Correlation"))
        }
    }
}

/// Default location of the sample data set, relative to the crate root
pub fn sample_csv_path() -> &'static Path {
    Path::new("data/transactions.csv")
}

/// Where `data_generator` writes when no path is given; kept out of `data/`
pub fn generated_csv_path() -> &'static Path {
    Path::new("target/generated/transactions.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_data_does_not_replace_sample() {
        assert_ne!(generated_csv_path(), sample_csv_path());
        assert!(generated_csv_path().starts_with("target"));
    }

    #[test]
    fn test_required_columns_follow_mode() {
        let mut config = ReportConfig::new("in.csv", "out");
        assert_eq!(config.required_columns(), ["category", "amount"]);

        config.analysis = AnalysisMode::Detailed;
        assert_eq!(config.required_columns(), ["category", "amount", "date", "customer"]);
    }
}
