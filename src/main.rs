use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use spend_analyzer::{
    LoadOptions,
    pipeline::{self, AnalysisMode, PlotKind, ReportConfig},
};

#[cfg(not(target_env = "msvc"))]
use jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "spend-analyzer")]
#[command(about = "Grouped statistics and charts over a CSV file of spending records")]
#[command(version)]
struct Args {
    /// Path to the input data file
    file: PathBuf,

    /// Type of analysis to perform
    #[arg(long, value_enum)]
    analysis: AnalysisArg,

    /// Type of plot to generate
    #[arg(long, value_enum)]
    plot: PlotArg,

    /// Directory for the chart and report.json
    #[arg(short, long)]
    output: PathBuf,

    #[arg(long, default_value = "category")]
    category_column: String,

    #[arg(long, default_value = "amount")]
    value_column: String,

    #[arg(long, default_value = "date")]
    date_column: String,

    #[arg(long, default_value = "customer")]
    customer_column: String,

    /// Number of bins for the spending distribution
    #[arg(long, default_value_t = 10)]
    bins: usize,

    /// Number of categories in the top-N ranking
    #[arg(long, default_value_t = 5)]
    top_n: usize,

    /// Number of customer segments
    #[arg(long, default_value_t = 4)]
    segments: usize,

    /// Keep records on or after this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    from: Option<NaiveDate>,

    /// Keep records on or before this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    to: Option<NaiveDate>,

    /// Keep only these categories (comma separated)
    #[arg(long, value_delimiter = ',')]
    categories: Vec<String>,

    /// Field delimiter of the input file
    #[arg(long, default_value_t = ',')]
    delimiter: char,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AnalysisArg {
    Summary,
    Detailed,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlotArg {
    Bar,
    Line,
    Pie,
    Heatmap,
}

fn parse_date_arg(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

impl Args {
    fn into_config(self) -> Result<ReportConfig> {
        if !self.delimiter.is_ascii() {
            bail!("delimiter must be a single ASCII character, got '{}'", self.delimiter);
        }

        let date_range = match (self.from, self.to) {
            (None, None) => None,
            (from, to) => Some((from.unwrap_or(NaiveDate::MIN), to.unwrap_or(NaiveDate::MAX))),
        };

        let mut config = ReportConfig::new(self.file, self.output);
        config.analysis = match self.analysis {
            AnalysisArg::Summary => AnalysisMode::Summary,
            AnalysisArg::Detailed => AnalysisMode::Detailed,
        };
        config.plot = match self.plot {
            PlotArg::Bar => PlotKind::Bar,
            PlotArg::Line => PlotKind::Line,
            PlotArg::Pie => PlotKind::Pie,
            PlotArg::Heatmap => PlotKind::Heatmap,
        };
        config.category_column = self.category_column;
        config.value_column = self.value_column;
        config.date_column = self.date_column;
        config.customer_column = self.customer_column;
        config.bins = self.bins;
        config.top_n = self.top_n;
        config.segments = self.segments;
        config.date_range = date_range;
        config.categories = self.categories;
        config.load = LoadOptions {
            delimiter: self.delimiter as u8,
            ..LoadOptions::default()
        };
        Ok(config)
    }
}

fn run(args: Args) -> Result<()> {
    let config = args.into_config()?;
    let outcome = pipeline::run(&config)
        .with_context(|| format!("analysis of {} failed", config.input.display()))?;

    info!(
        chart = %outcome.chart_path.display(),
        report = %outcome.report_path.display(),
        sections = outcome.report.sections.len(),
        "analysis and plot generation completed"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
