use spend_analyzer::pipeline::{self, AnalysisMode, ReportConfig, sample_csv_path};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _profiler = dhat::Profiler::new_heap();

    let input = std::env::args()
        .nth(1)
        .unwrap_or_else(|| sample_csv_path().display().to_string());
    let mut config = ReportConfig::new(input, "target/memory-report");
    config.analysis = AnalysisMode::Detailed;

    let outcome = pipeline::run(&config)?;

    println!(
        "Memory profile of a detailed report over {} rows finished. See dhat-heap.json for details",
        outcome.report.rows
    );
    Ok(())
}
