use anyhow::Result;
use std::path::PathBuf;
use crate::output::read_report;
use crate::utils::config::SCHEMA_VERSION;

/// Validate a report JSON file
pub fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report_file = read_report(&file_path)?;
    let report = &report_file.report;

    let threads: usize = report.dates.values().map(|d| d.threads.len()).sum();
    let unresolved = report
        .entries()
        .filter(|e| e.unresolved_native().is_some())
        .count();

    println!("✓ Valid report JSON");
    println!("  Version: {}", report_file.version);
    println!("  Generated: {}", report_file.generated_at);
    println!("  Pings: {} read, {} skipped", report_file.pings_read, report_file.pings_skipped);
    println!("  Dates: {}", report.dates.len());
    println!("  Threads: {}", threads);
    println!("  Stacks: {}", report.entries().count());
    println!("  Unsymbolicated native stacks: {}", unresolved);
    println!("  Tracked categories: {}", report_file.tracked.len());

    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("Hang Reporter v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Aggregation and symbolication of background thread-hang telemetry.");
}
