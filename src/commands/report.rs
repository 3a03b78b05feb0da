//! Report command implementation.
//!
//! The report command:
//! 1. Reads and decodes ping documents
//! 2. Aggregates hangs per date, thread and top frame
//! 3. Symbolicates native stacks (if a symbol server is configured)
//! 4. Summarizes tracked hang categories
//! 5. Writes the JSON report

use crate::aggregator::{aggregate_pings, HangReport};
use crate::output::{write_report, ReportFile};
use crate::parser::read_pings;
use crate::symbols::{SymbolClient, SymbolResolver};
use crate::tracked::{summarize_tracked, tracked_classifiers};
use crate::utils::config::{DEFAULT_SYMBOL_WORKERS, MAX_SYMBOL_WORKERS};
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the report command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ReportArgs {
    /// Ping input file (JSON array or JSON lines)
    pub input: PathBuf,

    /// Output path for the JSON report
    pub output: PathBuf,

    /// Symbol server base URL (None = skip symbolication)
    pub symbol_server_url: Option<String>,

    /// Concurrent symbol server requests
    pub workers: usize,

    /// Include tracked hang summaries
    pub tracked: bool,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// Groups per thread shown in the summary
    pub summary_top: usize,
}

impl Default for ReportArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("pings.json"),
            output: PathBuf::from("hang_report.json"),
            symbol_server_url: None,
            workers: DEFAULT_SYMBOL_WORKERS,
            tracked: true,
            print_summary: false,
            summary_top: 5,
        }
    }
}

/// Execute the report command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Unreadable input file
/// * Invalid symbol server URL
/// * File write errors
///
/// Symbol server failures are not errors; affected frames keep placeholders.
pub fn execute_report(args: ReportArgs) -> Result<ReportFile> {
    let start_time = Instant::now();

    info!("Step 1/5: Reading pings from {}...", args.input.display());
    let parsed = read_pings(&args.input)
        .with_context(|| format!("Failed to read pings from {}", args.input.display()))?;
    let pings_read = parsed.pings.len() + parsed.skipped;

    info!("Step 2/5: Aggregating {} pings...", parsed.pings.len());
    let acc = aggregate_pings(&parsed.pings);
    let pings_skipped = parsed.skipped + acc.skipped_pings;
    info!(
        "Admitted {} pings across {} dates",
        acc.admitted_pings,
        acc.dates.len()
    );
    let mut report = acc.finish();

    match &args.symbol_server_url {
        Some(url) => {
            info!("Step 3/5: Symbolicating native stacks via {}...", url);
            let client = SymbolClient::new(url).context("Failed to create symbol server client")?;
            let mut resolver = SymbolResolver::with_workers(client, args.workers);
            let stats = resolver.symbolicate(&mut report);
            info!(
                "Resolved {} offsets in {} modules ({} failed)",
                stats.offsets_resolved, stats.modules_requested, stats.modules_failed
            );
        }
        None => info!("Step 3/5: Skipping symbolication (no symbol server configured)"),
    }

    let tracked = if args.tracked {
        info!("Step 4/5: Summarizing tracked hangs...");
        summarize_tracked(&parsed.pings, &tracked_classifiers())
    } else {
        info!("Step 4/5: Skipping tracked hangs (not requested)");
        Vec::new()
    };

    info!("Step 5/5: Writing report...");
    let report_file = ReportFile::new(report, tracked).with_ping_counts(pings_read, pings_skipped);
    write_report(&report_file, &args.output).context("Failed to write hang report")?;
    info!("✓ Report written to: {}", args.output.display());

    if args.print_summary {
        println!("{}", format_summary(&report_file.report, args.summary_top));
    }

    let elapsed = start_time.elapsed();
    info!("Report completed in {:.2}s", elapsed.as_secs_f64());

    Ok(report_file)
}

/// Validate report arguments
///
/// **Public** - can be called before execute_report for early validation
pub fn validate_args(args: &ReportArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }

    if let Some(url) = &args.symbol_server_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("Symbol server URL must start with http:// or https://");
        }
    }

    if args.workers == 0 {
        anyhow::bail!("workers must be greater than 0");
    }

    if args.workers > MAX_SYMBOL_WORKERS {
        anyhow::bail!("workers is too large (max {})", MAX_SYMBOL_WORKERS);
    }

    Ok(())
}

/// Human-readable summary of the top groups per date and thread
///
/// **Public** - printed by `--summary`
pub fn format_summary(report: &HangReport, top_n: usize) -> String {
    let mut out = String::new();
    out.push_str(&"=".repeat(80));
    out.push_str("\nHANG REPORT SUMMARY\n");
    out.push_str(&"=".repeat(80));
    out.push('\n');

    if report.is_empty() {
        out.push_str("No eligible pings.\n");
        return out;
    }

    for (date, date_report) in &report.dates {
        out.push_str(&format!(
            "\n{} ({} usage seconds)\n",
            date, date_report.usage_seconds
        ));

        for (thread, groups) in &date_report.threads {
            out.push_str(&format!("  {}\n", thread));

            let mut ranked: Vec<_> = groups.iter().collect();
            ranked.sort_by(|a, b| b.1.hang_ms_per_hour.total_cmp(&a.1.hang_ms_per_hour));

            for (top_frame, group) in ranked.into_iter().take(top_n) {
                out.push_str(&format!(
                    "    {:>12.2} ms/h {:>10.3} hangs/h  {} ({} stacks)\n",
                    group.hang_ms_per_hour,
                    group.hang_count_per_hour,
                    top_frame,
                    group.stacks.len()
                ));
            }
        }
    }

    debug!("Formatted summary for {} dates", report.dates.len());
    out
}
