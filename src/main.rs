//! Hang Reporter CLI
//!
//! Aggregates background thread-hang pings into a ranked report and
//! optionally resolves native stacks against a symbol server.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use hang_reporter::commands::{
    display_version, execute_report, validate_args, validate_report_file, ReportArgs,
};
use hang_reporter::utils::config::DEFAULT_SYMBOL_WORKERS;

/// Hang Reporter - thread-hang telemetry aggregation
#[derive(Parser, Debug)]
#[command(name = "hang-reporter")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate pings into a hang report
    Report {
        /// Ping input file (JSON array or JSON lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the JSON report
        #[arg(short, long, default_value = "hang_report.json")]
        output: PathBuf,

        /// Symbol server base URL; symbolication is skipped when unset
        #[arg(long, env = "SYMBOL_SERVER_URL")]
        symbol_server_url: Option<String>,

        /// Concurrent symbol server requests
        #[arg(long, default_value_t = DEFAULT_SYMBOL_WORKERS)]
        workers: usize,

        /// Do not compute tracked hang summaries
        #[arg(long)]
        no_tracked: bool,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Top-frame groups per thread shown in the summary
        #[arg(long, default_value = "5")]
        summary_top: usize,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Report {
            input,
            output,
            symbol_server_url,
            workers,
            no_tracked,
            summary,
            summary_top,
        } => {
            let args = ReportArgs {
                input,
                output,
                symbol_server_url,
                workers,
                tracked: !no_tracked,
                print_summary: summary,
                summary_top,
            };

            // Validate args first
            validate_args(&args)?;

            execute_report(args)?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
