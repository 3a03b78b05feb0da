//! Hang Reporter
//!
//! Aggregation and symbolication of background thread-hang telemetry.
//!
//! Pings describing sampled thread hangs are filtered, bucketed by build
//! date and thread, deduplicated by stack and ranked by hang time
//! normalized against total observed usage. Native stacks in the result
//! can then be resolved against a remote symbol server.
//!
//! ## Getting Started
//!
//! ```bash
//! hang-reporter report --input pings.jsonl --output hang_report.json \
//!     --symbol-server-url https://symbols.example.com/v1/
//! ```
//!
//! As a library:
//!
//! ```ignore
//! let report = hang_reporter::aggregator::transform_pings(&pings);
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod symbols;
pub mod tracked;
pub mod utils;
