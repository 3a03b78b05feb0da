//! Aggregation of hang observations into a ranked, usage-normalized report.
//!
//! This module transforms decoded pings into:
//! - Per-date usage totals (the normalization denominator)
//! - Deduplicated stacks grouped by date, thread and top frame
//! - Ranked `hang_ms_per_hour` / `hang_count_per_hour` metrics

pub mod accumulator;
pub mod filter;
pub mod report;
pub mod stack_key;

// Re-export main types and functions
pub use accumulator::{aggregate_pings, transform_pings, HangAccumulator, Totals};
pub use filter::{admit, date_key, AdmittedPing};
pub use report::{DateReport, HangReport, NativeFrames, StackEntry, ThreadReport, TopFrameGroup};
pub use stack_key::{narrow_native_stack, top_frame_key, Module, NativeKey, StackKey};
