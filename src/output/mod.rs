//! Output writers for hang reports.

pub mod json;

// Re-export main functions
pub use json::{read_report, report_to_string, write_report, ReportFile};
