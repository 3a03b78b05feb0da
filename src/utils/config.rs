//! Configuration and constants for the report pipeline.

use std::time::Duration;

/// Default timeout for symbol server requests
pub const DEFAULT_SYMBOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of concurrent symbol server requests
pub const DEFAULT_SYMBOL_WORKERS: usize = 10;

/// Upper bound accepted for `--workers`
pub const MAX_SYMBOL_WORKERS: usize = 256;

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Only pings from this platform are aggregated
pub const SUPPORTED_OS: &str = "Windows_NT";

/// Build ids start with the build date as YYYYMMDD
pub const BUILD_DATE_PREFIX_LEN: usize = 8;

/// Top-frame key used for hangs that carry no pseudo-stack
pub const EMPTY_STACK_KEY: &str = "empty_pseudo_stack";

// Rates are normalized by usage_seconds / USAGE_DIVISOR.
// The result is labelled "per hour" in reports; keep the divisor as is.
pub const USAGE_DIVISOR: f64 = 60.0;
