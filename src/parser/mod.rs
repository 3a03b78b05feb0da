//! Ping decoding and schema definitions.
//!
//! This module handles:
//! - Decoding raw JSON ping documents
//! - Skipping malformed pings
//! - Flattening parent and child thread-hang records

pub mod decoder;
pub mod ping;
pub mod schema;

// Re-export main types
pub use decoder::{flatten_hangs, ThreadHang};
pub use ping::{parse_ping, parse_pings, read_pings, ParsedPings};
pub use schema::{ChildPayload, Frame, Hang, Histogram, NativeStack, Ping, ThreadHangStats};
