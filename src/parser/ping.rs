//! Decode raw ping documents.
//!
//! Input files hold either a JSON array of pings or one JSON ping per line.
//! A document that does not match the schema is skipped, never fatal.

use super::schema::Ping;
use crate::utils::error::ParseError;
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Pings that decoded successfully, plus how many were dropped
#[derive(Debug, Clone, Default)]
pub struct ParsedPings {
    pub pings: Vec<Ping>,
    pub skipped: usize,
}

/// Decode a single ping document
///
/// **Public** - main entry point for one document
///
/// # Errors
/// * `ParseError::JsonError` - missing required field, wrong type, or a
///   histogram bucket that is not an integer
pub fn parse_ping(raw: &serde_json::Value) -> Result<Ping, ParseError> {
    Ok(Ping::deserialize(raw)?)
}

/// Decode a batch of ping documents, skipping malformed ones
///
/// **Public** - used by the report command
pub fn parse_pings(raw: &[serde_json::Value]) -> ParsedPings {
    let mut parsed = ParsedPings::default();

    for (index, document) in raw.iter().enumerate() {
        match parse_ping(document) {
            Ok(ping) => parsed.pings.push(ping),
            Err(e) => {
                warn!("Skipping malformed ping #{}: {}", index, e);
                parsed.skipped += 1;
            }
        }
    }

    debug!(
        "Decoded {} pings ({} skipped)",
        parsed.pings.len(),
        parsed.skipped
    );

    parsed
}

/// Read raw ping documents from a file
///
/// **Public** - accepts a JSON array or JSON lines
///
/// Lines that are not valid JSON are counted as skipped pings.
pub fn read_pings(input_path: impl AsRef<Path>) -> Result<ParsedPings, ParseError> {
    let input_path = input_path.as_ref();

    debug!("Reading pings from: {}", input_path.display());

    let content = fs::read_to_string(input_path)?;
    let trimmed = content.trim_start();

    if trimmed.starts_with('[') {
        let documents: Vec<serde_json::Value> = serde_json::from_str(trimmed)?;
        return Ok(parse_pings(&documents));
    }

    let mut documents = Vec::new();
    let mut unreadable = 0;

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(document) => documents.push(document),
            Err(e) => {
                warn!("Skipping unreadable line {}: {}", line_no + 1, e);
                unreadable += 1;
            }
        }
    }

    let mut parsed = parse_pings(&documents);
    parsed.skipped += unreadable;
    Ok(parsed)
}
