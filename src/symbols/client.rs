//! HTTP client for the remote symbol server.
//!
//! One request resolves many offsets of a single module:
//! `GET {base}/{file name}/{debug id}` with body `{"offsets": [...]}`.
//! The server answers with a JSON object mapping offset to function name.

use crate::aggregator::Module;
use crate::utils::config::DEFAULT_SYMBOL_TIMEOUT;
use crate::utils::error::SymbolError;
use log::debug;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Anything that can resolve a batch of offsets for one module
///
/// Implementations are shared across resolver worker threads.
pub trait SymbolSource: Sync {
    /// Resolve `offsets` in `module` to bare function names.
    ///
    /// Offsets the source knows nothing about are simply absent from the map.
    fn lookup(&self, module: &Module, offsets: &[u64]) -> Result<HashMap<u64, String>, SymbolError>;
}

/// Request body sent to the symbol server
#[derive(Debug, Serialize)]
struct SymbolRequest<'a> {
    offsets: &'a [u64],
}

/// Symbol server client
pub struct SymbolClient {
    client: Client,
    base_url: Url,
}

impl SymbolClient {
    /// Create a new symbol server client
    pub fn new(base_url: &str) -> Result<Self, SymbolError> {
        Self::with_timeout(base_url, DEFAULT_SYMBOL_TIMEOUT)
    }

    /// Create a client with custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, SymbolError> {
        let base_url = parse_base_url(base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SymbolError::RequestFailed)?;

        Ok(Self { client, base_url })
    }

    /// URL of a module's symbol endpoint
    pub fn module_url(&self, module: &Module) -> Result<Url, SymbolError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SymbolError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(&module.file_name)
            .push(&module.debug_id);
        Ok(url)
    }
}

impl SymbolSource for SymbolClient {
    fn lookup(&self, module: &Module, offsets: &[u64]) -> Result<HashMap<u64, String>, SymbolError> {
        let url = self.module_url(module)?;

        debug!("Requesting {} symbols from {}", offsets.len(), url);

        let response = self
            .client
            .get(url)
            .json(&SymbolRequest { offsets })
            .send()
            .map_err(SymbolError::RequestFailed)?;

        // Check HTTP status
        if !response.status().is_success() {
            return Err(SymbolError::InvalidResponse(format!(
                "HTTP {} for {}",
                response.status(),
                module
            )));
        }

        let body = response.text().map_err(SymbolError::RequestFailed)?;
        parse_symbol_map(&body)
    }
}

/// Validate the configured base URL
fn parse_base_url(base_url: &str) -> Result<Url, SymbolError> {
    let url = Url::parse(base_url).map_err(|e| SymbolError::InvalidUrl(format!("{}: {}", base_url, e)))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(SymbolError::InvalidUrl(base_url.to_string()));
    }

    Ok(url)
}

/// Parse a symbol server response body
///
/// Keys are decimal offsets or `0x`-prefixed hex.
pub fn parse_symbol_map(body: &str) -> Result<HashMap<u64, String>, SymbolError> {
    let raw: HashMap<String, String> = serde_json::from_str(body)
        .map_err(|e| SymbolError::InvalidResponse(format!("malformed JSON: {}", e)))?;

    raw.into_iter()
        .map(|(key, symbol)| {
            parse_offset(&key)
                .map(|offset| (offset, symbol))
                .ok_or_else(|| SymbolError::InvalidResponse(format!("invalid offset key {:?}", key)))
        })
        .collect()
}

fn parse_offset(key: &str) -> Option<u64> {
    let key = key.trim();
    match key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => key.parse().ok(),
    }
}
