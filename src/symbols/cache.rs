//! Symbol cache for one symbolication run.

use log::debug;
use std::collections::HashMap;

/// Resolved symbols keyed by (module debug id, offset)
///
/// Entries are write-once: a key resolved earlier in the run is never
/// overwritten.
#[derive(Debug, Clone, Default)]
pub struct SymbolCache {
    entries: HashMap<(String, u64), String>,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, debug_id: &str, offset: u64) -> Option<&str> {
        self.entries
            .get(&(debug_id.to_string(), offset))
            .map(String::as_str)
    }

    pub fn contains(&self, debug_id: &str, offset: u64) -> bool {
        self.entries.contains_key(&(debug_id.to_string(), offset))
    }

    /// Install a symbol unless the key is already present
    ///
    /// Returns true if the entry was added.
    pub fn insert(&mut self, debug_id: &str, offset: u64, symbol: String) -> bool {
        let key = (debug_id.to_string(), offset);
        if self.entries.contains_key(&key) {
            debug!("Symbol for {}+0x{:x} already cached", debug_id, offset);
            return false;
        }
        self.entries.insert(key, symbol);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
