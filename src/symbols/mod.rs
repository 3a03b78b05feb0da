//! Native stack symbolication against a remote symbol server.

pub mod batcher;
pub mod cache;
pub mod client;
pub mod resolver;

pub use batcher::{collect_lookups, LookupBatches};
pub use cache::SymbolCache;
pub use client::{parse_symbol_map, SymbolClient, SymbolSource};
pub use resolver::{unresolved_placeholder, SymbolResolver, SymbolicationStats};
