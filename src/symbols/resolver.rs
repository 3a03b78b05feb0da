//! Concurrent symbolication of a hang report.
//!
//! A run moves through four phases: collect outstanding lookups, wait for
//! every per-module request on a bounded worker pool, merge the responses
//! into the cache, then rewrite native frames as symbol strings. The cache
//! is only read for splicing once every request has settled.

use super::batcher::{collect_lookups, LookupBatches};
use super::cache::SymbolCache;
use super::client::SymbolSource;
use crate::aggregator::{HangReport, Module, NativeFrames, NativeKey};
use crate::utils::config::DEFAULT_SYMBOL_WORKERS;
use crate::utils::error::SymbolError;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::thread;

/// Outcome counters of one `symbolicate` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolicationStats {
    /// Modules a request was issued for
    pub modules_requested: usize,

    /// Modules whose request failed
    pub modules_failed: usize,

    /// Offsets the server returned a symbol for
    pub offsets_resolved: usize,

    /// Offsets left as placeholders after a successful request
    pub offsets_missing: usize,

    /// Stack entries rewritten
    pub entries_symbolicated: usize,
}

/// Result of one module's request
struct BatchOutcome {
    module: Module,
    offsets: Vec<u64>,
    result: Result<HashMap<u64, String>, SymbolError>,
}

/// Resolves native stacks for one pipeline run
///
/// Owns the run's symbol cache; drop the resolver to discard it.
pub struct SymbolResolver<S> {
    source: S,
    cache: SymbolCache,
    workers: usize,
}

impl<S: SymbolSource> SymbolResolver<S> {
    pub fn new(source: S) -> Self {
        Self::with_workers(source, DEFAULT_SYMBOL_WORKERS)
    }

    /// Resolver with at most `workers` requests in flight
    pub fn with_workers(source: S, workers: usize) -> Self {
        Self {
            source,
            cache: SymbolCache::new(),
            workers: workers.max(1),
        }
    }

    pub fn cache(&self) -> &SymbolCache {
        &self.cache
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Replace every unresolved native stack in `report` with symbols
    ///
    /// **Public** - main entry point for symbolication
    ///
    /// Failures never abort the run: a module whose request fails keeps
    /// placeholder strings for its offsets, every other module resolves.
    pub fn symbolicate(&mut self, report: &mut HangReport) -> SymbolicationStats {
        let mut stats = SymbolicationStats::default();

        // collecting requests
        let batches = collect_lookups(report, &self.cache);
        stats.modules_requested = batches.len();

        if !batches.is_empty() {
            info!(
                "Resolving symbols for {} modules with {} workers",
                batches.len(),
                self.workers.min(batches.len())
            );
        }

        // awaiting concurrent responses
        let outcomes = self.fetch_all(batches);

        // merging results
        for outcome in outcomes {
            self.merge_outcome(outcome, &mut stats);
        }

        // splice back
        for entry in report.entries_mut() {
            if let Some(NativeFrames::Unresolved(key)) = &entry.native {
                let symbols = self.render_frames(key);
                entry.native = Some(NativeFrames::Symbolicated { symbols });
                stats.entries_symbolicated += 1;
            }
        }

        debug!("Symbolication finished: {:?}", stats);

        stats
    }

    /// Issue one request per module on the worker pool and wait for all
    fn fetch_all(&self, batches: LookupBatches) -> Vec<BatchOutcome> {
        if batches.is_empty() {
            return Vec::new();
        }

        let workers = self.workers.min(batches.len());
        let (job_tx, job_rx) = crossbeam_channel::bounded::<(Module, Vec<u64>)>(workers);
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<BatchOutcome>();
        let source = &self.source;

        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for (module, offsets) in job_rx.iter() {
                        let result = source.lookup(&module, &offsets);
                        let outcome = BatchOutcome {
                            module,
                            offsets,
                            result,
                        };
                        if result_tx.send(outcome).is_err() {
                            break;
                        }
                    }
                });
            }

            for (module, offsets) in batches {
                let job = (module, offsets.into_iter().collect());
                if job_tx.send(job).is_err() {
                    break;
                }
            }
            drop(job_tx);
        });

        drop(result_tx);
        result_rx.iter().collect()
    }

    fn merge_outcome(&mut self, outcome: BatchOutcome, stats: &mut SymbolicationStats) {
        let BatchOutcome {
            module,
            offsets,
            result,
        } = outcome;

        let symbols = match result {
            Ok(symbols) => symbols,
            Err(e) => {
                warn!("Symbol lookup failed for {}: {}", module, e);
                stats.modules_failed += 1;
                return;
            }
        };

        for offset in offsets {
            // Offsets the server omitted are cached as placeholders so a
            // later pass over the same run does not ask again.
            let symbol = match symbols.get(&offset) {
                Some(name) => {
                    stats.offsets_resolved += 1;
                    format!("{} (in {})", name, module.file_name)
                }
                None => {
                    stats.offsets_missing += 1;
                    unresolved_placeholder(offset, &module)
                }
            };
            self.cache.insert(&module.debug_id, offset, symbol);
        }
    }

    fn render_frames(&self, key: &NativeKey) -> Vec<String> {
        key.frames
            .iter()
            .map(|&(index, offset)| match key.module_of(index) {
                Some(module) => self
                    .cache
                    .get(&module.debug_id, offset)
                    .map(str::to_string)
                    .unwrap_or_else(|| unresolved_placeholder(offset, module)),
                None => format!("0x{:x}", offset),
            })
            .collect()
    }
}

/// Placeholder for an offset the symbol server did not resolve
///
/// **Public** - e.g. `0x2b67 (in xul.pdb)`
pub fn unresolved_placeholder(offset: u64, module: &Module) -> String {
    format!("0x{:x} (in {})", offset, module.file_name)
}
