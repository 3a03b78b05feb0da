//! Group outstanding native-stack lookups by module.
//!
//! Each module becomes one request, so a module is never split across
//! concurrent calls. Offsets already in the cache are left out.

use super::cache::SymbolCache;
use crate::aggregator::{HangReport, Module};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Outstanding offsets per module
pub type LookupBatches = BTreeMap<Module, BTreeSet<u64>>;

/// Scan a report for native offsets that still need resolving
///
/// **Public** - first phase of symbolication
pub fn collect_lookups(report: &HangReport, cache: &SymbolCache) -> LookupBatches {
    let mut batches = LookupBatches::new();
    let mut cached = 0usize;

    for key in report.entries().filter_map(|entry| entry.unresolved_native()) {
        for &(index, offset) in &key.frames {
            let Some(module) = key.module_of(index) else {
                continue;
            };
            if cache.contains(&module.debug_id, offset) {
                cached += 1;
                continue;
            }
            batches.entry(module.clone()).or_default().insert(offset);
        }
    }

    debug!(
        "Collected {} offsets across {} modules ({} frames already cached)",
        batches.values().map(BTreeSet::len).sum::<usize>(),
        batches.len(),
        cached
    );

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{DateReport, NativeFrames, NativeKey, StackEntry, ThreadReport, TopFrameGroup};
    use crate::parser::Frame;

    fn report(natives: Vec<NativeKey>) -> HangReport {
        let stacks = natives
            .into_iter()
            .map(|key| StackEntry {
                pseudo_stack: vec![Frame::named("top")],
                native: Some(NativeFrames::Unresolved(key)),
                hang_ms_per_hour: 0.0,
                hang_count_per_hour: 0.0,
            })
            .collect();

        let mut thread = ThreadReport::new();
        thread.insert("top".to_string(), TopFrameGroup { stacks, ..Default::default() });
        let mut date = DateReport::default();
        date.threads.insert("Gecko".to_string(), thread);
        let mut report = HangReport::default();
        report.dates.insert("20170317".to_string(), date);
        report
    }

    #[test]
    fn test_groups_offsets_by_module() {
        let xul = Module::new("xul.pdb", "X");
        let ntdll = Module::new("ntdll.pdb", "N");
        let report = report(vec![
            NativeKey {
                modules: vec![xul.clone()],
                frames: vec![(0, 1), (-1, 2), (0, 3)],
            },
            NativeKey {
                modules: vec![ntdll.clone(), xul.clone()],
                frames: vec![(1, 3), (0, 9)],
            },
        ]);

        let batches = collect_lookups(&report, &SymbolCache::new());

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[&xul], BTreeSet::from([1, 3]));
        assert_eq!(batches[&ntdll], BTreeSet::from([9]));
    }

    #[test]
    fn test_cached_offsets_are_excluded() {
        let xul = Module::new("xul.pdb", "X");
        let report = report(vec![NativeKey {
            modules: vec![xul.clone()],
            frames: vec![(0, 1), (0, 2)],
        }]);

        let mut cache = SymbolCache::new();
        cache.insert("X", 1, "cached (in xul.pdb)".to_string());
        let batches = collect_lookups(&report, &cache);
        assert_eq!(batches[&xul], BTreeSet::from([2]));

        cache.insert("X", 2, "also cached (in xul.pdb)".to_string());
        assert!(collect_lookups(&report, &cache).is_empty());
    }
}
