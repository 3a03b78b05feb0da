//! Finalized hang report.
//!
//! Layout: date -> thread -> top frame -> ranked stack entries.
//! All rates on a date share that date's usage total as denominator.

use super::stack_key::{Module, NativeKey};
use crate::parser::Frame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregated report for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HangReport {
    pub dates: BTreeMap<String, DateReport>,
}

/// Everything reported for one build date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateReport {
    /// Total subsession seconds of every admitted ping on this date
    pub usage_seconds: u64,

    /// Thread name -> report
    pub threads: BTreeMap<String, ThreadReport>,
}

/// Top-frame key -> group
pub type ThreadReport = BTreeMap<String, TopFrameGroup>;

/// Stacks sharing a top frame, ranked by hang time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopFrameGroup {
    /// Sorted descending by `hang_ms_per_hour`
    pub stacks: Vec<StackEntry>,
    pub hang_ms_per_hour: f64,
    pub hang_count_per_hour: f64,
}

/// One deduplicated stack and its normalized rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackEntry {
    pub pseudo_stack: Vec<Frame>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<NativeFrames>,

    pub hang_ms_per_hour: f64,
    pub hang_count_per_hour: f64,
}

/// Native part of a stack entry, before and after symbolication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NativeFrames {
    /// Narrowed module table plus (module index, offset) frames
    Unresolved(NativeKey),

    /// One human-readable symbol per frame
    Symbolicated { symbols: Vec<String> },
}

impl HangReport {
    /// Look up a group by its full path
    ///
    /// **Public** - convenience for consumers and tests
    pub fn group(&self, date: &str, thread: &str, top_frame: &str) -> Option<&TopFrameGroup> {
        self.dates.get(date)?.threads.get(thread)?.get(top_frame)
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Every stack entry in the report
    pub fn entries(&self) -> impl Iterator<Item = &StackEntry> {
        self.dates
            .values()
            .flat_map(|date| date.threads.values())
            .flat_map(|thread| thread.values())
            .flat_map(|group| group.stacks.iter())
    }

    /// Every stack entry in the report, mutably
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut StackEntry> {
        self.dates
            .values_mut()
            .flat_map(|date| date.threads.values_mut())
            .flat_map(|thread| thread.values_mut())
            .flat_map(|group| group.stacks.iter_mut())
    }

    /// Modules referenced by unresolved native stacks
    pub fn referenced_modules(&self) -> impl Iterator<Item = &Module> {
        self.entries()
            .filter_map(|entry| match &entry.native {
                Some(NativeFrames::Unresolved(key)) => Some(key.modules.iter()),
                _ => None,
            })
            .flatten()
    }
}

impl StackEntry {
    /// Unresolved native frames, if this entry still has them
    pub fn unresolved_native(&self) -> Option<&NativeKey> {
        match &self.native {
            Some(NativeFrames::Unresolved(key)) => Some(key),
            _ => None,
        }
    }

    /// Symbolicated native frames, if resolution already ran
    pub fn symbols(&self) -> Option<&[String]> {
        match &self.native {
            Some(NativeFrames::Symbolicated { symbols }) => Some(symbols),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, native: Option<NativeFrames>) -> StackEntry {
        StackEntry {
            pseudo_stack: vec![Frame::named(name)],
            native,
            hang_ms_per_hour: 1.0,
            hang_count_per_hour: 1.0,
        }
    }

    fn report_with(entries: Vec<StackEntry>) -> HangReport {
        let mut thread = ThreadReport::new();
        thread.insert(
            "top".to_string(),
            TopFrameGroup {
                stacks: entries,
                hang_ms_per_hour: 0.0,
                hang_count_per_hour: 0.0,
            },
        );
        let mut date = DateReport {
            usage_seconds: 60,
            ..Default::default()
        };
        date.threads.insert("Gecko".to_string(), thread);

        let mut report = HangReport::default();
        report.dates.insert("20170317".to_string(), date);
        report
    }

    #[test]
    fn test_group_lookup() {
        let report = report_with(vec![entry("top", None)]);
        assert!(report.group("20170317", "Gecko", "top").is_some());
        assert!(report.group("20170317", "Gecko", "missing").is_none());
        assert!(report.group("20170316", "Gecko", "top").is_none());
    }

    #[test]
    fn test_referenced_modules_skips_symbolicated() {
        let unresolved = NativeFrames::Unresolved(NativeKey {
            modules: vec![Module::new("xul.pdb", "X")],
            frames: vec![(0, 1)],
        });
        let resolved = NativeFrames::Symbolicated {
            symbols: vec!["main (in firefox.pdb)".to_string()],
        };
        let report = report_with(vec![
            entry("a", Some(unresolved)),
            entry("b", Some(resolved)),
            entry("c", None),
        ]);

        let modules: Vec<&Module> = report.referenced_modules().collect();
        assert_eq!(modules, vec![&Module::new("xul.pdb", "X")]);
    }

    #[test]
    fn test_native_frames_serialization_is_tagged() {
        let resolved = NativeFrames::Symbolicated {
            symbols: vec!["wmain (in firefox.pdb)".to_string()],
        };
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["state"], "symbolicated");
        assert_eq!(json["symbols"][0], "wmain (in firefox.pdb)");
    }
}
