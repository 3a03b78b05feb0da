//! Partial hang aggregation.
//!
//! A `HangAccumulator` holds raw integer totals, so two partial aggregates
//! built over disjoint sets of pings can be merged in any order and any
//! grouping with the same result. Normalization happens once, in `finish`.

use super::filter::admit;
use super::report::{DateReport, HangReport, NativeFrames, StackEntry, ThreadReport, TopFrameGroup};
use super::stack_key::{top_frame_key, StackKey};
use crate::parser::{flatten_hangs, Hang, Ping};
use crate::utils::config::USAGE_DIVISOR;
use crate::utils::error::ParseError;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};

/// Raw weighted totals of a stack
///
/// Sums saturate at `u64::MAX`, which keeps `merge` associative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    /// Sum of count * bucket_ms over reportable buckets
    pub hang_ms: u64,

    /// Sum of count over reportable buckets
    pub hang_count: u64,
}

impl Totals {
    fn add(&mut self, other: Totals) {
        self.hang_ms = self.hang_ms.saturating_add(other.hang_ms);
        self.hang_count = self.hang_count.saturating_add(other.hang_count);
    }
}

/// Stack entries sharing a top frame, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct GroupAccumulator {
    entries: Vec<(StackKey, Totals)>,
    index: HashMap<StackKey, usize>,
}

impl GroupAccumulator {
    /// Add totals to the entry for `key`, creating it if needed
    pub fn add(&mut self, key: StackKey, totals: Totals) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1.add(totals),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, totals));
            }
        }
    }

    /// Totals recorded for a key
    pub fn totals_for(&self, key: &StackKey) -> Option<Totals> {
        self.index.get(key).map(|&i| self.entries[i].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn merge(&mut self, other: GroupAccumulator) {
        for (key, totals) in other.entries {
            self.add(key, totals);
        }
    }
}

/// Usage and hangs accumulated for one date
#[derive(Debug, Clone, Default)]
pub struct DateAccumulator {
    pub usage_seconds: u64,

    /// thread -> top frame -> group
    pub threads: BTreeMap<String, BTreeMap<String, GroupAccumulator>>,
}

impl DateAccumulator {
    fn merge(&mut self, other: DateAccumulator) {
        self.usage_seconds = self.usage_seconds.saturating_add(other.usage_seconds);
        for (thread, groups) in other.threads {
            let ours = self.threads.entry(thread).or_default();
            for (top_frame, group) in groups {
                ours.entry(top_frame).or_default().merge(group);
            }
        }
    }
}

/// Partial aggregate over a set of pings
#[derive(Debug, Clone, Default)]
pub struct HangAccumulator {
    pub dates: BTreeMap<String, DateAccumulator>,

    /// Pings that passed the eligibility filter
    pub admitted_pings: usize,

    /// Pings dropped as malformed
    pub skipped_pings: usize,
}

impl HangAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one ping into the aggregate
    ///
    /// **Public** - the per-record step of a map/reduce driver
    ///
    /// Returns whether the ping was admitted. Usage is counted once per
    /// admitted ping, no matter how many hangs it carries.
    pub fn add_ping(&mut self, ping: &Ping) -> Result<bool, ParseError> {
        let Some(admitted) = admit(ping)? else {
            return Ok(false);
        };

        let date = self.dates.entry(admitted.date).or_default();
        date.usage_seconds = date.usage_seconds.saturating_add(admitted.usage_seconds);

        for observed in flatten_hangs(ping) {
            add_hang(date, observed.thread, observed.hang);
        }

        self.admitted_pings += 1;
        Ok(true)
    }

    /// Combine two partial aggregates
    ///
    /// **Public** - associative and commutative up to tie order in groups
    pub fn merge(mut self, other: HangAccumulator) -> HangAccumulator {
        for (date, acc) in other.dates {
            self.dates.entry(date).or_default().merge(acc);
        }
        self.admitted_pings += other.admitted_pings;
        self.skipped_pings += other.skipped_pings;
        self
    }

    /// Usage total recorded for a date
    pub fn usage_seconds(&self, date: &str) -> Option<u64> {
        self.dates.get(date).map(|d| d.usage_seconds)
    }

    /// Group accumulator at a (date, thread, top frame) path
    pub fn group(&self, date: &str, thread: &str, top_frame: &str) -> Option<&GroupAccumulator> {
        self.dates.get(date)?.threads.get(thread)?.get(top_frame)
    }

    /// Normalize by usage and rank stacks
    ///
    /// **Public** - produces the final report
    pub fn finish(self) -> HangReport {
        let dates = self
            .dates
            .into_iter()
            .map(|(date, acc)| (date, finish_date(acc)))
            .collect();

        HangReport { dates }
    }
}

/// Aggregate a batch of pings, skipping malformed ones
///
/// **Public** - sequential driver over `HangAccumulator::add_ping`
pub fn aggregate_pings<'a>(pings: impl IntoIterator<Item = &'a Ping>) -> HangAccumulator {
    let mut acc = HangAccumulator::new();

    for ping in pings {
        if let Err(e) = acc.add_ping(ping) {
            warn!("Skipping malformed ping (build {:?}): {}", ping.build_id, e);
            acc.skipped_pings += 1;
        }
    }

    debug!(
        "Aggregated {} admitted pings over {} dates ({} skipped)",
        acc.admitted_pings,
        acc.dates.len(),
        acc.skipped_pings
    );

    acc
}

/// Aggregate and finalize in one step
///
/// **Public** - convenience for single-batch runs
pub fn transform_pings<'a>(pings: impl IntoIterator<Item = &'a Ping>) -> HangReport {
    aggregate_pings(pings).finish()
}

fn add_hang(date: &mut DateAccumulator, thread: &str, hang: &Hang) {
    let (hang_ms, hang_count) = hang.histogram.weighted_totals();
    let key = StackKey::new(&hang.stack, hang.native_stack.as_ref());

    date.threads
        .entry(thread.to_string())
        .or_default()
        .entry(top_frame_key(&hang.stack))
        .or_default()
        .add(key, Totals { hang_ms, hang_count });
}

fn finish_date(acc: DateAccumulator) -> DateReport {
    let divisor = acc.usage_seconds as f64 / USAGE_DIVISOR;

    let threads = acc
        .threads
        .into_iter()
        .map(|(thread, groups)| {
            let report: ThreadReport = groups
                .into_iter()
                .map(|(top_frame, group)| (top_frame, finish_group(group, divisor)))
                .collect();
            (thread, report)
        })
        .collect();

    DateReport {
        usage_seconds: acc.usage_seconds,
        threads,
    }
}

fn finish_group(group: GroupAccumulator, divisor: f64) -> TopFrameGroup {
    let mut entries = group.entries;
    // Stable: equal totals keep first-seen order
    entries.sort_by(|a, b| b.1.hang_ms.cmp(&a.1.hang_ms));

    let stacks: Vec<StackEntry> = entries
        .into_iter()
        .map(|(key, totals)| StackEntry {
            pseudo_stack: key.pseudo_stack,
            native: key.native.map(NativeFrames::Unresolved),
            hang_ms_per_hour: rate(totals.hang_ms, divisor),
            hang_count_per_hour: rate(totals.hang_count, divisor),
        })
        .collect();

    TopFrameGroup {
        hang_ms_per_hour: stacks.iter().map(|s| s.hang_ms_per_hour).sum(),
        hang_count_per_hour: stacks.iter().map(|s| s.hang_count_per_hour).sum(),
        stacks,
    }
}

fn rate(total: u64, divisor: f64) -> f64 {
    if divisor > 0.0 {
        total as f64 / divisor
    } else {
        0.0
    }
}
