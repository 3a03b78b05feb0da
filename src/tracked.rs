//! Named hang classifiers and their per-date summaries.
//!
//! Classifiers look only at pseudo-stack frames. They are independent of the
//! date/thread/top-frame grouping and produce cross-cutting totals such as
//! "all hangs in devtools code".

use crate::aggregator::admit;
use crate::parser::{flatten_hangs, Frame, Ping};
use crate::utils::config::USAGE_DIVISOR;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named predicate over a hang's pseudo-stack
pub trait HangClassifier: Send + Sync {
    fn title(&self) -> &str;
    fn matches(&self, stack: &[Frame]) -> bool;
}

/// Matches every hang, including ones without a pseudo-stack
#[derive(Debug, Clone, Copy, Default)]
pub struct AllHangs;

impl HangClassifier for AllHangs {
    fn title(&self) -> &str {
        "All Hangs"
    }

    fn matches(&self, _stack: &[Frame]) -> bool {
        true
    }
}

/// Matches when one frame's symbol contains every needle
#[derive(Debug, Clone, Copy)]
pub struct SubstringClassifier {
    pub title: &'static str,
    pub needles: &'static [&'static str],
}

impl HangClassifier for SubstringClassifier {
    fn title(&self) -> &str {
        self.title
    }

    fn matches(&self, stack: &[Frame]) -> bool {
        stack.iter().any(|frame| {
            frame
                .name
                .as_deref()
                .is_some_and(|name| self.needles.iter().all(|needle| name.contains(needle)))
        })
    }
}

const SUBSTRING_CLASSIFIERS: &[SubstringClassifier] = &[
    SubstringClassifier { title: "Devtools Hangs", needles: &["devtools/"] },
    SubstringClassifier { title: "Toolbox Hangs", needles: &["toolbox.js"] },
    SubstringClassifier { title: "Netmonitor Hangs", needles: &["/netmonitor/"] },
    SubstringClassifier {
        title: "Netmonitor Batching Hangs",
        needles: &["netmonitor/src/middleware/batching"],
    },
    SubstringClassifier {
        title: "Netmonitor Selectors Hangs",
        needles: &["netmonitor/src/selectors"],
    },
    SubstringClassifier {
        title: "Netmonitor Components Hangs",
        needles: &["netmonitor/src/components"],
    },
    SubstringClassifier { title: "Netmonitor backend Hangs", needles: &["/network-monitor.js"] },
    SubstringClassifier { title: "React Hangs", needles: &["devtools/", "vendor/react"] },
    SubstringClassifier { title: "Immutable Hangs", needles: &["devtools/", "vendor/immutable"] },
    SubstringClassifier { title: "Inspector Hangs", needles: &["/inspector/"] },
    SubstringClassifier { title: "Console Hangs", needles: &["/webconsole/"] },
    SubstringClassifier { title: "Debugger Hangs", needles: &["/debugger/"] },
];

/// The registered classifiers, in report order
///
/// **Public** - fixed list used by the report command
pub fn tracked_classifiers() -> Vec<Box<dyn HangClassifier>> {
    let mut classifiers: Vec<Box<dyn HangClassifier>> = vec![Box::new(AllHangs)];
    classifiers.extend(
        SUBSTRING_CLASSIFIERS
            .iter()
            .map(|c| Box::new(*c) as Box<dyn HangClassifier>),
    );
    classifiers
}

/// Normalized totals of one classifier on one date
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackedRates {
    pub hang_ms_per_hour: f64,
    pub hang_count_per_hour: f64,
}

/// Per-date totals of one classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedStat {
    pub title: String,
    pub dates: BTreeMap<String, TrackedRates>,
}

/// Summarize matching hangs for each classifier
///
/// **Public** - uses the same eligibility, bucket rules and per-date usage
/// denominator as the main report
pub fn summarize_tracked(pings: &[Ping], classifiers: &[Box<dyn HangClassifier>]) -> Vec<TrackedStat> {
    let mut usage: BTreeMap<String, u64> = BTreeMap::new();
    // classifier index -> date -> (ms, count)
    let mut totals: Vec<BTreeMap<String, (u64, u64)>> = vec![BTreeMap::new(); classifiers.len()];

    for ping in pings {
        let admitted = match admit(ping) {
            Ok(Some(admitted)) => admitted,
            Ok(None) => continue,
            Err(e) => {
                warn!("Skipping malformed ping in tracked summary: {}", e);
                continue;
            }
        };

        let date_usage = usage.entry(admitted.date.clone()).or_default();
        *date_usage = date_usage.saturating_add(admitted.usage_seconds);

        for observed in flatten_hangs(ping) {
            let (ms, count) = observed.hang.histogram.weighted_totals();
            for (i, classifier) in classifiers.iter().enumerate() {
                if classifier.matches(&observed.hang.stack) {
                    let slot = totals[i].entry(admitted.date.clone()).or_default();
                    slot.0 = slot.0.saturating_add(ms);
                    slot.1 = slot.1.saturating_add(count);
                }
            }
        }
    }

    debug!("Summarized {} classifiers over {} dates", classifiers.len(), usage.len());

    classifiers
        .iter()
        .zip(totals)
        .map(|(classifier, per_date)| TrackedStat {
            title: classifier.title().to_string(),
            dates: per_date
                .into_iter()
                .map(|(date, (ms, count))| {
                    let divisor = usage.get(&date).copied().unwrap_or(0) as f64 / USAGE_DIVISOR;
                    let rates = if divisor > 0.0 {
                        TrackedRates {
                            hang_ms_per_hour: ms as f64 / divisor,
                            hang_count_per_hour: count as f64 / divisor,
                        }
                    } else {
                        TrackedRates::default()
                    };
                    (date, rates)
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Hang, Histogram, ThreadHangStats};

    fn frames(names: &[&str]) -> Vec<Frame> {
        names.iter().map(|n| Frame::named(*n)).collect()
    }

    fn classifier(title: &str) -> Box<dyn HangClassifier> {
        tracked_classifiers()
            .into_iter()
            .find(|c| c.title() == title)
            .unwrap()
    }

    #[test]
    fn test_registered_order() {
        let titles: Vec<String> = tracked_classifiers()
            .iter()
            .map(|c| c.title().to_string())
            .collect();
        assert_eq!(titles.len(), 13);
        assert_eq!(titles[0], "All Hangs");
        assert_eq!(titles[12], "Debugger Hangs");
    }

    #[test]
    fn test_all_hangs_matches_empty_stack() {
        assert!(AllHangs.matches(&[]));
        assert!(!classifier("Devtools Hangs").matches(&[]));
    }

    #[test]
    fn test_substring_match() {
        let stack = frames(&["nsThread::Run", "resource://devtools/client/netmonitor/src/selectors/index.js"]);
        assert!(classifier("Devtools Hangs").matches(&stack));
        assert!(classifier("Netmonitor Hangs").matches(&stack));
        assert!(classifier("Netmonitor Selectors Hangs").matches(&stack));
        assert!(!classifier("Inspector Hangs").matches(&stack));
    }

    #[test]
    fn test_all_needles_in_same_frame() {
        let split = frames(&["devtools/client/app.js", "vendor/react.js"]);
        assert!(!classifier("React Hangs").matches(&split));

        let joined = frames(&["devtools/client/shared/vendor/react.js"]);
        assert!(classifier("React Hangs").matches(&joined));
    }

    #[test]
    fn test_summarize_uses_date_usage() {
        let hang = |names: &[&str]| {
            Hang::new(frames(names), Histogram::from_counts(&[(64, 5), (128, 1), (256, 1)]), None)
        };
        let ping = Ping {
            os_name: "Windows_NT".to_string(),
            build_id: "20170317000000".to_string(),
            subsession_length: 120,
            thread_hang_stats: vec![ThreadHangStats {
                name: "Gecko".to_string(),
                hangs: vec![hang(&["devtools/a.js"]), hang(&["other"])],
            }],
            child_payloads: Vec::new(),
        };

        let stats = summarize_tracked(&[ping], &tracked_classifiers());

        let all = &stats[0].dates["20170317"];
        assert_eq!(all.hang_ms_per_hour, 2.0 * 384.0 / 2.0);
        assert_eq!(all.hang_count_per_hour, 2.0);

        let devtools = &stats[1].dates["20170317"];
        assert_eq!(devtools.hang_ms_per_hour, 384.0 / 2.0);
        assert!(stats[2].dates.is_empty());
    }

    #[test]
    fn test_summarize_saturates_on_huge_input() {
        let ping = Ping {
            os_name: "Windows_NT".to_string(),
            build_id: "20170317000000".to_string(),
            subsession_length: i64::MAX,
            thread_hang_stats: vec![ThreadHangStats {
                name: "Gecko".to_string(),
                hangs: vec![Hang::new(
                    frames(&["top"]),
                    Histogram::from_counts(&[(64, 0), (128, u64::MAX / 2), (256, u64::MAX / 2)]),
                    None,
                )],
            }],
            child_payloads: Vec::new(),
        };
        let pings = vec![ping.clone(), ping.clone(), ping];

        let stats = summarize_tracked(&pings, &[Box::new(AllHangs) as Box<dyn HangClassifier>]);

        let all = &stats[0].dates["20170317"];
        assert!(all.hang_ms_per_hour.is_finite());
        assert!(all.hang_ms_per_hour > 0.0);
    }
}
