//! Ping schema definitions.
//!
//! Pings arrive as JSON documents whose top-level keys are flattened
//! telemetry paths (e.g. `payload/info/subsessionLength`). Everything the
//! aggregation needs is typed here; unknown keys are ignored.

use crate::utils::error::ParseError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One telemetry submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ping {
    /// Operating system name (e.g. "Windows_NT")
    #[serde(rename = "environment/system/os/name")]
    pub os_name: String,

    /// Build identifier, prefixed with the build date as YYYYMMDD
    #[serde(rename = "application/buildId")]
    pub build_id: String,

    /// Subsession usage in seconds
    #[serde(rename = "payload/info/subsessionLength")]
    pub subsession_length: i64,

    /// Thread hang records of the parent process
    #[serde(rename = "payload/threadHangStats", default, deserialize_with = "nullable")]
    pub thread_hang_stats: Vec<ThreadHangStats>,

    /// Thread hang records of child processes
    #[serde(rename = "payload/childPayloads", default, deserialize_with = "nullable")]
    pub child_payloads: Vec<ChildPayload>,
}

/// Hang records reported by one child process
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChildPayload {
    #[serde(rename = "threadHangStats", default, deserialize_with = "nullable")]
    pub thread_hang_stats: Vec<ThreadHangStats>,
}

/// All hangs observed on one named thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadHangStats {
    pub name: String,

    #[serde(default, deserialize_with = "nullable")]
    pub hangs: Vec<Hang>,
}

/// One sampled stall event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hang {
    /// Pseudo-stack, root first. May be empty.
    #[serde(default, deserialize_with = "nullable")]
    pub stack: Vec<Frame>,

    /// Stall duration histogram
    pub histogram: Histogram,

    /// Native stack, when the client captured one
    #[serde(rename = "nativeStack", default, skip_serializing_if = "Option::is_none")]
    pub native_stack: Option<NativeStack>,
}

impl Hang {
    pub fn new(stack: Vec<Frame>, histogram: Histogram, native_stack: Option<NativeStack>) -> Self {
        Self {
            stack,
            histogram,
            native_stack,
        }
    }
}

/// A pseudo-stack frame: library plus symbol, either of which may be missing
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawFrame", into = "RawFrame")]
pub struct Frame {
    pub library: Option<String>,
    pub name: Option<String>,
}

impl Frame {
    /// Frame carrying only a symbol name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            library: None,
            name: Some(name.into()),
        }
    }

    pub fn with_library(library: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            library: Some(library.into()),
            name: Some(name.into()),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.library) {
            (Some(name), _) => f.write_str(name),
            (None, Some(library)) => f.write_str(library),
            (None, None) => f.write_str("(unknown)"),
        }
    }
}

/// Wire form of a frame: a bare symbol or a `[library, symbol]` pair
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawFrame {
    Symbol(Option<String>),
    Pair(Option<String>, Option<String>),
}

impl From<RawFrame> for Frame {
    fn from(raw: RawFrame) -> Self {
        match raw {
            RawFrame::Symbol(name) => Frame { library: None, name },
            RawFrame::Pair(library, name) => Frame { library, name },
        }
    }
}

impl From<Frame> for RawFrame {
    fn from(frame: Frame) -> Self {
        match frame.library {
            None => RawFrame::Symbol(frame.name),
            library => RawFrame::Pair(library, frame.name),
        }
    }
}

/// Stall duration histogram: bucket lower bound in ms -> occurrences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawHistogram", into = "RawHistogram")]
pub struct Histogram {
    pub values: BTreeMap<u64, u64>,
}

impl Histogram {
    /// Build a histogram from `(bucket_ms, count)` pairs
    pub fn from_counts(counts: &[(u64, u64)]) -> Self {
        Self {
            values: counts.iter().copied().collect(),
        }
    }

    /// Buckets that count as reportable hangs.
    ///
    /// The smallest bucket holds sub-threshold stalls and is always skipped.
    pub fn reportable_buckets(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.values.iter().skip(1).map(|(&ms, &count)| (ms, count))
    }

    /// `(sum of count * bucket_ms, sum of count)` over reportable buckets
    ///
    /// Saturates at `u64::MAX` instead of overflowing.
    pub fn weighted_totals(&self) -> (u64, u64) {
        self.reportable_buckets()
            .fold((0u64, 0u64), |(ms, count), (bucket_ms, bucket_count)| {
                (
                    ms.saturating_add(bucket_count.saturating_mul(bucket_ms)),
                    count.saturating_add(bucket_count),
                )
            })
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct RawHistogram {
    values: BTreeMap<String, u64>,
}

impl TryFrom<RawHistogram> for Histogram {
    type Error = ParseError;

    fn try_from(raw: RawHistogram) -> Result<Self, Self::Error> {
        let mut values = BTreeMap::new();
        for (bucket, count) in raw.values {
            let ms = bucket
                .trim()
                .parse::<u64>()
                .map_err(|_| ParseError::InvalidBucket(bucket.clone()))?;
            let slot = values.entry(ms).or_insert(0u64);
            *slot = slot.saturating_add(count);
        }
        Ok(Histogram { values })
    }
}

impl From<Histogram> for RawHistogram {
    fn from(histogram: Histogram) -> Self {
        RawHistogram {
            values: histogram
                .values
                .into_iter()
                .map(|(ms, count)| (ms.to_string(), count))
                .collect(),
        }
    }
}

/// Native stack as captured by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeStack {
    /// Module table: (library file name, debug id)
    #[serde(rename = "memoryMap", default)]
    pub memory_map: Vec<(String, String)>,

    /// Stacks of (module index, offset). Index -1 means no module.
    #[serde(default)]
    pub stacks: Vec<Vec<(i64, u64)>>,
}

impl NativeStack {
    /// The stack attached to the hang (the first one reported)
    pub fn frames(&self) -> &[(i64, u64)] {
        self.stacks.first().map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Treat an explicit `null` like a missing field
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
