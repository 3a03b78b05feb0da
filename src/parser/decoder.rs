//! Flatten a ping into per-thread hang observations.
//!
//! Parent-process records come first, followed by each child payload's
//! records in the order they were reported. Nothing is filtered here.

use super::schema::{Hang, Ping, ThreadHangStats};

/// One hang together with the thread it was observed on
#[derive(Debug, Clone, Copy)]
pub struct ThreadHang<'a> {
    pub thread: &'a str,
    pub hang: &'a Hang,
}

/// Flatten parent and child thread-hang records of a ping
///
/// **Public** - used by the aggregator and the tracked summaries
pub fn flatten_hangs(ping: &Ping) -> Vec<ThreadHang<'_>> {
    let child_stats = ping
        .child_payloads
        .iter()
        .flat_map(|child| child.thread_hang_stats.iter());

    ping.thread_hang_stats
        .iter()
        .chain(child_stats)
        .flat_map(thread_hangs)
        .collect()
}

fn thread_hangs(stats: &ThreadHangStats) -> impl Iterator<Item = ThreadHang<'_>> {
    stats.hangs.iter().map(move |hang| ThreadHang {
        thread: stats.name.as_str(),
        hang,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_parent_then_children() {
        let ping: Ping = serde_json::from_value(json!({
            "environment/system/os/name": "Windows_NT",
            "application/buildId": "20170317987654321",
            "payload/info/subsessionLength": 100,
            "payload/threadHangStats": [
                {"name": "Gecko", "hangs": [
                    {"stack": ["a"], "histogram": {"values": {"64": 1}}},
                    {"stack": [], "histogram": {"values": {"64": 1}}}
                ]}
            ],
            "payload/childPayloads": [
                {"threadHangStats": [
                    {"name": "Gecko_Child", "hangs": [
                        {"stack": ["b"], "histogram": {"values": {"64": 1}}}
                    ]}
                ]},
                {"threadHangStats": []}
            ]
        }))
        .unwrap();

        let hangs = flatten_hangs(&ping);
        let threads: Vec<&str> = hangs.iter().map(|h| h.thread).collect();

        assert_eq!(threads, vec!["Gecko", "Gecko", "Gecko_Child"]);
        assert!(hangs[1].hang.stack.is_empty());
    }
}
