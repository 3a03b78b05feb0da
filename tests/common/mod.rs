#![allow(dead_code)]

use hang_reporter::parser::{parse_pings, Ping};
use serde_json::{json, Value};

pub const WINDOWS: &str = "Windows_NT";
pub const NOT_WINDOWS: &str = "linux";

pub const B_1: &str = "20170317987654321";
// same day as B_1
pub const B_2: &str = "20170317123456789";
// different day
pub const B_3: &str = "20170316123456789";

pub const S_0: &[&str] = &[];
pub const S_1: &[&str] = &["stack1", "topframe1"];
pub const S_2: &[&str] = &["stack2", "topframe1"];
pub const S_3: &[&str] = &["stack3", "topframe2"];

pub const T_1: &str = "Gecko";
pub const T_2: &str = "Gecko_Child";
pub const T_3: &str = "NotGecko1";
pub const T_4: &str = "NotGecko2";

/// (thread, stacks, histogram counts for 64/128/256, native stacks)
pub type ThreadSpec = (
    &'static str,
    Vec<&'static [&'static str]>,
    Vec<(u64, u64, u64)>,
    Option<Vec<Value>>,
);

pub fn native(debug_id: &str, first: u64) -> Value {
    json!({
        "memoryMap": [["xul.pdb", debug_id]],
        "stacks": [[[0, first], [-1, first + 1]]]
    })
}

fn thread_stats(spec: &ThreadSpec) -> Value {
    let (name, stacks, histograms, natives) = spec;
    let hangs: Vec<Value> = stacks
        .iter()
        .zip(histograms)
        .enumerate()
        .map(|(i, (stack, h))| {
            let mut hang = json!({
                "histogram": {"values": {"64": h.0, "128": h.1, "256": h.2}},
                "stack": stack,
            });
            if let Some(natives) = natives {
                hang["nativeStack"] = natives[i].clone();
            }
            hang
        })
        .collect();

    json!({"name": name, "hangs": hangs})
}

pub fn parent_ping(os: &str, build_id: &str, usage: i64, threads: Vec<ThreadSpec>) -> Value {
    let stats: Vec<Value> = threads.iter().map(thread_stats).collect();
    json!({
        "environment/system/os/name": os,
        "application/buildId": build_id,
        "payload/info/subsessionLength": usage,
        "payload/childPayloads": [],
        "payload/threadHangStats": stats,
    })
}

pub fn child_ping(os: &str, build_id: &str, usage: i64, children: Vec<Vec<ThreadSpec>>) -> Value {
    let payloads: Vec<Value> = children
        .iter()
        .map(|threads| {
            let stats: Vec<Value> = threads.iter().map(thread_stats).collect();
            json!({"threadHangStats": stats})
        })
        .collect();
    json!({
        "environment/system/os/name": os,
        "application/buildId": build_id,
        "payload/info/subsessionLength": usage,
        "payload/childPayloads": payloads,
        "payload/threadHangStats": [],
    })
}

pub fn decode(raw: Vec<Value>) -> Vec<Ping> {
    let parsed = parse_pings(&raw);
    assert_eq!(parsed.skipped, 0, "fixture pings must decode");
    parsed.pings
}

pub fn simple_data() -> Vec<Ping> {
    decode(vec![
        parent_ping(
            WINDOWS,
            B_1,
            100,
            vec![
                (T_1, vec![S_1, S_2, S_0], vec![(1, 2, 3), (3, 2, 1), (0, 1, 0)], None),
                // second thread lands in its own report
                (T_4, vec![S_1, S_2], vec![(1, 2, 3), (3, 2, 1)], None),
            ],
        ),
        parent_ping(WINDOWS, B_2, 200, vec![(T_1, vec![S_3, S_2], vec![(1, 3, 2), (3, 4, 5)], None)]),
        // excluded: no usage
        parent_ping(WINDOWS, B_2, 0, vec![(T_1, vec![S_3, S_2], vec![(1, 3, 2), (3, 4, 5)], None)]),
        // excluded: wrong platform
        parent_ping(NOT_WINDOWS, B_2, 200, vec![(T_1, vec![S_3, S_2], vec![(7, 8, 9), (6, 7, 8)], None)]),
        // different date
        parent_ping(WINDOWS, B_3, 100, vec![(T_1, vec![S_1, S_2], vec![(1, 2, 3), (3, 2, 1)], None)]),
        // different thread
        parent_ping(WINDOWS, B_1, 100, vec![(T_3, vec![S_1, S_2], vec![(1, 2, 3), (3, 2, 1)], None)]),
    ])
}

pub fn child_payloads_data() -> Vec<Ping> {
    decode(vec![
        child_ping(WINDOWS, B_1, 100, vec![vec![(T_2, vec![S_1, S_2], vec![(1, 2, 3), (3, 2, 1)], None)]]),
        child_ping(
            WINDOWS,
            B_2,
            200,
            vec![
                vec![(T_2, vec![S_2, S_3], vec![(3, 2, 3), (1, 2, 1)], None)],
                vec![(T_2, vec![S_3, S_2], vec![(3, 1, 1), (4, 2, 2)], None)],
            ],
        ),
        child_ping(WINDOWS, B_1, 0, vec![vec![(T_2, vec![S_1, S_2], vec![(1, 2, 3), (3, 2, 1)], None)]]),
        child_ping(NOT_WINDOWS, B_2, 200, vec![vec![(T_2, vec![S_3, S_2], vec![(7, 8, 9), (6, 7, 8)], None)]]),
        child_ping(WINDOWS, B_3, 100, vec![vec![(T_2, vec![S_1, S_2], vec![(1, 2, 3), (3, 2, 1)], None)]]),
        child_ping(WINDOWS, B_1, 100, vec![vec![(T_3, vec![S_1, S_2], vec![(1, 2, 3), (3, 2, 1)], None)]]),
    ])
}

pub fn native_stack_data() -> Vec<Ping> {
    decode(vec![
        parent_ping(
            WINDOWS,
            B_1,
            100,
            vec![(
                T_1,
                vec![S_1, S_2],
                vec![(1, 2, 3), (3, 2, 1)],
                Some(vec![native("native1", 11111), native("native2", 22222)]),
            )],
        ),
        parent_ping(
            WINDOWS,
            B_2,
            200,
            vec![(
                T_1,
                vec![S_3, S_2],
                vec![(1, 3, 2), (3, 4, 5)],
                Some(vec![native("native1", 11111), native("native3", 33333)]),
            )],
        ),
    ])
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
