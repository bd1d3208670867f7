//! Integration tests: the format-level properties from the PathMap
//! specification's testable-properties section -- round-trip, absence,
//! deduplication, and byte-offset correctness -- exercised against the
//! full writer -> bytes -> reader pipeline rather than individual
//! modules.

use pathmap::{PathMapReader, PathMapWriter, PathTrie};
use proptest::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn arb_segment() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{0,8}"
}

fn arb_path() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_segment(), 0..5)
        .prop_map(|segs| format!("/{}", segs.join("/")))
}

fn arb_payload() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        ".*".prop_map(Value::String),
        proptest::collection::vec(any::<i32>(), 0..4).prop_map(|v| json!(v)),
    ]
}

proptest! {
    #[test]
    fn round_trip_arbitrary_paths(
        pairs in proptest::collection::hash_map(arb_path(), arb_payload(), 0..30)
    ) {
        let mut trie = PathTrie::new();
        for (path, payload) in &pairs {
            trie.insert(path, payload.clone()).unwrap();
        }
        let bytes = PathMapWriter::stringify(&trie).unwrap();
        let reader = PathMapReader::new(&bytes).unwrap();
        for (path, payload) in &pairs {
            prop_assert_eq!(reader.find(path).unwrap(), Some(payload.clone()));
        }
    }

    #[test]
    fn stringify_is_deterministic(
        pairs in proptest::collection::hash_map(arb_path(), arb_payload(), 0..20)
    ) {
        let mut trie = PathTrie::new();
        for (path, payload) in &pairs {
            trie.insert(path, payload.clone()).unwrap();
        }
        let a = PathMapWriter::stringify(&trie).unwrap();
        let b = PathMapWriter::stringify(&trie).unwrap();
        prop_assert_eq!(a, b);
    }
}

#[test]
fn insert_foo_then_query_root_and_deeper_path_are_absent() {
    let mut trie = PathTrie::new();
    trie.insert("/foo", json!("f")).unwrap();
    let bytes = PathMapWriter::stringify(&trie).unwrap();
    let reader = PathMapReader::new(&bytes).unwrap();
    assert_eq!(reader.find("/").unwrap(), None);
    assert_eq!(reader.find("/foo/anything").unwrap(), None);
}

#[test]
fn duplicate_payloads_and_identical_subtrees_collapse_to_one_line() {
    let mut trie = PathTrie::new();
    let colors = [("black", 1), ("blue", 2), ("brown", 3)];
    for (color, val) in colors {
        trie.insert(&format!("/women/trousers/yoga-pants/{color}"), json!(val))
            .unwrap();
        trie.insert(
            &format!("/women/trousers/zip-off-trousers/{color}"),
            json!(val),
        )
        .unwrap();
    }
    let bytes = PathMapWriter::stringify(&trie).unwrap();
    let text = String::from_utf8(bytes).unwrap();

    for val in [1, 2, 3] {
        assert_eq!(
            text.lines().filter(|l| *l == val.to_string()).count(),
            1,
            "payload {val} should appear exactly once"
        );
    }

    // yoga-pants and zip-off-trousers have identical shape (three
    // identical leaf offsets) and must dedupe to a single node line.
    let category_node_lines: Vec<&str> = text
        .lines()
        .filter(|l| l.starts_with('/') && l.matches('/').count() == 3)
        .collect();
    assert_eq!(category_node_lines.len(), 1);
}

#[test]
fn every_offset_reference_points_to_a_line_start() {
    let mut trie = PathTrie::new();
    for i in 0..50 {
        trie.insert(&format!("/a/b/{i}"), json!({"n": i})).unwrap();
    }
    let bytes = PathMapWriter::stringify(&trie).unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();

    let mut line_starts = std::collections::HashSet::new();
    let mut offset = 0usize;
    for line in text.split_inclusive('\n') {
        line_starts.insert(offset as u64);
        offset += line.len();
    }

    for line in text.lines() {
        for offset in extract_offsets(line) {
            assert!(
                line_starts.contains(&offset),
                "offset {offset} in line {line:?} does not point to a line start"
            );
        }
    }
}

fn extract_offsets(line: &str) -> Vec<u64> {
    let mut offsets = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b':' {
            let mut j = i + 1;
            while j < bytes.len() && matches!(bytes[j], b'0'..=b'9' | b'a'..=b'f') {
                j += 1;
            }
            let hex = &line[i + 1..j];
            let n = if hex.is_empty() {
                0
            } else {
                u64::from_str_radix(hex, 16).unwrap()
            };
            offsets.push(n);
            i = j;
        } else {
            i += 1;
        }
    }
    offsets
}

#[test]
fn true_payload_never_emits_its_own_line() {
    let mut trie = PathTrie::new();
    trie.insert("/a/b", json!(true)).unwrap();
    trie.insert("/a/c", json!(true)).unwrap();
    let bytes = PathMapWriter::stringify(&trie).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(!text.lines().any(|l| l == "true"));
}

#[test]
fn reader_open_over_file_matches_reader_new_over_bytes() {
    let mut trie = PathTrie::new();
    trie.insert("/a/b/c", json!({"x": 1, "y": [1, 2, 3]}))
        .unwrap();
    let bytes = PathMapWriter::stringify(&trie).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.pathmap");
    std::fs::write(&path, &bytes).unwrap();

    let from_bytes = PathMapReader::new(&bytes).unwrap();
    let from_file = PathMapReader::open(&path).unwrap();

    assert_eq!(
        from_bytes.find("/a/b/c").unwrap(),
        from_file.find("/a/b/c").unwrap()
    );
}
