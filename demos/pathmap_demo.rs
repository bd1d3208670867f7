//! PathMap demo -- build a small file, write it to disk, then reopen it
//! via mmap and run a few lookups.
//!
//! Usage:
//!   cargo run --example pathmap-demo -- /tmp/demo.pathmap

use std::env;
use std::path::PathBuf;

use anyhow::Result;
use pathmap::{PathMapReader, PathMapWriter, PathTrie};
use serde_json::json;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let out_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| env::temp_dir().join("pathmap_demo.pathmap"));

    let mut trie = PathTrie::new();
    trie.insert("/women/trousers/yoga-pants/black", json!(1))?;
    trie.insert("/women/trousers/yoga-pants/blue", json!(2))?;
    trie.insert("/women/trousers/yoga-pants/brown", json!(3))?;
    trie.insert("/women/trousers/zip-off-trousers/black", json!(1))?;
    trie.insert("/women/trousers/zip-off-trousers/blue", json!(2))?;
    trie.insert("/women/trousers/zip-off-trousers/brown", json!(3))?;
    trie.insert("/featured", json!(true))?;

    PathMapWriter::write_to_file(&trie, &out_path)?;
    let written = std::fs::metadata(&out_path)?.len();
    println!("wrote {written} bytes to {}", out_path.display());

    let reader = PathMapReader::open(&out_path)?;
    for path in [
        "/women/trousers/yoga-pants/black",
        "/featured",
        "/women/trousers/yoga-pants/red",
    ] {
        println!("{path} -> {:?}", reader.find(path)?);
    }

    Ok(())
}
