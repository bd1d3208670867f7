//! PathMap: a compact, human-inspectable, read-only file format mapping
//! string paths to JSON payloads via an offset-addressed radix trie, plus
//! a Bloom filter companion over the key set.

pub mod bloom;
pub mod node_line;
pub mod path;
pub mod reader;
pub mod segment;
pub mod trie;
pub mod writer;

pub use bloom::{BloomConfig, BloomFilter};
pub use node_line::{NodeLine, Ref};
pub use reader::PathMapReader;
pub use trie::{PathTrie, TrieNode};
pub use writer::PathMapWriter;
