//! PathMap -- a compact, human-inspectable, read-only file format for
//! datasets that map a very large number of string keys (typically
//! URL-style paths) to small structured payloads.
//!
//! A writer ([`PathTrie`] + [`PathMapWriter`]) builds the file from an
//! in-memory key -> payload mapping; a reader ([`PathMapReader`]) opens
//! the file and answers point lookups without materializing the whole
//! structure. A [`BloomFilter`] companion over the key set lets readers
//! short-circuit absence checks.
//!
//! ```
//! use pathmap::{PathTrie, PathMapWriter, PathMapReader};
//! use serde_json::json;
//!
//! let mut trie = PathTrie::new();
//! trie.insert("/women/trousers/yoga-pants/black", json!(1)).unwrap();
//! trie.insert("/women/trousers/yoga-pants/blue", json!(2)).unwrap();
//!
//! let bytes = PathMapWriter::stringify(&trie).unwrap();
//! let reader = PathMapReader::new(&bytes).unwrap();
//! assert_eq!(
//!     reader.find("/women/trousers/yoga-pants/black").unwrap(),
//!     Some(json!(1)),
//! );
//! assert_eq!(reader.find("/women/trousers/yoga-pants/red").unwrap(), None);
//! ```

pub mod error;
pub mod pathmap;

pub use error::{PathMapError, Result};
pub use pathmap::{BloomConfig, BloomFilter, NodeLine, PathMapReader, PathMapWriter, PathTrie, Ref, TrieNode};
