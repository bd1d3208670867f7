//! In-memory trie — an unordered segment -> child mapping with an
//! optional self-payload at any depth.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::Result;
use crate::pathmap::path::split_segments;

/// One node of the trie: an optional self-payload plus children keyed by
/// segment. The root is the node reached by consuming the leading empty
/// segment that precedes the first `/`.
#[derive(Debug, Clone, Default)]
pub struct TrieNode {
    pub payload: Option<Value>,
    pub children: HashMap<String, TrieNode>,
}

impl TrieNode {
    fn new() -> Self {
        Self::default()
    }
}

/// A mutable, in-memory trie built up via repeated [`PathTrie::insert`]
/// and consumed once by [`crate::pathmap::writer::PathMapWriter`].
#[derive(Debug, Clone, Default)]
pub struct PathTrie {
    pub root: TrieNode,
}

impl PathTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `payload` at `path`, overwriting any prior value at that
    /// exact path. Fails with [`crate::error::PathMapError::PathShape`]
    /// if `path` does not start with `/`.
    pub fn insert(&mut self, path: &str, payload: Value) -> Result<()> {
        let segments = split_segments(path)?;
        let mut node = &mut self.root;
        for segment in segments {
            node = node.children.entry(segment).or_insert_with(TrieNode::new);
        }
        node.payload = Some(payload);
        Ok(())
    }

    /// Insert every entry of `map`. Equivalent to calling [`Self::insert`]
    /// for each entry, in the map's iteration order.
    pub fn bulk_insert(
        &mut self,
        map: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<()> {
        for (path, payload) in map {
            self.insert(&path, payload)?;
        }
        Ok(())
    }

    /// Return the payload stored at `path`, or `None` if no such path was
    /// inserted (any segment along the way has no matching child).
    pub fn find(&self, path: &str) -> Result<Option<&Value>> {
        let segments = split_segments(path)?;
        let mut node = &self.root;
        for segment in segments {
            match node.children.get(&segment) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        Ok(node.payload.as_ref())
    }
}
