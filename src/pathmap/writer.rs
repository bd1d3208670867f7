//! Serializer — depth-first, post-order emission of leaf and node lines
//! into an append-only buffer, with byte offsets assigned as lines are
//! pushed and line-level deduplication.
//!
//! Grounded on `storage_v2::writer::NodeSegmentWriter::finish` (accumulate,
//! then one pass produces the final bytes) and
//! `storage_v2::string_table::StringTableV2::intern` (lookup-or-insert
//! against a dedup table, assign offset, append).

use std::collections::HashMap;

use serde_json::Value;

use crate::error::Result;
use crate::pathmap::node_line::{NodeLine, Ref};
use crate::pathmap::trie::{PathTrie, TrieNode};

/// Serializes a [`PathTrie`] into the PathMap file format.
///
/// `stringify()` is deterministic given the trie's final state: identical
/// trees always serialize to identical bytes, because children are always
/// encoded in ascending segment order and the dedup table is keyed by
/// exact line text.
pub struct PathMapWriter {
    buffer: Vec<u8>,
    /// Offset at which we will begin appending next.
    len: u64,
    /// Already-emitted line text -> the offset at which it was first
    /// emitted.
    seen: HashMap<String, u64>,
}

impl PathMapWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            len: 0,
            seen: HashMap::new(),
        }
    }

    /// Serialize `trie` into file bytes. The root always gets its own node
    /// line, even when it has no children -- a writer must always emit at
    /// least one node line, the root, so readers have somewhere to start.
    pub fn stringify(trie: &PathTrie) -> Result<Vec<u8>> {
        let mut w = PathMapWriter::new();
        w.emit_node_line(&trie.root)?;
        Ok(w.buffer)
    }

    /// Serialize `trie` and write the result to `path`, for symmetry with
    /// [`crate::pathmap::reader::PathMapReader::open`].
    pub fn write_to_file(trie: &PathTrie, path: impl AsRef<std::path::Path>) -> Result<()> {
        let bytes = Self::stringify(trie)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Append `text` plus a trailing `\n` if not already emitted; return
    /// the offset of the (possibly pre-existing) line.
    fn push(&mut self, text: String) -> u64 {
        if let Some(&offset) = self.seen.get(&text) {
            return offset;
        }
        let offset = self.len;
        self.buffer.extend_from_slice(text.as_bytes());
        self.buffer.push(b'\n');
        self.len += text.len() as u64 + 1;
        self.seen.insert(text, offset);
        offset
    }

    /// Emit a leaf payload, returning its reference. A payload equal to
    /// `true` is never written as its own line; it is always the inline
    /// [`Ref::Inline`] marker.
    fn emit_leaf(&mut self, payload: &Value) -> Result<Ref> {
        if payload == &Value::Bool(true) {
            return Ok(Ref::Inline);
        }
        let text = serde_json::to_string(payload)?;
        Ok(Ref::Offset(self.push(text)))
    }

    /// A "leaf-only" node has a self-payload and no children: its whole
    /// subtree is representable as a single JSON line rather than a node
    /// line.
    fn is_leaf_only(node: &TrieNode) -> bool {
        node.payload.is_some() && node.children.is_empty()
    }

    /// Emit a child node, returning the reference by which its parent
    /// should address it. A leaf-only child collapses to its payload line
    /// directly, with no node line of its own. The root never goes through
    /// this path -- see `emit_node_line`.
    fn emit_child(&mut self, node: &TrieNode) -> Result<Ref> {
        if Self::is_leaf_only(node) {
            // The payload may still be `true`, in which case emit_leaf
            // returns Ref::Inline directly without writing a line.
            return self.emit_leaf(node.payload.as_ref().unwrap());
        }
        self.emit_node_line(node)
    }

    /// Emit a node line for `node`, unconditionally, and recurse into its
    /// children. Used for the root (which always gets a node line, even
    /// when leaf-only or entirely empty) and for any non-leaf-only child.
    fn emit_node_line(&mut self, node: &TrieNode) -> Result<Ref> {
        let mut line = NodeLine::new();
        if let Some(payload) = &node.payload {
            line.self_ref = Some(self.emit_leaf(payload)?);
        }

        let mut segments: Vec<&String> = node.children.keys().collect();
        segments.sort();
        for segment in segments {
            let child = &node.children[segment];
            let child_ref = self.emit_child(child)?;
            line.children.insert(segment.clone(), child_ref);
        }

        let offset = self.push(line.encode());
        Ok(Ref::Offset(offset))
    }
}

impl Default for PathMapWriter {
    fn default() -> Self {
        Self::new()
    }
}
