//! Reader — locates the root line via end-of-file scan, then resolves a
//! lookup path through successive node lines using stored byte offsets,
//! parsing only the lines it touches.
//!
//! Grounded on `storage_v2::string_table::StringTableV2`'s read-only,
//! bounds-checked, offset-addressed access pattern, and on the mmap
//! rationale of the whole `storage_v2` subsystem for [`PathMapReader::open`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{PathMapError, Result};
use crate::pathmap::node_line::{NodeLine, Ref};
use crate::pathmap::path::split_segments;

/// A byte buffer a [`PathMapReader`] can be constructed over: either an
/// owned `Vec<u8>`/borrowed slice, or a memory-mapped file.
enum Backing {
    Owned(Vec<u8>),
    Mapped(memmap2::Mmap),
}

impl std::ops::Deref for Backing {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        match self {
            Backing::Owned(v) => v.as_slice(),
            Backing::Mapped(m) => &m[..],
        }
    }
}

/// A decoded line: either a node line or a leaf JSON value, cached by the
/// offset it was read from.
#[derive(Debug, Clone)]
enum CachedLine {
    Node(Arc<NodeLine>),
    Leaf(Arc<Value>),
}

/// Read-only view over a serialized PathMap file. Construct once, then
/// call [`Self::find`] any number of times; repeated traversals reuse the
/// internal parse cache and never re-decode an offset twice.
///
/// The cache is an ordinary `RefCell`-guarded table: a reader instance is
/// not `Sync` for concurrent mutation of its own cache, but multiple
/// independent reader instances over the same backing bytes are safe to
/// use from separate threads.
pub struct PathMapReader {
    bytes: Backing,
    root_offset: u64,
    cache: RefCell<HashMap<u64, CachedLine>>,
}

impl PathMapReader {
    /// Construct a reader over in-memory bytes (owned `Vec<u8>` or a
    /// borrowed slice, copied once).
    pub fn new(bytes: impl AsRef<[u8]>) -> Result<Self> {
        Self::from_backing(Backing::Owned(bytes.as_ref().to_vec()))
    }

    /// Construct a reader by memory-mapping `path`. Zero-copy: the file is
    /// never read into a `Vec`, matching the teacher's mmap-based segment
    /// design.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        // Safety: the caller must not mutate the underlying file while
        // this mapping is alive. PathMap files are immutable by contract,
        // so this holds for well-behaved callers.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Self::from_backing(Backing::Mapped(mmap))
    }

    fn from_backing(bytes: Backing) -> Result<Self> {
        let root_offset = find_root_offset(&bytes)?;
        Ok(Self {
            bytes,
            root_offset,
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// Resolve `path` to its payload, or `None` if absent.
    pub fn find(&self, path: &str) -> Result<Option<Value>> {
        let segments = split_segments(path)?;

        let root = match self.decode_at(self.root_offset)? {
            CachedLine::Node(n) => n,
            CachedLine::Leaf(_) => return Err(PathMapError::UnexpectedPayload(self.root_offset)),
        };

        let mut current = root;
        let mut segments = segments.into_iter().peekable();

        while let Some(segment) = segments.next() {
            match current.children.get(&segment) {
                None => return Ok(None),
                Some(Ref::Inline) => {
                    if segments.peek().is_some() {
                        return Ok(None);
                    }
                    return Ok(Some(Value::Bool(true)));
                }
                Some(Ref::Offset(offset)) => match self.decode_at(*offset)? {
                    CachedLine::Leaf(v) => {
                        if segments.peek().is_some() {
                            return Ok(None);
                        }
                        return Ok(Some((*v).clone()));
                    }
                    // Whether or not this was the last segment, descending
                    // into a node line just continues the traversal: if
                    // segments remain the next iteration consumes them
                    // against `current`'s children; if none remain the
                    // loop ends and falls through to the self-reference
                    // resolution below.
                    CachedLine::Node(n) => current = n,
                },
            }
        }

        self.resolve_self(&current)
    }

    fn decode_at(&self, offset: u64) -> Result<CachedLine> {
        if let Some(cached) = self.cache.borrow().get(&offset) {
            return Ok(cached.clone());
        }

        let line = read_line(&self.bytes, offset)?;
        let decoded = if starts_node_line(line) {
            CachedLine::Node(Arc::new(NodeLine::decode(line).map_err(|e| {
                tracing::warn!(offset, error = %e, "malformed node line");
                e
            })?))
        } else {
            let value: Value = serde_json::from_str(line)?;
            CachedLine::Leaf(Arc::new(value))
        };

        self.cache.borrow_mut().insert(offset, decoded.clone());
        Ok(decoded)
    }

    /// Resolve a node's self-reference, if any: `true` for the inline
    /// marker, or the JSON payload at the referenced offset. A node's own
    /// self-reference always points to a leaf line -- the writer only
    /// ever reaches it through its leaf-emitting path, never its node-line
    /// path -- so an offset self-reference here is always resolved as
    /// JSON, never re-entered as a node line.
    fn resolve_self(&self, node: &NodeLine) -> Result<Option<Value>> {
        match node.self_ref {
            None => Ok(None),
            Some(Ref::Inline) => Ok(Some(Value::Bool(true))),
            Some(Ref::Offset(offset)) => match self.decode_at(offset)? {
                CachedLine::Leaf(v) => Ok(Some((*v).clone())),
                CachedLine::Node(_) => Err(PathMapError::MalformedLine(format!(
                    "self-reference at offset {offset} points to a node line, not a JSON payload"
                ))),
            },
        }
    }
}

/// A node line starts with one of the node grammar's reserved starters
/// (`/`, `:`, `!`), or is empty. Any other starter is a JSON value
/// (`"`, `{`, `[`, digit, `-`, `t`, `f`, `n`).
fn starts_node_line(line: &str) -> bool {
    match line.as_bytes().first() {
        None => true,
        Some(b'/') | Some(b':') | Some(b'!') => true,
        _ => false,
    }
}

/// Scan backward from the end of the buffer to find the offset of the
/// root line: the last non-empty line, ignoring any trailing newlines.
fn find_root_offset(bytes: &[u8]) -> Result<u64> {
    if bytes.is_empty() {
        return Err(PathMapError::UnexpectedEOF(0));
    }
    let mut end = bytes.len();
    while end > 0 && bytes[end - 1] == b'\n' {
        end -= 1;
    }
    // If the buffer is nothing but newlines, the root line is the empty
    // line immediately preceding the final one -- offset 0. This is the
    // degenerate empty-trie case: an empty node line (no self-payload, no
    // children) still decodes to the empty mapping.
    let mut start = end;
    while start > 0 && bytes[start - 1] != b'\n' {
        start -= 1;
    }
    Ok(start as u64)
}

/// Read the line starting at byte offset `offset`, scanning forward to
/// the next `\n`. Fails with [`PathMapError::UnexpectedEOF`] if no
/// newline follows before the end of the buffer.
fn read_line(bytes: &[u8], offset: u64) -> Result<&str> {
    let start = offset as usize;
    if start > bytes.len() {
        return Err(PathMapError::UnexpectedEOF(offset));
    }
    let rel_newline = bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(PathMapError::UnexpectedEOF(offset))?;
    std::str::from_utf8(&bytes[start..start + rel_newline])
        .map_err(|_| PathMapError::MalformedLine("line is not valid UTF-8".to_string()))
}

impl std::fmt::Debug for PathMapReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathMapReader")
            .field("len", &self.bytes.len())
            .field("root_offset", &self.root_offset)
            .finish()
    }
}
