//! Node-line codec — encode/decode one node line: its self-reference
//! plus its ordered segment -> child-reference map.
//!
//! ```text
//! field        := selfField | childField
//! selfField    := ':' hexNat  |  '!'
//! childField   := '/' segEsc ( ':' hexNat | '!' )
//! ```
//!
//! At most one `selfField`, and if present it comes first. All subsequent
//! fields are `childField`s naming distinct segments.

use std::collections::BTreeMap;

use crate::error::{PathMapError, Result};
use crate::pathmap::segment::{decode_until_reserved, escape};

/// A reference to a payload or child line -- a sum type rather than a
/// sentinel integer. Absence (no self-payload, or no such child) is
/// modeled by `Option<Ref>` / not being a map key, not by a third `Ref`
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ref {
    /// The payload is the sentinel value `true`, carried inline.
    Inline,
    /// A byte offset to the line encoding the payload or child node.
    Offset(u64),
}

/// One decoded node line: an optional self-reference and an ordered map
/// from segment to child reference.
///
/// Children are kept in a `BTreeMap` so iteration is always in ascending
/// byte order of the segment -- the required encoding order, and a
/// stable key for writer-side line-content deduplication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeLine {
    pub self_ref: Option<Ref>,
    pub children: BTreeMap<String, Ref>,
}

impl NodeLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode this node line.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        if let Some(r) = self.self_ref {
            match r {
                Ref::Inline => out.push('!'),
                Ref::Offset(n) => {
                    out.push(':');
                    push_hex(&mut out, n);
                }
            }
        }
        for (segment, r) in &self.children {
            out.push('/');
            out.push_str(&escape(segment));
            match r {
                Ref::Inline => out.push('!'),
                Ref::Offset(n) => {
                    out.push(':');
                    push_hex(&mut out, *n);
                }
            }
        }
        out
    }

    /// Decode a node line. An empty input decodes to the empty node.
    /// Fails with [`PathMapError::MalformedLine`] on any grammar
    /// violation: an unknown starter byte, a pending key without a
    /// value marker, a stray value marker without a key, or an
    /// unterminated escape.
    pub fn decode(text: &str) -> Result<Self> {
        let bytes = text.as_bytes();
        let mut node = NodeLine::new();
        let mut i = 0;

        if i < bytes.len() && (bytes[i] == b':' || bytes[i] == b'!') {
            let (r, consumed) = decode_value(&bytes[i..])?;
            node.self_ref = Some(r);
            i += consumed;
        }

        while i < bytes.len() {
            if bytes[i] != b'/' {
                return Err(PathMapError::MalformedLine(format!(
                    "unexpected byte {:?} at position {} (expected '/' to start a child field)",
                    bytes[i] as char, i
                )));
            }
            i += 1; // consume '/'
            let (segment, consumed) = decode_until_reserved(&bytes[i..])?;
            i += consumed;
            if i >= bytes.len() || (bytes[i] != b':' && bytes[i] != b'!') {
                return Err(PathMapError::MalformedLine(format!(
                    "child segment {:?} has no value marker (':' or '!')",
                    segment
                )));
            }
            let (r, consumed) = decode_value(&bytes[i..])?;
            i += consumed;
            node.children.insert(segment, r);
        }

        Ok(node)
    }
}

/// Decode a single `':' hexNat` or `'!'` value field. Returns the value
/// and the number of bytes consumed.
fn decode_value(bytes: &[u8]) -> Result<(Ref, usize)> {
    match bytes.first() {
        Some(b'!') => Ok((Ref::Inline, 1)),
        Some(b':') => {
            let mut i = 1;
            while i < bytes.len() && matches!(bytes[i], b'0'..=b'9' | b'a'..=b'f') {
                i += 1;
            }
            let hex = &bytes[1..i];
            let n = if hex.is_empty() {
                0
            } else {
                let s = std::str::from_utf8(hex).map_err(|_| {
                    PathMapError::MalformedLine("non-UTF-8 hex digits".to_string())
                })?;
                u64::from_str_radix(s, 16).map_err(|_| {
                    PathMapError::MalformedLine(format!("invalid hex offset: {:?}", s))
                })?
            };
            Ok((Ref::Offset(n), i))
        }
        Some(b) => Err(PathMapError::MalformedLine(format!(
            "expected ':' or '!' value marker, found {:?}",
            *b as char
        ))),
        None => Err(PathMapError::MalformedLine(
            "pending key with no value marker".to_string(),
        )),
    }
}

fn push_hex(out: &mut String, n: u64) {
    if n == 0 {
        return;
    }
    out.push_str(&format!("{:x}", n));
}
