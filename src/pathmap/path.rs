//! Shared path-splitting and percent-decoding, used identically by the
//! trie builder and the reader so the two traversal implementations
//! cannot disagree on what a "segment" is.

use crate::error::{PathMapError, Result};

/// Split a path into its percent-decoded segments.
///
/// Fails with [`PathMapError::PathShape`] if `path` does not start with
/// `/`. The leading slash itself contributes no segment: `/foo/bar` splits
/// into `["foo", "bar"]`, `/` splits into `[]`, `//` splits into `[""]`,
/// and a trailing slash yields a final empty segment (`/foo/` splits into
/// `["foo", ""]`).
pub fn split_segments(path: &str) -> Result<Vec<String>> {
    if !path.starts_with('/') {
        return Err(PathMapError::PathShape(path.to_string()));
    }
    let rest = &path[1..];
    if rest.is_empty() {
        return Ok(Vec::new());
    }
    rest.split('/').map(percent_decode).collect()
}

/// Percent-decode a single path segment (`%XX` -> byte `XX`).
///
/// Bytes not part of a `%XX` escape pass through unchanged. The decoded
/// bytes are interpreted as UTF-8; malformed UTF-8 after decoding falls
/// back to a lossy conversion rather than failing the whole lookup, since
/// a segment that cannot decode cleanly simply will not match any stored
/// segment.
fn percent_decode(segment: &str) -> Result<String> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    Ok(String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()))
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
