//! Error types for the PathMap file format.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PathMapError>;

#[derive(Error, Debug)]
pub enum PathMapError {
    /// A path argument did not start with `/`.
    #[error("path must start with '/': {0:?}")]
    PathShape(String),

    /// A node-line decoder encountered an unknown byte, a pending key
    /// without a value marker, a stray value marker without a key, or an
    /// unterminated escape.
    #[error("malformed node line: {0}")]
    MalformedLine(String),

    /// A line scan ran past the end of the buffer looking for a newline,
    /// or the buffer contained no complete line at all.
    #[error("unexpected end of file while reading a line at offset {0}")]
    UnexpectedEOF(u64),

    /// The reader expected a node line (e.g. at the root offset) but found
    /// a JSON leaf value instead.
    #[error("expected a node line at offset {0}, found a JSON payload")]
    UnexpectedPayload(u64),

    /// One of a Bloom filter's `n, p, m, k, s` parameters is outside its
    /// valid domain.
    #[error("invalid bloom filter configuration: {0}")]
    BloomConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
