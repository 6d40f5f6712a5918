//! Text-format codecs: each module implements a `read` producing a
//! [`Tree`](crate::Tree) and a `write` serializing one, differing only
//! in syntax, never in semantics.
//!
//! `read` is all-or-nothing: on a malformed source the error carries
//! the position and no partial tree escapes. `write` treats the tree as
//! read-only and fails only on sink I/O or a value with no literal
//! representation in the target format.

use thiserror::Error;

pub mod json;
pub mod ktf;
pub mod xml;

/// Immutable per-call codec configuration. Constructed once and passed
/// to `read`/`write`; each codec reads the fields that apply to it.
#[derive(Debug, Clone)]
pub struct CodecOptions {
    /// Trim surrounding whitespace from text content (XML) and unquoted
    /// scalars (KTF).
    pub trim_whitespace: bool,
    /// Detect inline JSON inside a field value and graft it as a
    /// subtree (KTF values, XML text content).
    pub inline_json: bool,
    /// Keep the outer root level explicit: KTF wraps output in a
    /// root-named block, the XML reader keeps the document element as a
    /// child of an anonymous root.
    pub preserve_root: bool,
    /// Keep whitespace-only text nodes (XML).
    pub preserve_whitespace_nodes: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            trim_whitespace: true,
            inline_json: true,
            preserve_root: false,
            preserve_whitespace_nodes: false,
        }
    }
}

/// Malformed serialized input. Positions are one-based; the whole
/// `read` call fails and no partial tree is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("parse error at {line}:{column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }
}

/// A `write` failure: sink I/O, or a value with no representation in
/// the target format (named by its path from the written root).
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("value at {path:?} has no representation in the target format")]
    Unrepresentable { path: String },
}
