//! Path-expression syntax for keytree trees.
//!
//! A path addresses a node (or one of its attributes) relative to the node
//! the query is invoked on:
//!
//! ```text
//! path    := segment ('/' segment)*
//! segment := name ('[' index ']')? ('@' attr)?  |  '..'  |  '.'
//! ```
//!
//! `index` selects the i-th child sharing `name` (children with the same
//! name form an implicit array). `@attr` selects an attribute of the
//! resolved node and is only legal on the final segment; a bare `@attr`
//! addresses an attribute of the invoking node itself. `..` moves to the
//! parent, `.` stays in place, and the empty path addresses the invoking
//! node itself. Paths are always relative; a leading `/` is rejected.
//!
//! # Example
//!
//! ```
//! use keytree_path::{parse, Step};
//!
//! let path = parse("servers/host[2]@port").unwrap();
//! assert_eq!(path.steps.len(), 2);
//! assert_eq!(
//!     path.steps[1],
//!     Step::Child { name: "host".into(), index: Some(2) },
//! );
//! assert_eq!(path.attr.as_deref(), Some("port"));
//! assert_eq!(path.to_string(), "servers/host[2]@port");
//! ```

use std::str::FromStr;
use thiserror::Error;

pub mod types;
pub use types::{Path, Step};

/// Error raised for a malformed path expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathSyntaxError {
    /// Paths are always relative to the invoking node.
    #[error("leading '/' is not allowed: paths are relative")]
    LeadingSlash,
    /// `@attr` appeared on a non-final segment.
    #[error("attribute selector '@{0}' must be on the final segment")]
    AttrNotLast(String),
    /// Empty attribute name after `@`.
    #[error("empty attribute name")]
    EmptyAttr,
    /// `[` without a matching `]`.
    #[error("unterminated index in segment {0:?}")]
    UnterminatedIndex(String),
    /// Index content is not a plain decimal number.
    #[error("invalid index {0:?}")]
    InvalidIndex(String),
    /// Characters after `]` other than an attribute selector.
    #[error("unexpected characters after index in segment {0:?}")]
    TrailingAfterIndex(String),
    /// `..` and `.` take neither an index nor an attribute.
    #[error("'..' and '.' segments take no index or attribute: {0:?}")]
    DecoratedDots(String),
}

/// Parse a path expression into a [`Path`].
///
/// # Example
///
/// ```
/// use keytree_path::{parse, Step};
///
/// assert!(parse("").unwrap().is_here());
/// assert_eq!(parse("..").unwrap().steps, vec![Step::Up]);
/// assert!(parse("/abs").is_err());
/// ```
pub fn parse(text: &str) -> Result<Path, PathSyntaxError> {
    if text.is_empty() {
        return Ok(Path::here());
    }
    if text.starts_with('/') {
        return Err(PathSyntaxError::LeadingSlash);
    }

    let raw_segments: Vec<&str> = text.split('/').collect();
    let last = raw_segments.len() - 1;
    let mut path = Path::here();

    for (i, raw) in raw_segments.iter().enumerate() {
        let (step, attr) = parse_segment(raw)?;
        if let Some(attr) = attr {
            if i != last {
                return Err(PathSyntaxError::AttrNotLast(attr));
            }
            path.attr = Some(attr);
        }
        if let Some(step) = step {
            path.steps.push(step);
        }
    }
    Ok(path)
}

/// Check a path expression without keeping the parse.
pub fn validate(text: &str) -> Result<(), PathSyntaxError> {
    parse(text).map(|_| ())
}

fn parse_segment(raw: &str) -> Result<(Option<Step>, Option<String>), PathSyntaxError> {
    if raw == ".." {
        return Ok((Some(Step::Up), None));
    }
    if raw == "." {
        return Ok((Some(Step::Here), None));
    }

    // Split off the attribute selector first; '@' cannot occur in an index.
    let (node_part, attr) = match raw.find('@') {
        Some(pos) => {
            let attr = &raw[pos + 1..];
            if attr.is_empty() {
                return Err(PathSyntaxError::EmptyAttr);
            }
            (&raw[..pos], Some(attr.to_string()))
        }
        None => (raw, None),
    };

    let (name, index) = match node_part.find('[') {
        Some(open) => {
            let rest = &node_part[open + 1..];
            let close = rest
                .find(']')
                .ok_or_else(|| PathSyntaxError::UnterminatedIndex(raw.to_string()))?;
            if close + 1 != rest.len() {
                return Err(PathSyntaxError::TrailingAfterIndex(raw.to_string()));
            }
            let digits = &rest[..close];
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PathSyntaxError::InvalidIndex(digits.to_string()));
            }
            let index: usize = digits
                .parse()
                .map_err(|_| PathSyntaxError::InvalidIndex(digits.to_string()))?;
            (&node_part[..open], Some(index))
        }
        None => (node_part, None),
    };

    if name == ".." || name == "." {
        return Err(PathSyntaxError::DecoratedDots(raw.to_string()));
    }

    // A bare attribute selector (`@attr`, or `a/@attr`) contributes no
    // step: it addresses an attribute of the node resolved so far.
    if name.is_empty() && index.is_none() && attr.is_some() {
        return Ok((None, attr));
    }

    Ok((
        Some(Step::Child {
            name: name.to_string(),
            index,
        }),
        attr,
    ))
}

impl FromStr for Path {
    type Err = PathSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}
