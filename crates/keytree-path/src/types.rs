//! Type definitions for tree path expressions.

use std::fmt;

/// One step of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Move to a named child. `index` selects the i-th child sharing
    /// `name` (zero-based); without an index the first match is taken.
    /// An empty `name` addresses anonymous children.
    Child { name: String, index: Option<usize> },
    /// Move to the parent node (`..`).
    Up,
    /// Stay on the current node (`.`).
    Here,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Child { name, index: None } => write!(f, "{name}"),
            Step::Child {
                name,
                index: Some(i),
            } => write!(f, "{name}[{i}]"),
            Step::Up => write!(f, ".."),
            Step::Here => write!(f, "."),
        }
    }
}

/// A parsed path expression.
///
/// A path is a sequence of node steps, optionally ending in an attribute
/// selector (`a/b[2]/c@attr`). The empty path (no steps, no attribute)
/// addresses the node the query was invoked on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    pub steps: Vec<Step>,
    /// Attribute selector of the final segment, if any.
    pub attr: Option<String>,
}

impl Path {
    /// A path addressing the invoking node itself.
    pub fn here() -> Self {
        Path::default()
    }

    /// True if this path resolves to the invoking node (no steps, no
    /// attribute selector).
    pub fn is_here(&self) -> bool {
        self.steps.is_empty() && self.attr.is_none()
    }

    /// True if the path ends in an `@attr` selector.
    pub fn is_attr(&self) -> bool {
        self.attr.is_some()
    }

    /// Number of node steps (the attribute selector is not a step).
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{step}")?;
        }
        if let Some(attr) = &self.attr {
            write!(f, "@{attr}")?;
        }
        Ok(())
    }
}
