//! Path resolution over a [`Tree`]: read lookups that never mutate, and
//! write lookups that create missing nodes on demand.

use keytree_path::{Path, PathSyntaxError, Step};
use thiserror::Error;

use crate::node::{NodeId, Tree};
use crate::value::Value;

/// Error raised by path resolution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid path: {0}")]
    Syntax(#[from] PathSyntaxError),
    /// A node or attribute named by the path does not exist.
    #[error("path not found: {0:?}")]
    NotFound(String),
    /// `..` was applied to the root node.
    #[error("no parent: '..' applied at the root")]
    NoParent,
    /// The path addresses an attribute where a node was required.
    #[error("path {0:?} addresses an attribute, not a node")]
    AttrTarget(String),
    /// The root node cannot be detached from its own tree.
    #[error("cannot detach the root node")]
    RootDetach,
}

/// What a path resolved to: a node, or an attribute slot of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Node(NodeId),
    Attr(NodeId, String),
}

impl Target {
    pub fn node_id(&self) -> NodeId {
        match self {
            Target::Node(id) => *id,
            Target::Attr(id, _) => *id,
        }
    }
}

impl Tree {
    /// Resolve a path for reading. Fails with [`PathError::NotFound`] on
    /// any missing segment; never mutates the tree.
    pub fn resolve(&self, from: NodeId, path: &str) -> Result<Target, PathError> {
        let parsed = keytree_path::parse(path)?;
        let node = self.resolve_steps(from, &parsed, path)?;
        match parsed.attr {
            Some(attr) => Ok(Target::Attr(node, attr)),
            None => Ok(Target::Node(node)),
        }
    }

    fn resolve_steps(&self, from: NodeId, parsed: &Path, text: &str) -> Result<NodeId, PathError> {
        let mut cur = from;
        for step in &parsed.steps {
            cur = match step {
                Step::Here => cur,
                Step::Up => self.parent(cur).ok_or(PathError::NoParent)?,
                Step::Child { name, index } => self
                    .child_at(cur, name, index.unwrap_or(0))
                    .ok_or_else(|| PathError::NotFound(text.to_string()))?,
            };
        }
        Ok(cur)
    }

    /// Resolve a path to a node id. Attribute paths are rejected.
    pub fn get(&self, from: NodeId, path: &str) -> Result<NodeId, PathError> {
        match self.resolve(from, path)? {
            Target::Node(id) => Ok(id),
            Target::Attr(..) => Err(PathError::AttrTarget(path.to_string())),
        }
    }

    /// Read the value addressed by a path: a node's own value, or an
    /// attribute value for `@attr` paths. A resolved node with no value
    /// reads as [`Value::Absent`]; a missing attribute on an existing
    /// node fails with [`PathError::NotFound`].
    pub fn value_at(&self, from: NodeId, path: &str) -> Result<Value, PathError> {
        match self.resolve(from, path)? {
            Target::Node(id) => Ok(self.value(id).clone()),
            Target::Attr(id, attr) => {
                let value = self.node(id).attr(&attr);
                if value.is_absent() {
                    return Err(PathError::NotFound(path.to_string()));
                }
                Ok(value.clone())
            }
        }
    }

    /// Read the value addressed by a path, producing [`Value::Absent`]
    /// instead of failing when the path names a missing node or
    /// attribute. Syntax errors and `..`-at-root still fail.
    pub fn value_or_absent(&self, from: NodeId, path: &str) -> Result<Value, PathError> {
        match self.value_at(from, path) {
            Ok(value) => Ok(value),
            Err(PathError::NotFound(_)) => Ok(Value::Absent),
            Err(other) => Err(other),
        }
    }

    /// Read with a default: absence (missing node, missing attribute, or
    /// value-less node) is replaced by `default`.
    pub fn value_or(
        &self,
        from: NodeId,
        path: &str,
        default: impl Into<Value>,
    ) -> Result<Value, PathError> {
        Ok(self.value_or_absent(from, path)?.or(default))
    }

    /// Resolve a path for writing, creating missing nodes on demand, and
    /// return the final target without assigning anything.
    ///
    /// An indexed segment past the end of its sibling run extends the
    /// run one value-less node at a time, so `arr[5]` on an empty parent
    /// creates six children named `arr`.
    pub fn ensure(&mut self, from: NodeId, path: &str) -> Result<Target, PathError> {
        let parsed = keytree_path::parse(path)?;
        let mut cur = from;
        for step in &parsed.steps {
            cur = match step {
                Step::Here => cur,
                Step::Up => self.parent(cur).ok_or(PathError::NoParent)?,
                Step::Child { name, index } => match index {
                    None => match self.child(cur, name) {
                        Some(id) => id,
                        None => self.push_child(cur, name.clone()),
                    },
                    Some(i) => {
                        while self.count(cur, name) <= *i {
                            self.push_child(cur, name.clone());
                        }
                        match self.child_at(cur, name, *i) {
                            Some(id) => id,
                            None => return Err(PathError::NotFound(path.to_string())),
                        }
                    }
                },
            };
        }
        match parsed.attr {
            Some(attr) => Ok(Target::Attr(cur, attr)),
            None => Ok(Target::Node(cur)),
        }
    }

    /// Resolve a path for writing and return the node id, creating
    /// missing nodes. Attribute paths are rejected.
    pub fn ensure_node(&mut self, from: NodeId, path: &str) -> Result<NodeId, PathError> {
        match self.ensure(from, path)? {
            Target::Node(id) => Ok(id),
            Target::Attr(..) => Err(PathError::AttrTarget(path.to_string())),
        }
    }

    /// Assign through a path, creating missing nodes on demand. Returns
    /// the target that received the value.
    pub fn set(
        &mut self,
        from: NodeId,
        path: &str,
        value: impl Into<Value>,
    ) -> Result<Target, PathError> {
        let target = self.ensure(from, path)?;
        match &target {
            Target::Node(id) => self.set_value(*id, value),
            Target::Attr(id, attr) => self.set_attr(*id, attr.clone(), value),
        }
        Ok(target)
    }
}
