//! Literal tree construction without a serialized source.
//!
//! The builder accepts ordered `(key, value)` entries, nested
//! sub-builders, and attribute entries, and preserves insertion order
//! exactly — the in-memory mirror of a KTF or JSON document.
//!
//! # Example
//!
//! ```
//! use keytree::TreeBuilder;
//!
//! let tree = TreeBuilder::new()
//!     .key("title", "Demo")
//!     .node(
//!         "server",
//!         TreeBuilder::new().key("host", "localhost").key("port", 8080),
//!     )
//!     .array("fib", [1, 1, 2, 3])
//!     .build();
//!
//! let root = tree.root();
//! assert_eq!(tree.value_at(root, "server/port").unwrap().as_int().unwrap(), 8080);
//! assert_eq!(tree.count(root, "fib"), 4);
//! ```

use crate::node::{NodeId, Tree};
use crate::value::Value;

enum Entry {
    Leaf(Value),
    Sub(TreeBuilder),
}

/// Ordered literal builder for one node and its subtree.
#[derive(Default)]
pub struct TreeBuilder {
    value: Value,
    attrs: Vec<(String, Value)>,
    entries: Vec<(String, Entry)>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        TreeBuilder::default()
    }

    /// Set this node's own value.
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Add an attribute (insertion order preserved).
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Add a scalar child. Repeating a key appends another sibling with
    /// the same name (the implicit array model).
    pub fn key(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((key.into(), Entry::Leaf(value.into())));
        self
    }

    /// Add a subtree child built from a nested builder.
    pub fn node(mut self, key: impl Into<String>, sub: TreeBuilder) -> Self {
        self.entries.push((key.into(), Entry::Sub(sub)));
        self
    }

    /// Add one scalar child per item, all sharing `key`.
    pub fn array<I>(mut self, key: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let key = key.into();
        for item in items {
            self.entries.push((key.clone(), Entry::Leaf(item.into())));
        }
        self
    }

    /// Add one subtree child per builder, all sharing `key`.
    pub fn nodes<I>(mut self, key: impl Into<String>, subs: I) -> Self
    where
        I: IntoIterator<Item = TreeBuilder>,
    {
        let key = key.into();
        for sub in subs {
            self.entries.push((key.clone(), Entry::Sub(sub)));
        }
        self
    }

    /// Materialize the tree with an anonymous root.
    pub fn build(self) -> Tree {
        self.build_named("")
    }

    /// Materialize the tree with a named root.
    pub fn build_named(self, root_name: impl Into<String>) -> Tree {
        let mut tree = Tree::new(root_name.into());
        let root = tree.root();
        self.build_into(&mut tree, root);
        tree
    }

    fn build_into(self, tree: &mut Tree, id: NodeId) {
        tree.set_value(id, self.value);
        for (name, value) in self.attrs {
            tree.set_attr(id, name, value);
        }
        for (key, entry) in self.entries {
            let child = tree.push_child(id, key);
            match entry {
                Entry::Leaf(value) => tree.set_value(child, value),
                Entry::Sub(sub) => sub.build_into(tree, child),
            }
        }
    }
}
