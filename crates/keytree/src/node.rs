//! The node arena: a tree is a slot vector of nodes addressed by
//! [`NodeId`] handles, with non-owning parent back-references.
//!
//! Ownership is strictly hierarchical: the arena owns every node, a
//! child's lifetime never exceeds its parent's, and no node is a child
//! of two parents. The parent link is a plain id used only for `..`
//! navigation; detaching a subtree moves it into a freshly rooted
//! [`Tree`] and clears the link.

use indexmap::IndexMap;

use crate::value::Value;

/// Handle to a node inside one [`Tree`]'s arena.
///
/// Ids are only meaningful against the tree that produced them; a
/// detached subtree gets fresh ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// One element of a tree: a name, an optional value, an ordered set of
/// named attributes, and an ordered sequence of children.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) value: Value,
    pub(crate) attrs: IndexMap<String, Value>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    fn new(name: String, parent: Option<NodeId>) -> Self {
        Node {
            name,
            value: Value::Absent,
            attrs: IndexMap::new(),
            children: Vec::new(),
            parent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child ids in sibling order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Attribute lookup; absent attributes read as [`Value::Absent`].
    pub fn attr(&self, name: &str) -> &Value {
        const ABSENT: Value = Value::Absent;
        self.attrs.get(name).unwrap_or(&ABSENT)
    }

    /// Attributes in insertion order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    /// True if the node carries nothing but its name.
    pub fn is_empty(&self) -> bool {
        self.value.is_absent() && self.attrs.is_empty() && self.children.is_empty()
    }
}

/// A single connected, ordered, attributed tree rooted at one node.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    root: NodeId,
}

impl Tree {
    /// Construct a tree holding a single root node.
    pub fn new(root_name: impl Into<String>) -> Self {
        Tree {
            slots: vec![Some(Node::new(root_name.into(), None))],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Borrow a node. Panics on a stale id, which is a caller bug: ids
    /// never outlive the detach/replace that removed their node.
    pub fn node(&self, id: NodeId) -> &Node {
        match self.slots.get(id.0).and_then(Option::as_ref) {
            Some(node) => node,
            None => panic!("stale NodeId({})", id.0),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.slots.get_mut(id.0).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("stale NodeId({})", id.0),
        }
    }

    /// Borrow a node if the id is still live.
    pub fn try_node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn name(&self, id: NodeId) -> &str {
        self.node(id).name()
    }

    pub fn value(&self, id: NodeId) -> &Value {
        self.node(id).value()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    /// First child with the given name.
    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.child_at(id, name, 0)
    }

    /// The `index`-th child sharing `name` (zero-based).
    pub fn child_at(&self, id: NodeId, name: &str, index: usize) -> Option<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(|&c| self.node(c).name == name)
            .nth(index)
    }

    /// Number of children sharing `name` (the implicit array length).
    pub fn count(&self, id: NodeId, name: &str) -> usize {
        self.node(id)
            .children
            .iter()
            .filter(|&&c| self.node(c).name == name)
            .count()
    }

    /// Number of live nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn set_value(&mut self, id: NodeId, value: impl Into<Value>) {
        self.node_mut(id).value = value.into();
    }

    pub fn set_attr(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<Value>) {
        self.node_mut(id).attrs.insert(name.into(), value.into());
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) {
        self.node_mut(id).name = name.into();
    }

    /// Append a new child and return its id.
    pub fn push_child(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let child = self.alloc(Node::new(name.into(), Some(parent)));
        self.node_mut(parent).children.push(child);
        child
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Detach the subtree rooted at `id`, transferring ownership to the
    /// returned tree. The detached root's parent link is cleared. The
    /// root of this tree cannot be detached.
    pub fn detach(&mut self, id: NodeId) -> Result<Tree, crate::PathError> {
        let parent = match self.node(id).parent {
            Some(p) => p,
            None => return Err(crate::PathError::RootDetach),
        };
        self.node_mut(parent).children.retain(|&c| c != id);

        let mut out = Tree::new("");
        out.slots.clear();
        self.move_subtree(id, None, &mut out);
        out.root = NodeId(0);
        Ok(out)
    }

    /// Move `id` and its descendants into `out`, freeing the slots here.
    /// Nodes are laid out in `out` in depth-first order.
    fn move_subtree(&mut self, id: NodeId, new_parent: Option<NodeId>, out: &mut Tree) -> NodeId {
        let mut node = match self.slots.get_mut(id.0).and_then(Option::take) {
            Some(node) => node,
            None => panic!("stale NodeId({})", id.0),
        };
        self.free.push(id.0);

        let children = std::mem::take(&mut node.children);
        node.parent = new_parent;
        out.slots.push(Some(node));
        let new_id = NodeId(out.slots.len() - 1);
        for child in children {
            let moved = self.move_subtree(child, Some(new_id), out);
            out.node_mut(new_id).children.push(moved);
        }
        new_id
    }

    /// Attach another tree as the last child of `parent`, consuming it.
    /// Returns the id of the grafted subtree's root in this tree.
    pub fn attach(&mut self, parent: NodeId, subtree: Tree) -> NodeId {
        let grafted = self.copy_subtree(&subtree, subtree.root, parent);
        self.node_mut(parent).children.push(grafted);
        grafted
    }

    pub(crate) fn copy_subtree(&mut self, src: &Tree, src_id: NodeId, parent: NodeId) -> NodeId {
        let src_node = src.node(src_id);
        let id = self.alloc(Node {
            name: src_node.name.clone(),
            value: src_node.value.clone(),
            attrs: src_node.attrs.clone(),
            children: Vec::new(),
            parent: Some(parent),
        });
        for &child in src.node(src_id).children() {
            let copied = self.copy_subtree(src, child, id);
            self.node_mut(id).children.push(copied);
        }
        id
    }

    fn eq_subtree(&self, id: NodeId, other: &Tree, other_id: NodeId) -> bool {
        let a = self.node(id);
        let b = other.node(other_id);
        if a.name != b.name || a.value != b.value || a.attrs != b.attrs {
            return false;
        }
        if a.children.len() != b.children.len() {
            return false;
        }
        a.children
            .iter()
            .zip(&b.children)
            .all(|(&x, &y)| self.eq_subtree(x, other, y))
    }
}

/// Structural equality: same names, values, attribute sequences, and
/// child order. Arena layout and node ids are not compared.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.eq_subtree(self.root, other, other.root)
    }
}

impl Default for Tree {
    /// An anonymous single-node tree.
    fn default() -> Self {
        Tree::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_root() {
        let tree = Tree::new("cfg");
        assert_eq!(tree.name(tree.root()), "cfg");
        assert_eq!(tree.node_count(), 1);
        assert!(tree.parent(tree.root()).is_none());
    }

    #[test]
    fn test_children_order_and_arrays() {
        let mut tree = Tree::new("");
        let root = tree.root();
        let a = tree.push_child(root, "item");
        let b = tree.push_child(root, "other");
        let c = tree.push_child(root, "item");
        tree.set_value(a, 1);
        tree.set_value(c, 3);

        assert_eq!(tree.children(root), &[a, b, c]);
        assert_eq!(tree.count(root, "item"), 2);
        assert_eq!(tree.child(root, "item"), Some(a));
        assert_eq!(tree.child_at(root, "item", 1), Some(c));
        assert_eq!(tree.child_at(root, "item", 2), None);
    }

    #[test]
    fn test_attrs_preserve_insertion_order() {
        let mut tree = Tree::new("n");
        let root = tree.root();
        tree.set_attr(root, "z", 1);
        tree.set_attr(root, "a", 2);
        let names: Vec<&str> = tree.node(root).attrs().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["z", "a"]);
        assert_eq!(tree.node(root).attr("z").as_int().unwrap(), 1);
        assert!(tree.node(root).attr("missing").is_absent());
    }

    #[test]
    fn test_detach_and_attach() {
        let mut tree = Tree::new("root");
        let root = tree.root();
        let branch = tree.push_child(root, "branch");
        let leaf = tree.push_child(branch, "leaf");
        tree.set_value(leaf, "x");

        let detached = tree.detach(branch).unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(detached.node_count(), 2);
        assert_eq!(detached.name(detached.root()), "branch");
        assert!(detached.parent(detached.root()).is_none());

        let mut other = Tree::new("host");
        let grafted = other.attach(other.root(), detached);
        assert_eq!(other.name(grafted), "branch");
        assert_eq!(other.parent(grafted), Some(other.root()));
        let leaf = other.child(grafted, "leaf").unwrap();
        assert_eq!(other.value(leaf).as_str().unwrap(), "x");
    }

    #[test]
    fn test_root_detach_rejected() {
        let mut tree = Tree::new("r");
        let root = tree.root();
        assert!(matches!(
            tree.detach(root),
            Err(crate::PathError::RootDetach)
        ));
    }

    #[test]
    fn test_slot_reuse_after_detach() {
        let mut tree = Tree::new("r");
        let root = tree.root();
        let a = tree.push_child(root, "a");
        tree.detach(a).unwrap();
        let b = tree.push_child(root, "b");
        // The freed slot is recycled.
        assert_eq!(a, b);
        assert_eq!(tree.name(b), "b");
    }

    #[test]
    fn test_structural_equality() {
        let mut a = Tree::new("r");
        let x = a.push_child(a.root(), "x");
        a.set_value(x, 1);

        let mut b = Tree::new("r");
        let x = b.push_child(b.root(), "x");
        b.set_value(x, 1);
        assert_eq!(a, b);

        b.set_value(x, 2);
        assert_ne!(a, b);
    }
}
