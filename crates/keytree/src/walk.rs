//! Depth-first, pre-order traversal with visitor-controlled recursion.

use crate::node::{NodeId, Tree};

/// Traversal directive returned by visitor callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Descend into this node's children and continue the walk.
    Children,
    /// Do not descend into this node's children; continue with its
    /// remaining siblings.
    Skip,
    /// Abort the entire traversal.
    Stop,
}

/// A traversal callback. `start_tree` fires once before the first node;
/// `node` fires for every visited node in pre-order.
pub trait Visitor {
    /// Returning [`Visit::Stop`] cancels the walk before any node
    /// fires; [`Visit::Skip`] visits no nodes but counts as a completed
    /// walk.
    fn start_tree(&mut self, _tree: &Tree, _root: NodeId) -> Visit {
        Visit::Children
    }

    fn node(&mut self, tree: &Tree, id: NodeId) -> Visit;
}

/// Walk the subtree rooted at `from`, invoking `visitor` at each node.
/// Returns `true` if the traversal ran to completion and `false` if the
/// visitor aborted it with [`Visit::Stop`].
///
/// The walker never mutates the tree. Structural mutation from inside a
/// visitor is unsupported (the `&Tree` borrow rules it out).
pub fn walk(tree: &Tree, from: NodeId, visitor: &mut dyn Visitor) -> bool {
    match visitor.start_tree(tree, from) {
        Visit::Stop => false,
        Visit::Skip => true,
        Visit::Children => walk_node(tree, from, visitor),
    }
}

fn walk_node(tree: &Tree, id: NodeId, visitor: &mut dyn Visitor) -> bool {
    match visitor.node(tree, id) {
        Visit::Stop => false,
        Visit::Skip => true,
        Visit::Children => {
            for &child in tree.children(id) {
                if !walk_node(tree, child, visitor) {
                    return false;
                }
            }
            true
        }
    }
}
