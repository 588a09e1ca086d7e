//! Depth-first traversal without recursion

use super::{NodeId, Tree};

/// Lazy pre-order walk: a node, then its children left to right.
///
/// Uses an explicit stack so depth is bounded by memory, not the call stack.
/// Not restartable; build a new one from `Tree::iter` to walk again.
pub struct TreeIterator<'a> {
    tree: &'a Tree,
    stack: Vec<&'a NodeId>,
}

impl<'a> TreeIterator<'a> {
    pub(crate) fn new(tree: &'a Tree, start: &'a NodeId) -> Self {
        Self {
            tree,
            stack: vec![start],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = &'a NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children_of(id).iter().rev());
        Some(id)
    }
}
