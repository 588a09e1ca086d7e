//! Read-only view of parent/child structure
//!
//! Renderers work against this trait instead of `Tree` directly, so they can be
//! pointed at any id/parent source. `Tree` is the main implementation.

use super::NodeId;

/// A parent/child structure keyed by `NodeId`.
///
/// Implementations only provide the basic lookups; `level` and `is_leaf`
/// have derived defaults.
pub trait Hierarchy {
    /// All node ids, in node-insertion order.
    fn node_ids(&self) -> Box<dyn Iterator<Item = &NodeId> + '_>;

    /// Number of nodes.
    fn node_count(&self) -> usize;

    /// Check whether the id belongs to this hierarchy.
    fn contains(&self, id: &NodeId) -> bool;

    /// Parent of a node. `None` for the root and for unknown ids.
    fn parent(&self, id: &NodeId) -> Option<&NodeId>;

    /// Children of a node in insertion order. Empty for leaves and unknown ids.
    fn children(&self, id: &NodeId) -> &[NodeId];

    /// Display label of a node, `None` for unknown ids.
    fn label(&self, id: &NodeId) -> Option<&str>;

    /// Distance from the top of the parent chain.
    ///
    /// The walk is capped at `node_count` steps so a malformed source with a
    /// cycle still terminates.
    fn level(&self, id: &NodeId) -> usize {
        let mut level = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if level >= self.node_count() {
                break;
            }
            level += 1;
            current = self.parent(parent);
        }
        level
    }

    fn is_leaf(&self, id: &NodeId) -> bool {
        self.children(id).is_empty()
    }
}
