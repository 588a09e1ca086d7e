//! Bottom-up rendering of a hierarchy into nested markup
//!
//! Leaves are rendered first. A parent is rendered only once every child has
//! finished markup, which it then consumes. A well-formed hierarchy collapses
//! to exactly one rendered element, the root.

mod style;

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::error::{Result, TreeError};
use crate::tree::{Hierarchy, NodeId};

pub use style::{BraceStyle, MarkdownStyle, MarkupStyle, XmlStyle};

pub struct TreeMarkup<'a, H: Hierarchy + ?Sized, S: MarkupStyle = BraceStyle> {
    hierarchy: &'a H,
    style: S,
}

impl<'a, H: Hierarchy + ?Sized> TreeMarkup<'a, H, BraceStyle> {
    pub fn new(hierarchy: &'a H) -> Self {
        Self {
            hierarchy,
            style: BraceStyle,
        }
    }
}

impl<'a, H: Hierarchy + ?Sized, S: MarkupStyle> TreeMarkup<'a, H, S> {
    pub fn with_style(hierarchy: &'a H, style: S) -> Self {
        Self { hierarchy, style }
    }

    /// Render the hierarchy.
    ///
    /// Fails with `RenderInconsistency` unless every node was rendered and
    /// exactly one top-level element is left, e.g. for a node whose parent is
    /// not part of the hierarchy or a parent cycle no leaf leads into.
    pub fn render(&self) -> Result<String> {
        let h = self.hierarchy;
        let mut rendered: HashMap<NodeId, String> = HashMap::new();
        let mut pending: Vec<NodeId> = Vec::new();
        let mut queued: HashSet<NodeId> = HashSet::new();
        let mut consumed = 0usize;

        let leaves: Vec<&NodeId> = h.node_ids().filter(|id| h.is_leaf(id)).collect();
        for leaf in leaves {
            let markup = self
                .style
                .render_leaf(h.label(leaf).unwrap_or_default(), h.level(leaf));
            rendered.insert(leaf.clone(), markup);
            consumed += 1;
            self.queue_parent(leaf, &rendered, &mut pending, &mut queued);
        }

        while !pending.is_empty() {
            let ready = pending.iter().rposition(|id| {
                h.children(id)
                    .iter()
                    .all(|child| rendered.contains_key(child))
            });
            let Some(pos) = ready else {
                warn!("{} nodes can never be rendered", pending.len());
                break;
            };

            let id = pending.remove(pos);
            let children: Vec<String> = h
                .children(&id)
                .iter()
                .filter_map(|child| rendered.remove(child))
                .collect();
            let markup =
                self.style
                    .render_branch(h.label(&id).unwrap_or_default(), h.level(&id), &children);
            rendered.insert(id.clone(), markup);
            consumed += 1;
            self.queue_parent(&id, &rendered, &mut pending, &mut queued);
        }

        let remaining = rendered.len();
        let unrendered = h.node_count().saturating_sub(consumed);
        if remaining != 1 || unrendered != 0 {
            return Err(TreeError::RenderInconsistency {
                remaining,
                unrendered,
            });
        }
        debug!("rendered markup for {} nodes", consumed);
        rendered
            .into_values()
            .next()
            .ok_or(TreeError::RenderInconsistency {
                remaining: 0,
                unrendered,
            })
    }

    fn queue_parent(
        &self,
        id: &NodeId,
        rendered: &HashMap<NodeId, String>,
        pending: &mut Vec<NodeId>,
        queued: &mut HashSet<NodeId>,
    ) {
        let Some(parent) = self.hierarchy.parent(id) else {
            return;
        };
        if !self.hierarchy.contains(parent) {
            warn!("node {} points at unknown parent {}", id, parent);
            return;
        }
        if !rendered.contains_key(parent) && queued.insert(parent.clone()) {
            pending.push(parent.clone());
        }
    }
}
