//! Error types shared by every tree producer and consumer

use thiserror::Error;

use crate::tree::NodeId;

/// Structural problems found while building a tree. Always fatal to construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("no root node: every node references a parent")]
    MissingRoot,

    #[error("ambiguous root: {} nodes have no parent ({})", roots.len(), join_ids(roots))]
    AmbiguousRoot { roots: Vec<NodeId> },

    #[error("node {node} references missing parent {parent}")]
    DanglingParent { node: NodeId, parent: NodeId },

    #[error("node {node} has a parent reference that is not an id: {value}")]
    InvalidParent { node: NodeId, value: String },

    #[error("cycle detected in the parent chain of node {node}")]
    Cycle { node: NodeId },
}

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("invalid tree structure: {0}")]
    Structure(#[from] StructureError),

    #[error("node not found: {id}")]
    NotFound { id: NodeId },

    #[error(
        "markup rendering left {remaining} top-level elements and {unrendered} unrendered nodes, expected exactly 1 and 0"
    )]
    RenderInconsistency { remaining: usize, unrendered: usize },

    #[error("nested value under node {id} would be {depth} levels deep (limit {limit})")]
    NestingTooDeep {
        id: NodeId,
        depth: usize,
        limit: usize,
    },

    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TreeError {
    pub(crate) fn not_found(id: &NodeId) -> Self {
        TreeError::NotFound { id: id.clone() }
    }
}

pub type Result<T> = std::result::Result<T, TreeError>;

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
