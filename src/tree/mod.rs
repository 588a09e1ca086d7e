//! Generic tree: construction, queries and traversal
//!
//! - `Tree`: built once from a flat `id -> attributes` map, then queried
//! - `TreeIterator`: explicit-stack pre-order walk
//! - `Hierarchy`: read-only parent/child view used by renderers

mod container;
mod iter;
mod node;
mod traits;

pub use container::{
    DEFAULT_NAME_FIELD, DEFAULT_PARENT_FIELD, FlatMap, LeafRun, MAX_NESTED_DEPTH,
    ReverseTreeElements, Tree, node_record,
};
pub use iter::TreeIterator;
pub use node::{NodeId, TreeNode};
pub use traits::Hierarchy;

