//! Nested mapping/sequence/scalar data as a tree
//!
//! `DictParser::parse` assigns sequential ids in pre-order, records each
//! node's key, list index and dict path, and never fails on input shape.
//! `DictTree::build_tree` hands the result to the generic `Tree`.

mod parser;
mod path;

pub use parser::{DictNode, DictParser, DictTree, ObjType, to_payload};
pub use path::{PathSegment, resolve_path, to_pointer};
