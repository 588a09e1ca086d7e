//! twig - A generic tree layer: build, query, iterate and render hierarchies
//!
//! Producers turn their data into a flat `id -> attributes` map and hand it to
//! [`Tree::create_tree`]. Two producers ship with the crate: [`DictParser`] for
//! nested JSON-like values and [`FileTree`] for directory scans.

pub mod dict;
pub mod error;
pub mod files;
pub mod markup;
pub mod output;
pub mod tree;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use dict::{DictNode, DictParser, DictTree, ObjType, PathSegment, to_payload};
pub use error::{Result, StructureError, TreeError};
pub use files::{FileFinder, FileIndex, FileTree, FinderConfig, path_id};
pub use markup::{BraceStyle, MarkdownStyle, MarkupStyle, TreeMarkup, XmlStyle};
pub use output::{OutputConfig, TreeFormatter, format_size, print_flat_json, print_json};
pub use tree::{
    FlatMap, Hierarchy, LeafRun, MAX_NESTED_DEPTH, NodeId, ReverseTreeElements, Tree, TreeIterator,
    TreeNode, node_record,
};
