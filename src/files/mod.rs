//! Filesystem scanning and the file tree built from it

mod finder;
mod tree;

pub use finder::{FileFinder, FileIndex, FinderConfig};
pub use tree::{FileTree, path_id};
