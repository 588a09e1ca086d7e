//! Tree of a filesystem scan with size aggregation

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::{debug, warn};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::tree::{DEFAULT_NAME_FIELD, DEFAULT_PARENT_FIELD, FlatMap, NodeId, Tree, TreeNode};

use super::finder::FileIndex;

/// Stable node id for a path: the SHA-256 of its normalized text.
pub fn path_id(path: &Path) -> NodeId {
    let normalized: PathBuf = path.components().collect();
    let mut hasher = Sha256::new();
    hasher.update(normalized.to_string_lossy().as_bytes());
    NodeId::Hash(format!("{:x}", hasher.finalize()))
}

/// A `Tree` whose nodes are the directories and files of a scan.
///
/// Each node carries `name`, `path` and `is_file`; with metadata also `size`
/// (files), `chdate` and, after aggregation, `total_size`.
#[derive(Debug, Clone)]
pub struct FileTree {
    tree: Tree,
    root_path: PathBuf,
}

impl FileTree {
    /// Build from a `directory -> files` index rooted at `root`.
    ///
    /// Directories missing from the index between `root` and a listed
    /// directory are created. Paths outside `root` are skipped.
    pub fn build(root: impl AsRef<Path>, index: &FileIndex, with_metadata: bool) -> Result<Self> {
        let root = root.as_ref();
        let mut flat = FlatMap::new();
        flat.insert(path_id(root), entry_record(root, None, false, with_metadata));

        for (dir, files) in index {
            let dir = Path::new(dir);
            if !dir.starts_with(root) {
                warn!("skipping directory outside {}: {}", root.display(), dir.display());
                continue;
            }
            let dir_id = ensure_dir(&mut flat, root, dir, with_metadata);

            for file in files {
                let file = Path::new(file);
                let id = path_id(file);
                if flat.contains_key(&id) {
                    continue;
                }
                flat.insert(id, entry_record(file, Some(&dir_id), true, with_metadata));
            }
        }

        let tree = Tree::create_tree(flat, DEFAULT_NAME_FIELD, DEFAULT_PARENT_FIELD, false)?;
        let mut file_tree = Self {
            tree,
            root_path: root.to_path_buf(),
        };
        if with_metadata {
            file_tree.calc_total_sizes()?;
        }
        debug!(
            "file tree for {}: {} dirs, {} files",
            root.display(),
            file_tree.dir_count(),
            file_tree.file_count()
        );
        Ok(file_tree)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn into_tree(self) -> Tree {
        self.tree
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn node_for_path(&self, path: impl AsRef<Path>) -> Option<&TreeNode> {
        self.tree.get_node(&path_id(path.as_ref())).ok()
    }

    pub fn file_count(&self) -> usize {
        self.tree.nodes().filter(|node| is_file(node)).count()
    }

    pub fn dir_count(&self) -> usize {
        self.tree.nodes().filter(|node| !is_file(node)).count()
    }

    /// Aggregated size of a node, 0 before `calc_total_sizes` ran.
    pub fn total_size(&self, id: &NodeId) -> Result<u64> {
        let node = self.tree.get_node(id)?;
        Ok(node
            .attribute("total_size")
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    /// Recompute `total_size` for every node.
    ///
    /// Totals start from zero (a file from its own size) on every call, and
    /// each file's size is added to every node in its predecessor chain.
    /// Calling this repeatedly yields the same totals.
    pub fn calc_total_sizes(&mut self) -> Result<()> {
        let mut totals: HashMap<NodeId, u64> = self
            .tree
            .nodes()
            .map(|node| (node.id.clone(), file_size(node).unwrap_or(0)))
            .collect();

        for node in self.tree.nodes().filter(|node| node.is_leaf && is_file(node)) {
            let Some(size) = file_size(node) else {
                continue;
            };
            for ancestor in self.tree.get_predecessors(&node.id)? {
                *totals.entry(ancestor).or_default() += size;
            }
        }

        for (id, total) in totals {
            self.tree.set_attribute(&id, "total_size", Value::from(total))?;
        }
        Ok(())
    }
}

/// Make sure `dir` and every directory between it and `root` has a node.
fn ensure_dir(flat: &mut FlatMap, root: &Path, dir: &Path, with_metadata: bool) -> NodeId {
    let mut missing = Vec::new();
    let mut current = dir;
    while !flat.contains_key(&path_id(current)) {
        missing.push(current);
        match current.parent() {
            Some(parent) if parent.starts_with(root) => current = parent,
            _ => break,
        }
    }

    for path in missing.into_iter().rev() {
        let parent = path.parent().map(path_id);
        flat.insert(
            path_id(path),
            entry_record(path, parent.as_ref(), false, with_metadata),
        );
    }
    path_id(dir)
}

fn entry_record(
    path: &Path,
    parent: Option<&NodeId>,
    is_file: bool,
    with_metadata: bool,
) -> Map<String, Value> {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());

    let mut record = Map::new();
    record.insert(
        DEFAULT_PARENT_FIELD.to_string(),
        parent.map_or(Value::Null, NodeId::to_value),
    );
    record.insert(DEFAULT_NAME_FIELD.to_string(), Value::from(name));
    record.insert(
        "path".to_string(),
        Value::from(path.to_string_lossy().as_ref()),
    );
    record.insert("is_file".to_string(), Value::Bool(is_file));
    if with_metadata {
        read_metadata(path, is_file, &mut record);
    }
    record
}

/// Attach size and change date. A failed read is recorded, not raised.
fn read_metadata(path: &Path, is_file: bool, record: &mut Map<String, Value>) {
    match fs::symlink_metadata(path) {
        Ok(meta) => {
            if is_file {
                record.insert("size".to_string(), Value::from(meta.len()));
            }
            let chdate = meta
                .modified()
                .ok()
                .map(|time| DateTime::<Local>::from(time).to_rfc3339());
            record.insert(
                "chdate".to_string(),
                chdate.map_or(Value::Null, Value::from),
            );
        }
        Err(e) => {
            debug!("no metadata for {}: {}", path.display(), e);
            if is_file {
                record.insert("size".to_string(), Value::Null);
            }
            record.insert("chdate".to_string(), Value::Null);
            record.insert("metadata_error".to_string(), Value::from(e.to_string()));
        }
    }
}

fn is_file(node: &TreeNode) -> bool {
    node.attribute("is_file")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn file_size(node: &TreeNode) -> Option<u64> {
    if !is_file(node) {
        return None;
    }
    node.attribute("size").and_then(Value::as_u64)
}
