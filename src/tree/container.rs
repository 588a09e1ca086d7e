//! The generic tree container
//!
//! A `Tree` is built once from a flat `id -> attributes` map and is
//! structurally immutable afterwards. Only attribute values can change, through
//! `set_attribute`.

use std::collections::{BTreeMap, HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, trace};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, StructureError, TreeError};

use super::iter::TreeIterator;
use super::node::{NodeId, TreeNode, value_label};
use super::traits::Hierarchy;

/// Ordered construction input: node id to its attribute record.
pub type FlatMap = IndexMap<NodeId, Map<String, Value>>;

pub const DEFAULT_NAME_FIELD: &str = "name";
pub const DEFAULT_PARENT_FIELD: &str = "parent";

/// Build an attribute record with the default `parent` and `name` fields.
pub fn node_record(parent: Option<&NodeId>, name: impl Into<Value>) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert(
        DEFAULT_PARENT_FIELD.to_string(),
        parent.map_or(Value::Null, NodeId::to_value),
    );
    record.insert(DEFAULT_NAME_FIELD.to_string(), name.into());
    record
}

/// A maximal run of adjacent leaf children under one parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafRun {
    pub parent: NodeId,
    pub leaves: Vec<NodeId>,
}

/// Deepest nested `Value` the tree will build. Deeper values would overflow
/// the stack when `serde_json` drops or serializes them.
pub const MAX_NESTED_DEPTH: usize = 512;

/// Node id to nested subtree, in node-insertion order. Subtrees are built
/// one per `subtree` call.
#[derive(Debug, Clone, Copy)]
pub struct ReverseTreeElements<'a> {
    tree: &'a Tree,
}

impl<'a> ReverseTreeElements<'a> {
    /// Node ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &'a NodeId> + 'a {
        self.tree.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// The children of `id` as nested objects keyed by id; `{}` for a leaf.
    pub fn subtree(&self, id: &NodeId) -> Result<Value> {
        self.tree.nested_subtree(id, 0)
    }
}

/// Reverse lookups built when `analyze_fields` is requested.
#[derive(Debug, Clone, Default)]
struct FieldIndex {
    by_name: HashMap<String, Vec<NodeId>>,
    by_level: BTreeMap<usize, Vec<NodeId>>,
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: IndexMap<NodeId, TreeNode>,
    root_id: NodeId,
    max_level: usize,
    fields: Option<FieldIndex>,
}

impl Tree {
    /// Build a tree from a flat map.
    ///
    /// `parent_field` names the attribute holding the parent id (`null` or
    /// absent for the root), `name_field` the attribute used as display label.
    pub fn create_tree(
        flat_map: FlatMap,
        name_field: &str,
        parent_field: &str,
        analyze_fields: bool,
    ) -> Result<Self> {
        let mut parents: IndexMap<NodeId, Option<NodeId>> = IndexMap::with_capacity(flat_map.len());
        let mut roots = Vec::new();

        for (id, attributes) in &flat_map {
            let parent = match attributes.get(parent_field) {
                None | Some(Value::Null) => None,
                Some(value) => Some(NodeId::from_value(value).ok_or_else(|| {
                    StructureError::InvalidParent {
                        node: id.clone(),
                        value: value.to_string(),
                    }
                })?),
            };
            if parent.is_none() {
                roots.push(id.clone());
            }
            parents.insert(id.clone(), parent);
        }

        let root_id = match roots.len() {
            0 => return Err(StructureError::MissingRoot.into()),
            1 => roots.swap_remove(0),
            _ => return Err(StructureError::AmbiguousRoot { roots }.into()),
        };

        for (id, parent) in &parents {
            if let Some(parent) = parent {
                if !parents.contains_key(parent) {
                    return Err(StructureError::DanglingParent {
                        node: id.clone(),
                        parent: parent.clone(),
                    }
                    .into());
                }
            }
        }

        let levels = compute_levels(&parents, &root_id)?;

        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for (id, parent) in &parents {
            if let Some(parent) = parent {
                children.entry(parent.clone()).or_default().push(id.clone());
            }
        }

        let mut nodes = IndexMap::with_capacity(flat_map.len());
        let mut max_level = 0;
        for (id, attributes) in flat_map {
            let parent = parents.get(&id).cloned().flatten();
            let kids = children.remove(&id).unwrap_or_default();
            let level = levels.get(&id).copied().unwrap_or_default();
            max_level = max_level.max(level);
            let node = TreeNode {
                id: id.clone(),
                parent,
                is_leaf: kids.is_empty(),
                children: kids,
                level,
                name: value_label(attributes.get(name_field)),
                attributes,
            };
            nodes.insert(id, node);
        }

        let mut tree = Self {
            nodes,
            root_id,
            max_level,
            fields: None,
        };
        if analyze_fields {
            tree.fields = Some(tree.build_field_index());
        }

        debug!(
            "built tree: {} nodes, root {}, max level {}",
            tree.nodes.len(),
            tree.root_id,
            tree.max_level
        );
        Ok(tree)
    }

    /// `create_tree` with the default `name`/`parent` fields and no reverse lookups.
    pub fn from_flat_map(flat_map: FlatMap) -> Result<Self> {
        Self::create_tree(flat_map, DEFAULT_NAME_FIELD, DEFAULT_PARENT_FIELD, false)
    }

    fn build_field_index(&self) -> FieldIndex {
        let mut index = FieldIndex::default();
        for node in self.nodes.values() {
            index
                .by_name
                .entry(node.name.clone())
                .or_default()
                .push(node.id.clone());
            index
                .by_level
                .entry(node.level)
                .or_default()
                .push(node.id.clone());
        }
        index
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root_id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Highest level of any node.
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.values()
    }

    pub fn get_node(&self, id: &NodeId) -> Result<&TreeNode> {
        self.nodes.get(id).ok_or_else(|| TreeError::not_found(id))
    }

    /// The attribute record the producer supplied for this node.
    pub fn get_element(&self, id: &NodeId) -> Result<&Map<String, Value>> {
        self.get_node(id).map(|node| &node.attributes)
    }

    pub fn get_parent(&self, id: &NodeId) -> Result<Option<&NodeId>> {
        self.get_node(id).map(|node| node.parent.as_ref())
    }

    pub fn get_children(&self, id: &NodeId) -> Result<&[NodeId]> {
        self.get_node(id).map(|node| node.children.as_slice())
    }

    /// Every descendant of `id` in pre-order, the node itself excluded.
    pub fn get_all_children(&self, id: &NodeId, only_leaves: bool) -> Result<Vec<NodeId>> {
        let mut descendants = self.iter_from(id)?;
        descendants.next();
        Ok(descendants
            .filter(|child| !only_leaves || self.is_leaf_unchecked(child))
            .cloned()
            .collect())
    }

    /// Ancestors of `id`, root first, the node itself excluded.
    pub fn get_predecessors(&self, id: &NodeId) -> Result<Vec<NodeId>> {
        let mut chain = Vec::with_capacity(self.get_node(id)?.level);
        let mut current = self.get_parent(id)?;
        while let Some(parent) = current {
            chain.push(parent.clone());
            current = self.nodes.get(parent).and_then(|node| node.parent.as_ref());
        }
        chain.reverse();
        Ok(chain)
    }

    /// Other children of the same parent, in original order. The root has none.
    pub fn get_siblings(&self, id: &NodeId) -> Result<Vec<NodeId>> {
        let Some(parent) = self.get_parent(id)? else {
            return Ok(Vec::new());
        };
        Ok(self
            .children_of(parent)
            .iter()
            .filter(|sibling| *sibling != id)
            .cloned()
            .collect())
    }

    /// Leaves in node-insertion order.
    pub fn get_leaves(&self) -> Vec<&NodeId> {
        self.nodes
            .values()
            .filter(|node| node.is_leaf)
            .map(|node| &node.id)
            .collect()
    }

    /// Runs of adjacent leaf siblings, grouped by their shared parent.
    pub fn get_leaf_siblings(&self) -> Vec<LeafRun> {
        let mut runs = Vec::new();
        for node in self.nodes.values().filter(|node| !node.is_leaf) {
            let mut run: Vec<NodeId> = Vec::new();
            for child in &node.children {
                if self.is_leaf_unchecked(child) {
                    run.push(child.clone());
                } else if !run.is_empty() {
                    runs.push(LeafRun {
                        parent: node.id.clone(),
                        leaves: std::mem::take(&mut run),
                    });
                }
            }
            if !run.is_empty() {
                runs.push(LeafRun {
                    parent: node.id.clone(),
                    leaves: run,
                });
            }
        }
        runs
    }

    /// The whole tree as nested JSON objects keyed by node id.
    ///
    /// The result is as deep as the tree, and `serde_json` drops and
    /// serializes values recursively. Trees deeper than
    /// `MAX_NESTED_DEPTH` fail with `NestingTooDeep` instead.
    pub fn get_nested_dict(&self) -> Result<Value> {
        let mut top = Map::new();
        top.insert(
            self.root_id.to_string(),
            self.nested_subtree(&self.root_id, 1)?,
        );
        Ok(Value::Object(top))
    }

    /// Every node mapped to its own nested subtree, built on demand.
    pub fn get_reverse_tree_elements(&self) -> ReverseTreeElements<'_> {
        ReverseTreeElements { tree: self }
    }

    /// Names from the root down to `id`, both included.
    pub fn get_key_path(&self, id: &NodeId) -> Result<Vec<String>> {
        let mut path: Vec<String> = self
            .get_predecessors(id)?
            .iter()
            .filter_map(|ancestor| self.nodes.get(ancestor))
            .map(|node| node.name.clone())
            .collect();
        path.push(self.get_node(id)?.name.clone());
        Ok(path)
    }

    pub fn is_leaf(&self, id: &NodeId) -> Result<bool> {
        self.get_node(id).map(|node| node.is_leaf)
    }

    pub fn is_node(&self, id: &NodeId) -> Result<bool> {
        self.is_leaf(id).map(|leaf| !leaf)
    }

    /// Nodes whose display name equals `name`, in insertion order.
    pub fn find_by_name(&self, name: &str) -> Vec<&NodeId> {
        match &self.fields {
            Some(index) => index
                .by_name
                .get(name)
                .map(|ids| ids.iter().collect())
                .unwrap_or_default(),
            None => self
                .nodes
                .values()
                .filter(|node| node.name == name)
                .map(|node| &node.id)
                .collect(),
        }
    }

    /// Nodes at the given level, in insertion order.
    pub fn nodes_at_level(&self, level: usize) -> Vec<&NodeId> {
        match &self.fields {
            Some(index) => index
                .by_level
                .get(&level)
                .map(|ids| ids.iter().collect())
                .unwrap_or_default(),
            None => self
                .nodes
                .values()
                .filter(|node| node.level == level)
                .map(|node| &node.id)
                .collect(),
        }
    }

    /// Set a metadata attribute. Structure (parent, children, level) is untouched.
    ///
    /// Returns the previous value, if any.
    pub fn set_attribute(&mut self, id: &NodeId, key: &str, value: Value) -> Result<Option<Value>> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::not_found(id))?;
        trace!("set {}.{} = {}", id, key, value);
        Ok(node.attributes.insert(key.to_string(), value))
    }

    /// Pre-order iterator over every node id.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, &self.root_id)
    }

    /// Pre-order iterator over the subtree rooted at `id`, `id` first.
    pub fn iter_from<'a>(&'a self, id: &NodeId) -> Result<TreeIterator<'a>> {
        let node = self.get_node(id)?;
        Ok(TreeIterator::new(self, &node.id))
    }

    /// Pretty JSON of the full node map, in insertion order.
    pub fn json(&self) -> Result<String> {
        let mut out = Map::new();
        for (id, node) in &self.nodes {
            out.insert(id.to_string(), serde_json::to_value(node)?);
        }
        Ok(serde_json::to_string_pretty(&Value::Object(out))?)
    }

    /// Children of `id` as nested objects, bottom-up over the reversed
    /// pre-order of its subtree. Finished subtrees are moved into their
    /// parent, never cloned. `extra` counts wrapping levels the caller adds.
    fn nested_subtree(&self, id: &NodeId, extra: usize) -> Result<Value> {
        let base = self.get_node(id)?.level;
        let order: Vec<&NodeId> = self.iter_from(id)?.collect();
        let deepest = order
            .iter()
            .filter_map(|node| self.nodes.get(*node))
            .map(|node| node.level)
            .max()
            .unwrap_or(base);
        let depth = deepest - base + 1 + extra;
        if depth > MAX_NESTED_DEPTH {
            return Err(TreeError::NestingTooDeep {
                id: id.clone(),
                depth,
                limit: MAX_NESTED_DEPTH,
            });
        }

        let mut built: HashMap<&NodeId, Value> = HashMap::with_capacity(order.len());
        for node in order.into_iter().rev() {
            let mut object = Map::new();
            for child in self.children_of(node) {
                let subtree = built.remove(child).unwrap_or_else(empty_object);
                object.insert(child.to_string(), subtree);
            }
            built.insert(node, Value::Object(object));
        }
        Ok(built.remove(id).unwrap_or_else(empty_object))
    }

    pub(crate) fn children_of(&self, id: &NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    fn is_leaf_unchecked(&self, id: &NodeId) -> bool {
        self.nodes.get(id).is_some_and(|node| node.is_leaf)
    }
}

impl Hierarchy for Tree {
    fn node_ids(&self) -> Box<dyn Iterator<Item = &NodeId> + '_> {
        Box::new(self.nodes.keys())
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    fn parent(&self, id: &NodeId) -> Option<&NodeId> {
        self.nodes.get(id).and_then(|node| node.parent.as_ref())
    }

    fn children(&self, id: &NodeId) -> &[NodeId] {
        self.children_of(id)
    }

    fn label(&self, id: &NodeId) -> Option<&str> {
        self.nodes.get(id).map(|node| node.name.as_str())
    }

    fn level(&self, id: &NodeId) -> usize {
        self.nodes.get(id).map_or(0, |node| node.level)
    }

    fn is_leaf(&self, id: &NodeId) -> bool {
        self.is_leaf_unchecked(id)
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Level of every node by walking upwards until a node with a known level.
///
/// Expects exactly one root and no dangling parents. Each walk keeps a
/// visited set so a loop that never reaches the root is reported as a cycle.
fn compute_levels(
    parents: &IndexMap<NodeId, Option<NodeId>>,
    root_id: &NodeId,
) -> Result<HashMap<NodeId, usize>> {
    let mut levels: HashMap<&NodeId, usize> = HashMap::with_capacity(parents.len());
    levels.insert(root_id, 0);

    for start in parents.keys() {
        if levels.contains_key(start) {
            continue;
        }

        let mut chain: Vec<&NodeId> = Vec::new();
        let mut visited: HashSet<&NodeId> = HashSet::new();
        let mut current = start;
        let base = loop {
            if let Some(&level) = levels.get(current) {
                break level;
            }
            if !visited.insert(current) {
                return Err(StructureError::Cycle {
                    node: current.clone(),
                }
                .into());
            }
            chain.push(current);
            match parents.get(current) {
                Some(Some(parent)) => current = parent,
                // Only the root lacks a parent and it is seeded above.
                _ => return Err(StructureError::MissingRoot.into()),
            }
        };

        for (depth, id) in chain.into_iter().rev().enumerate() {
            levels.insert(id, base + depth + 1);
        }
    }

    Ok(levels
        .into_iter()
        .map(|(id, level)| (id.clone(), level))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(parent: Option<u64>, value: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("parent".to_string(), parent.map_or(Value::Null, Value::from));
        map.insert("value".to_string(), Value::from(value));
        map
    }

    fn ids(raw: &[u64]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId::Int).collect()
    }

    /// 1 -> (2 -> 4), 3
    fn sample() -> Tree {
        let mut flat = FlatMap::new();
        flat.insert(NodeId::Int(1), record(None, "v1"));
        flat.insert(NodeId::Int(2), record(Some(1), "v2"));
        flat.insert(NodeId::Int(3), record(Some(1), "v3"));
        flat.insert(NodeId::Int(4), record(Some(2), "v4"));
        Tree::create_tree(flat, "value", "parent", false).unwrap()
    }

    /// 1 -> a(2), b(3 -> 5, 6), c(4), d(7)
    fn wider() -> Tree {
        let mut flat = FlatMap::new();
        flat.insert(NodeId::Int(1), record(None, "root"));
        flat.insert(NodeId::Int(2), record(Some(1), "a"));
        flat.insert(NodeId::Int(3), record(Some(1), "b"));
        flat.insert(NodeId::Int(4), record(Some(1), "c"));
        flat.insert(NodeId::Int(5), record(Some(3), "b1"));
        flat.insert(NodeId::Int(6), record(Some(3), "b2"));
        flat.insert(NodeId::Int(7), record(Some(1), "d"));
        Tree::create_tree(flat, "value", "parent", true).unwrap()
    }

    #[test]
    fn test_concrete_scenario() {
        let tree = sample();
        assert_eq!(tree.root_id(), &NodeId::Int(1));
        assert_eq!(tree.max_level(), 2);
        assert_eq!(tree.get_children(&NodeId::Int(1)).unwrap(), ids(&[2, 3]).as_slice());
        assert_eq!(tree.get_leaves(), vec![&NodeId::Int(3), &NodeId::Int(4)]);
        assert_eq!(tree.get_predecessors(&NodeId::Int(4)).unwrap(), ids(&[1, 2]));
        assert_eq!(tree.get_node(&NodeId::Int(4)).unwrap().name, "v4");
    }

    #[test]
    fn test_missing_root() {
        let mut flat = FlatMap::new();
        flat.insert(NodeId::Int(1), record(Some(2), "a"));
        flat.insert(NodeId::Int(2), record(Some(1), "b"));
        let err = Tree::create_tree(flat, "value", "parent", false).unwrap_err();
        assert!(matches!(err, TreeError::Structure(StructureError::MissingRoot)));
    }

    #[test]
    fn test_ambiguous_root() {
        let mut flat = FlatMap::new();
        flat.insert(NodeId::Int(1), record(None, "a"));
        flat.insert(NodeId::Int(2), record(None, "b"));
        let err = Tree::create_tree(flat, "value", "parent", false).unwrap_err();
        match err {
            TreeError::Structure(StructureError::AmbiguousRoot { roots }) => {
                assert_eq!(roots, ids(&[1, 2]));
            }
            other => panic!("expected ambiguous root, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_map_has_no_root() {
        let err = Tree::from_flat_map(FlatMap::new()).unwrap_err();
        assert!(matches!(err, TreeError::Structure(StructureError::MissingRoot)));
    }

    #[test]
    fn test_dangling_parent() {
        let mut flat = FlatMap::new();
        flat.insert(NodeId::Int(1), record(None, "a"));
        flat.insert(NodeId::Int(2), record(Some(99), "b"));
        let err = Tree::create_tree(flat, "value", "parent", false).unwrap_err();
        assert!(matches!(
            err,
            TreeError::Structure(StructureError::DanglingParent { .. })
        ));
    }

    #[test]
    fn test_cycle_detected() {
        let mut flat = FlatMap::new();
        flat.insert(NodeId::Int(1), record(None, "root"));
        flat.insert(NodeId::Int(2), record(Some(3), "a"));
        flat.insert(NodeId::Int(3), record(Some(2), "b"));
        let err = Tree::create_tree(flat, "value", "parent", false).unwrap_err();
        assert!(matches!(err, TreeError::Structure(StructureError::Cycle { .. })));
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let mut flat = FlatMap::new();
        flat.insert(NodeId::Int(1), record(None, "root"));
        flat.insert(NodeId::Int(2), record(Some(2), "loop"));
        let err = Tree::create_tree(flat, "value", "parent", false).unwrap_err();
        assert!(matches!(err, TreeError::Structure(StructureError::Cycle { .. })));
    }

    #[test]
    fn test_invalid_parent_value() {
        let mut flat = FlatMap::new();
        flat.insert(NodeId::Int(1), record(None, "root"));
        let mut bad = Map::new();
        bad.insert("parent".to_string(), json!([1]));
        flat.insert(NodeId::Int(2), bad);
        let err = Tree::create_tree(flat, "value", "parent", false).unwrap_err();
        assert!(matches!(
            err,
            TreeError::Structure(StructureError::InvalidParent { .. })
        ));
    }

    #[test]
    fn test_child_listed_before_parent() {
        let mut flat = FlatMap::new();
        flat.insert(NodeId::Int(4), record(Some(2), "deep"));
        flat.insert(NodeId::Int(2), record(Some(1), "mid"));
        flat.insert(NodeId::Int(1), record(None, "root"));
        let tree = Tree::create_tree(flat, "value", "parent", false).unwrap();
        assert_eq!(tree.get_node(&NodeId::Int(4)).unwrap().level, 2);
        assert_eq!(tree.get_children(&NodeId::Int(2)).unwrap(), ids(&[4]).as_slice());
    }

    #[test]
    fn test_hash_ids() {
        let mut flat = FlatMap::new();
        flat.insert(NodeId::from("top"), node_record(None, "top"));
        flat.insert(
            NodeId::from("leaf"),
            node_record(Some(&NodeId::from("top")), "leaf"),
        );
        let tree = Tree::from_flat_map(flat).unwrap();
        assert_eq!(tree.root_id(), &NodeId::from("top"));
        assert!(tree.is_leaf(&NodeId::from("leaf")).unwrap());
    }

    #[test]
    fn test_not_found() {
        let tree = sample();
        let missing = NodeId::Int(42);
        assert!(matches!(tree.get_node(&missing), Err(TreeError::NotFound { .. })));
        assert!(tree.get_children(&missing).is_err());
        assert!(tree.get_predecessors(&missing).is_err());
        assert!(tree.get_siblings(&missing).is_err());
        assert!(tree.get_all_children(&missing, false).is_err());
        assert!(tree.is_leaf(&missing).is_err());
        assert!(tree.is_node(&missing).is_err());
        assert!(tree.get_key_path(&missing).is_err());
    }

    #[test]
    fn test_all_children_preorder() {
        let tree = wider();
        assert_eq!(
            tree.get_all_children(&NodeId::Int(1), false).unwrap(),
            ids(&[2, 3, 5, 6, 4, 7])
        );
        assert_eq!(
            tree.get_all_children(&NodeId::Int(1), true).unwrap(),
            ids(&[2, 5, 6, 4, 7])
        );
        assert!(tree.get_all_children(&NodeId::Int(5), false).unwrap().is_empty());
    }

    #[test]
    fn test_siblings() {
        let tree = wider();
        assert_eq!(tree.get_siblings(&NodeId::Int(3)).unwrap(), ids(&[2, 4, 7]));
        assert_eq!(tree.get_siblings(&NodeId::Int(5)).unwrap(), ids(&[6]));
        assert!(tree.get_siblings(&NodeId::Int(1)).unwrap().is_empty());
    }

    #[test]
    fn test_leaf_runs() {
        let tree = wider();
        let runs = tree.get_leaf_siblings();
        assert_eq!(
            runs,
            vec![
                LeafRun { parent: NodeId::Int(1), leaves: ids(&[2]) },
                LeafRun { parent: NodeId::Int(1), leaves: ids(&[4, 7]) },
                LeafRun { parent: NodeId::Int(3), leaves: ids(&[5, 6]) },
            ]
        );
    }

    #[test]
    fn test_nested_dict() {
        let tree = sample();
        assert_eq!(
            tree.get_nested_dict().unwrap(),
            json!({ "1": { "2": { "4": {} }, "3": {} } })
        );
    }

    #[test]
    fn test_reverse_tree_elements() {
        let tree = sample();
        let elements = tree.get_reverse_tree_elements();
        assert_eq!(elements.len(), 4);
        assert_eq!(
            elements.subtree(&NodeId::Int(1)).unwrap(),
            json!({ "2": { "4": {} }, "3": {} })
        );
        assert_eq!(elements.subtree(&NodeId::Int(2)).unwrap(), json!({ "4": {} }));
        assert_eq!(elements.subtree(&NodeId::Int(4)).unwrap(), json!({}));
        assert!(matches!(
            elements.subtree(&NodeId::Int(99)),
            Err(TreeError::NotFound { .. })
        ));
        let order: Vec<&NodeId> = elements.ids().collect();
        assert_eq!(order, ids(&[1, 2, 3, 4]).iter().collect::<Vec<_>>());
    }

    fn chain(depth: u64) -> Tree {
        let mut flat = FlatMap::new();
        flat.insert(NodeId::Int(0), node_record(None, "n0"));
        for i in 1..depth {
            flat.insert(
                NodeId::Int(i),
                node_record(Some(&NodeId::Int(i - 1)), format!("n{i}")),
            );
        }
        Tree::from_flat_map(flat).unwrap()
    }

    #[test]
    fn test_reverse_tree_elements_on_deep_chain() {
        let tree = chain(100_001);
        let elements = tree.get_reverse_tree_elements();
        assert_eq!(elements.len(), 100_001);
        assert_eq!(elements.subtree(&NodeId::Int(100_000)).unwrap(), json!({}));

        // 400 levels below node 99_600: within the bound
        let near_bottom = elements.subtree(&NodeId::Int(99_600)).unwrap();
        let mut depth = 0;
        let mut current = &near_bottom;
        while let Some((_, child)) = current.as_object().and_then(|o| o.iter().next()) {
            depth += 1;
            current = child;
        }
        assert_eq!(depth, 400);

        assert!(matches!(
            elements.subtree(&NodeId::Int(0)),
            Err(TreeError::NestingTooDeep { limit: MAX_NESTED_DEPTH, .. })
        ));
    }

    #[test]
    fn test_nested_dict_depth_bound() {
        // Wrapper object plus one object per level
        let fits = chain((MAX_NESTED_DEPTH - 1) as u64);
        assert!(fits.get_nested_dict().is_ok());

        let deep = chain(100_001);
        match deep.get_nested_dict() {
            Err(TreeError::NestingTooDeep { id, depth, limit }) => {
                assert_eq!(id, NodeId::Int(0));
                assert_eq!(depth, 100_002);
                assert_eq!(limit, MAX_NESTED_DEPTH);
            }
            other => panic!("expected NestingTooDeep, got {other:?}"),
        }
    }

    #[test]
    fn test_key_path() {
        let tree = sample();
        assert_eq!(tree.get_key_path(&NodeId::Int(4)).unwrap(), ["v1", "v2", "v4"]);
        assert_eq!(tree.get_key_path(&NodeId::Int(1)).unwrap(), ["v1"]);
    }

    #[test]
    fn test_leaf_node_partition() {
        let tree = wider();
        for node in tree.nodes() {
            let leaf = tree.is_leaf(&node.id).unwrap();
            assert_ne!(leaf, tree.is_node(&node.id).unwrap());
            assert_eq!(leaf, tree.get_children(&node.id).unwrap().is_empty());
        }
    }

    #[test]
    fn test_field_index_keeps_duplicates() {
        let mut flat = FlatMap::new();
        flat.insert(NodeId::Int(1), record(None, "root"));
        flat.insert(NodeId::Int(2), record(Some(1), "dup"));
        flat.insert(NodeId::Int(3), record(Some(1), "dup"));
        let analyzed = Tree::create_tree(flat.clone(), "value", "parent", true).unwrap();
        let plain = Tree::create_tree(flat, "value", "parent", false).unwrap();
        for tree in [&analyzed, &plain] {
            assert_eq!(tree.find_by_name("dup"), vec![&NodeId::Int(2), &NodeId::Int(3)]);
            assert_eq!(tree.nodes_at_level(1).len(), 2);
            assert!(tree.find_by_name("nope").is_empty());
        }
    }

    #[test]
    fn test_set_attribute_keeps_structure() {
        let mut tree = sample();
        let previous = tree
            .set_attribute(&NodeId::Int(2), "total_size", json!(10))
            .unwrap();
        assert!(previous.is_none());
        assert_eq!(
            tree.get_element(&NodeId::Int(2)).unwrap()["total_size"],
            json!(10)
        );
        assert_eq!(tree.get_children(&NodeId::Int(2)).unwrap(), ids(&[4]).as_slice());
        assert!(tree.set_attribute(&NodeId::Int(9), "x", json!(1)).is_err());
    }

    #[test]
    fn test_json_round_trips_through_serde() {
        let tree = sample();
        let parsed: Value = serde_json::from_str(&tree.json().unwrap()).unwrap();
        assert_eq!(parsed["4"]["parent"], json!(2));
        assert_eq!(parsed["4"]["level"], json!(2));
        assert_eq!(parsed["1"]["children"], json!([2, 3]));
        assert_eq!(parsed["3"]["is_leaf"], json!(true));
        assert_eq!(parsed["2"]["attributes"]["value"], json!("v2"));
    }
}
