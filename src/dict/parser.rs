//! Nested data to tree conversion
//!
//! `DictParser` walks a `serde_json::Value` with an explicit work stack and
//! stores every mapping entry, sequence item and scalar as a node in a flat
//! arena, indexed by its synthetic id.

use std::fmt;

use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, TreeError};
use crate::tree::{DEFAULT_NAME_FIELD, DEFAULT_PARENT_FIELD, FlatMap, NodeId, Tree};

use super::path::PathSegment;

/// Runtime shape of a node's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjType {
    Object,
    Array,
    String,
    Integer,
    Float,
    Boolean,
    Null,
}

impl ObjType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => ObjType::Object,
            Value::Array(_) => ObjType::Array,
            Value::String(_) => ObjType::String,
            Value::Number(n) if n.is_f64() => ObjType::Float,
            Value::Number(_) => ObjType::Integer,
            Value::Bool(_) => ObjType::Boolean,
            Value::Null => ObjType::Null,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjType::Object => "object",
            ObjType::Array => "array",
            ObjType::String => "string",
            ObjType::Integer => "integer",
            ObjType::Float => "float",
            ObjType::Boolean => "boolean",
            ObjType::Null => "null",
        }
    }

    /// Mappings and sequences; everything else terminates the descent.
    pub fn is_container(&self) -> bool {
        matches!(self, ObjType::Object | ObjType::Array)
    }
}

impl fmt::Display for ObjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node produced by the parser. Borrows its value from the parsed input.
#[derive(Debug, Clone, Serialize)]
pub struct DictNode<'a> {
    pub id: u64,
    pub parent: Option<u64>,
    /// Mapping key, when the value is a mapping entry.
    pub key: Option<String>,
    /// Position, when the value is a sequence item.
    pub list_idx: Option<usize>,
    pub object: &'a Value,
    pub obj_type: ObjType,
    pub children: Vec<u64>,
    /// Root first, ending with this node itself.
    pub predecessors: Vec<u64>,
    /// Keys and indices leading from the input to `object`; empty for the root.
    pub dict_path: Vec<PathSegment>,
    pub level: usize,
    pub is_leaf: bool,
}

impl<'a> DictNode<'a> {
    fn new(
        id: u64,
        parent: Option<u64>,
        key: Option<String>,
        list_idx: Option<usize>,
        object: &'a Value,
    ) -> Self {
        Self {
            id,
            parent,
            key,
            list_idx,
            object,
            obj_type: ObjType::of(object),
            children: Vec::new(),
            predecessors: Vec::new(),
            dict_path: Vec::new(),
            level: 0,
            is_leaf: false,
        }
    }

    pub fn node_id(&self) -> NodeId {
        NodeId::Int(self.id)
    }

    fn segment(&self) -> Option<PathSegment> {
        match (&self.key, self.list_idx) {
            (Some(key), _) => Some(PathSegment::Key(key.clone())),
            (None, Some(idx)) => Some(PathSegment::Index(idx)),
            (None, None) => None,
        }
    }
}

/// Sequential id source, threaded through a single parse.
#[derive(Debug, Default)]
struct IdCounter(u64);

impl IdCounter {
    fn next(&mut self) -> u64 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

/// An entry waiting on the work stack.
struct Pending<'a> {
    parent: u64,
    key: Option<String>,
    list_idx: Option<usize>,
    value: &'a Value,
}

/// Converts nested data into a `DictTree`.
#[derive(Debug, Clone)]
pub struct DictParser {
    root_name: String,
}

impl Default for DictParser {
    fn default() -> Self {
        Self {
            root_name: "root".to_string(),
        }
    }
}

impl DictParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display name given to the synthetic root node.
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// Parse `input` into a tree. Never fails: every value that is neither a
    /// mapping nor a sequence becomes a leaf.
    pub fn parse<'a>(&self, input: &'a Value) -> DictTree<'a> {
        let mut counter = IdCounter::default();
        let mut nodes = vec![DictNode::new(counter.next(), None, None, None, input)];
        let mut stack = Vec::new();
        push_children(&mut stack, 0, input);

        // Ids are handed out on pop, which numbers nodes in pre-order and keeps
        // `nodes[id]` addressing valid.
        while let Some(pending) = stack.pop() {
            let id = counter.next();
            nodes[pending.parent as usize].children.push(id);
            push_children(&mut stack, id, pending.value);
            nodes.push(DictNode::new(
                id,
                Some(pending.parent),
                pending.key,
                pending.list_idx,
                pending.value,
            ));
        }

        annotate(&mut nodes);
        debug!("parsed {} nodes from {} input", nodes.len(), ObjType::of(input));

        DictTree {
            input,
            nodes,
            root_name: self.root_name.clone(),
        }
    }
}

fn push_children<'a>(stack: &mut Vec<Pending<'a>>, parent: u64, value: &'a Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter().rev() {
                stack.push(Pending {
                    parent,
                    key: Some(key.clone()),
                    list_idx: None,
                    value: child,
                });
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate().rev() {
                stack.push(Pending {
                    parent,
                    key: None,
                    list_idx: Some(idx),
                    value: child,
                });
            }
        }
        _ => {}
    }
}

/// Fill in predecessors, dict path, level and leaf flag.
///
/// Parents always precede their children in the arena, so one forward sweep
/// sees every parent finished before its children.
fn annotate(nodes: &mut [DictNode<'_>]) {
    for idx in 0..nodes.len() {
        let (predecessors, dict_path) = match nodes[idx].parent {
            Some(parent) => {
                let parent = &nodes[parent as usize];
                let mut predecessors = parent.predecessors.clone();
                let mut dict_path = parent.dict_path.clone();
                dict_path.extend(nodes[idx].segment());
                predecessors.push(nodes[idx].id);
                (predecessors, dict_path)
            }
            None => (vec![nodes[idx].id], Vec::new()),
        };
        let node = &mut nodes[idx];
        node.level = predecessors.len() - 1;
        node.predecessors = predecessors;
        node.dict_path = dict_path;
    }

    for node in nodes.iter_mut() {
        node.is_leaf = node.children.is_empty();
    }
}

/// Convert any serializable value into parser input.
///
/// Values serde cannot express as JSON (for example maps with non-string
/// keys) are kept as a single opaque leaf holding their debug text.
pub fn to_payload<T: Serialize + fmt::Debug>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("storing value as opaque leaf: {}", e);
            Value::String(format!("{:?}", value))
        }
    }
}

/// Result of a parse: the node arena plus the input it borrows from.
#[derive(Debug, Clone)]
pub struct DictTree<'a> {
    input: &'a Value,
    nodes: Vec<DictNode<'a>>,
    root_name: String,
}

impl<'a> DictTree<'a> {
    pub fn input(&self) -> &'a Value {
        self.input
    }

    pub fn root(&self) -> &DictNode<'a> {
        &self.nodes[0]
    }

    pub fn nodes(&self) -> &[DictNode<'a>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: u64) -> Result<&DictNode<'a>> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.nodes.get(idx))
            .ok_or(TreeError::NotFound {
                id: NodeId::Int(id),
            })
    }

    /// The input value a tree node id stands for, containers included.
    pub fn object(&self, id: &NodeId) -> Result<&'a Value> {
        match id {
            NodeId::Int(idx) => self.node(*idx).map(|node| node.object),
            NodeId::Hash(_) => Err(TreeError::not_found(id)),
        }
    }

    pub fn leaves(&self) -> impl Iterator<Item = &DictNode<'a>> {
        self.nodes.iter().filter(|node| node.is_leaf)
    }

    /// Find the node whose dict path equals `path`.
    pub fn find_path(&self, path: &[PathSegment]) -> Option<&DictNode<'a>> {
        let mut current = self.root();
        for segment in path {
            current = current
                .children
                .iter()
                .filter_map(|child| self.nodes.get(*child as usize))
                .find(|child| child.segment().as_ref() == Some(segment))?;
        }
        Some(current)
    }

    /// Display name of a node: its key, its list index, or the root name.
    pub fn name_of(&self, node: &DictNode<'_>) -> String {
        match node.segment() {
            Some(segment) => segment.to_string(),
            None => self.root_name.clone(),
        }
    }

    /// Flat `id -> attributes` map for `Tree::create_tree`.
    ///
    /// Only leaves carry their `object`. A container's value would otherwise be
    /// copied once per ancestor; look it up with `DictTree::object` instead.
    pub fn to_flat_map(&self) -> FlatMap {
        self.nodes
            .iter()
            .map(|node| {
                let mut record = Map::new();
                record.insert(
                    DEFAULT_PARENT_FIELD.to_string(),
                    node.parent.map_or(Value::Null, Value::from),
                );
                record.insert(DEFAULT_NAME_FIELD.to_string(), Value::from(self.name_of(node)));
                record.insert(
                    "key".to_string(),
                    node.key.as_deref().map_or(Value::Null, Value::from),
                );
                record.insert(
                    "list_idx".to_string(),
                    node.list_idx.map_or(Value::Null, Value::from),
                );
                record.insert("obj_type".to_string(), Value::from(node.obj_type.as_str()));
                record.insert(
                    "dict_path".to_string(),
                    Value::Array(node.dict_path.iter().map(PathSegment::to_value).collect()),
                );
                if node.is_leaf {
                    record.insert("object".to_string(), node.object.clone());
                }
                (node.node_id(), record)
            })
            .collect()
    }

    /// Build the generic tree for these nodes.
    ///
    /// The tree's ids are the parser's, so `DictTree::object` resolves any of
    /// them, branches included, back to the input value.
    pub fn build_tree(&self, analyze_fields: bool) -> Result<Tree> {
        Tree::create_tree(
            self.to_flat_map(),
            DEFAULT_NAME_FIELD,
            DEFAULT_PARENT_FIELD,
            analyze_fields,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::resolve_path;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn sample() -> Value {
        json!({ "k1": "value1", "k2": { "k2.1": 5, "k2.2": [1, 2] } })
    }

    #[test]
    fn test_nested_scenario() {
        let input = sample();
        let parsed = DictParser::new().parse(&input);

        let list = parsed
            .find_path(&["k2".into(), "k2.2".into()])
            .expect("k2.2 node");
        assert_eq!(list.children.len(), 2);
        assert_eq!(list.obj_type, ObjType::Array);

        let second = parsed.node(list.children[1]).unwrap();
        assert!(second.is_leaf);
        assert_eq!(
            second.dict_path,
            vec![PathSegment::from("k2"), "k2.2".into(), 1.into()]
        );
        assert_eq!(second.object, &json!(2));
        assert_eq!(second.list_idx, Some(1));
        assert_eq!(second.key, None);
        assert!(parsed.node(list.children[0]).unwrap().is_leaf);
    }

    #[test]
    fn test_ids_are_preorder_and_sequential() {
        let input = sample();
        let parsed = DictParser::new().parse(&input);
        let names: Vec<String> = parsed.nodes().iter().map(|n| parsed.name_of(n)).collect();
        assert_eq!(names, ["root", "k1", "k2", "k2.1", "k2.2", "0", "1"]);
        for (idx, node) in parsed.nodes().iter().enumerate() {
            assert_eq!(node.id, idx as u64);
        }
        assert_eq!(parsed.root().children, vec![1, 2]);
    }

    #[test]
    fn test_predecessors_and_levels() {
        let input = sample();
        let parsed = DictParser::new().parse(&input);
        let deepest = parsed.node(6).unwrap();
        assert_eq!(deepest.predecessors, vec![0, 2, 4, 6]);
        assert_eq!(deepest.level, 3);
        assert_eq!(parsed.root().predecessors, vec![0]);
        assert_eq!(parsed.root().level, 0);
        assert!(parsed.root().dict_path.is_empty());
    }

    #[test]
    fn test_round_trip_every_node() {
        let input = json!({
            "a": [[1, 2], [], {"b": null}],
            "c": {"d": {"e": 1.5}},
            "f": true,
            "": "empty key"
        });
        let parsed = DictParser::new().parse(&input);
        for node in parsed.nodes() {
            assert_eq!(resolve_path(&input, &node.dict_path), Some(node.object));
        }
    }

    #[test]
    fn test_list_of_lists() {
        let input = json!([[1, 2], [3]]);
        let parsed = DictParser::new().parse(&input);
        assert_eq!(parsed.len(), 6);
        let inner = parsed.find_path(&[1.into(), 0.into()]).unwrap();
        assert_eq!(inner.object, &json!(3));
        assert_eq!(inner.level, 2);
    }

    #[test]
    fn test_scalar_input_is_single_leaf() {
        let input = json!(42);
        let parsed = DictParser::new().parse(&input);
        assert_eq!(parsed.len(), 1);
        assert!(parsed.root().is_leaf);
        assert_eq!(parsed.root().obj_type, ObjType::Integer);
    }

    #[test]
    fn test_empty_containers_are_leaves() {
        let input = json!({ "obj": {}, "arr": [] });
        let parsed = DictParser::new().parse(&input);
        let obj = parsed.find_path(&["obj".into()]).unwrap();
        assert!(obj.is_leaf);
        assert_eq!(obj.obj_type, ObjType::Object);
    }

    #[test]
    fn test_obj_types() {
        assert_eq!(ObjType::of(&json!(1)), ObjType::Integer);
        assert_eq!(ObjType::of(&json!(1.5)), ObjType::Float);
        assert_eq!(ObjType::of(&json!("s")), ObjType::String);
        assert_eq!(ObjType::of(&json!(false)), ObjType::Boolean);
        assert_eq!(ObjType::of(&Value::Null), ObjType::Null);
        assert!(ObjType::Array.is_container());
        assert!(!ObjType::Null.is_container());
    }

    #[test]
    fn test_node_not_found() {
        let input = sample();
        let parsed = DictParser::new().parse(&input);
        assert!(matches!(parsed.node(100), Err(TreeError::NotFound { .. })));
        assert!(parsed.find_path(&["missing".into()]).is_none());
    }

    #[test]
    fn test_build_tree() {
        let input = sample();
        let parsed = DictParser::new().parse(&input);
        let tree = parsed.build_tree(true).unwrap();

        assert_eq!(tree.len(), parsed.len());
        assert_eq!(tree.root_id(), &NodeId::Int(0));
        assert_eq!(tree.max_level(), 3);
        assert_eq!(
            tree.get_key_path(&NodeId::Int(6)).unwrap(),
            ["root", "k2", "k2.2", "1"]
        );
        let element = tree.get_element(&NodeId::Int(6)).unwrap();
        assert_eq!(element["dict_path"], json!(["k2", "k2.2", 1]));
        assert_eq!(element["object"], json!(2));
        assert_eq!(element["list_idx"], json!(1));
        assert!(tree.get_element(&NodeId::Int(2)).unwrap().get("object").is_none());
        assert_eq!(tree.find_by_name("k2.1"), vec![&NodeId::Int(3)]);
    }

    #[test]
    fn test_custom_root_name() {
        let input = json!({ "a": 1 });
        let parsed = DictParser::new().with_root_name("config").parse(&input);
        assert_eq!(parsed.name_of(parsed.root()), "config");
    }

    #[test]
    fn test_parser_is_reentrant() {
        let parser = DictParser::new();
        let first_input = json!({ "x": [1, 2, 3] });
        let second_input = json!(["a"]);
        let first = parser.parse(&first_input);
        let second = parser.parse(&second_input);
        assert_eq!(first.len(), 5);
        assert_eq!(second.nodes()[1].id, 1);
    }

    #[test]
    fn test_to_payload_degrades_to_opaque_leaf() {
        let mut bad: BTreeMap<(u8, u8), u8> = BTreeMap::new();
        bad.insert((1, 2), 3);
        let payload = to_payload(&bad);
        assert!(payload.is_string());
        let parsed = DictParser::new().parse(&payload);
        assert_eq!(parsed.len(), 1);

        let good = to_payload(&vec![1, 2]);
        assert_eq!(good, json!([1, 2]));
    }

    #[test]
    fn test_container_objects_resolve_through_dict_tree() {
        let input = sample();
        let parsed = DictParser::new().parse(&input);
        let tree = parsed.build_tree(false).unwrap();

        let list = NodeId::Int(4);
        assert!(tree.is_node(&list).unwrap());
        assert!(!tree.get_element(&list).unwrap().contains_key("object"));
        assert_eq!(parsed.object(&list).unwrap(), &json!([1, 2]));
        assert_eq!(parsed.object(tree.root_id()).unwrap(), &input);

        let leaf = NodeId::Int(3);
        assert_eq!(tree.get_element(&leaf).unwrap()["object"], json!(5));
        assert_eq!(parsed.object(&leaf).unwrap(), &json!(5));

        assert!(matches!(
            parsed.object(&NodeId::Int(7)),
            Err(TreeError::NotFound { .. })
        ));
        assert!(parsed.object(&NodeId::from("k2")).is_err());
    }
}
