//! Node identity and the per-node record stored by a `Tree`

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque node identifier, unique within one tree.
///
/// Producers pick the flavour: the dict parser hands out sequential integers,
/// the file tree hashes paths into hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Int(u64),
    Hash(String),
}

impl NodeId {
    /// Interpret a JSON value as a node reference.
    ///
    /// Non-negative integers and strings are ids; everything else is not.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64().map(NodeId::Int),
            Value::String(s) => Some(NodeId::Hash(s.clone())),
            _ => None,
        }
    }

    /// The JSON form used when the id is stored as an attribute.
    pub fn to_value(&self) -> Value {
        match self {
            NodeId::Int(n) => Value::from(*n),
            NodeId::Hash(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Int(n) => write!(f, "{}", n),
            NodeId::Hash(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId::Int(id)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId::Hash(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        NodeId::Hash(id)
    }
}

/// A single node of a built tree.
///
/// `level`, `is_leaf` and `children` are derived during construction and never
/// change afterwards. `attributes` is the record the producer supplied.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub level: usize,
    pub is_leaf: bool,
    pub name: String,
    pub attributes: Map<String, Value>,
}

impl TreeNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Look up a producer attribute such as `size` or `dict_path`.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// Render an attribute value as a display label.
pub(crate) fn value_label(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
