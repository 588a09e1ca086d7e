//! Locating values inside nested data by key/index path

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// One step of a dict path: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    pub fn to_value(&self) -> Value {
        match self {
            PathSegment::Key(key) => Value::from(key.as_str()),
            PathSegment::Index(idx) => Value::from(*idx),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(idx) => write!(f, "{}", idx),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

/// Follow `path` from `root` by successive key/index lookups.
///
/// Returns `None` as soon as a step does not match the shape of the value.
pub fn resolve_path<'a>(root: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    path.iter().try_fold(root, |current, segment| match (current, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get(key),
        (Value::Array(items), PathSegment::Index(idx)) => items.get(*idx),
        _ => None,
    })
}

/// Render a path as a JSON Pointer (RFC 6901), usable with `Value::pointer`.
pub fn to_pointer(path: &[PathSegment]) -> String {
    path.iter()
        .map(|segment| {
            let raw = segment.to_string();
            format!("/{}", raw.replace('~', "~0").replace('/', "~1"))
        })
        .collect()
}
