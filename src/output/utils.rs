//! Shared utility functions for output formatting

use serde_json::Value;

use crate::tree::TreeNode;

/// Prefix carried down to the children of a node.
pub fn continuation_prefix(prefix: &str, is_last: bool) -> String {
    if is_last {
        format!("{}    ", prefix)
    } else {
        format!("{}│   ", prefix)
    }
}

pub fn connector(is_last: bool) -> &'static str {
    if is_last { "└── " } else { "├── " }
}

/// Format a size in bytes to human-readable format.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1}G", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1}M", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1}K", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}

/// Size shown next to a node: its aggregated total, else its own size.
pub fn node_size(node: &TreeNode) -> Option<u64> {
    node.attribute("total_size")
        .or_else(|| node.attribute("size"))
        .and_then(Value::as_u64)
}
