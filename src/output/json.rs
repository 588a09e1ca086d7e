//! JSON output formatting

use std::io;

use crate::dict::DictTree;
use crate::tree::Tree;

/// Print the tree's node map as pretty-printed JSON to stdout.
pub fn print_json(tree: &Tree) -> io::Result<()> {
    let json = tree.json().map_err(io::Error::other)?;
    println!("{}", json);
    Ok(())
}

/// Print a parsed dictionary as its flat map, pretty-printed, to stdout.
pub fn print_flat_json(dict: &DictTree<'_>) -> io::Result<()> {
    let flat: serde_json::Map<String, serde_json::Value> = dict
        .to_flat_map()
        .into_iter()
        .map(|(id, record)| (id.to_string(), serde_json::Value::Object(record)))
        .collect();
    let json = serde_json::to_string_pretty(&flat).map_err(io::Error::other)?;
    println!("{}", json);
    Ok(())
}
