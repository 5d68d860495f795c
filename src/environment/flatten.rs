//! Document flattening.
//!
//! # Responsibilities
//! - Turn a nested JSON tree into an ordered `path → string` map
//! - Rebuild a tree from a flat map (inverse used by round-trip checks)
//!
//! # Rules
//! ```text
//! {"limits": {"disk": 1024}}   → limits:disk = "1024"
//! {"uris": ["a", "b"]}         → uris:0 = "a", uris:1 = "b"
//! {"users": null}              → (no entry)
//! {"tags": [], "meta": {}}     → (no entry)
//! ```
//!
//! # Design Decisions
//! - Depth-first pre-order; object members in document order, arrays by index
//! - Null and empty containers produce absence, never an empty string
//! - Scalars use serde_json's canonical text (locale independent)

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Separator between path segments.
pub const KEY_DELIMITER: &str = ":";

/// Ordered mapping of colon-delimited paths to string values.
pub type FlatMap = IndexMap<String, String>;

/// Flatten a document into a new ordered map.
pub fn flatten(document: &Value) -> FlatMap {
    let mut out = FlatMap::new();
    flatten_into(document, "", &mut out);
    out
}

/// Flatten `node` under `prefix`, appending to `out`.
///
/// An empty prefix flattens at the root. A bare scalar with an empty prefix
/// has no path to live under and is skipped.
pub fn flatten_into(node: &Value, prefix: &str, out: &mut FlatMap) {
    match node {
        Value::Null => {}
        Value::Object(members) => {
            for (key, child) in members {
                flatten_into(child, &join_path(prefix, key), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, &join_path(prefix, &index.to_string()), out);
            }
        }
        scalar => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), scalar_to_string(scalar));
            }
        }
    }
}

/// Append `segment` to `prefix` with the key delimiter.
pub fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        let mut path = String::with_capacity(prefix.len() + KEY_DELIMITER.len() + segment.len());
        path.push_str(prefix);
        path.push_str(KEY_DELIMITER);
        path.push_str(segment);
        path
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Containers and null are handled by the caller.
        other => other.to_string(),
    }
}

/// Rebuild a tree from a flat map.
///
/// Every leaf becomes a string. An object whose keys are exactly `0..n` in
/// order is turned back into an array. Re-flattening the result yields the
/// input map.
pub fn unflatten(map: &FlatMap) -> Value {
    let mut root = Map::new();
    for (path, value) in map {
        let segments: Vec<&str> = path.split(KEY_DELIMITER).collect();
        insert_path(&mut root, &segments, value);
    }
    restore_arrays(Value::Object(root))
}

fn insert_path(node: &mut Map<String, Value>, segments: &[&str], value: &str) {
    match segments {
        [] => {}
        [leaf] => {
            node.insert((*leaf).to_string(), Value::String(value.to_string()));
        }
        [head, rest @ ..] => {
            let child = node
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                insert_path(child, rest, value);
            }
        }
    }
}

fn restore_arrays(node: Value) -> Value {
    match node {
        Value::Object(members) => {
            let is_sequence = !members.is_empty()
                && members
                    .keys()
                    .enumerate()
                    .all(|(index, key)| *key == index.to_string());
            if is_sequence {
                Value::Array(members.into_iter().map(|(_, v)| restore_arrays(v)).collect())
            } else {
                Value::Object(
                    members
                        .into_iter()
                        .map(|(k, v)| (k, restore_arrays(v)))
                        .collect(),
                )
            }
        }
        other => other,
    }
}
