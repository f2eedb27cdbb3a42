//! Dotted-path view over nested request data.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Nodes nested deeper than this are kept as values but not expanded
pub const MAX_FLATTEN_DEPTH: usize = 32;

/// Flattened view of one request bucket.
///
/// Leaves (scalars, empty containers and containers at the depth cap) are
/// stored with their values; objects and arrays that were expanded are
/// recorded by path only, so every input node is stored at most once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatPaths {
    leaves: BTreeMap<String, Value>,
    branches: BTreeSet<String>,
}

impl FlatPaths {
    /// Value of a leaf path. Expanded objects and arrays have no value here;
    /// use [`FlatPaths::contains`] to test for them.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.leaves.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.leaves.contains_key(path) || self.branches.contains(path)
    }

    /// Number of stored paths, leaves and branches together
    pub fn len(&self) -> usize {
        self.leaves.len() + self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty() && self.branches.is_empty()
    }

    /// Leaf paths with their values
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.leaves.iter()
    }
}

/// Flatten a bucket into dotted paths.
///
/// Top-level keys are kept as they are. Objects and arrays are walked, with
/// array indices used as path segments, and both intermediate and leaf nodes
/// get an entry.
pub fn flatten(data: &Map<String, Value>) -> FlatPaths {
    let mut flat = FlatPaths::default();
    // (path, value, depth)
    let mut stack: Vec<(String, &Value, usize)> = data
        .iter()
        .map(|(key, value)| (key.clone(), value, 1))
        .collect();

    while let Some((path, value, depth)) = stack.pop() {
        let expandable = depth < MAX_FLATTEN_DEPTH;
        match value {
            Value::Object(children) if expandable && !children.is_empty() => {
                for (key, child) in children {
                    stack.push((format!("{}.{}", path, key), child, depth + 1));
                }
                flat.branches.insert(path);
            }
            Value::Array(items) if expandable && !items.is_empty() => {
                for (index, child) in items.iter().enumerate() {
                    stack.push((format!("{}.{}", path, index), child, depth + 1));
                }
                flat.branches.insert(path);
            }
            _ => {
                flat.leaves.insert(path, value.clone());
            }
        }
    }

    flat
}
