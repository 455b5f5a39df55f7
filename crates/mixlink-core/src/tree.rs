//! Client-side mirror of the daemon's state tree.
//!
//! Subscribers that want more than the latest patch can replay every patch
//! into a [`StateTree`] and query it by path. Replaying a flattened
//! snapshot onto an empty tree reconstructs the snapshot.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::patch::{Patch, PatchOp};

/// A JSON tree that patches apply to.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTree {
    root: Value,
}

impl Default for StateTree {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTree {
    /// Create an empty tree (an empty object at the root).
    #[must_use]
    pub fn new() -> Self {
        Self { root: Value::Object(Map::new()) }
    }

    /// The current root value.
    #[must_use]
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Look up the value at a `/`-delimited path, if present.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in split_path(path).ok()? {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Apply a single patch to the tree.
    ///
    /// Add and Replace set the value at the path, creating intermediate
    /// objects as needed; both are idempotent. Remove deletes an object key
    /// or exactly the array element at the given index, shifting later
    /// elements down. Removing a missing key or an out-of-range index is an
    /// error, not a silent no-op.
    ///
    /// # Errors
    /// Returns an error if the path is empty, descends through a
    /// non-container, names an invalid or out-of-range array index, or if an
    /// Add/Replace patch carries no value.
    pub fn apply(&mut self, patch: &Patch) -> Result<()> {
        let segments = split_path(&patch.path)?;
        let (last, parents) = segments.split_last().ok_or(Error::EmptyPath)?;

        match patch.op {
            PatchOp::Add | PatchOp::Replace => {
                let value = patch
                    .value
                    .clone()
                    .ok_or_else(|| Error::MissingValue { op: format!("{:?}", patch.op) })?;
                let parent = descend_creating(&mut self.root, parents, &patch.path)?;
                set_child(parent, last, value, &patch.path)
            }
            PatchOp::Remove => {
                let parent = descend(&mut self.root, parents, &patch.path)?;
                remove_child(parent, last, &patch.path)
            }
        }
    }
}

fn split_path(path: &str) -> Result<Vec<&str>> {
    let rest = path.strip_prefix('/').ok_or(Error::EmptyPath)?;
    if rest.is_empty() {
        return Err(Error::EmptyPath);
    }
    Ok(rest.split('/').collect())
}

/// Walk down to the parent of the patch target, materializing missing
/// object segments along the way.
fn descend_creating<'a>(
    root: &'a mut Value,
    segments: &[&str],
    path: &str,
) -> Result<&'a mut Value> {
    let mut current = root;
    for segment in segments {
        current = match current {
            Value::Object(map) => map
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(items) => {
                let index = parse_index(segment, path)?;
                let len = items.len();
                items.get_mut(index).ok_or(Error::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len,
                })?
            }
            _ => return Err(Error::NotAContainer(path.to_string())),
        };
    }
    Ok(current)
}

/// Walk down to the parent of the patch target without creating anything.
fn descend<'a>(root: &'a mut Value, segments: &[&str], path: &str) -> Result<&'a mut Value> {
    let mut current = root;
    for segment in segments {
        current = match current {
            Value::Object(map) => map
                .get_mut(*segment)
                .ok_or_else(|| Error::PathNotFound(path.to_string()))?,
            Value::Array(items) => {
                let index = parse_index(segment, path)?;
                let len = items.len();
                items.get_mut(index).ok_or(Error::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len,
                })?
            }
            _ => return Err(Error::NotAContainer(path.to_string())),
        };
    }
    Ok(current)
}

fn set_child(parent: &mut Value, segment: &str, value: Value, path: &str) -> Result<()> {
    match parent {
        Value::Object(map) => {
            map.insert(segment.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = parse_index(segment, path)?;
            let len = items.len();
            if index < len {
                items[index] = value;
                Ok(())
            } else if index == len {
                items.push(value);
                Ok(())
            } else {
                Err(Error::IndexOutOfRange { path: path.to_string(), index, len })
            }
        }
        _ => Err(Error::NotAContainer(path.to_string())),
    }
}

fn remove_child(parent: &mut Value, segment: &str, path: &str) -> Result<()> {
    match parent {
        Value::Object(map) => map
            .shift_remove(segment)
            .map(|_| ())
            .ok_or_else(|| Error::PathNotFound(path.to_string())),
        Value::Array(items) => {
            let index = parse_index(segment, path)?;
            let len = items.len();
            if index < len {
                items.remove(index);
                Ok(())
            } else {
                Err(Error::IndexOutOfRange { path: path.to_string(), index, len })
            }
        }
        _ => Err(Error::NotAContainer(path.to_string())),
    }
}

fn parse_index(segment: &str, path: &str) -> Result<usize> {
    segment.parse().map_err(|_| Error::InvalidIndex {
        path: path.to_string(),
        segment: segment.to_string(),
    })
}
