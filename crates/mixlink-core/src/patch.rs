//! The patch model: a single flat change notification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operation carried by a patch.
///
/// Wire names are lowercase to match the daemon's JSON-patch vocabulary.
/// An unrecognized op fails deserialization for that frame only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    /// Insert a value at a path
    Add,
    /// Overwrite the value at a path
    Replace,
    /// Delete the value at a path
    Remove,
}

/// A single flat `{op, path, value}` change notification.
///
/// Either received incrementally from the daemon or synthesized from a
/// snapshot by [`crate::flatten::flatten_snapshot`]. Patches are immutable
/// and ephemeral; the client does not retain them after dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// What to do at the path
    pub op: PatchOp,
    /// `/`-delimited structural address into the daemon's state tree,
    /// e.g. `/mixers/<serial>/levels/volumes/Mic`
    pub path: String,
    /// Present for Add/Replace, absent for Remove
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Patch {
    /// Create a synthetic Replace patch, the shape the flattener emits.
    #[must_use]
    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self { op: PatchOp::Replace, path: path.into(), value: Some(value) }
    }
}
