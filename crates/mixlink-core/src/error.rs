//! Error types for Mixlink core.

use thiserror::Error;

/// Core error type for patch and tree operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Empty patch path")]
    EmptyPath,

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Invalid array index in path {path:?}: {segment:?}")]
    InvalidIndex { path: String, segment: String },

    #[error("Array index {index} out of range (len {len}) at {path:?}")]
    IndexOutOfRange { path: String, index: usize, len: usize },

    #[error("Cannot descend into non-container value at {0:?}")]
    NotAContainer(String),

    #[error("Patch op {op:?} requires a value")]
    MissingValue { op: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for Mixlink core operations.
pub type Result<T> = std::result::Result<T, Error>;
