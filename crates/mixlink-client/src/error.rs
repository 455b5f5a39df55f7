//! Client error types.

use thiserror::Error;

/// Per-frame decode failure.
///
/// Frame-scoped and non-fatal: the session loop logs the error and drops
/// the frame, leaving the connection and all other frames unaffected.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Frame is not a JSON object")]
    NotAnObject,

    #[error("Frame has no data field")]
    MissingData,

    #[error("Malformed patch list: {0}")]
    MalformedPatch(#[source] serde_json::Error),
}
