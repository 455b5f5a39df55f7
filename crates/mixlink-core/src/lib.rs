//! Mixlink Core - Patch model, snapshot flattening, and state mirroring.
//!
//! This crate contains the protocol-independent domain model shared between
//! the client and any consumer that wants to keep its own view of the
//! daemon's state tree.

pub mod error;
pub mod flatten;
pub mod patch;
pub mod path;
pub mod tree;

pub use error::{Error, Result};
pub use flatten::flatten_snapshot;
pub use patch::{Patch, PatchOp};
pub use path::PathPattern;
pub use tree::StateTree;
