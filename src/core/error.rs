//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

use super::tree::NodeId;

/// The primary error type for the `core` module.
///
/// Per-entry failures during a walk (unreadable directories, attribute lookups)
/// never surface here; they are folded into the tree or the rendering. This enum
/// only carries failures of a whole operation and contract violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// Represents an error that occurred when a Tokio task was joined.
    /// This is often due to a task panicking or being cancelled.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Represents a path that was expected to be a directory but was not.
    #[error("Path is not a valid directory: {0}")]
    NotADirectory(PathBuf),

    /// An explicit toggle must be Checked or Unchecked.
    #[error("Partial is a derived state and cannot be set directly")]
    PartialSelection,

    /// A node id that does not belong to the tree it was used with.
    #[error("Unknown tree node: {0:?}")]
    UnknownNode(NodeId),

    /// An export collaborator could not complete its batch.
    #[error("Export failed: {0}")]
    Export(String),
}
