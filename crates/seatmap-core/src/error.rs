//! Error types for scene operations.

use crate::shapes::ShapeId;
use thiserror::Error;

/// Result type for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Errors that can occur while editing the scene.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    /// The referenced shape is no longer in the tree.
    #[error("Shape not found: {0}")]
    NotFound(ShapeId),

    /// A shape with the same id already exists somewhere in the tree.
    #[error("Duplicate shape id: {0}")]
    DuplicateId(ShapeId),

    /// Operation rejected before any mutation (e.g. grouping a single item).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Image or SVG data could not be decoded.
    #[error("Import failed: {0}")]
    ImportFailure(String),

    /// A stored snapshot cannot be restored.
    #[error("History corrupted: {0}")]
    HistoryCorruption(String),

    /// A parent walk revisited a node.
    #[error("Cycle detected at shape {0}")]
    Cycle(ShapeId),
}
