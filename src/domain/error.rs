//! Error taxonomy for store operations
//!
//! Every store operation returns a typed outcome. None of these errors is
//! fatal: a failed operation leaves the collection in its last valid,
//! fully-normalized state and the caller decides how to surface the failure.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    /// Empty or otherwise invalid user input
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A referenced id does not resolve
    #[error("Not found: {0}")]
    NotFound(String),

    /// Cross-scope or out-of-range reorder
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    /// Paste attempted with nothing copied
    #[error("Clipboard is empty")]
    EmptyClipboard,

    /// Bulk copy attempted with no tasks selected
    #[error("Selection is empty")]
    EmptySelection,

    /// Unreadable persisted or imported data; existing state is untouched
    #[error("Malformed data: {0}")]
    MalformedData(String),

    /// The external text service failed; drafts are preserved
    #[error("Text service failed: {0}")]
    ExternalService(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
