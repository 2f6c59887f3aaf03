//! Snapshot error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A path resolves outside the managed root.
    #[error("Path {path:?} is outside the managed root {root:?}")]
    PathOutsideRoot { path: PathBuf, root: PathBuf },

    /// A path points into the repository metadata.
    #[error("Path {0:?} is inside repository metadata")]
    ProtectedPath(PathBuf),

    /// The working tree already matches HEAD.
    #[error("No changes to commit")]
    NoChanges,

    /// Unknown revision identifier.
    #[error("Revision not found: {0}")]
    RevisionNotFound(String),

    /// The repository could not be created or opened.
    #[error("Failed to initialize snapshot repository: {0}")]
    Initialization(String),

    /// The repository has no commits yet.
    #[error("Snapshot repository is not initialized")]
    NotInitialized,

    /// `end` was called without an open checkpoint.
    #[error("No checkpoint is active")]
    CheckpointNotActive,

    /// Retention ceiling below one revision.
    #[error("Invalid retention ceiling {0}: at least one revision must be kept")]
    InvalidRetention(usize),

    /// Versioning is switched off in configuration.
    #[error("Configuration versioning is disabled")]
    Disabled,

    /// The store behind a checkpoint manager was dropped.
    #[error("Snapshot store has been closed")]
    StoreClosed,

    /// Git error.
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid glob pattern.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Operation failed.
    #[error("Snapshot operation failed: {0}")]
    OperationFailed(String),
}

impl SnapshotError {
    /// Create a revision not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::RevisionNotFound(id.into())
    }

    /// Create an operation failed error.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::OperationFailed(message.into())
    }

    /// Whether this is the expected "nothing to commit" outcome.
    pub fn is_no_changes(&self) -> bool {
        matches!(self, Self::NoChanges)
    }
}
