//! Error types for sync and lookup operations.

use thiserror::Error;

/// Failures that abort a sync pass, or stop it from starting.
///
/// Duplicate-key races and missing tree paths are expected during a pass
/// and handled where they occur; they never surface here.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The name is not present in the repository registry.
    #[error("repository '{0}' is not registered")]
    RepositoryNotFound(String),

    /// The object store failed: unreadable repository, missing object,
    /// malformed commit graph. The frontier is left unchanged.
    #[error("object store error: {0}")]
    Walker(#[from] git2::Error),

    /// The index store failed. The frontier is left unchanged, so the next
    /// pass retries the same range.
    #[error("index storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
