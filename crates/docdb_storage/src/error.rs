//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The document identifier has never been stored (or was purged).
    #[error("document not found: {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: String,
    },

    /// A revision string could not be parsed.
    #[error("invalid revision: {0}")]
    InvalidRevision(String),

    /// Stored state is inconsistent.
    #[error("store corrupted: {0}")]
    Corrupted(String),
}

impl StorageError {
    /// Creates a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}
