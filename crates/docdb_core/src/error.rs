//! Error types for DocDB core.

use crate::codec::CodecError;
use docdb_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in DocDB core operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// Store collaborator error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Value codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Array index outside the valid range.
    #[error("index {index} out of range for array of {count} elements")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The array length at the time of the call.
        count: usize,
    },

    /// A mutable container was placed where it cannot live.
    #[error("invalid containment: {reason}")]
    InvalidContainment {
        /// Why the placement was rejected.
        reason: String,
    },

    /// Empty or malformed document identifier.
    #[error("invalid document id: {id:?}")]
    InvalidId {
        /// The rejected identifier.
        id: String,
    },

    /// Mutation attempted through a read-only handle.
    #[error("unsupported operation: {message}")]
    UnsupportedOperation {
        /// What was attempted.
        message: String,
    },

    /// A save or delete lost against a concurrent revision.
    #[error("conflict on document {doc_id}: {reason}")]
    Conflict {
        /// The document that conflicted.
        doc_id: String,
        /// Why the conflict could not be resolved.
        reason: String,
    },

    /// Document does not exist.
    #[error("not found: {doc_id}")]
    NotFound {
        /// The identifier that was looked up.
        doc_id: String,
    },

    /// A fragment write whose intermediate path is not a container.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The path that failed to resolve.
        path: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates an index out of range error.
    pub fn index_out_of_range(index: usize, count: usize) -> Self {
        Self::IndexOutOfRange { index, count }
    }

    /// Creates an invalid containment error.
    pub fn invalid_containment(reason: impl Into<String>) -> Self {
        Self::InvalidContainment {
            reason: reason.into(),
        }
    }

    /// Creates an invalid id error.
    pub fn invalid_id(id: impl Into<String>) -> Self {
        Self::InvalidId { id: id.into() }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            message: message.into(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(doc_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Conflict {
            doc_id: doc_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(doc_id: impl Into<String>) -> Self {
        Self::NotFound {
            doc_id: doc_id.into(),
        }
    }

    /// Creates a path not found error.
    pub fn path_not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for the conflict variant.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
