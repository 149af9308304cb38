//! # DocDB Storage
//!
//! The persistence collaborators that sit underneath the DocDB object model.
//!
//! Stores are **opaque field stores** - every document field arrives as an
//! already-encoded byte string and is never interpreted here. What a store
//! does own is the revision chain of each document identifier:
//!
//! - a save is conditioned on the revision the writer started from
//! - a successful save produces a revision whose generation is exactly one
//!   above its parent
//! - a stale base revision is reported as a conflict carrying the current
//!   revision, never silently overwritten
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - reference [`DocumentStore`] for tests and ephemeral use
//! - [`InMemoryBlobStore`] - reference [`BlobStore`], content addressed by digest
//!
//! ## Example
//!
//! ```rust
//! use docdb_storage::{ChangeSet, DocumentStore, InMemoryStore, SaveOutcome};
//!
//! let store = InMemoryStore::new();
//! let mut changes = ChangeSet::new();
//! changes.put("name", b"alice".to_vec());
//!
//! let SaveOutcome::Saved(rev) = store.save("doc1", None, &changes).unwrap() else {
//!     panic!("fresh id cannot conflict");
//! };
//! assert_eq!(rev.revision.generation(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod blob;
mod error;
mod memory;
mod revision;
mod store;

pub use blob::{blob_digest, BlobStore, InMemoryBlobStore};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStore;
pub use revision::RevisionId;
pub use store::{ChangeSet, DocumentStore, FieldChange, SaveOutcome, StoredRevision};
