//! # DocDB Core
//!
//! The document object model of DocDB.
//!
//! This crate provides:
//! - Read-only snapshots ([`ReadOnlyArray`], [`ReadOnlyDictionary`],
//!   [`ReadOnlyDocument`]) that are cheap to clone and share
//! - Mutable containers ([`MutableArray`], [`MutableDictionary`]) that layer
//!   edits over a snapshot and enforce single-parent containment
//! - [`Document`], a mutable dictionary with an identifier and a revision
//! - [`Fragment`] paths for permissive chained reads and last-hop writes
//! - The optimistic save protocol with pluggable [`ConflictResolver`]s
//!
//! ## Reading and writing
//!
//! ```rust
//! use docdb_core::prelude::*;
//!
//! let db = Database::open_in_memory();
//! let mut doc = Document::with_id("doc1").unwrap();
//! doc.set("name", "Scott Tiger").unwrap();
//! doc.set("address", MutableDictionary::new()).unwrap();
//! doc.fragment("address").get("city").set("Berkeley").unwrap();
//! db.save(&mut doc).unwrap();
//!
//! let stored = db.fetch("doc1").unwrap();
//! assert_eq!(stored.fragment("address").get("city").string().as_deref(), Some("Berkeley"));
//! assert_eq!(stored.fragment("missing").get("b").get(0).int(), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod mutable;
pub mod readonly;

mod blob;
mod config;
mod conflict;
mod database;
mod document;
mod error;
mod fragment;
mod id;
mod traits;
mod value;

pub use blob::Blob;
pub use config::Config;
pub use conflict::{Conflict, ConflictPolicy, ConflictResolver, Resolution};
pub use database::Database;
pub use document::Document;
pub use error::{CoreError, CoreResult};
pub use fragment::{Fragment, Segment};
pub use id::DocumentId;
pub use mutable::{MutableArray, MutableDictionary, MutableValue, Subdocument};
pub use readonly::{ReadOnlyArray, ReadOnlyDictionary, ReadOnlyDocument};
pub use traits::{ArrayRead, DictionaryRead};
pub use value::{format_date, parse_date, Coerce, Value};

pub use docdb_storage::RevisionId;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything needed for day-to-day use, including the read traits that
/// provide the typed getters.
pub mod prelude {
    pub use crate::{
        ArrayRead, Blob, Coerce, ConflictPolicy, ConflictResolver, Database, DictionaryRead,
        Document, Fragment, MutableArray, MutableDictionary, MutableValue, ReadOnlyArray,
        ReadOnlyDictionary, ReadOnlyDocument, Value,
    };
}
