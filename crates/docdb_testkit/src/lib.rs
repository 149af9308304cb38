//! # DocDB Testkit
//!
//! Test utilities for DocDB.
//!
//! This crate provides:
//! - Test fixtures and database helpers
//! - Property-based test generators using proptest
//! - A plain `Vec` reference model for mutable array edits
//! - Integration helpers for the concurrent save protocol
//!
//! ## Usage
//!
//! ```rust
//! use docdb_testkit::prelude::*;
//!
//! with_temp_db(|db| {
//!     let doc = populate_document(db, "doc1");
//!     assert_eq!(doc.int("one"), 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod model;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::model::*;
    pub use docdb_core::prelude::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use model::*;
