//! Mutable containers layered over read-only snapshots.
//!
//! A mutable container is a shared handle: cloning it yields another
//! reference to the same container. Being *attached* is a separate notion.
//! Every container records the one parent it currently lives in, and every
//! insertion checks that record so that a container never sits in two
//! places at once and never ends up inside itself.
//!
//! Locks: a container's state lock may be held while taking a child's
//! state lock, never the reverse. Inserting a container also takes one
//! global attachment lock, after the target's state lock and before any
//! parent link. Parent links live behind their own mutex, which is never
//! held across any other lock.

mod array;
mod dictionary;
mod node;
mod value;

pub use array::MutableArray;
pub use dictionary::MutableDictionary;
pub use value::MutableValue;

pub(crate) use node::ContainerRef;

/// A mutable dictionary nested inside a document or array.
///
/// It has no identifier of its own and is persisted only as part of the
/// document that contains it.
pub type Subdocument = MutableDictionary;
