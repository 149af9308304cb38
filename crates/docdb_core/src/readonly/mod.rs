//! Immutable snapshots as fetched from the store.

mod array;
mod dictionary;
mod document;

pub use array::ReadOnlyArray;
pub use dictionary::ReadOnlyDictionary;
pub use document::ReadOnlyDocument;
