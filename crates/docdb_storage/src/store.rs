//! Document store trait definition.

use crate::error::StorageResult;
use crate::revision::RevisionId;

/// One persisted revision of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRevision {
    /// Document identifier.
    pub id: String,
    /// Revision of this state.
    pub revision: RevisionId,
    /// Whether this revision is a deletion tombstone.
    pub deleted: bool,
    /// Encoded fields in stored order.
    pub fields: Vec<(String, Vec<u8>)>,
}

impl StoredRevision {
    /// Looks up the encoded bytes of a field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }
}

/// A single field edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    /// Insert or replace a field.
    Put {
        /// Field name.
        key: String,
        /// Encoded field value.
        value: Vec<u8>,
    },
    /// Remove a field.
    Remove {
        /// Field name.
        key: String,
    },
}

impl FieldChange {
    /// Returns the field name this change touches.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            FieldChange::Put { key, .. } | FieldChange::Remove { key } => key,
        }
    }
}

/// The field edits a writer submits against a base revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a field insert or replacement.
    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.changes.push(FieldChange::Put {
            key: key.into(),
            value,
        });
    }

    /// Records a field removal.
    pub fn remove(&mut self, key: impl Into<String>) {
        self.changes.push(FieldChange::Remove { key: key.into() });
    }

    /// Returns true if there are no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the number of changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Iterates the changes in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.changes.iter()
    }

    /// Applies the changes to a field list.
    ///
    /// Replaced fields keep their position, new fields are appended and
    /// removed fields are dropped. Removing an absent field is a no-op.
    pub fn apply_to(&self, fields: &mut Vec<(String, Vec<u8>)>) {
        for change in &self.changes {
            match change {
                FieldChange::Put { key, value } => {
                    match fields.iter_mut().find(|(k, _)| k == key) {
                        Some(slot) => slot.1.clone_from(value),
                        None => fields.push((key.clone(), value.clone())),
                    }
                }
                FieldChange::Remove { key } => fields.retain(|(k, _)| k != key),
            }
        }
    }
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The write was applied and produced this revision.
    Saved(StoredRevision),
    /// The base revision was stale. Carries the current revision, or `None`
    /// if the identifier no longer exists at all.
    Conflict(Option<StoredRevision>),
}

/// A document store with per-identifier optimistic concurrency.
///
/// # Invariants
///
/// - `save` and `delete` are atomic: every change applies or none does
/// - a successful write's revision is derived from the revision it was
///   conditioned on, so generations increase by exactly one
/// - a write whose base is not the current revision returns
///   [`SaveOutcome::Conflict`] and changes nothing
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - reference implementation
pub trait DocumentStore: Send + Sync {
    /// Fetches the current revision of a document, tombstones included.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn fetch(&self, id: &str) -> StorageResult<Option<StoredRevision>>;

    /// Applies `changes` on top of `base`.
    ///
    /// With `base = None` the write creates the document; it succeeds when the
    /// identifier is unknown or tombstoned and conflicts with a live revision.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn save(
        &self,
        id: &str,
        base: Option<&RevisionId>,
        changes: &ChangeSet,
    ) -> StorageResult<SaveOutcome>;

    /// Writes a deletion tombstone on top of `base`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if the identifier is unknown.
    fn delete(&self, id: &str, base: &RevisionId) -> StorageResult<SaveOutcome>;

    /// Removes every trace of a document. Returns true if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn purge(&self, id: &str) -> StorageResult<bool>;

    /// Returns the identifiers of all live (non-deleted) documents, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn ids(&self) -> StorageResult<Vec<String>>;

    /// Returns the number of live documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn count(&self) -> StorageResult<usize> {
        Ok(self.ids()?.len())
    }

    /// Returns true if a live revision exists for `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn contains(&self, id: &str) -> StorageResult<bool> {
        Ok(self.fetch(id)?.is_some_and(|rev| !rev.deleted))
    }
}
