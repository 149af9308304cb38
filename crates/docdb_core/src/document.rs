//! Mutable documents.

use crate::codec;
use crate::database::Database;
use crate::error::{CoreError, CoreResult};
use crate::fragment::Fragment;
use crate::id::DocumentId;
use crate::mutable::{MutableArray, MutableDictionary, MutableValue};
use crate::readonly::{ReadOnlyDictionary, ReadOnlyDocument};
use crate::traits::DictionaryRead;
use docdb_storage::{ChangeSet, RevisionId};
use std::fmt;

/// A mutable document: a dictionary with an identifier and a revision.
///
/// The identifier never changes. The revision is the one the document was
/// last read or saved at; it is what a save is conditioned on.
///
/// # Example
///
/// ```rust
/// use docdb_core::{Database, Document, DictionaryRead};
///
/// let db = Database::open_in_memory();
/// let mut doc = Document::with_id("doc1").unwrap();
/// doc.set("name", "Scott Tiger").unwrap();
/// db.save(&mut doc).unwrap();
///
/// let mut copy = db.get_document("doc1").unwrap().unwrap();
/// copy.set("age", 30).unwrap();
/// copy.save().unwrap();
/// assert_eq!(copy.revision().unwrap().generation(), 2);
/// ```
pub struct Document {
    id: DocumentId,
    root: MutableDictionary,
    base: Option<ReadOnlyDocument>,
    deleted: bool,
    database: Option<Database>,
}

impl Document {
    /// Creates an empty document with a random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::fresh(DocumentId::new(), ReadOnlyDictionary::new())
    }

    /// Creates an empty document with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidId`] if `id` is empty or malformed.
    pub fn with_id(id: impl Into<String>) -> CoreResult<Self> {
        Ok(Self::fresh(DocumentId::parse(id)?, ReadOnlyDictionary::new()))
    }

    /// Creates a document with the given identifier and content.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidId`] if `id` is empty or malformed.
    pub fn with_content(id: impl Into<String>, content: ReadOnlyDictionary) -> CoreResult<Self> {
        Ok(Self::fresh(DocumentId::parse(id)?, content))
    }

    /// Creates a document from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidId`] for a bad identifier or
    /// [`CoreError::InvalidOperation`] if `json` is not an object.
    pub fn with_json(id: impl Into<String>, json: serde_json::Value) -> CoreResult<Self> {
        let id = DocumentId::parse(id)?;
        Ok(Self::fresh(id, ReadOnlyDictionary::from_json(json)?))
    }

    pub(crate) fn fresh(id: DocumentId, content: ReadOnlyDictionary) -> Self {
        let root = MutableDictionary::new();
        root.assign(&content);
        Self {
            id,
            root,
            base: None,
            deleted: false,
            database: None,
        }
    }

    pub(crate) fn from_snapshot(snapshot: ReadOnlyDocument, database: Option<Database>) -> Self {
        Self {
            id: snapshot.id().clone(),
            root: snapshot.properties().to_mutable(),
            deleted: snapshot.is_deleted(),
            base: Some(snapshot),
            database,
        }
    }

    /// Document identifier.
    #[must_use]
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Revision the document was last read or saved at.
    #[must_use]
    pub fn revision(&self) -> Option<RevisionId> {
        self.base.as_ref().and_then(ReadOnlyDocument::revision)
    }

    /// Returns true once the document has been deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Snapshot the document was last read or saved at.
    #[must_use]
    pub fn base(&self) -> Option<&ReadOnlyDocument> {
        self.base.as_ref()
    }

    /// The database this document is bound to.
    #[must_use]
    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    /// The root dictionary holding the document body.
    #[must_use]
    pub fn properties(&self) -> &MutableDictionary {
        &self.root
    }

    /// Number of top-level keys.
    #[must_use]
    pub fn count(&self) -> usize {
        self.root.count()
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// Top-level keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.root.keys()
    }

    /// Returns the value at `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<MutableValue> {
        self.root.value(key)
    }

    /// Sets `key` to `value`.
    ///
    /// # Errors
    ///
    /// See [`MutableDictionary::set`].
    pub fn set(&self, key: impl Into<String>, value: impl Into<MutableValue>) -> CoreResult<()> {
        self.root.set(key, value)
    }

    /// Removes `key`. Returns true if it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.root.remove(key)
    }

    /// Replaces the whole body.
    ///
    /// # Errors
    ///
    /// See [`MutableDictionary::set_content`].
    pub fn set_content<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>) -> CoreResult<()>
    where
        K: Into<String>,
        V: Into<MutableValue>,
    {
        self.root.set_content(entries)
    }

    /// Returns the array at `key` as a live handle.
    #[must_use]
    pub fn array(&self, key: &str) -> Option<MutableArray> {
        self.root.array(key)
    }

    /// Returns the subdocument at `key` as a live handle.
    #[must_use]
    pub fn dictionary(&self, key: &str) -> Option<MutableDictionary> {
        self.root.dictionary(key)
    }

    /// Starts a writable fragment path at `key`.
    #[must_use]
    pub fn fragment(&self, key: &str) -> Fragment {
        self.root.fragment(key)
    }

    /// Returns true if the body differs from the base snapshot, or the
    /// document has never been saved.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.base.is_none() || self.root.is_changed()
    }

    /// Snapshot of the current body, carrying the base revision.
    #[must_use]
    pub fn to_read_only(&self) -> ReadOnlyDocument {
        ReadOnlyDocument::new(
            self.id.clone(),
            self.revision(),
            self.deleted,
            self.root.to_read_only(),
        )
    }

    /// Converts the body to JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.root.to_json()
    }

    /// Top-level field diff against the base snapshot.
    ///
    /// A never-saved document reports every field. A field whose value
    /// equals the base value is not a change.
    ///
    /// # Errors
    ///
    /// Returns a codec error if a value cannot be encoded (NaN).
    pub fn change_set(&self) -> CoreResult<ChangeSet> {
        let current = self.root.to_read_only();
        let empty = ReadOnlyDictionary::new();
        let base = self.base.as_ref().map_or(&empty, ReadOnlyDocument::properties);

        let mut changes = ChangeSet::new();
        for (key, value) in current.iter() {
            if base.get(key) != Some(value) {
                changes.put(key, codec::encode(value)?);
            }
        }
        for (key, _) in base.iter() {
            if !current.contains_key(key) {
                changes.remove(key);
            }
        }
        Ok(changes)
    }

    /// Saves through the bound database.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if the document is not bound
    /// to a database, otherwise see [`Database::save`].
    pub fn save(&mut self) -> CoreResult<()> {
        let db = self.bound_database()?;
        db.save(self)
    }

    /// Deletes through the bound database.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if the document is not bound
    /// to a database, otherwise see [`Database::delete`].
    pub fn delete(&mut self) -> CoreResult<()> {
        let db = self.bound_database()?;
        db.delete(self)
    }

    fn bound_database(&self) -> CoreResult<Database> {
        self.database.clone().ok_or_else(|| {
            CoreError::invalid_operation(format!(
                "document {} is not bound to a database",
                self.id
            ))
        })
    }

    /// Adopts a freshly stored revision, keeping live child handles.
    pub(crate) fn did_save(&mut self, snapshot: ReadOnlyDocument, database: Database) {
        self.root.rebase(snapshot.properties().clone());
        self.deleted = snapshot.is_deleted();
        self.base = Some(snapshot);
        self.database = Some(database);
    }

    /// Adopts a stored tombstone. The body is emptied.
    pub(crate) fn did_delete(&mut self, tombstone: ReadOnlyDocument) {
        self.root.reset(tombstone.properties().clone());
        self.deleted = true;
        self.base = Some(tombstone);
    }

    /// Moves onto `theirs` with `content` as the pending body, so the next
    /// save is conditioned on `theirs` and carries the diff to `content`.
    /// Child handles whose value survives the merge stay live.
    pub(crate) fn rebase_onto(&mut self, theirs: ReadOnlyDocument, content: &ReadOnlyDictionary) {
        let base = if theirs.revision().is_some() {
            theirs.properties().clone()
        } else {
            ReadOnlyDictionary::new()
        };
        self.root.rebase(base);
        self.root.assign(content);
        self.deleted = false;
        self.base = theirs.revision().map(|_| theirs);
    }

    pub(crate) fn bind(&mut self, database: Database) {
        self.database = Some(database);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("revision", &self.revision())
            .field("deleted", &self.deleted)
            .field("properties", &self.root.to_read_only())
            .finish_non_exhaustive()
    }
}

impl DictionaryRead for Document {
    type Item = MutableValue;

    fn count(&self) -> usize {
        self.root.count()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        self.root.keys()
    }

    fn value(&self, key: &str) -> Option<MutableValue> {
        self.root.value(key)
    }
}
