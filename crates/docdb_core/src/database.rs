//! Database facade and the save protocol.

use crate::blob::Blob;
use crate::config::Config;
use crate::conflict::{Conflict, ConflictResolver, Resolution};
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::id::DocumentId;
use crate::readonly::ReadOnlyDocument;
use docdb_storage::{
    BlobStore, DocumentStore, InMemoryBlobStore, InMemoryStore, SaveOutcome, StorageError,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// The main database handle.
///
/// `Database` is a cheap-clone handle over a [`DocumentStore`], a
/// [`BlobStore`] and a default [`ConflictResolver`]. Clones share the same
/// stores.
///
/// # Saving
///
/// Saves are optimistic. A document remembers the revision it was read at;
/// the store applies the save only if that is still the current revision.
/// Otherwise the resolver merges the two sides and the save is retried on
/// top of the concurrent revision, at most `Config::max_save_retries` times.
///
/// # In-Memory Databases
///
/// ```rust
/// use docdb_core::{Database, Document, DictionaryRead};
///
/// let db = Database::open_in_memory();
/// let mut doc = Document::with_id("profile").unwrap();
/// doc.set("name", "Scott Tiger").unwrap();
/// db.save(&mut doc).unwrap();
///
/// let stored = db.document("profile").unwrap().unwrap();
/// assert_eq!(stored.string("name").as_deref(), Some("Scott Tiger"));
/// ```
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

struct Inner {
    /// Identity shared by every handle over the same stores.
    uid: Uuid,
    config: Config,
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    resolver: Arc<dyn ConflictResolver>,
}

impl Database {
    /// Opens an empty in-memory database with the default configuration.
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self::open(Config::default())
    }

    /// Opens an empty in-memory database.
    #[must_use]
    pub fn open(config: Config) -> Self {
        Self::open_with_stores(
            config,
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryBlobStore::new()),
        )
    }

    /// Opens a database over existing stores.
    #[must_use]
    pub fn open_with_stores(
        config: Config,
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let resolver = config.conflict_policy.resolver();
        Self {
            inner: Arc::new(Inner {
                uid: Uuid::new_v4(),
                config,
                store,
                blobs,
                resolver,
            }),
        }
    }

    /// Returns a handle over the same stores that resolves conflicts with
    /// `resolver` by default.
    #[must_use]
    pub fn with_conflict_resolver(&self, resolver: impl ConflictResolver + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                uid: self.inner.uid,
                config: self.inner.config.clone(),
                store: Arc::clone(&self.inner.store),
                blobs: Arc::clone(&self.inner.blobs),
                resolver: Arc::new(resolver),
            }),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Returns true if both handles share the same stores.
    #[must_use]
    pub fn same_database(&self, other: &Database) -> bool {
        self.inner.uid == other.inner.uid
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Reads the current revision of a document.
    ///
    /// Missing and deleted documents are `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidId`] for a malformed identifier, or a
    /// storage or codec error.
    pub fn document(&self, id: &str) -> CoreResult<Option<ReadOnlyDocument>> {
        let id = DocumentId::parse(id)?;
        match self.inner.store.fetch(id.as_str())? {
            Some(stored) if !stored.deleted => Ok(Some(ReadOnlyDocument::from_stored(&stored)?)),
            _ => Ok(None),
        }
    }

    /// Reads a document for editing. The returned document is bound to this
    /// database, so [`Document::save`] works on it.
    ///
    /// # Errors
    ///
    /// See [`Database::document`].
    pub fn get_document(&self, id: &str) -> CoreResult<Option<Document>> {
        Ok(self
            .document(id)?
            .map(|snapshot| Document::from_snapshot(snapshot, Some(self.clone()))))
    }

    /// Reads the current revision of a document that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the document is missing or deleted.
    pub fn fetch(&self, id: &str) -> CoreResult<ReadOnlyDocument> {
        self.document(id)?.ok_or_else(|| CoreError::not_found(id))
    }

    /// Returns true if a live document exists.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidId`] for a malformed identifier, or a
    /// storage error if the store cannot be read.
    pub fn contains(&self, id: &str) -> CoreResult<bool> {
        let id = DocumentId::parse(id)?;
        Ok(self.inner.store.contains(id.as_str())?)
    }

    /// Returns the number of live documents.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read.
    pub fn count(&self) -> CoreResult<usize> {
        Ok(self.inner.store.count()?)
    }

    /// Returns the identifiers of all live documents, sorted.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store cannot be read.
    pub fn ids(&self) -> CoreResult<Vec<DocumentId>> {
        Ok(self
            .inner
            .store
            .ids()?
            .into_iter()
            .map(DocumentId::trusted)
            .collect())
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Saves a document using the default conflict resolver.
    ///
    /// # Errors
    ///
    /// See [`Database::save_with`].
    pub fn save(&self, doc: &mut Document) -> CoreResult<()> {
        let resolver = Arc::clone(&self.inner.resolver);
        self.save_with(doc, resolver.as_ref())
    }

    /// Saves a document, resolving concurrent revisions with `resolver`.
    ///
    /// On success the document's base snapshot and revision move to the
    /// stored revision and the document becomes bound to this database.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Conflict`] if the resolver gives up or the retry bound
    ///   is exhausted; the store is left at the concurrent revision
    /// - [`CoreError::InvalidOperation`] if the document belongs to another
    ///   database
    /// - a codec error if a value cannot be encoded
    pub fn save_with(&self, doc: &mut Document, resolver: &dyn ConflictResolver) -> CoreResult<()> {
        self.check_owner(doc)?;
        let max_retries = self.inner.config.max_save_retries;
        let mut retries = 0;

        loop {
            let base = doc.revision();
            let changes = doc.change_set()?;
            debug!(
                id = %doc.id(),
                base = ?base,
                changes = changes.len(),
                attempt = retries + 1,
                "saving document"
            );

            let current = match self
                .inner
                .store
                .save(doc.id().as_str(), base.as_ref(), &changes)?
            {
                SaveOutcome::Saved(stored) => {
                    let snapshot = ReadOnlyDocument::from_stored(&stored)?;
                    trace!(id = %doc.id(), revision = %stored.revision, "document saved");
                    doc.did_save(snapshot, self.clone());
                    return Ok(());
                }
                SaveOutcome::Conflict(current) => current,
            };

            if retries >= max_retries {
                warn!(id = %doc.id(), retries, "save retries exhausted");
                return Err(CoreError::conflict(
                    doc.id().as_str(),
                    format!("still conflicting after {retries} retries"),
                ));
            }
            retries += 1;

            let theirs = match current {
                Some(stored) => ReadOnlyDocument::from_stored(&stored)?,
                None => ReadOnlyDocument::absent(doc.id().clone()),
            };
            debug!(
                id = %doc.id(),
                theirs = ?theirs.revision(),
                deleted = theirs.is_deleted(),
                "conflict detected"
            );

            let conflict = Conflict::new(doc.to_read_only(), theirs.clone(), doc.base().cloned());
            match resolver.resolve(&conflict) {
                Resolution::Merged(merged) => {
                    debug!(id = %doc.id(), "conflict resolved");
                    let content = merged.to_read_only();
                    doc.rebase_onto(theirs, content.properties());
                }
                Resolution::Unresolvable => {
                    warn!(id = %doc.id(), "conflict unresolvable");
                    return Err(CoreError::conflict(
                        doc.id().as_str(),
                        "resolver could not merge the concurrent revision",
                    ));
                }
            }
        }
    }

    /// Deletes a document, conditional on the revision it was read at.
    ///
    /// On success the document is marked deleted, its body is emptied and
    /// its revision moves to the tombstone.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the document was never saved, is already
    ///   deleted, or no longer exists
    /// - [`CoreError::Conflict`] if the document changed since it was read
    pub fn delete(&self, doc: &mut Document) -> CoreResult<()> {
        self.check_owner(doc)?;
        let base = match doc.revision() {
            Some(base) if !doc.is_deleted() => base,
            _ => return Err(CoreError::not_found(doc.id().as_str())),
        };

        match self.inner.store.delete(doc.id().as_str(), &base) {
            Ok(SaveOutcome::Saved(stored)) => {
                debug!(id = %doc.id(), revision = %stored.revision, "document deleted");
                doc.did_delete(ReadOnlyDocument::from_stored(&stored)?);
                doc.bind(self.clone());
                Ok(())
            }
            Ok(SaveOutcome::Conflict(current)) => {
                let current = current.map(|c| c.revision);
                debug!(id = %doc.id(), base = %base, current = ?current, "delete rejected");
                Err(CoreError::conflict(
                    doc.id().as_str(),
                    format!("document changed since revision {base}"),
                ))
            }
            Err(StorageError::NotFound { .. }) => Err(CoreError::not_found(doc.id().as_str())),
            Err(err) => Err(err.into()),
        }
    }

    /// Removes every trace of a document, tombstone included. Returns true
    /// if the identifier was known.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidId`] for a malformed identifier, or a
    /// storage error if the store cannot be written.
    pub fn purge(&self, id: &str) -> CoreResult<bool> {
        let id = DocumentId::parse(id)?;
        let existed = self.inner.store.purge(id.as_str())?;
        debug!(id = %id, existed, "purge");
        Ok(existed)
    }

    // ========================================================================
    // Blobs
    // ========================================================================

    /// Stores blob content and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the content cannot be written.
    pub fn save_blob(&self, content_type: Option<&str>, content: &[u8]) -> CoreResult<Blob> {
        let digest = self.inner.blobs.put(content)?;
        trace!(digest = %digest, length = content.len(), "blob stored");
        Ok(Blob::new(
            content_type.map(str::to_string),
            digest,
            content.len() as u64,
        ))
    }

    /// Reads the content a blob handle refers to.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the content is not stored.
    pub fn blob_content(&self, blob: &Blob) -> CoreResult<Vec<u8>> {
        self.inner
            .blobs
            .get(blob.digest())?
            .ok_or_else(|| CoreError::not_found(blob.digest()))
    }

    /// Returns true if the content a blob handle refers to is stored.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the blob store cannot be read.
    pub fn contains_blob(&self, blob: &Blob) -> CoreResult<bool> {
        Ok(self.inner.blobs.contains(blob.digest())?)
    }

    /// Removes blob content. Returns true if it was stored.
    ///
    /// Documents still referencing the blob keep their handle; reading its
    /// content afterwards fails with [`CoreError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns a storage error if the blob store cannot be written.
    pub fn remove_blob(&self, blob: &Blob) -> CoreResult<bool> {
        let removed = self.inner.blobs.remove(blob.digest())?;
        debug!(digest = %blob.digest(), removed, "blob removed");
        Ok(removed)
    }

    fn check_owner(&self, doc: &Document) -> CoreResult<()> {
        match doc.database() {
            Some(owner) if !owner.same_database(self) => Err(CoreError::invalid_operation(
                format!("document {} belongs to another database", doc.id()),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("uid", &self.inner.uid)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::ConflictPolicy;
    use crate::readonly::ReadOnlyDictionary;
    use crate::traits::DictionaryRead;
    use crate::value::Value;
    use docdb_storage::{ChangeSet, RevisionId, StorageResult, StoredRevision};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn saved_doc(db: &Database, id: &str, json: serde_json::Value) -> Document {
        let mut doc = Document::with_json(id, json).unwrap();
        db.save(&mut doc).unwrap();
        doc
    }

    #[test]
    fn save_then_read_back() {
        let db = Database::open_in_memory();
        let doc = saved_doc(&db, "doc1", serde_json::json!({"name": "Scott", "age": 30}));

        assert_eq!(doc.revision().unwrap().generation(), 1);
        assert!(!doc.has_changes());
        assert!(doc.database().unwrap().same_database(&db));

        let stored = db.fetch("doc1").unwrap();
        assert_eq!(stored.int("age"), 30);
        assert_eq!(stored.revision(), doc.revision());
        assert_eq!(db.count().unwrap(), 1);
        assert!(db.contains("doc1").unwrap());
    }

    #[test]
    fn missing_documents() {
        let db = Database::open_in_memory();
        assert!(db.document("nope").unwrap().is_none());
        assert!(db.get_document("nope").unwrap().is_none());
        assert!(matches!(db.fetch("nope"), Err(CoreError::NotFound { .. })));
        assert!(matches!(db.document(""), Err(CoreError::InvalidId { .. })));
        assert!(matches!(db.contains(""), Err(CoreError::InvalidId { .. })));
        assert!(matches!(db.purge(""), Err(CoreError::InvalidId { .. })));
        assert!(!db.contains("nope").unwrap());
    }

    #[test]
    fn update_advances_revision() {
        let db = Database::open_in_memory();
        let mut doc = saved_doc(&db, "doc1", serde_json::json!({"n": 1}));
        doc.set("n", 2).unwrap();
        doc.save().unwrap();

        assert_eq!(doc.revision().unwrap().generation(), 2);
        assert_eq!(db.fetch("doc1").unwrap().int("n"), 2);
    }

    #[test]
    fn nested_edits_are_saved() {
        let db = Database::open_in_memory();
        saved_doc(&db, "doc1", serde_json::json!({"address": {"city": "Berkeley"}, "tags": [1]}));

        let mut doc = db.get_document("doc1").unwrap().unwrap();
        doc.dictionary("address").unwrap().set("zip", "94702").unwrap();
        doc.array("tags").unwrap().append(2).unwrap();
        doc.save().unwrap();

        assert_eq!(
            db.fetch("doc1").unwrap().properties().to_json(),
            serde_json::json!({"address": {"city": "Berkeley", "zip": "94702"}, "tags": [1, 2]})
        );
    }

    #[test]
    fn concurrent_edits_merge() {
        let db = Database::open_in_memory();
        saved_doc(&db, "doc1", serde_json::json!({"a": 1, "b": 1}));

        let mut d1 = db.get_document("doc1").unwrap().unwrap();
        let mut d2 = db.get_document("doc1").unwrap().unwrap();
        d1.set("a", 2).unwrap();
        d1.save().unwrap();
        d2.set("b", 3).unwrap();
        d2.save().unwrap();

        assert_eq!(d1.revision().unwrap().generation(), 2);
        assert_eq!(d2.revision().unwrap().generation(), 3);
        assert_eq!(
            db.fetch("doc1").unwrap().properties().to_json(),
            serde_json::json!({"a": 2, "b": 3})
        );
        assert_eq!(d2.to_json(), serde_json::json!({"a": 2, "b": 3}));
        assert!(!d2.has_changes());
    }

    #[test]
    fn child_handles_survive_a_merged_save() {
        let db = Database::open_in_memory();
        saved_doc(&db, "doc1", serde_json::json!({"addr": {"city": "X"}, "n": 0}));

        let mut d1 = db.get_document("doc1").unwrap().unwrap();
        let mut d2 = db.get_document("doc1").unwrap().unwrap();
        let addr = d2.dictionary("addr").unwrap();
        d1.set("n", 1).unwrap();
        d1.save().unwrap();

        addr.set("city", "Y").unwrap();
        d2.save().unwrap();
        assert_eq!(d2.revision().unwrap().generation(), 3);
        assert!(d2.dictionary("addr").unwrap().same_container(&addr));

        addr.set("city", "Z").unwrap();
        assert!(d2.has_changes());
        d2.save().unwrap();
        assert_eq!(
            db.fetch("doc1").unwrap().properties().to_json(),
            serde_json::json!({"addr": {"city": "Z"}, "n": 1})
        );
    }

    #[test]
    fn resolver_sees_mine_theirs_and_base() {
        let db = Database::open_in_memory();
        saved_doc(&db, "doc1", serde_json::json!({"v": 0}));
        let mut d1 = db.get_document("doc1").unwrap().unwrap();
        let mut d2 = db.get_document("doc1").unwrap().unwrap();
        d1.set("v", 1).unwrap();
        d1.save().unwrap();
        d2.set("v", 2).unwrap();

        let resolver = |c: &Conflict| {
            assert_eq!(c.mine().int("v"), 2);
            assert_eq!(c.theirs().int("v"), 1);
            assert_eq!(c.base().unwrap().int("v"), 0);
            let sum = c.mine().int("v") + c.theirs().int("v");
            c.merged(ReadOnlyDictionary::from_entries([("v", Value::from(sum))]))
        };
        db.save_with(&mut d2, &resolver).unwrap();
        assert_eq!(db.fetch("doc1").unwrap().int("v"), 3);
    }

    #[test]
    fn unresolvable_conflict_fails() {
        let db = Database::open(Config::new().conflict_policy(ConflictPolicy::Manual));
        saved_doc(&db, "doc1", serde_json::json!({"v": 0}));
        let mut d1 = db.get_document("doc1").unwrap().unwrap();
        let mut d2 = db.get_document("doc1").unwrap().unwrap();
        d1.set("v", 1).unwrap();
        d1.save().unwrap();
        d2.set("v", 2).unwrap();

        let err = d2.save().unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(db.fetch("doc1").unwrap().int("v"), 1);
        // The failed document keeps its edit and its stale base.
        assert_eq!(d2.int("v"), 2);
        assert_eq!(d2.revision().unwrap().generation(), 1);
    }

    #[test]
    fn fresh_document_over_existing_id_conflicts() {
        let db = Database::open_in_memory().with_conflict_resolver(ConflictPolicy::MineWins);
        saved_doc(&db, "doc1", serde_json::json!({"old": true}));

        let mut other = Document::with_json("doc1", serde_json::json!({"new": true})).unwrap();
        db.save(&mut other).unwrap();
        assert_eq!(other.revision().unwrap().generation(), 2);
        assert_eq!(
            db.fetch("doc1").unwrap().properties().to_json(),
            serde_json::json!({"new": true})
        );
    }

    /// Writes a competing revision before every save it forwards.
    struct RacingStore {
        inner: InMemoryStore,
    }

    impl DocumentStore for RacingStore {
        fn fetch(&self, id: &str) -> StorageResult<Option<StoredRevision>> {
            self.inner.fetch(id)
        }

        fn save(
            &self,
            id: &str,
            base: Option<&RevisionId>,
            changes: &ChangeSet,
        ) -> StorageResult<SaveOutcome> {
            if let Some(current) = self.inner.fetch(id)? {
                let mut race = ChangeSet::new();
                race.put("racer", vec![0x01]);
                self.inner.save(id, Some(&current.revision), &race)?;
            }
            self.inner.save(id, base, changes)
        }

        fn delete(&self, id: &str, base: &RevisionId) -> StorageResult<SaveOutcome> {
            self.inner.delete(id, base)
        }

        fn purge(&self, id: &str) -> StorageResult<bool> {
            self.inner.purge(id)
        }

        fn ids(&self) -> StorageResult<Vec<String>> {
            self.inner.ids()
        }
    }

    #[test]
    fn retries_are_bounded() {
        let store = Arc::new(RacingStore {
            inner: InMemoryStore::new(),
        });
        store
            .inner
            .save("doc1", None, &ChangeSet::new())
            .unwrap();
        let db = Database::open_with_stores(
            Config::new().max_save_retries(2),
            store,
            Arc::new(InMemoryBlobStore::new()),
        );

        let calls = AtomicUsize::new(0);
        let resolver = |c: &Conflict| {
            calls.fetch_add(1, Ordering::SeqCst);
            ConflictPolicy::MineWins.resolve(c)
        };

        let mut doc = db.get_document("doc1").unwrap().unwrap();
        doc.set("mine", 1).unwrap();
        let err = db.save_with(&mut doc, &resolver).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_retries_fails_on_first_conflict() {
        let db = Database::open(Config::new().max_save_retries(0));
        saved_doc(&db, "doc1", serde_json::json!({"v": 0}));
        let mut d1 = db.get_document("doc1").unwrap().unwrap();
        let mut d2 = db.get_document("doc1").unwrap().unwrap();
        d1.set("v", 1).unwrap();
        d1.save().unwrap();
        d2.set("w", 1).unwrap();
        assert!(d2.save().unwrap_err().is_conflict());
    }

    #[test]
    fn delete_and_recreate() {
        let db = Database::open_in_memory();
        let mut doc = saved_doc(&db, "doc1", serde_json::json!({"v": 1}));
        db.delete(&mut doc).unwrap();

        assert!(doc.is_deleted());
        assert_eq!(doc.count(), 0);
        assert_eq!(doc.revision().unwrap().generation(), 2);
        assert!(db.document("doc1").unwrap().is_none());
        assert_eq!(db.count().unwrap(), 0);
        assert!(matches!(db.delete(&mut doc), Err(CoreError::NotFound { .. })));

        doc.set("v", 2).unwrap();
        doc.save().unwrap();
        assert!(!doc.is_deleted());
        assert_eq!(doc.revision().unwrap().generation(), 3);
        assert_eq!(db.fetch("doc1").unwrap().int("v"), 2);
    }

    #[test]
    fn delete_unsaved_is_not_found() {
        let db = Database::open_in_memory();
        let mut doc = Document::with_id("never").unwrap();
        assert!(matches!(db.delete(&mut doc), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn delete_stale_revision_conflicts() {
        let db = Database::open_in_memory();
        saved_doc(&db, "doc1", serde_json::json!({"v": 0}));
        let mut d1 = db.get_document("doc1").unwrap().unwrap();
        let mut d2 = db.get_document("doc1").unwrap().unwrap();
        d1.set("v", 1).unwrap();
        d1.save().unwrap();

        assert!(d2.delete().unwrap_err().is_conflict());
        assert!(db.contains("doc1").unwrap());
    }

    #[test]
    fn delete_purged_is_not_found() {
        let db = Database::open_in_memory();
        let mut doc = saved_doc(&db, "doc1", serde_json::json!({}));
        assert!(db.purge("doc1").unwrap());
        assert!(!db.purge("doc1").unwrap());
        assert!(matches!(doc.delete(), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn save_over_tombstone_with_merge_keeps_mine() {
        let db = Database::open_in_memory();
        saved_doc(&db, "doc1", serde_json::json!({"v": 0}));
        let mut d1 = db.get_document("doc1").unwrap().unwrap();
        let mut d2 = db.get_document("doc1").unwrap().unwrap();
        d1.delete().unwrap();
        d2.set("v", 5).unwrap();
        d2.save().unwrap();

        assert_eq!(d2.revision().unwrap().generation(), 3);
        assert_eq!(db.fetch("doc1").unwrap().int("v"), 5);
    }

    #[test]
    fn save_after_purge_recreates() {
        let db = Database::open_in_memory();
        let mut doc = saved_doc(&db, "doc1", serde_json::json!({"v": 0}));
        db.purge("doc1").unwrap();
        doc.set("v", 1).unwrap();
        doc.save().unwrap();

        assert_eq!(doc.revision().unwrap().generation(), 1);
        assert_eq!(db.fetch("doc1").unwrap().int("v"), 1);
    }

    #[test]
    fn documents_cannot_cross_databases() {
        let a = Database::open_in_memory();
        let b = Database::open_in_memory();
        let mut doc = saved_doc(&a, "doc1", serde_json::json!({}));
        assert!(matches!(
            b.save(&mut doc),
            Err(CoreError::InvalidOperation { .. })
        ));

        // A handle with another resolver is still the same database.
        let a2 = a.with_conflict_resolver(ConflictPolicy::TheirsWins);
        assert!(a2.same_database(&a));
        a2.save(&mut doc).unwrap();
    }

    #[test]
    fn ids_are_sorted() {
        let db = Database::open_in_memory();
        for id in ["c", "a", "b"] {
            saved_doc(&db, id, serde_json::json!({}));
        }
        let ids: Vec<String> = db.ids().unwrap().into_iter().map(String::from).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn blobs_round_trip() {
        let db = Database::open_in_memory();
        let blob = db.save_blob(Some("text/plain"), b"i'm blob").unwrap();
        assert_eq!(blob.length(), 8);
        assert_eq!(blob.content_type(), Some("text/plain"));
        assert_eq!(db.blob_content(&blob).unwrap(), b"i'm blob".to_vec());

        let mut doc = Document::with_id("doc1").unwrap();
        doc.set("attachment", blob.clone()).unwrap();
        db.save(&mut doc).unwrap();
        assert_eq!(db.fetch("doc1").unwrap().blob("attachment"), Some(blob));

        let missing = Blob::describe(None, b"never stored");
        assert!(matches!(
            db.blob_content(&missing),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn removed_blob_content_is_not_found() {
        let db = Database::open_in_memory();
        let blob = db.save_blob(None, b"scratch").unwrap();
        assert!(db.contains_blob(&blob).unwrap());

        assert!(db.remove_blob(&blob).unwrap());
        assert!(!db.remove_blob(&blob).unwrap());
        assert!(!db.contains_blob(&blob).unwrap());
        assert!(matches!(
            db.blob_content(&blob),
            Err(CoreError::NotFound { .. })
        ));
    }
}
