//! In-memory document store.

use crate::error::{StorageError, StorageResult};
use crate::revision::RevisionId;
use crate::store::{ChangeSet, DocumentStore, SaveOutcome, StoredRevision};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, trace};

/// An in-memory document store.
///
/// Keeps only the current revision of each identifier, which is all the
/// optimistic-concurrency protocol needs. Suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// # Thread Safety
///
/// Every write runs under one exclusive lock, so the compare-and-swap of the
/// base revision and the application of the change set are atomic.
///
/// # Example
///
/// ```rust
/// use docdb_storage::{ChangeSet, DocumentStore, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// store.save("doc1", None, &ChangeSet::new()).unwrap();
/// assert!(store.contains("doc1").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, StoredRevision>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of identifiers known, tombstones included.
    #[must_use]
    pub fn len_including_tombstones(&self) -> usize {
        self.docs.read().len()
    }

    fn write_revision(
        docs: &mut HashMap<String, StoredRevision>,
        id: &str,
        parent: Option<&RevisionId>,
        deleted: bool,
        fields: Vec<(String, Vec<u8>)>,
    ) -> StoredRevision {
        let revision = RevisionId::derive(parent, deleted, &fields);
        let stored = StoredRevision {
            id: id.to_string(),
            revision,
            deleted,
            fields,
        };
        docs.insert(id.to_string(), stored.clone());
        trace!(id, revision = %revision, deleted, "stored revision");
        stored
    }
}

impl DocumentStore for InMemoryStore {
    fn fetch(&self, id: &str) -> StorageResult<Option<StoredRevision>> {
        Ok(self.docs.read().get(id).cloned())
    }

    fn save(
        &self,
        id: &str,
        base: Option<&RevisionId>,
        changes: &ChangeSet,
    ) -> StorageResult<SaveOutcome> {
        let mut docs = self.docs.write();
        let current = docs.get(id);

        let (parent, mut fields) = match (base, current) {
            // Fresh create, or re-create over a tombstone.
            (None, None) => (None, Vec::new()),
            (None, Some(cur)) if cur.deleted => (Some(cur.revision), Vec::new()),
            (Some(base), Some(cur)) if cur.revision == *base => {
                (Some(cur.revision), cur.fields.clone())
            }
            (_, current) => {
                debug!(
                    id,
                    base = ?base,
                    current = ?current.map(|c| c.revision),
                    "save rejected: stale base revision"
                );
                return Ok(SaveOutcome::Conflict(current.cloned()));
            }
        };

        changes.apply_to(&mut fields);
        let stored = Self::write_revision(&mut docs, id, parent.as_ref(), false, fields);
        Ok(SaveOutcome::Saved(stored))
    }

    fn delete(&self, id: &str, base: &RevisionId) -> StorageResult<SaveOutcome> {
        let mut docs = self.docs.write();
        let current = docs.get(id).ok_or_else(|| StorageError::not_found(id))?;

        if current.revision != *base {
            debug!(id, base = %base, current = %current.revision, "delete rejected: stale base revision");
            return Ok(SaveOutcome::Conflict(Some(current.clone())));
        }

        let parent = current.revision;
        let stored = Self::write_revision(&mut docs, id, Some(&parent), true, Vec::new());
        Ok(SaveOutcome::Saved(stored))
    }

    fn purge(&self, id: &str) -> StorageResult<bool> {
        let existed = self.docs.write().remove(id).is_some();
        if existed {
            debug!(id, "purged document");
        }
        Ok(existed)
    }

    fn ids(&self) -> StorageResult<Vec<String>> {
        let mut ids: Vec<String> = self
            .docs
            .read()
            .values()
            .filter(|rev| !rev.deleted)
            .map(|rev| rev.id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(key: &str, value: &[u8]) -> ChangeSet {
        let mut changes = ChangeSet::new();
        changes.put(key, value.to_vec());
        changes
    }

    fn saved(outcome: SaveOutcome) -> StoredRevision {
        match outcome {
            SaveOutcome::Saved(rev) => rev,
            SaveOutcome::Conflict(cur) => panic!("unexpected conflict: {cur:?}"),
        }
    }

    #[test]
    fn memory_new_is_empty() {
        let store = InMemoryStore::new();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.fetch("missing").unwrap().is_none());
    }

    #[test]
    fn create_then_fetch() {
        let store = InMemoryStore::new();
        let rev = saved(store.save("doc1", None, &put("a", b"1")).unwrap());

        let fetched = store.fetch("doc1").unwrap().unwrap();
        assert_eq!(fetched, rev);
        assert_eq!(fetched.field("a"), Some(&b"1"[..]));
        assert_eq!(fetched.revision.generation(), 1);
    }

    #[test]
    fn create_over_live_document_conflicts() {
        let store = InMemoryStore::new();
        let first = saved(store.save("doc1", None, &put("a", b"1")).unwrap());

        let outcome = store.save("doc1", None, &put("a", b"2")).unwrap();
        assert_eq!(outcome, SaveOutcome::Conflict(Some(first)));
    }

    #[test]
    fn update_with_current_base_applies_changes() {
        let store = InMemoryStore::new();
        let r1 = saved(store.save("doc1", None, &put("a", b"1")).unwrap());
        let r2 = saved(
            store
                .save("doc1", Some(&r1.revision), &put("b", b"2"))
                .unwrap(),
        );

        assert_eq!(r2.revision.generation(), 2);
        assert_eq!(r2.field("a"), Some(&b"1"[..]));
        assert_eq!(r2.field("b"), Some(&b"2"[..]));
    }

    #[test]
    fn update_with_stale_base_conflicts_and_changes_nothing() {
        let store = InMemoryStore::new();
        let r1 = saved(store.save("doc1", None, &put("a", b"1")).unwrap());
        let r2 = saved(
            store
                .save("doc1", Some(&r1.revision), &put("a", b"2"))
                .unwrap(),
        );

        let outcome = store
            .save("doc1", Some(&r1.revision), &put("a", b"3"))
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Conflict(Some(r2.clone())));
        assert_eq!(store.fetch("doc1").unwrap().unwrap(), r2);
    }

    #[test]
    fn update_of_purged_document_conflicts_with_nothing() {
        let store = InMemoryStore::new();
        let r1 = saved(store.save("doc1", None, &put("a", b"1")).unwrap());
        assert!(store.purge("doc1").unwrap());

        let outcome = store
            .save("doc1", Some(&r1.revision), &put("a", b"2"))
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Conflict(None));
    }

    #[test]
    fn delete_writes_tombstone() {
        let store = InMemoryStore::new();
        let r1 = saved(store.save("doc1", None, &put("a", b"1")).unwrap());
        let tomb = saved(store.delete("doc1", &r1.revision).unwrap());

        assert!(tomb.deleted);
        assert!(tomb.fields.is_empty());
        assert_eq!(tomb.revision.generation(), 2);
        assert!(!store.contains("doc1").unwrap());
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.len_including_tombstones(), 1);
    }

    #[test]
    fn delete_with_stale_base_conflicts() {
        let store = InMemoryStore::new();
        let r1 = saved(store.save("doc1", None, &put("a", b"1")).unwrap());
        let r2 = saved(
            store
                .save("doc1", Some(&r1.revision), &put("a", b"2"))
                .unwrap(),
        );

        let outcome = store.delete("doc1", &r1.revision).unwrap();
        assert_eq!(outcome, SaveOutcome::Conflict(Some(r2)));
    }

    #[test]
    fn delete_unknown_is_not_found() {
        let store = InMemoryStore::new();
        let rev = RevisionId::derive(None, false, &[]);
        let err = store.delete("nope", &rev).unwrap_err();
        assert_eq!(err, StorageError::not_found("nope"));
    }

    #[test]
    fn recreate_over_tombstone_continues_chain() {
        let store = InMemoryStore::new();
        let r1 = saved(store.save("doc1", None, &put("a", b"1")).unwrap());
        saved(store.delete("doc1", &r1.revision).unwrap());

        let r3 = saved(store.save("doc1", None, &put("b", b"2")).unwrap());
        assert_eq!(r3.revision.generation(), 3);
        assert_eq!(r3.field("a"), None);
        assert_eq!(r3.field("b"), Some(&b"2"[..]));
    }

    #[test]
    fn ids_are_sorted_and_skip_tombstones() {
        let store = InMemoryStore::new();
        store.save("c", None, &ChangeSet::new()).unwrap();
        store.save("a", None, &ChangeSet::new()).unwrap();
        let b = saved(store.save("b", None, &ChangeSet::new()).unwrap());
        store.delete("b", &b.revision).unwrap();

        assert_eq!(store.ids().unwrap(), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn concurrent_writers_from_same_base_one_wins() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryStore::new());
        let base = saved(store.save("doc1", None, &ChangeSet::new()).unwrap()).revision;

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || store.save("doc1", Some(&base), &put("w", &[i])).unwrap())
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|outcome| matches!(outcome, SaveOutcome::Saved(_)))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(
            store.fetch("doc1").unwrap().unwrap().revision.generation(),
            2
        );
    }
}
