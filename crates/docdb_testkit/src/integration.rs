//! Cross-crate integration test helpers.
//!
//! Provides a harness that tracks what every saved document should contain,
//! and scenario checks for the concurrent save protocol.

use docdb_core::{
    Conflict, CoreError, Database, DictionaryRead, Document, ReadOnlyDictionary, Resolution, Value,
};
use std::collections::HashMap;

/// A test harness for integration testing.
pub struct IntegrationHarness {
    /// The database instance.
    pub db: Database,
    /// Expected body of every tracked document.
    documents: HashMap<String, serde_json::Value>,
}

impl IntegrationHarness {
    /// Creates a new integration harness with an in-memory database.
    pub fn new() -> Self {
        Self {
            db: Database::open_in_memory(),
            documents: HashMap::new(),
        }
    }

    /// Saves a document and tracks its body for later verification.
    pub fn save(&mut self, doc: &mut Document) {
        self.db.save(doc).expect("Failed to save document");
        self.documents
            .insert(doc.id().to_string(), doc.to_json());
    }

    /// Reads a document and verifies it matches the tracked body.
    pub fn get_and_verify(&self, id: &str) -> Option<serde_json::Value> {
        let actual = self
            .db
            .document(id)
            .expect("Failed to read document")
            .map(|doc| doc.properties().to_json());

        if let Some(expected) = self.documents.get(id) {
            assert_eq!(actual.as_ref(), Some(expected), "Body mismatch for {id}");
        }
        actual
    }

    /// Deletes a document and stops tracking it.
    pub fn delete(&mut self, doc: &mut Document) {
        self.db.delete(doc).expect("Failed to delete document");
        self.documents.remove(doc.id().as_str());
    }

    /// Verifies all tracked documents are in the database.
    pub fn verify_all(&self) {
        for id in self.documents.keys() {
            self.get_and_verify(id);
        }
        assert_eq!(
            self.db.count().expect("Failed to count"),
            self.documents.len(),
            "Live document count mismatch"
        );
    }

    /// Returns the count of tracked documents.
    pub fn tracked_count(&self) -> usize {
        self.documents.len()
    }
}

impl Default for IntegrationHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolver that treats the integer field `key` as a counter: the merged
/// value is theirs plus my increment over the common base.
pub fn counter_resolver(key: &'static str) -> impl Fn(&Conflict) -> Resolution + Send + Sync {
    move |conflict: &Conflict| {
        let base = conflict.base().map_or(0, |b| b.int(key));
        let mine = conflict.mine().int(key);
        let theirs = conflict.theirs().int(key);
        let mut entries: Vec<(String, Value)> = conflict
            .theirs()
            .properties()
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        entries.push((key.to_string(), Value::Integer(theirs + (mine - base))));
        conflict.merged(ReadOnlyDictionary::from_entries(entries))
    }
}

/// Save-protocol scenarios.
pub mod conflicts {
    use super::*;
    use crate::fixtures::scenarios::diverged_pair;

    /// Two handles on revision 1 edit different fields; both saves succeed
    /// and the stored body carries both edits.
    pub fn test_disjoint_edits_merge(db: &Database) {
        let (mut d1, mut d2) = diverged_pair(db, "disjoint");
        d1.set("left", 1).expect("set");
        d2.set("right", 2).expect("set");
        d1.save().expect("first save");
        d2.save().expect("second save merges");

        let stored = db.fetch("disjoint").expect("fetch");
        assert_eq!(stored.int("left"), 1);
        assert_eq!(stored.int("right"), 2);
        assert_eq!(stored.revision(), d2.revision());
        assert_eq!(d2.revision().map(|r| r.generation()), Some(3));
    }

    /// The second save of a diverged pair fails with a conflict when the
    /// resolver gives up, and the store keeps the first save.
    pub fn test_unresolvable_conflict(db: &Database) {
        let (mut d1, mut d2) = diverged_pair(db, "unresolvable");
        d1.set("count", 1).expect("set");
        d2.set("count", 2).expect("set");
        d1.save().expect("first save");

        let give_up = |_: &Conflict| Resolution::Unresolvable;
        let err = db.save_with(&mut d2, &give_up).expect_err("must conflict");
        assert!(matches!(err, CoreError::Conflict { .. }));
        assert_eq!(db.fetch("unresolvable").expect("fetch").int("count"), 1);
    }

    /// Several threads increment one counter from the same revision; the
    /// counter resolver makes every increment count.
    pub fn test_concurrent_counter(db: &Database, writers: usize) {
        let mut seed = Document::with_id("counter").expect("valid id");
        seed.set("count", 0).expect("set");
        db.save(&mut seed).expect("seed save");

        let handles: Vec<_> = (0..writers)
            .map(|_| {
                let mut doc = db
                    .get_document("counter")
                    .expect("read")
                    .expect("document exists");
                std::thread::spawn(move || {
                    let db = doc.database().cloned().expect("bound document");
                    doc.set("count", doc.int("count") + 1).expect("set");
                    db.save_with(&mut doc, &counter_resolver("count"))
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("writer panicked").expect("save succeeds");
        }
        let stored = db.fetch("counter").expect("fetch");
        assert_eq!(stored.int("count"), writers as i64);
    }
}
