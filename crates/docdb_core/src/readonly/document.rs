use super::{ReadOnlyArray, ReadOnlyDictionary};
use crate::codec;
use crate::document::Document;
use crate::error::CoreResult;
use crate::fragment::{Fragment, Segment};
use crate::id::DocumentId;
use crate::traits::DictionaryRead;
use crate::value::Value;
use docdb_storage::{RevisionId, StoredRevision};

/// An immutable snapshot of one document revision.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOnlyDocument {
    id: DocumentId,
    revision: Option<RevisionId>,
    deleted: bool,
    properties: ReadOnlyDictionary,
}

impl ReadOnlyDocument {
    pub(crate) fn new(
        id: DocumentId,
        revision: Option<RevisionId>,
        deleted: bool,
        properties: ReadOnlyDictionary,
    ) -> Self {
        Self {
            id,
            revision,
            deleted,
            properties,
        }
    }

    /// Decodes a stored revision.
    pub(crate) fn from_stored(stored: &StoredRevision) -> CoreResult<Self> {
        let mut entries = Vec::with_capacity(stored.fields.len());
        for (key, bytes) in &stored.fields {
            entries.push((key.clone(), codec::decode(bytes)?));
        }
        Ok(Self {
            id: DocumentId::trusted(stored.id.clone()),
            revision: Some(stored.revision),
            deleted: stored.deleted,
            properties: ReadOnlyDictionary::from_entries(entries),
        })
    }

    /// Stand-in for an identifier that no longer exists in the store.
    pub(crate) fn absent(id: DocumentId) -> Self {
        Self::new(id, None, true, ReadOnlyDictionary::new())
    }

    /// Document identifier.
    #[must_use]
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Revision this snapshot was read at, `None` if never saved.
    #[must_use]
    pub fn revision(&self) -> Option<RevisionId> {
        self.revision
    }

    /// Returns true for a deletion tombstone.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// The document body.
    #[must_use]
    pub fn properties(&self) -> &ReadOnlyDictionary {
        &self.properties
    }

    /// Number of top-level keys.
    #[must_use]
    pub fn count(&self) -> usize {
        self.properties.count()
    }

    /// Borrows the value at `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Keys in stored order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.properties.keys()
    }

    /// Returns the array at `key`, if the value is one.
    #[must_use]
    pub fn array(&self, key: &str) -> Option<ReadOnlyArray> {
        self.properties.array(key)
    }

    /// Returns the dictionary at `key`, if the value is one.
    #[must_use]
    pub fn dictionary(&self, key: &str) -> Option<ReadOnlyDictionary> {
        self.properties.dictionary(key)
    }

    /// Starts a read-only fragment path at `key`.
    #[must_use]
    pub fn fragment(&self, key: &str) -> Fragment {
        Fragment::read_only(Value::Dictionary(self.properties.clone()), Segment::from(key))
    }

    /// Promotes to an unbound mutable document over this snapshot.
    #[must_use]
    pub fn to_mutable(&self) -> Document {
        Document::from_snapshot(self.clone(), None)
    }

    /// Converts the body to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.properties.to_json()
    }
}

impl DictionaryRead for ReadOnlyDocument {
    type Item = Value;

    fn count(&self) -> usize {
        self.properties.count()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        self.properties.keys()
    }

    fn value(&self, key: &str) -> Option<Value> {
        self.properties.value(key)
    }
}
