//! Conflict detection and resolution.

use crate::document::Document;
use crate::id::DocumentId;
use crate::readonly::{ReadOnlyDictionary, ReadOnlyDocument};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Two divergent revisions of one document, met at save time.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    mine: ReadOnlyDocument,
    theirs: ReadOnlyDocument,
    base: Option<ReadOnlyDocument>,
}

impl Conflict {
    /// Creates a conflict.
    #[must_use]
    pub fn new(
        mine: ReadOnlyDocument,
        theirs: ReadOnlyDocument,
        base: Option<ReadOnlyDocument>,
    ) -> Self {
        Self { mine, theirs, base }
    }

    /// Identifier of the conflicting document.
    #[must_use]
    pub fn doc_id(&self) -> &DocumentId {
        self.mine.id()
    }

    /// The content being saved.
    #[must_use]
    pub fn mine(&self) -> &ReadOnlyDocument {
        &self.mine
    }

    /// The revision currently in the store. A tombstone if it was deleted.
    #[must_use]
    pub fn theirs(&self) -> &ReadOnlyDocument {
        &self.theirs
    }

    /// The revision both sides started from, `None` for a document that was
    /// never saved by this writer.
    #[must_use]
    pub fn base(&self) -> Option<&ReadOnlyDocument> {
        self.base.as_ref()
    }

    /// Returns true if the other writer deleted the document.
    #[must_use]
    pub fn is_delete_conflict(&self) -> bool {
        self.theirs.is_deleted()
    }

    /// Builds a [`Resolution::Merged`] carrying `content`.
    #[must_use]
    pub fn merged(&self, content: ReadOnlyDictionary) -> Resolution {
        Resolution::Merged(Document::fresh(self.doc_id().clone(), content))
    }
}

/// Outcome of conflict resolution.
#[derive(Debug)]
pub enum Resolution {
    /// Save this body instead. Its identifier is ignored.
    Merged(Document),
    /// Give up; the save fails with a conflict error.
    Unresolvable,
}

/// Merges conflicting revisions.
///
/// Resolvers must be deterministic: the same conflict must always produce
/// the same resolution, or save retries may not converge.
pub trait ConflictResolver: Send + Sync {
    /// Resolves one conflict.
    fn resolve(&self, conflict: &Conflict) -> Resolution;
}

impl<F> ConflictResolver for F
where
    F: Fn(&Conflict) -> Resolution + Send + Sync,
{
    fn resolve(&self, conflict: &Conflict) -> Resolution {
        self(conflict)
    }
}

/// Built-in resolution policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Three-way merge by top-level field. A field changed on one side only
    /// takes that side; a field changed on both sides takes mine. A deleted
    /// theirs is overridden by mine.
    #[default]
    Merge,
    /// Mine always wins.
    MineWins,
    /// Theirs always wins. A deleted theirs comes back with an empty body.
    TheirsWins,
    /// Never resolve; every conflict fails the save.
    Manual,
}

impl ConflictPolicy {
    /// Returns true if this policy automatically resolves conflicts.
    #[must_use]
    pub fn auto_resolves(&self) -> bool {
        !matches!(self, ConflictPolicy::Manual)
    }

    /// Returns this policy as a shareable resolver.
    #[must_use]
    pub fn resolver(self) -> Arc<dyn ConflictResolver> {
        Arc::new(self)
    }
}

impl ConflictResolver for ConflictPolicy {
    fn resolve(&self, conflict: &Conflict) -> Resolution {
        match self {
            ConflictPolicy::Merge => conflict.merged(three_way_merge(conflict)),
            ConflictPolicy::MineWins => conflict.merged(conflict.mine.properties().clone()),
            ConflictPolicy::TheirsWins => conflict.merged(conflict.theirs.properties().clone()),
            ConflictPolicy::Manual => Resolution::Unresolvable,
        }
    }
}

fn three_way_merge(conflict: &Conflict) -> ReadOnlyDictionary {
    let mine = conflict.mine.properties();
    if conflict.is_delete_conflict() {
        return mine.clone();
    }
    let theirs = conflict.theirs.properties();
    let empty = ReadOnlyDictionary::new();
    let base = conflict.base.as_ref().map_or(&empty, ReadOnlyDocument::properties);

    let mut merged: Vec<(String, Value)> = Vec::with_capacity(theirs.count() + mine.count());
    for (key, their_value) in theirs.iter() {
        let my_value = mine.get(key);
        if my_value != base.get(key) {
            // Changed (or removed) on my side: mine wins.
            if let Some(value) = my_value {
                merged.push((key.to_string(), value.clone()));
            }
        } else {
            merged.push((key.to_string(), their_value.clone()));
        }
    }
    for (key, my_value) in mine.iter() {
        if theirs.contains_key(key) {
            continue;
        }
        let base_value = base.get(key);
        let removed_by_them = base_value.is_some();
        if !removed_by_them || base_value != Some(my_value) {
            merged.push((key.to_string(), my_value.clone()));
        }
    }
    ReadOnlyDictionary::from_entries(merged)
}
