use super::node::{self, ContainerRef, Node};
use super::{MutableArray, MutableValue};
use crate::error::{CoreError, CoreResult};
use crate::fragment::{Fragment, Segment};
use crate::readonly::ReadOnlyDictionary;
use crate::traits::DictionaryRead;
use crate::value::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

enum Slot {
    Set(MutableValue),
    Removed,
}

/// Base snapshot plus pending edits.
///
/// `added` lists the keys that are not in `base`, in insertion order; a key
/// is in `added` exactly when it is absent from `base` and set in `changes`.
pub(crate) struct DictionaryState {
    base: ReadOnlyDictionary,
    changes: HashMap<String, Slot>,
    added: Vec<String>,
}

impl DictionaryState {
    fn new(base: ReadOnlyDictionary) -> Self {
        Self {
            base,
            changes: HashMap::new(),
            added: Vec::new(),
        }
    }

    fn lookup(&self, key: &str) -> Option<MutableValue> {
        match self.changes.get(key) {
            Some(Slot::Set(value)) => Some(value.clone()),
            Some(Slot::Removed) => None,
            None => self.base.get(key).map(MutableValue::from),
        }
    }

    fn lookup_value(&self, key: &str) -> Option<Value> {
        match self.changes.get(key) {
            Some(Slot::Set(value)) => Some(value.to_value()),
            Some(Slot::Removed) => None,
            None => self.base.value(key),
        }
    }

    fn overlay(&self, key: &str) -> Option<&MutableValue> {
        match self.changes.get(key) {
            Some(Slot::Set(value)) => Some(value),
            _ => None,
        }
    }

    fn contains(&self, key: &str) -> bool {
        match self.changes.get(key) {
            Some(Slot::Set(_)) => true,
            Some(Slot::Removed) => false,
            None => self.base.contains_key(key),
        }
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .base
            .iter()
            .filter(|(key, _)| !matches!(self.changes.get(*key), Some(Slot::Removed)))
            .map(|(key, _)| key.to_string())
            .collect();
        keys.extend(self.added.iter().cloned());
        keys
    }

    fn count(&self) -> usize {
        let removed = self
            .changes
            .iter()
            .filter(|(key, slot)| matches!(slot, Slot::Removed) && self.base.contains_key(key))
            .count();
        self.base.count() - removed + self.added.len()
    }

    fn put(&mut self, key: String, value: MutableValue) -> Option<MutableValue> {
        let old = self.lookup(&key);
        if !self.base.contains_key(&key) && !matches!(self.changes.get(&key), Some(Slot::Set(_))) {
            self.added.push(key.clone());
        }
        self.changes.insert(key, Slot::Set(value));
        old
    }

    fn take(&mut self, key: &str) -> Option<MutableValue> {
        if self.base.contains_key(key) {
            let old = self.lookup(key);
            if old.is_some() {
                self.changes.insert(key.to_string(), Slot::Removed);
            }
            return old;
        }
        match self.changes.remove(key) {
            Some(Slot::Set(old)) => {
                self.added.retain(|k| k != key);
                Some(old)
            }
            _ => None,
        }
    }

    /// Drops every pending edit and returns the values it held.
    fn drain_overlay(&mut self) -> Vec<MutableValue> {
        self.added.clear();
        self.changes
            .drain()
            .filter_map(|(_, slot)| match slot {
                Slot::Set(value) => Some(value),
                Slot::Removed => None,
            })
            .collect()
    }

    fn materialize(&self) -> ReadOnlyDictionary {
        if self.changes.is_empty() {
            return self.base.clone();
        }
        ReadOnlyDictionary::from_entries(self.keys().into_iter().filter_map(|key| {
            let value = self.lookup_value(&key)?;
            Some((key, value))
        }))
    }
}

/// A mutable string-keyed dictionary.
///
/// Edits are kept as an overlay over the snapshot the dictionary was created
/// from, and [`MutableDictionary::to_read_only`] folds them into a new
/// snapshot. Nested arrays and dictionaries are handed out as live mutable
/// handles attached to this dictionary, so edits made through them show up
/// here.
///
/// # Example
///
/// ```rust
/// use docdb_core::{MutableDictionary, DictionaryRead};
///
/// let address = MutableDictionary::new();
/// address.set("city", "Berkeley").unwrap();
///
/// let person = MutableDictionary::new();
/// person.set("address", address.clone()).unwrap();
/// address.set("zip", 94702).unwrap();
///
/// let snapshot = person.to_read_only();
/// assert_eq!(snapshot.dictionary("address").unwrap().count(), 2);
///
/// // Already attached to `person`:
/// assert!(MutableDictionary::new().set("address", address).is_err());
/// ```
#[derive(Clone)]
pub struct MutableDictionary {
    node: Arc<Node<DictionaryState>>,
}

impl MutableDictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::from_read_only(ReadOnlyDictionary::new())
    }

    /// Creates a dictionary layered over `base`.
    #[must_use]
    pub fn from_read_only(base: ReadOnlyDictionary) -> Self {
        Self {
            node: Node::new(DictionaryState::new(base)),
        }
    }

    /// Creates a dictionary from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if `json` is not an object.
    pub fn from_json(json: serde_json::Value) -> CoreResult<Self> {
        Ok(Self::from_read_only(ReadOnlyDictionary::from_json(json)?))
    }

    pub(crate) fn from_node(node: Arc<Node<DictionaryState>>) -> Self {
        Self { node }
    }

    pub(crate) fn node(&self) -> &Arc<Node<DictionaryState>> {
        &self.node
    }

    fn as_container(&self) -> ContainerRef {
        ContainerRef::Dictionary(self.clone())
    }

    /// Number of keys.
    #[must_use]
    pub fn count(&self) -> usize {
        self.node.state.read().count()
    }

    /// Returns true if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns true if `key` is present (even with a null value).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.node.state.read().contains(key)
    }

    /// Keys: base keys in stored order, then added keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.node.state.read().keys()
    }

    /// Returns the value at `key`.
    ///
    /// A nested array or dictionary comes back as a live mutable handle.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<MutableValue> {
        let mut state = self.node.state.write();
        let current = state.lookup(key)?;
        Some(self.promote(&mut state, key, current))
    }

    fn promote(&self, state: &mut DictionaryState, key: &str, current: MutableValue) -> MutableValue {
        let child = match current {
            MutableValue::Value(Value::Array(array)) => {
                ContainerRef::Array(MutableArray::from_read_only(array))
            }
            MutableValue::Value(Value::Dictionary(dict)) => {
                ContainerRef::Dictionary(MutableDictionary::from_read_only(dict))
            }
            other => return other,
        };
        node::attach(&self.as_container(), &child);
        let value = child.into_value();
        state
            .changes
            .insert(key.to_string(), Slot::Set(value.clone()));
        trace!(key, "promoted nested container");
        value
    }

    /// Sets `key` to `value`. Setting null keeps the key present.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidContainment`] if `value` is a mutable
    /// container that is this dictionary, one of its ancestors, or already
    /// attached somewhere else.
    pub fn set(&self, key: impl Into<String>, value: impl Into<MutableValue>) -> CoreResult<()> {
        let key = key.into();
        let value = value.into();
        let incoming = value.container();

        let mut state = self.node.state.write();
        let _attaching = incoming.as_ref().map(|_| node::attachment_guard());
        if let Some(child) = &incoming {
            let already_here = state
                .overlay(&key)
                .and_then(MutableValue::container)
                .is_some_and(|c| c.id() == child.id());
            node::check_attach(&self.as_container(), child, already_here)?;
        }
        if let Some(old) = state.put(key, value) {
            node::detach(&old, incoming.as_ref());
        }
        if let Some(child) = &incoming {
            node::attach(&self.as_container(), child);
        }
        Ok(())
    }

    /// Removes `key`. Returns true if it was present.
    pub fn remove(&self, key: &str) -> bool {
        let old = self.node.state.write().take(key);
        match old {
            Some(old) => {
                node::detach(&old, None);
                true
            }
            None => false,
        }
    }

    /// Replaces the whole content with `entries`.
    ///
    /// A key given more than once keeps its first position and its last
    /// value. Nothing changes if any entry is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidContainment`] under the same rules as
    /// [`MutableDictionary::set`], or if one container appears twice.
    pub fn set_content<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>) -> CoreResult<()>
    where
        K: Into<String>,
        V: Into<MutableValue>,
    {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut deduped: Vec<(String, MutableValue)> = Vec::new();
        for (key, value) in entries {
            let key = key.into();
            match positions.get(&key) {
                Some(&at) => deduped[at].1 = value.into(),
                None => {
                    positions.insert(key.clone(), deduped.len());
                    deduped.push((key, value.into()));
                }
            }
        }
        let target = self.as_container();

        let mut state = self.node.state.write();
        let _attaching = node::attachment_guard();
        let incoming = checked_children(&target, deduped.iter().map(|(_, v)| v))?;

        let old = state.drain_overlay();
        let base_keys = state.base.keys();
        for key in base_keys {
            state.changes.insert(key, Slot::Removed);
        }
        for (key, value) in deduped {
            state.put(key, value);
        }

        for value in &old {
            node::detach(value, None);
        }
        for child in &incoming {
            node::attach(&target, child);
        }
        Ok(())
    }

    /// Iterates entries, promoting nested containers to live handles.
    pub fn iter(&self) -> std::vec::IntoIter<(String, MutableValue)> {
        self.keys()
            .into_iter()
            .filter_map(|key| {
                let value = self.value(&key)?;
                Some((key, value))
            })
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Returns the array at `key` as a live handle.
    #[must_use]
    pub fn array(&self, key: &str) -> Option<MutableArray> {
        match self.value(key)? {
            MutableValue::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Returns the dictionary at `key` as a live handle.
    #[must_use]
    pub fn dictionary(&self, key: &str) -> Option<MutableDictionary> {
        match self.value(key)? {
            MutableValue::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Starts a writable fragment path at `key`.
    #[must_use]
    pub fn fragment(&self, key: &str) -> Fragment {
        Fragment::mutable(self.as_container(), Segment::from(key))
    }

    /// Folds pending edits into a snapshot. Without edits this is the base
    /// snapshot itself.
    #[must_use]
    pub fn to_read_only(&self) -> ReadOnlyDictionary {
        self.node.state.read().materialize()
    }

    /// Returns true if the content differs from the base snapshot.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        let state = self.node.state.read();
        !state.changes.is_empty() && state.materialize() != state.base
    }

    /// Converts the materialized content to JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.to_read_only().to_json()
    }

    /// Returns true if both handles refer to the same container.
    #[must_use]
    pub fn same_container(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    pub(crate) fn base(&self) -> ReadOnlyDictionary {
        self.node.state.read().base.clone()
    }

    /// Moves onto a new base, keeping pending edits that still differ from
    /// it and every live child handle.
    pub(crate) fn rebase(&self, new_base: ReadOnlyDictionary) {
        let mut state = self.node.state.write();
        let keys = state.keys();
        let mut changes = std::mem::take(&mut state.changes);
        changes.retain(|key, slot| match slot {
            Slot::Removed => new_base.contains_key(key),
            Slot::Set(MutableValue::Value(value)) => new_base.get(key) != Some(&*value),
            Slot::Set(_) => true,
        });
        state.added = keys
            .into_iter()
            .filter(|key| {
                !new_base.contains_key(key) && matches!(changes.get(key), Some(Slot::Set(_)))
            })
            .collect();
        state.changes = changes;
        state.base = new_base;
    }

    /// Makes the content equal to `content`.
    ///
    /// Keys whose current value already equals the target keep their slot,
    /// so live child handles there stay attached. Other keys are overwritten
    /// with plain values and keys missing from `content` are removed.
    pub(crate) fn assign(&self, content: &ReadOnlyDictionary) {
        let old = {
            let mut state = self.node.state.write();
            let mut old = Vec::new();
            for (key, value) in content.iter() {
                if state.lookup_value(key).as_ref() != Some(value) {
                    old.extend(state.put(key.to_string(), MutableValue::Value(value.clone())));
                }
            }
            for key in state.keys() {
                if !content.contains_key(&key) {
                    old.extend(state.take(&key));
                }
            }
            old
        };
        for value in &old {
            node::detach(value, None);
        }
    }

    /// Moves onto a new base, discarding all pending edits.
    pub(crate) fn reset(&self, new_base: ReadOnlyDictionary) {
        let old = {
            let mut state = self.node.state.write();
            let old = state.drain_overlay();
            state.base = new_base;
            old
        };
        for value in &old {
            node::detach(value, None);
        }
    }
}

/// Validates a batch of incoming values for a bulk replace of `target`.
pub(super) fn checked_children<'a>(
    target: &ContainerRef,
    values: impl Iterator<Item = &'a MutableValue>,
) -> CoreResult<Vec<ContainerRef>> {
    let mut seen = HashSet::new();
    let mut children = Vec::new();
    for child in values.filter_map(MutableValue::container) {
        if !seen.insert(child.id()) {
            return Err(CoreError::invalid_containment(
                "the same container appears twice",
            ));
        }
        node::check_attach(target, &child, true)?;
        children.push(child);
    }
    Ok(children)
}

impl Default for MutableDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MutableDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutableDictionary")
            .field(&self.to_read_only())
            .finish()
    }
}

impl DictionaryRead for MutableDictionary {
    type Item = MutableValue;

    fn count(&self) -> usize {
        MutableDictionary::count(self)
    }

    fn contains_key(&self, key: &str) -> bool {
        MutableDictionary::contains_key(self, key)
    }

    fn keys(&self) -> Vec<String> {
        MutableDictionary::keys(self)
    }

    fn value(&self, key: &str) -> Option<MutableValue> {
        MutableDictionary::value(self, key)
    }
}

impl From<ReadOnlyDictionary> for MutableDictionary {
    fn from(base: ReadOnlyDictionary) -> Self {
        Self::from_read_only(base)
    }
}
