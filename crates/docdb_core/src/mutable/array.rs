use super::dictionary::checked_children;
use super::node::{self, ContainerRef, Node};
use super::{MutableDictionary, MutableValue};
use crate::error::{CoreError, CoreResult};
use crate::fragment::{Fragment, Segment};
use crate::readonly::ReadOnlyArray;
use crate::traits::ArrayRead;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

enum ArraySlot {
    /// Element `i` of the base snapshot.
    Base(usize),
    Own(MutableValue),
}

/// Base snapshot plus, after the first edit, the full index vector.
pub(crate) struct ArrayState {
    base: ReadOnlyArray,
    slots: Option<Vec<ArraySlot>>,
}

impl ArrayState {
    fn new(base: ReadOnlyArray) -> Self {
        Self { base, slots: None }
    }

    fn count(&self) -> usize {
        self.slots.as_ref().map_or(self.base.count(), Vec::len)
    }

    fn base_value(&self, index: usize) -> Value {
        self.base.get(index).cloned().unwrap_or_default()
    }

    fn lookup(&self, index: usize) -> Option<MutableValue> {
        match &self.slots {
            None => self.base.get(index).map(MutableValue::from),
            Some(slots) => slots.get(index).map(|slot| match slot {
                ArraySlot::Base(i) => MutableValue::Value(self.base_value(*i)),
                ArraySlot::Own(value) => value.clone(),
            }),
        }
    }

    fn own(&self, index: usize) -> Option<&MutableValue> {
        match self.slots.as_ref()?.get(index)? {
            ArraySlot::Own(value) => Some(value),
            ArraySlot::Base(_) => None,
        }
    }

    fn slots_mut(&mut self) -> &mut Vec<ArraySlot> {
        let count = self.base.count();
        self.slots
            .get_or_insert_with(|| (0..count).map(ArraySlot::Base).collect())
    }

    fn slot_value(&self, slot: ArraySlot) -> MutableValue {
        match slot {
            ArraySlot::Base(i) => MutableValue::Value(self.base_value(i)),
            ArraySlot::Own(value) => value,
        }
    }

    fn materialize(&self) -> ReadOnlyArray {
        match &self.slots {
            None => self.base.clone(),
            Some(slots) => ReadOnlyArray::from_values(slots.iter().map(|slot| match slot {
                ArraySlot::Base(i) => self.base_value(*i),
                ArraySlot::Own(value) => value.to_value(),
            })),
        }
    }
}

/// A mutable ordered sequence.
///
/// Indices stay contiguous: `insert` shifts the tail up and `remove`
/// compacts it. Reads and writes outside the valid range fail with
/// [`CoreError::IndexOutOfRange`].
#[derive(Clone)]
pub struct MutableArray {
    node: Arc<Node<ArrayState>>,
}

impl MutableArray {
    /// Creates an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::from_read_only(ReadOnlyArray::new())
    }

    /// Creates an array layered over `base`.
    #[must_use]
    pub fn from_read_only(base: ReadOnlyArray) -> Self {
        Self {
            node: Node::new(ArrayState::new(base)),
        }
    }

    /// Creates an array holding `values`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidContainment`] if a value is an attached
    /// container or the same container appears twice.
    pub fn from_values<V: Into<MutableValue>>(
        values: impl IntoIterator<Item = V>,
    ) -> CoreResult<Self> {
        let array = Self::new();
        array.set_content(values)?;
        Ok(array)
    }

    pub(crate) fn from_node(node: Arc<Node<ArrayState>>) -> Self {
        Self { node }
    }

    pub(crate) fn node(&self) -> &Arc<Node<ArrayState>> {
        &self.node
    }

    fn as_container(&self) -> ContainerRef {
        ContainerRef::Array(self.clone())
    }

    /// Number of elements.
    #[must_use]
    pub fn count(&self) -> usize {
        self.node.state.read().count()
    }

    /// Returns true if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns the element at `index`, or `None` when out of range.
    ///
    /// A nested array or dictionary comes back as a live mutable handle.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<MutableValue> {
        let mut state = self.node.state.write();
        let current = state.lookup(index)?;
        Some(self.promote(&mut state, index, current))
    }

    /// Returns the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexOutOfRange`] if `index >= count`.
    pub fn value_at(&self, index: usize) -> CoreResult<MutableValue> {
        self.get(index)
            .ok_or_else(|| CoreError::index_out_of_range(index, self.count()))
    }

    fn promote(&self, state: &mut ArrayState, index: usize, current: MutableValue) -> MutableValue {
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
        state.slots_mut()[index] = ArraySlot::Own(value.clone());
        trace!(index, "promoted nested container");
        value
    }

    fn check_incoming(
        &self,
        state: &ArrayState,
        index: usize,
        incoming: Option<&ContainerRef>,
    ) -> CoreResult<()> {
        if let Some(child) = incoming {
            let already_here = state
                .own(index)
                .and_then(MutableValue::container)
                .is_some_and(|c| c.id() == child.id());
            node::check_attach(&self.as_container(), child, already_here)?;
        }
        Ok(())
    }

    /// Replaces the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexOutOfRange`] if `index >= count`, or
    /// [`CoreError::InvalidContainment`] for a container that cannot be
    /// placed here.
    pub fn set(&self, index: usize, value: impl Into<MutableValue>) -> CoreResult<()> {
        let value = value.into();
        let incoming = value.container();

        let mut state = self.node.state.write();
        let count = state.count();
        if index >= count {
            return Err(CoreError::index_out_of_range(index, count));
        }
        let _attaching = incoming.as_ref().map(|_| node::attachment_guard());
        self.check_incoming(&state, index, incoming.as_ref())?;
        let old = std::mem::replace(&mut state.slots_mut()[index], ArraySlot::Own(value));
        let old = state.slot_value(old);

        node::detach(&old, incoming.as_ref());
        if let Some(child) = &incoming {
            node::attach(&self.as_container(), child);
        }
        Ok(())
    }

    /// Inserts `value` at `index`, shifting later elements up by one.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexOutOfRange`] if `index > count`, or
    /// [`CoreError::InvalidContainment`] for a container that cannot be
    /// placed here.
    pub fn insert(&self, index: usize, value: impl Into<MutableValue>) -> CoreResult<()> {
        let value = value.into();
        let incoming = value.container();

        let mut state = self.node.state.write();
        let count = state.count();
        if index > count {
            return Err(CoreError::index_out_of_range(index, count));
        }
        let _attaching = incoming.as_ref().map(|_| node::attachment_guard());
        if let Some(child) = &incoming {
            node::check_attach(&self.as_container(), child, false)?;
        }
        state.slots_mut().insert(index, ArraySlot::Own(value));

        if let Some(child) = &incoming {
            node::attach(&self.as_container(), child);
        }
        Ok(())
    }

    /// Appends `value` at the end.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidContainment`] for a container that cannot
    /// be placed here.
    pub fn append(&self, value: impl Into<MutableValue>) -> CoreResult<()> {
        let value = value.into();
        let incoming = value.container();

        let mut state = self.node.state.write();
        let _attaching = incoming.as_ref().map(|_| node::attachment_guard());
        if let Some(child) = &incoming {
            node::check_attach(&self.as_container(), child, false)?;
        }
        state.slots_mut().push(ArraySlot::Own(value));

        if let Some(child) = &incoming {
            node::attach(&self.as_container(), child);
        }
        Ok(())
    }

    /// Removes and returns the element at `index`, shifting later elements
    /// down by one. A removed container is detached and may be placed
    /// elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexOutOfRange`] if `index >= count`.
    pub fn remove(&self, index: usize) -> CoreResult<MutableValue> {
        let old = {
            let mut state = self.node.state.write();
            let count = state.count();
            if index >= count {
                return Err(CoreError::index_out_of_range(index, count));
            }
            let slot = state.slots_mut().remove(index);
            state.slot_value(slot)
        };
        node::detach(&old, None);
        Ok(old)
    }

    /// Replaces the whole content with `values`.
    ///
    /// Nothing changes if any value is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidContainment`] under the same rules as
    /// [`MutableArray::set`], or if one container appears twice.
    pub fn set_content<V: Into<MutableValue>>(
        &self,
        values: impl IntoIterator<Item = V>,
    ) -> CoreResult<()> {
        let values: Vec<MutableValue> = values.into_iter().map(Into::into).collect();
        let target = self.as_container();

        let mut state = self.node.state.write();
        let _attaching = node::attachment_guard();
        let incoming = checked_children(&target, values.iter())?;

        let replaced = std::mem::replace(
            state.slots_mut(),
            values.into_iter().map(ArraySlot::Own).collect(),
        );
        let old: Vec<MutableValue> = replaced
            .into_iter()
            .filter_map(|slot| match slot {
                ArraySlot::Own(value) => Some(value),
                ArraySlot::Base(_) => None,
            })
            .collect();

        for value in &old {
            node::detach(value, None);
        }
        for child in &incoming {
            node::attach(&target, child);
        }
        Ok(())
    }

    /// Iterates elements, promoting nested containers to live handles.
    pub fn iter(&self) -> std::vec::IntoIter<MutableValue> {
        (0..self.count())
            .map_while(|index| self.get(index))
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Returns the array at `index` as a live handle, `None` if the element
    /// is not an array.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexOutOfRange`] if `index >= count`.
    pub fn array_at(&self, index: usize) -> CoreResult<Option<MutableArray>> {
        Ok(match self.value_at(index)? {
            MutableValue::Array(array) => Some(array),
            _ => None,
        })
    }

    /// Returns the dictionary at `index` as a live handle, `None` if the
    /// element is not a dictionary.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexOutOfRange`] if `index >= count`.
    pub fn dictionary_at(&self, index: usize) -> CoreResult<Option<MutableDictionary>> {
        Ok(match self.value_at(index)? {
            MutableValue::Dictionary(dict) => Some(dict),
            _ => None,
        })
    }

    /// Starts a writable fragment path at `index`.
    #[must_use]
    pub fn fragment(&self, index: usize) -> Fragment {
        Fragment::mutable(self.as_container(), Segment::Index(index))
    }

    /// Folds pending edits into a snapshot. Without edits this is the base
    /// snapshot itself.
    #[must_use]
    pub fn to_read_only(&self) -> ReadOnlyArray {
        self.node.state.read().materialize()
    }

    /// Returns true if the content differs from the base snapshot.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        let state = self.node.state.read();
        state.slots.is_some() && state.materialize() != state.base
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
}

impl Default for MutableArray {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MutableArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutableArray")
            .field(&self.to_read_only())
            .finish()
    }
}

impl ArrayRead for MutableArray {
    type Item = MutableValue;

    fn count(&self) -> usize {
        MutableArray::count(self)
    }

    fn value_at(&self, index: usize) -> CoreResult<MutableValue> {
        MutableArray::value_at(self, index)
    }
}

impl From<ReadOnlyArray> for MutableArray {
    fn from(base: ReadOnlyArray) -> Self {
        Self::from_read_only(base)
    }
}
