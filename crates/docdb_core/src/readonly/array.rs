use crate::error::{CoreError, CoreResult};
use crate::fragment::{Fragment, Segment};
use crate::mutable::MutableArray;
use crate::traits::ArrayRead;
use crate::value::Value;
use std::sync::Arc;

/// An immutable ordered sequence of values.
///
/// Cloning is cheap: clones share the same snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadOnlyArray {
    values: Arc<Vec<Value>>,
}

impl ReadOnlyArray {
    /// Creates an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an array from values.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            values: Arc::new(values.into_iter().collect()),
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrows the element at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexOutOfRange`] if `index >= count`.
    pub fn value_at(&self, index: usize) -> CoreResult<Value> {
        self.values
            .get(index)
            .cloned()
            .ok_or_else(|| CoreError::index_out_of_range(index, self.count()))
    }

    /// Iterates the elements in stored order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    /// Returns the array at `index`, `None` if the element is not an array.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexOutOfRange`] if `index >= count`.
    pub fn array_at(&self, index: usize) -> CoreResult<Option<ReadOnlyArray>> {
        Ok(self.value_at(index)?.as_array().cloned())
    }

    /// Returns the dictionary at `index`, `None` if the element is not one.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IndexOutOfRange`] if `index >= count`.
    pub fn dictionary_at(&self, index: usize) -> CoreResult<Option<super::ReadOnlyDictionary>> {
        Ok(self.value_at(index)?.as_dictionary().cloned())
    }

    /// Starts a read-only fragment path at `index`.
    #[must_use]
    pub fn fragment(&self, index: usize) -> Fragment {
        Fragment::read_only(Value::Array(self.clone()), Segment::Index(index))
    }

    /// Returns a mutable copy layered over this snapshot.
    #[must_use]
    pub fn to_mutable(&self) -> MutableArray {
        MutableArray::from_read_only(self.clone())
    }

    /// Converts to a JSON array.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.values.iter().map(Value::to_json).collect())
    }

    /// Returns true if both handles share one snapshot.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }
}

impl ArrayRead for ReadOnlyArray {
    type Item = Value;

    fn count(&self) -> usize {
        self.values.len()
    }

    fn value_at(&self, index: usize) -> CoreResult<Value> {
        ReadOnlyArray::value_at(self, index)
    }
}

impl<'a> IntoIterator for &'a ReadOnlyArray {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V: Into<Value>> FromIterator<V> for ReadOnlyArray {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_values(iter.into_iter().map(Into::into))
    }
}
