//! Read capability shared by read-only and mutable containers.

use crate::blob::Blob;
use crate::error::CoreResult;
use crate::value::Coerce;
use chrono::{DateTime, Utc};

/// Keyed read access with typed getters.
///
/// Reads are permissive: a missing key yields the type's absent value
/// (`0`, `0.0`, `false` or `None`), never an error.
pub trait DictionaryRead {
    /// The value type handed out by [`DictionaryRead::value`].
    type Item: Coerce;

    /// Number of keys.
    fn count(&self) -> usize;

    /// Returns true if `key` is present (even with a null value).
    fn contains_key(&self, key: &str) -> bool;

    /// Keys in stored order.
    fn keys(&self) -> Vec<String>;

    /// Returns the value at `key`.
    fn value(&self, key: &str) -> Option<Self::Item>;

    /// Returns true if there are no keys.
    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Integer at `key`.
    fn int(&self, key: &str) -> i64 {
        self.value(key).map_or(0, |v| v.to_int())
    }

    /// Float at `key`.
    fn float(&self, key: &str) -> f64 {
        self.value(key).map_or(0.0, |v| v.to_float())
    }

    /// Boolean at `key`.
    fn boolean(&self, key: &str) -> bool {
        self.value(key).is_some_and(|v| v.to_bool())
    }

    /// String at `key`.
    fn string(&self, key: &str) -> Option<String> {
        self.value(key).and_then(|v| v.as_str().map(str::to_string))
    }

    /// Date at `key`.
    fn date(&self, key: &str) -> Option<DateTime<Utc>> {
        self.value(key).and_then(|v| v.to_date())
    }

    /// Blob at `key`.
    fn blob(&self, key: &str) -> Option<Blob> {
        self.value(key).and_then(|v| v.as_blob().cloned())
    }
}

/// Indexed read access with typed getters.
///
/// Unlike dictionaries, arrays are strict: an index outside `0..count`
/// fails with [`crate::CoreError::IndexOutOfRange`].
pub trait ArrayRead {
    /// The value type handed out by [`ArrayRead::value_at`].
    type Item: Coerce;

    /// Number of elements.
    fn count(&self) -> usize;

    /// Returns the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::IndexOutOfRange`] if `index >= count`.
    fn value_at(&self, index: usize) -> CoreResult<Self::Item>;

    /// Returns true if there are no elements.
    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Integer at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::IndexOutOfRange`] if `index >= count`.
    fn int_at(&self, index: usize) -> CoreResult<i64> {
        Ok(self.value_at(index)?.to_int())
    }

    /// Float at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::IndexOutOfRange`] if `index >= count`.
    fn float_at(&self, index: usize) -> CoreResult<f64> {
        Ok(self.value_at(index)?.to_float())
    }

    /// Boolean at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::IndexOutOfRange`] if `index >= count`.
    fn boolean_at(&self, index: usize) -> CoreResult<bool> {
        Ok(self.value_at(index)?.to_bool())
    }

    /// String at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::IndexOutOfRange`] if `index >= count`.
    fn string_at(&self, index: usize) -> CoreResult<Option<String>> {
        Ok(self.value_at(index)?.as_str().map(str::to_string))
    }

    /// Date at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::IndexOutOfRange`] if `index >= count`.
    fn date_at(&self, index: usize) -> CoreResult<Option<DateTime<Utc>>> {
        Ok(self.value_at(index)?.to_date())
    }

    /// Blob at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::IndexOutOfRange`] if `index >= count`.
    fn blob_at(&self, index: usize) -> CoreResult<Option<Blob>> {
        Ok(self.value_at(index)?.as_blob().cloned())
    }
}
