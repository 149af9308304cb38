use super::ReadOnlyArray;
use crate::error::{CoreError, CoreResult};
use crate::fragment::{Fragment, Segment};
use crate::mutable::MutableDictionary;
use crate::traits::DictionaryRead;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Default)]
struct Entries {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

/// An immutable mapping from string keys to values.
///
/// Keys keep the order they were stored in. Cloning is cheap: clones share
/// the same snapshot. Equality compares key/value sets and ignores order.
#[derive(Clone, Default)]
pub struct ReadOnlyDictionary {
    inner: Arc<Entries>,
}

impl ReadOnlyDictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dictionary from entries in order.
    ///
    /// A repeated key keeps its first position and its last value.
    pub fn from_entries<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        let mut inner = Entries::default();
        for (key, value) in entries {
            let key = key.into();
            match inner.index.get(&key) {
                Some(&pos) => inner.entries[pos].1 = value,
                None => {
                    inner.index.insert(key.clone(), inner.entries.len());
                    inner.entries.push((key, value));
                }
            }
        }
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Converts a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if `json` is not an object.
    pub fn from_json(json: serde_json::Value) -> CoreResult<Self> {
        match Value::from_json(json) {
            Value::Dictionary(dict) => Ok(dict),
            other => Err(CoreError::invalid_operation(format!(
                "expected a JSON object, got {}",
                other.type_name()
            ))),
        }
    }

    /// Number of keys.
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.entries.len()
    }

    /// Returns true if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Borrows the value at `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner
            .index
            .get(key)
            .map(|&pos| &self.inner.entries[pos].1)
    }

    /// Returns the value at `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.index.contains_key(key)
    }

    /// Keys in stored order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Iterates entries in stored order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.inner.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the array at `key`, if the value is one.
    #[must_use]
    pub fn array(&self, key: &str) -> Option<ReadOnlyArray> {
        self.get(key).and_then(Value::as_array).cloned()
    }

    /// Returns the dictionary at `key`, if the value is one.
    #[must_use]
    pub fn dictionary(&self, key: &str) -> Option<ReadOnlyDictionary> {
        self.get(key).and_then(Value::as_dictionary).cloned()
    }

    /// Starts a read-only fragment path at `key`.
    #[must_use]
    pub fn fragment(&self, key: &str) -> Fragment {
        Fragment::read_only(Value::Dictionary(self.clone()), Segment::from(key))
    }

    /// Returns a mutable copy layered over this snapshot.
    #[must_use]
    pub fn to_mutable(&self) -> MutableDictionary {
        MutableDictionary::from_read_only(self.clone())
    }

    /// Converts to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.iter()
                .map(|(k, v)| (k.to_string(), v.to_json()))
                .collect(),
        )
    }

    /// Returns true if both handles share one snapshot.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for ReadOnlyDictionary {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.count() == other.count()
                && self.iter().all(|(k, v)| other.get(k) == Some(v)))
    }
}

impl fmt::Debug for ReadOnlyDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl DictionaryRead for ReadOnlyDictionary {
    type Item = Value;

    fn count(&self) -> usize {
        self.inner.entries.len()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.inner.index.contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        ReadOnlyDictionary::keys(self)
    }

    fn value(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ReadOnlyDictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(iter.into_iter().map(|(k, v)| (k, v.into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ReadOnlyDictionary {
        [
            ("name", Value::from("Scott Tiger")),
            ("age", Value::from(30)),
            ("nothing", Value::Null),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn keeps_stored_order() {
        assert_eq!(sample().keys(), vec!["name", "age", "nothing"]);
    }

    #[test]
    fn missing_key_is_permissive() {
        let dict = sample();
        assert_eq!(dict.get("missing"), None);
        assert_eq!(dict.int("missing"), 0);
        assert!(!dict.boolean("missing"));
        assert_eq!(dict.string("missing"), None);
        assert!(!dict.contains_key("missing"));
    }

    #[test]
    fn null_value_is_present() {
        let dict = sample();
        assert!(dict.contains_key("nothing"));
        assert_eq!(dict.get("nothing"), Some(&Value::Null));
    }

    #[test]
    fn typed_getters() {
        let dict = sample();
        assert_eq!(dict.string("name").as_deref(), Some("Scott Tiger"));
        assert_eq!(dict.int("age"), 30);
        assert!((dict.float("age") - 30.0).abs() < f64::EPSILON);
        assert!(dict.boolean("age"));
        assert_eq!(dict.int("name"), 0);
    }

    #[test]
    fn repeated_key_keeps_first_position() {
        let dict = ReadOnlyDictionary::from_entries([
            ("a", Value::from(1)),
            ("b", Value::from(2)),
            ("a", Value::from(3)),
        ]);
        assert_eq!(dict.keys(), vec!["a", "b"]);
        assert_eq!(dict.get("a"), Some(&Value::from(3)));
    }

    #[test]
    fn equality_ignores_order() {
        let a = ReadOnlyDictionary::from_entries([("x", Value::from(1)), ("y", Value::from(2))]);
        let b = ReadOnlyDictionary::from_entries([("y", Value::from(2)), ("x", Value::from(1))]);
        let c = ReadOnlyDictionary::from_entries([("x", Value::from(1))]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn from_json_requires_object() {
        let dict = ReadOnlyDictionary::from_json(serde_json::json!({"k": [1, 2]})).unwrap();
        assert_eq!(dict.array("k").map(|a| a.count()), Some(2));
        assert!(ReadOnlyDictionary::from_json(serde_json::json!([1])).is_err());
    }
}
