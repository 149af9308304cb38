//! Lazy path navigation through nested containers.
//!
//! A [`Fragment`] is a root plus a path. Building a longer path never
//! touches the data; each accessor walks the path again at call time, so a
//! fragment kept around sees later edits. Reads are permissive: a missing
//! key, an index out of range or a step into a scalar all resolve to an
//! absent value, and typed accessors then return the type's zero value.

use crate::blob::Blob;
use crate::error::{CoreError, CoreResult};
use crate::mutable::{ContainerRef, MutableArray, MutableDictionary, MutableValue};
use crate::readonly::{ReadOnlyArray, ReadOnlyDictionary};
use crate::value::{Coerce, Value};
use chrono::{DateTime, Utc};
use std::fmt;

/// One step of a fragment path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Dictionary key.
    Key(String),
    /// Array index.
    Index(usize),
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "[{key:?}]"),
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

#[derive(Clone)]
enum Root {
    ReadOnly(Value),
    Mutable(ContainerRef),
}

/// A lazily resolved path into a container.
#[derive(Clone)]
pub struct Fragment {
    root: Root,
    path: Vec<Segment>,
}

impl Fragment {
    pub(crate) fn read_only(root: Value, first: Segment) -> Self {
        Self {
            root: Root::ReadOnly(root),
            path: vec![first],
        }
    }

    pub(crate) fn mutable(root: ContainerRef, first: Segment) -> Self {
        Self {
            root: Root::Mutable(root),
            path: vec![first],
        }
    }

    /// Extends the path by one step. Nothing is resolved yet.
    #[must_use]
    pub fn get(&self, segment: impl Into<Segment>) -> Fragment {
        let mut path = self.path.clone();
        path.push(segment.into());
        Self {
            root: self.root.clone(),
            path,
        }
    }

    /// The path from the root.
    #[must_use]
    pub fn path(&self) -> &[Segment] {
        &self.path
    }

    /// Returns true if this fragment was started from a read-only container.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        matches!(self.root, Root::ReadOnly(_))
    }

    fn root_value(&self) -> MutableValue {
        match &self.root {
            Root::ReadOnly(value) => MutableValue::Value(value.clone()),
            Root::Mutable(container) => container.clone().into_value(),
        }
    }

    fn walk(mut current: MutableValue, path: &[Segment]) -> Option<MutableValue> {
        for segment in path {
            current = step(&current, segment)?;
        }
        Some(current)
    }

    /// Resolves the path now.
    ///
    /// Under a mutable root, nested containers come back as live handles.
    #[must_use]
    pub fn value(&self) -> Option<MutableValue> {
        Self::walk(self.root_value(), &self.path)
    }

    /// Resolves the path and materializes the result.
    #[must_use]
    pub fn read_only_value(&self) -> Option<Value> {
        self.value().map(|value| value.to_value())
    }

    /// Returns true if the path currently resolves.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.value().is_some()
    }

    /// Integer at the path, `0` when absent.
    #[must_use]
    pub fn int(&self) -> i64 {
        self.value().map_or(0, |v| v.to_int())
    }

    /// Float at the path, `0.0` when absent.
    #[must_use]
    pub fn float(&self) -> f64 {
        self.value().map_or(0.0, |v| v.to_float())
    }

    /// Boolean at the path, `false` when absent.
    #[must_use]
    pub fn boolean(&self) -> bool {
        self.value().is_some_and(|v| v.to_bool())
    }

    /// String at the path.
    #[must_use]
    pub fn string(&self) -> Option<String> {
        self.value().and_then(|v| v.as_str().map(str::to_string))
    }

    /// Date at the path.
    #[must_use]
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.value().and_then(|v| v.to_date())
    }

    /// Blob at the path.
    #[must_use]
    pub fn blob(&self) -> Option<Blob> {
        self.value().and_then(|v| v.as_blob().cloned())
    }

    /// Live array at the path. Always `None` under a read-only root; use
    /// [`Fragment::read_only_array`] there.
    #[must_use]
    pub fn array(&self) -> Option<MutableArray> {
        match self.value()? {
            MutableValue::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Live dictionary at the path. Always `None` under a read-only root; use
    /// [`Fragment::read_only_dictionary`] there.
    #[must_use]
    pub fn dictionary(&self) -> Option<MutableDictionary> {
        match self.value()? {
            MutableValue::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Array snapshot at the path, under either kind of root.
    #[must_use]
    pub fn read_only_array(&self) -> Option<ReadOnlyArray> {
        match self.read_only_value()? {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Dictionary snapshot at the path, under either kind of root.
    #[must_use]
    pub fn read_only_dictionary(&self) -> Option<ReadOnlyDictionary> {
        match self.read_only_value()? {
            Value::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Resolves everything but the last step to a live container.
    fn target(&self, action: &str) -> CoreResult<(MutableValue, &Segment)> {
        let Root::Mutable(root) = &self.root else {
            return Err(CoreError::unsupported(format!(
                "cannot {action} {self} through a read-only fragment"
            )));
        };
        let Some((last, parents)) = self.path.split_last() else {
            return Err(CoreError::path_not_found(self.to_string()));
        };
        let parent = Self::walk(root.clone().into_value(), parents)
            .filter(|p| matches!(p, MutableValue::Array(_) | MutableValue::Dictionary(_)))
            .ok_or_else(|| CoreError::path_not_found(self.to_string()))?;
        Ok((parent, last))
    }

    /// Writes `value` at the path. Only the last step may be missing.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UnsupportedOperation`] under a read-only root
    /// - [`CoreError::PathNotFound`] if the parent path is not a container,
    ///   or a key is used on an array or an index on a dictionary
    /// - whatever the final `set` on the parent container returns
    pub fn set(&self, value: impl Into<MutableValue>) -> CoreResult<()> {
        let (parent, last) = self.target("set")?;
        match (parent, last) {
            (MutableValue::Dictionary(dict), Segment::Key(key)) => dict.set(key.clone(), value),
            (MutableValue::Array(array), Segment::Index(index)) => array.set(*index, value),
            _ => Err(CoreError::path_not_found(self.to_string())),
        }
    }

    /// Removes the value at the path. Returns true if something was removed.
    ///
    /// # Errors
    ///
    /// Same as [`Fragment::set`]; an array index out of range is
    /// [`CoreError::IndexOutOfRange`].
    pub fn remove(&self) -> CoreResult<bool> {
        let (parent, last) = self.target("remove")?;
        match (parent, last) {
            (MutableValue::Dictionary(dict), Segment::Key(key)) => Ok(dict.remove(key)),
            (MutableValue::Array(array), Segment::Index(index)) => {
                array.remove(*index).map(|_| true)
            }
            _ => Err(CoreError::path_not_found(self.to_string())),
        }
    }
}

fn step(container: &MutableValue, segment: &Segment) -> Option<MutableValue> {
    match (container, segment) {
        (MutableValue::Dictionary(dict), Segment::Key(key)) => dict.value(key),
        (MutableValue::Array(array), Segment::Index(index)) => array.get(*index),
        (MutableValue::Value(Value::Dictionary(dict)), Segment::Key(key)) => {
            dict.get(key).map(MutableValue::from)
        }
        (MutableValue::Value(Value::Array(array)), Segment::Index(index)) => {
            array.get(*index).map(MutableValue::from)
        }
        _ => None,
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.path {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("path", &self.to_string())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> ReadOnlyDictionary {
        ReadOnlyDictionary::from_json(serde_json::json!({
            "name": "Scott",
            "address": {"city": "Berkeley", "zip": 94702},
            "phones": [{"type": "home", "number": "555-0100"}],
            "count": 3,
        }))
        .unwrap()
    }

    #[test]
    fn read_only_chain() {
        let doc = doc();
        assert_eq!(doc.fragment("address").get("city").string().as_deref(), Some("Berkeley"));
        assert_eq!(doc.fragment("address").get("zip").int(), 94702);
        assert_eq!(
            doc.fragment("phones").get(0).get("number").string().as_deref(),
            Some("555-0100")
        );
        assert!(doc.fragment("phones").get(0).read_only_dictionary().is_some());
    }

    #[test]
    fn absent_chain_is_silent() {
        let doc = doc();
        let missing = doc.fragment("a").get("b").get(0);
        assert!(!missing.exists());
        assert_eq!(missing.int(), 0);
        assert!(missing.float().abs() < f64::EPSILON);
        assert!(!missing.boolean());
        assert_eq!(missing.string(), None);
        assert_eq!(missing.read_only_value(), None);

        assert!(!doc.fragment("count").get("deeper").exists());
        assert!(!doc.fragment("phones").get(7).exists());
        assert!(!doc.fragment("phones").get("0").exists());
        assert!(!doc.fragment("address").get(0).exists());
    }

    #[test]
    fn read_only_fragment_rejects_writes() {
        let doc = doc();
        let err = doc.fragment("name").set("Tiger").unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedOperation { .. }));
        assert!(doc.fragment("name").remove().is_err());
        assert_eq!(doc.fragment("name").string().as_deref(), Some("Scott"));
    }

    #[test]
    fn mutable_fragment_writes_last_hop() {
        let dict = doc().to_mutable();
        dict.fragment("address").get("city").set("Palo Alto").unwrap();
        dict.fragment("phones").get(0).get("type").set("work").unwrap();

        let snapshot = dict.to_read_only();
        assert_eq!(
            snapshot.fragment("address").get("city").string().as_deref(),
            Some("Palo Alto")
        );
        assert_eq!(
            snapshot.fragment("phones").get(0).get("type").string().as_deref(),
            Some("work")
        );
    }

    #[test]
    fn resolution_is_lazy() {
        let dict = MutableDictionary::new();
        let fragment = dict.fragment("later").get("x");
        assert!(!fragment.exists());

        let later = MutableDictionary::new();
        later.set("x", 42).unwrap();
        dict.set("later", later).unwrap();
        assert_eq!(fragment.int(), 42);
    }

    #[test]
    fn missing_intermediate_is_path_not_found() {
        let dict = MutableDictionary::new();
        let err = dict.fragment("a").get("b").set(1).unwrap_err();
        assert!(matches!(err, CoreError::PathNotFound { .. }));
        assert!(dict.is_empty());

        dict.set("a", 5).unwrap();
        assert!(dict.fragment("a").get("b").set(1).is_err());
    }

    #[test]
    fn array_fragment_follows_index_rules() {
        let array = MutableArray::from_values([1, 2]).unwrap();
        array.fragment(1).set(20).unwrap();
        assert_eq!(array.fragment(1).int(), 20);
        assert!(matches!(
            array.fragment(5).set(1),
            Err(CoreError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            array.fragment(5).remove(),
            Err(CoreError::IndexOutOfRange { .. })
        ));
        assert!(array.fragment(0).remove().unwrap());
        assert_eq!(array.count(), 1);
    }

    #[test]
    fn live_handles_under_mutable_root() {
        let dict = doc().to_mutable();
        let address = dict.fragment("address").dictionary().unwrap();
        address.set("zip", 1).unwrap();
        assert_eq!(dict.fragment("address").get("zip").int(), 1);
        assert!(doc().fragment("address").dictionary().is_none());
    }

    #[test]
    fn display_renders_path() {
        let fragment = doc().fragment("phones").get(0).get("number");
        assert_eq!(fragment.to_string(), r#"["phones"][0]["number"]"#);
    }
}
