use super::node::ContainerRef;
use super::{MutableArray, MutableDictionary};
use crate::blob::Blob;
use crate::readonly::{ReadOnlyArray, ReadOnlyDictionary};
use crate::value::{Coerce, Value};
use chrono::{DateTime, Utc};

/// A value held by a mutable container.
///
/// Scalars and read-only snapshots are stored as [`MutableValue::Value`].
/// Mutable children are stored as live handles.
#[derive(Debug, Clone)]
pub enum MutableValue {
    /// A snapshot value.
    Value(Value),
    /// A live mutable array.
    Array(MutableArray),
    /// A live mutable dictionary (a subdocument).
    Dictionary(MutableDictionary),
}

impl MutableValue {
    /// Materializes into a snapshot value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            MutableValue::Value(value) => value.clone(),
            MutableValue::Array(array) => Value::Array(array.to_read_only()),
            MutableValue::Dictionary(dict) => Value::Dictionary(dict.to_read_only()),
        }
    }

    /// Returns the snapshot value, if this is not a live container.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            MutableValue::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the live array, if this is one.
    #[must_use]
    pub fn as_array(&self) -> Option<&MutableArray> {
        match self {
            MutableValue::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Returns the live dictionary, if this is one.
    #[must_use]
    pub fn as_dictionary(&self) -> Option<&MutableDictionary> {
        match self {
            MutableValue::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Returns true for a null value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, MutableValue::Value(Value::Null))
    }

    /// Converts to JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.to_value().to_json()
    }

    pub(crate) fn container(&self) -> Option<ContainerRef> {
        match self {
            MutableValue::Value(_) => None,
            MutableValue::Array(array) => Some(ContainerRef::Array(array.clone())),
            MutableValue::Dictionary(dict) => Some(ContainerRef::Dictionary(dict.clone())),
        }
    }
}

impl Default for MutableValue {
    fn default() -> Self {
        MutableValue::Value(Value::Null)
    }
}

/// Compares materialized content. Use `same_container` on the handles to
/// test identity.
impl PartialEq for MutableValue {
    fn eq(&self, other: &Self) -> bool {
        self.to_value() == other.to_value()
    }
}

impl Coerce for MutableValue {
    fn to_int(&self) -> i64 {
        match self {
            MutableValue::Value(value) => value.to_int(),
            _ => 0,
        }
    }

    fn to_float(&self) -> f64 {
        match self {
            MutableValue::Value(value) => value.to_float(),
            _ => 0.0,
        }
    }

    fn to_bool(&self) -> bool {
        match self {
            MutableValue::Value(value) => value.to_bool(),
            _ => true,
        }
    }

    fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Coerce::as_str)
    }

    fn as_blob(&self) -> Option<&Blob> {
        self.as_value().and_then(Coerce::as_blob)
    }
}

impl From<Value> for MutableValue {
    fn from(value: Value) -> Self {
        MutableValue::Value(value)
    }
}

impl From<&Value> for MutableValue {
    fn from(value: &Value) -> Self {
        MutableValue::Value(value.clone())
    }
}

impl From<MutableArray> for MutableValue {
    fn from(array: MutableArray) -> Self {
        MutableValue::Array(array)
    }
}

impl From<MutableDictionary> for MutableValue {
    fn from(dict: MutableDictionary) -> Self {
        MutableValue::Dictionary(dict)
    }
}

impl<T: Into<MutableValue>> From<Option<T>> for MutableValue {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(MutableValue::default, Into::into)
    }
}

macro_rules! mutable_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for MutableValue {
                fn from(value: $ty) -> Self {
                    MutableValue::Value(Value::from(value))
                }
            }
        )*
    };
}

mutable_from_value!(
    (),
    bool,
    i32,
    u32,
    i64,
    f32,
    f64,
    &str,
    String,
    Blob,
    ReadOnlyArray,
    ReadOnlyDictionary,
    DateTime<Utc>,
    serde_json::Value,
);
