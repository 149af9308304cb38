//! Snapshot values and typed coercions.

use crate::blob::Blob;
use crate::readonly::{ReadOnlyArray, ReadOnlyDictionary};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// An immutable value as held by read-only containers.
///
/// Containers inside a `Value` are read-only snapshots and cheap to clone.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null value (a present key with no value).
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
    /// UTF-8 string. Dates are stored as ISO-8601 strings.
    String(String),
    /// Reference to binary content.
    Blob(Blob),
    /// Ordered sequence.
    Array(ReadOnlyArray),
    /// Keyed mapping in stored order.
    Dictionary(ReadOnlyDictionary),
}

impl Value {
    /// Returns true for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type name, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Blob(_) => "blob",
            Value::Array(_) => "array",
            Value::Dictionary(_) => "dictionary",
        }
    }

    /// Returns the array, if this is one.
    #[must_use]
    pub fn as_array(&self) -> Option<&ReadOnlyArray> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Returns the dictionary, if this is one.
    #[must_use]
    pub fn as_dictionary(&self) -> Option<&ReadOnlyDictionary> {
        match self {
            Value::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Converts a JSON value.
    ///
    /// Integers that fit `i64` stay integers, other numbers become floats,
    /// and objects shaped like a blob handle become [`Value::Blob`].
    #[must_use]
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(ReadOnlyArray::from_values(
                items.into_iter().map(Value::from_json),
            )),
            serde_json::Value::Object(map) => match Blob::from_json(&map) {
                Some(blob) => Value::Blob(blob),
                None => Value::Dictionary(ReadOnlyDictionary::from_entries(
                    map.into_iter().map(|(k, v)| (k, Value::from_json(v))),
                )),
            },
        }
    }

    /// Converts to JSON. Non-finite floats become `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Blob(blob) => blob.to_json(),
            Value::Array(array) => array.to_json(),
            Value::Dictionary(dict) => dict.to_json(),
        }
    }
}

/// Formats a date the way it is stored (`2017-01-01T00:00:00.000Z`).
#[must_use]
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored date string.
#[must_use]
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Typed coercions shared by snapshot and mutable values.
///
/// The rules are loose on purpose: asking for a number or a boolean never
/// fails, it falls back to the type's zero value.
pub trait Coerce {
    /// Integer view: integers as is, floats truncated, booleans 1/0, else 0.
    fn to_int(&self) -> i64;

    /// Float view: numbers as f64, booleans 1.0/0.0, else 0.0.
    fn to_float(&self) -> f64;

    /// Boolean view: null is false, numbers are true when non-zero, strings,
    /// blobs and containers are true.
    fn to_bool(&self) -> bool;

    /// String view. Only strings have one.
    fn as_str(&self) -> Option<&str>;

    /// Blob view. Only blobs have one.
    fn as_blob(&self) -> Option<&Blob>;

    /// Date view: strings that parse as ISO-8601.
    fn to_date(&self) -> Option<DateTime<Utc>> {
        self.as_str().and_then(parse_date)
    }
}

impl Coerce for Value {
    #[allow(clippy::cast_possible_truncation)]
    fn to_int(&self) -> i64 {
        match self {
            Value::Integer(n) => *n,
            Value::Float(f) => *f as i64,
            Value::Bool(b) => i64::from(*b),
            _ => 0,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn to_float(&self) -> f64 {
        match self {
            Value::Integer(n) => *n as f64,
            Value::Float(f) => *f,
            Value::Bool(b) => f64::from(u8::from(*b)),
            _ => 0.0,
        }
    }

    fn to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(_) | Value::Blob(_) | Value::Array(_) | Value::Dictionary(_) => true,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_blob(&self) -> Option<&Blob> {
        match self {
            Value::Blob(blob) => Some(blob),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(n) => serializer.serialize_i64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Blob(blob) => blob.serialize(serializer),
            Value::Array(array) => array.serialize(serializer),
            Value::Dictionary(dict) => dict.serialize(serializer),
        }
    }
}

impl Serialize for ReadOnlyArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.count()))?;
        for value in self.iter() {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

impl Serialize for ReadOnlyDictionary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.count()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

macro_rules! value_from {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $body
                }
            }
        )*
    };
}

value_from! {
    () => |_v| Value::Null,
    bool => |v| Value::Bool(v),
    i32 => |v| Value::Integer(i64::from(v)),
    u32 => |v| Value::Integer(i64::from(v)),
    i64 => |v| Value::Integer(v),
    f32 => |v| Value::Float(f64::from(v)),
    f64 => |v| Value::Float(v),
    &str => |v| Value::String(v.to_string()),
    String => |v| Value::String(v),
    Blob => |v| Value::Blob(v),
    ReadOnlyArray => |v| Value::Array(v),
    ReadOnlyDictionary => |v| Value::Dictionary(v),
    DateTime<Utc> => |v| Value::String(format_date(&v)),
    serde_json::Value => |v| Value::from_json(v),
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(ReadOnlyArray::from_values(values.into_iter().map(Into::into)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn int_coercion() {
        assert_eq!(Value::Integer(7).to_int(), 7);
        assert_eq!(Value::Float(1.1).to_int(), 1);
        assert_eq!(Value::Float(-2.9).to_int(), -2);
        assert_eq!(Value::Bool(true).to_int(), 1);
        assert_eq!(Value::Bool(false).to_int(), 0);
        assert_eq!(Value::from("12").to_int(), 0);
        assert_eq!(Value::Null.to_int(), 0);
    }

    #[test]
    fn float_coercion() {
        assert!((Value::Integer(2).to_float() - 2.0).abs() < f64::EPSILON);
        assert!((Value::Float(1.5).to_float() - 1.5).abs() < f64::EPSILON);
        assert!((Value::Bool(true).to_float() - 1.0).abs() < f64::EPSILON);
        assert!(Value::from("1.5").to_float().abs() < f64::EPSILON);
    }

    #[test]
    fn bool_coercion() {
        assert!(!Value::Null.to_bool());
        assert!(!Value::Integer(0).to_bool());
        assert!(Value::Integer(-1).to_bool());
        assert!(!Value::Float(0.0).to_bool());
        assert!(Value::Float(0.1).to_bool());
        assert!(Value::from("").to_bool());
        assert!(Value::Array(ReadOnlyArray::new()).to_bool());
        assert!(Value::Dictionary(ReadOnlyDictionary::new()).to_bool());
    }

    #[test]
    fn string_and_blob_views() {
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::Integer(1).as_str(), None);

        let blob = Blob::describe(None, b"x");
        assert_eq!(Value::from(blob.clone()).as_blob(), Some(&blob));
        assert_eq!(Value::from("x").as_blob(), None);
    }

    #[test]
    fn dates_are_stored_as_millisecond_strings() {
        let date = Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap();
        let value = Value::from(date);
        assert_eq!(value, Value::from("2017-01-01T00:00:00.000Z"));
        assert_eq!(value.to_date(), Some(date));
        assert_eq!(Value::from("not a date").to_date(), None);
        assert_eq!(Value::Integer(0).to_date(), None);
    }

    #[test]
    fn integer_and_float_are_distinct() {
        assert_ne!(Value::Integer(1), Value::Float(1.0));
    }

    #[test]
    fn option_and_vec_conversions() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Integer(3));

        let array = Value::from(vec![1, 2, 3]);
        assert_eq!(array.as_array().map(ReadOnlyArray::count), Some(3));
    }

    #[test]
    fn json_conversion() {
        let json = serde_json::json!({
            "name": "Scott",
            "age": 30,
            "height": 1.75,
            "tags": ["a", null, true],
            "photo": {"@type": "blob", "digest": "sha256-00", "length": 4},
        });
        let value = Value::from_json(json.clone());

        let dict = value.as_dictionary().unwrap();
        assert_eq!(dict.get("age"), Some(&Value::Integer(30)));
        assert_eq!(dict.get("height"), Some(&Value::Float(1.75)));
        assert!(matches!(dict.get("photo"), Some(Value::Blob(_))));
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn serialize_keeps_stored_order() {
        let dict = ReadOnlyDictionary::from_entries([
            ("z".to_string(), Value::Integer(1)),
            ("a".to_string(), Value::Null),
        ]);
        let text = serde_json::to_string(&Value::Dictionary(dict)).unwrap();
        assert_eq!(text, r#"{"z":1,"a":null}"#);
    }

    #[test]
    fn from_json_keeps_document_order() {
        let json: serde_json::Value = serde_json::from_str(r#"{"zeta": 1, "alpha": {"y": 2, "b": 3}}"#).unwrap();
        let value = Value::from_json(json);
        let dict = value.as_dictionary().unwrap();
        assert_eq!(dict.keys(), vec!["zeta", "alpha"]);
        assert_eq!(dict.dictionary("alpha").unwrap().keys(), vec!["y", "b"]);
        assert_eq!(
            serde_json::to_string(&value.to_json()).unwrap(),
            r#"{"zeta":1,"alpha":{"y":2,"b":3}}"#
        );
    }
}
