//! Blob handles.

use docdb_storage::blob_digest;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Marker stored under `@type` for blob values.
pub(crate) const BLOB_TYPE: &str = "blob";

/// An immutable reference to binary content held by a blob store.
///
/// Containers only ever carry the handle. The bytes are written and read
/// through [`crate::Database::save_blob`] and [`crate::Database::blob_content`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Blob {
    content_type: Option<String>,
    digest: String,
    length: u64,
}

impl Blob {
    /// Creates a handle from its parts.
    #[must_use]
    pub fn new(content_type: Option<String>, digest: impl Into<String>, length: u64) -> Self {
        Self {
            content_type,
            digest: digest.into(),
            length,
        }
    }

    /// Computes the handle for `content` without storing it.
    #[must_use]
    pub fn describe(content_type: Option<&str>, content: &[u8]) -> Self {
        Self {
            content_type: content_type.map(str::to_string),
            digest: blob_digest(content),
            length: content.len() as u64,
        }
    }

    /// MIME type, if known.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Content digest (`sha256-<hex>`).
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Content length in bytes.
    #[must_use]
    pub const fn length(&self) -> u64 {
        self.length
    }

    /// Returns the JSON form, `{"@type":"blob", ...}`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("@type".into(), BLOB_TYPE.into());
        if let Some(content_type) = &self.content_type {
            map.insert("content_type".into(), content_type.clone().into());
        }
        map.insert("digest".into(), self.digest.clone().into());
        map.insert("length".into(), self.length.into());
        serde_json::Value::Object(map)
    }

    /// Recognizes the JSON form produced by [`Blob::to_json`].
    #[must_use]
    pub fn from_json(json: &serde_json::Map<String, serde_json::Value>) -> Option<Self> {
        if json.get("@type")?.as_str()? != BLOB_TYPE {
            return None;
        }
        let content_type = match json.get("content_type") {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(value.as_str()?.to_string()),
        };
        Some(Self {
            content_type,
            digest: json.get("digest")?.as_str()?.to_string(),
            length: json.get("length")?.as_u64()?,
        })
    }
}

impl Serialize for Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.content_type.is_some() { 4 } else { 3 };
        let mut state = serializer.serialize_struct("Blob", fields)?;
        state.serialize_field("@type", BLOB_TYPE)?;
        if let Some(content_type) = &self.content_type {
            state.serialize_field("content_type", content_type)?;
        }
        state.serialize_field("digest", &self.digest)?;
        state.serialize_field("length", &self.length)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_computes_digest_and_length() {
        let blob = Blob::describe(Some("text/plain"), b"12345");
        assert_eq!(blob.content_type(), Some("text/plain"));
        assert_eq!(blob.length(), 5);
        assert_eq!(blob.digest(), blob_digest(b"12345"));
    }

    #[test]
    fn json_form() {
        let blob = Blob::describe(Some("text/plain"), b"12345");
        let json = blob.to_json();
        assert_eq!(json["@type"], "blob");
        assert_eq!(json["length"], 5);

        let back = Blob::from_json(json.as_object().unwrap()).unwrap();
        assert_eq!(back, blob);
    }

    #[test]
    fn serialize_matches_json_form() {
        let blob = Blob::describe(None, b"abc");
        assert_eq!(serde_json::to_value(&blob).unwrap(), blob.to_json());
    }

    #[test]
    fn from_json_ignores_plain_objects() {
        let json = serde_json::json!({"digest": "x", "length": 1});
        assert!(Blob::from_json(json.as_object().unwrap()).is_none());
    }
}
