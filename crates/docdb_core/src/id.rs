//! Document identifier.

use crate::error::{CoreError, CoreResult};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a document.
///
/// Document IDs are:
/// - Non-empty and free of control characters
/// - Immutable once assigned
/// - Random UUIDs (simple hex form) when not supplied by the caller
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a new random document ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Validates and wraps a caller-supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidId`] if the identifier is empty or
    /// contains control characters.
    pub fn parse(id: impl Into<String>) -> CoreResult<Self> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_control) {
            return Err(CoreError::invalid_id(id));
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wraps an identifier read back from the store, which only ever holds
    /// identifiers that passed [`DocumentId::parse`].
    pub(crate) fn trusted(id: String) -> Self {
        Self(id)
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocumentId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DocumentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for DocumentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DocumentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_unique() {
        let id1 = DocumentId::new();
        let id2 = DocumentId::new();
        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), 32);
    }

    #[test]
    fn parse_accepts_plain_ids() {
        let id = DocumentId::parse("doc1").unwrap();
        assert_eq!(id, "doc1");
        assert_eq!(id.to_string(), "doc1");
        assert_eq!(format!("{id:?}"), "DocumentId(doc1)");
    }

    #[test]
    fn parse_rejects_empty() {
        let err = DocumentId::parse("").unwrap_err();
        assert_eq!(err, CoreError::invalid_id(""));
    }

    #[test]
    fn parse_rejects_control_characters() {
        assert!(DocumentId::parse("doc\n1").is_err());
        assert!("doc\u{0}".parse::<DocumentId>().is_err());
    }
}
