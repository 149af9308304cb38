//! Revision identifiers.

use crate::error::StorageError;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Identifies one persisted state of a document.
///
/// A revision id is `<generation>-<digest>`:
/// - `generation` counts the saves in the document's history and grows by
///   exactly one per save, so revisions of one identifier form a chain
/// - `digest` is a SHA-256 over the parent revision, the tombstone flag and
///   the stored fields, so two writers that diverge from the same parent get
///   different ids even at the same generation
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RevisionId {
    generation: u64,
    digest: [u8; 32],
}

impl RevisionId {
    /// Creates a revision id from its parts.
    #[must_use]
    pub const fn from_parts(generation: u64, digest: [u8; 32]) -> Self {
        Self { generation, digest }
    }

    /// Derives the revision that follows `parent` for the given content.
    #[must_use]
    pub fn derive(parent: Option<&RevisionId>, deleted: bool, fields: &[(String, Vec<u8>)]) -> Self {
        let mut hasher = Sha256::new();
        if let Some(parent) = parent {
            hasher.update(parent.generation.to_be_bytes());
            hasher.update(parent.digest);
        }
        hasher.update([u8::from(deleted)]);
        for (key, value) in fields {
            // Length prefixes keep ("ab", "c") distinct from ("a", "bc").
            hasher.update((key.len() as u64).to_be_bytes());
            hasher.update(key.as_bytes());
            hasher.update((value.len() as u64).to_be_bytes());
            hasher.update(value);
        }

        Self {
            generation: parent.map_or(1, |p| p.generation + 1),
            digest: hasher.finalize().into(),
        }
    }

    /// Returns the generation number.
    #[inline]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the content digest.
    #[inline]
    #[must_use]
    pub const fn digest(&self) -> &[u8; 32] {
        &self.digest
    }
}

impl fmt::Debug for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevisionId({self})")
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-", self.generation)?;
        for byte in &self.digest {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for RevisionId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StorageError::InvalidRevision(s.to_string());

        let (generation, hex) = s.split_once('-').ok_or_else(invalid)?;
        let generation: u64 = generation.parse().map_err(|_| invalid())?;
        if generation == 0 || hex.len() != 64 || !hex.is_ascii() {
            return Err(invalid());
        }

        let mut digest = [0u8; 32];
        for (i, byte) in digest.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }

        Ok(Self { generation, digest })
    }
}
