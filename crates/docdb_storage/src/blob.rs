//! Content-addressed blob storage.

use crate::error::StorageResult;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write;

/// Computes the digest key of blob content (`sha256-<hex>`).
#[must_use]
pub fn blob_digest(content: &[u8]) -> String {
    let hash = Sha256::digest(content);
    let mut digest = String::with_capacity(7 + hash.len() * 2);
    digest.push_str("sha256-");
    for byte in hash {
        // Writing to a String cannot fail.
        let _ = write!(digest, "{byte:02x}");
    }
    digest
}

/// Stores binary content addressed by its digest.
///
/// Documents only ever reference blobs by digest; the bytes live here.
pub trait BlobStore: Send + Sync {
    /// Stores content and returns its digest. Storing identical content twice
    /// is idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the content cannot be written.
    fn put(&self, content: &[u8]) -> StorageResult<String>;

    /// Reads content by digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get(&self, digest: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Returns true if content with this digest is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn contains(&self, digest: &str) -> StorageResult<bool> {
        Ok(self.get(digest)?.is_some())
    }

    /// Removes content. Returns true if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn remove(&self, digest: &str) -> StorageResult<bool>;
}

/// An in-memory blob store.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Creates a new empty blob store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns true if no blobs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, content: &[u8]) -> StorageResult<String> {
        let digest = blob_digest(content);
        self.blobs
            .write()
            .entry(digest.clone())
            .or_insert_with(|| content.to_vec());
        Ok(digest)
    }

    fn get(&self, digest: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(digest).cloned())
    }

    fn contains(&self, digest: &str) -> StorageResult<bool> {
        Ok(self.blobs.read().contains_key(digest))
    }

    fn remove(&self, digest: &str) -> StorageResult<bool> {
        Ok(self.blobs.write().remove(digest).is_some())
    }
}
