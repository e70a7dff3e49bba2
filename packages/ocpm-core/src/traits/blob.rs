//! Blob persistence for raw uploads and serialized artifacts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Key of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobHandle(String);

impl BlobHandle {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque object store.
///
/// Keys are chosen by the caller so that a blob can be found again after a
/// restart. Storing under an existing key replaces the blob atomically:
/// a concurrent `load` sees the old or the new bytes, never a mix.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous blob.
    async fn store(&self, key: &str, bytes: Vec<u8>) -> Result<BlobHandle>;

    /// Load a blob.
    ///
    /// Fails with `EngineError::NotFound` when nothing is stored.
    async fn load(&self, handle: &BlobHandle) -> Result<Vec<u8>>;

    /// Delete a blob. Deleting a missing blob is not an error.
    async fn delete(&self, handle: &BlobHandle) -> Result<()>;

    /// Handles of all blobs whose key starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<BlobHandle>>;

    /// Whether a blob exists.
    async fn exists(&self, handle: &BlobHandle) -> Result<bool> {
        match self.load(handle).await {
            Ok(_) => Ok(true),
            Err(crate::error::EngineError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
