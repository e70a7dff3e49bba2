//! In-memory storage implementations for testing and development.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{EngineError, Result};
use crate::traits::blob::{BlobHandle, BlobStore};
use crate::traits::cache::ArtifactCache;
use crate::types::artifact::{ArtifactId, DiscoveryArtifact};

/// In-memory artifact cache.
///
/// Each entry is an `Arc` snapshot. `replace` swaps the `Arc` under the
/// shard lock, so readers see the old or the new artifact, never a mix.
/// Data is lost on restart.
#[derive(Default)]
pub struct MemoryArtifactCache {
    artifacts: DashMap<ArtifactId, Arc<DiscoveryArtifact>>,
}

impl MemoryArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of cached artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Clear all cached artifacts.
    pub fn clear(&self) {
        self.artifacts.clear();
    }
}

#[async_trait]
impl ArtifactCache for MemoryArtifactCache {
    async fn put(&self, artifact: DiscoveryArtifact) -> Result<ArtifactId> {
        let id = artifact.id;
        self.artifacts.insert(id, Arc::new(artifact));
        Ok(id)
    }

    async fn get(&self, id: &ArtifactId) -> Result<Arc<DiscoveryArtifact>> {
        self.artifacts
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EngineError::NotFound { id: id.to_string() })
    }

    async fn replace(&self, artifact: DiscoveryArtifact) -> Result<Arc<DiscoveryArtifact>> {
        let id = artifact.id;
        let mut entry = self
            .artifacts
            .get_mut(&id)
            .ok_or_else(|| EngineError::NotFound { id: id.to_string() })?;
        let snapshot = Arc::new(artifact);
        *entry.value_mut() = Arc::clone(&snapshot);
        Ok(snapshot)
    }

    async fn invalidate(&self, id: &ArtifactId) -> Result<bool> {
        Ok(self.artifacts.remove(id).is_some())
    }

    async fn list(&self) -> Result<Vec<ArtifactId>> {
        Ok(self.artifacts.iter().map(|entry| *entry.key()).collect())
    }
}

/// In-memory blob store.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Arc<Vec<u8>>>>,
}

fn poisoned<T>(_: PoisonError<T>) -> EngineError {
    EngineError::storage("memory blob store lock poisoned")
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored blobs.
    pub fn blob_count(&self) -> usize {
        self.blobs.read().map(|blobs| blobs.len()).unwrap_or_default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, key: &str, bytes: Vec<u8>) -> Result<BlobHandle> {
        self.blobs
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), Arc::new(bytes));
        Ok(BlobHandle::new(key))
    }

    async fn load(&self, handle: &BlobHandle) -> Result<Vec<u8>> {
        let blobs = self.blobs.read().map_err(poisoned)?;
        blobs
            .get(handle.key())
            .map(|bytes| bytes.as_ref().clone())
            .ok_or_else(|| EngineError::NotFound {
                id: handle.to_string(),
            })
    }

    async fn delete(&self, handle: &BlobHandle) -> Result<()> {
        self.blobs.write().map_err(poisoned)?.remove(handle.key());
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobHandle>> {
        let blobs = self.blobs.read().map_err(poisoned)?;
        let mut handles: Vec<_> = blobs
            .keys()
            .filter(|key| key.starts_with(prefix))
            .map(BlobHandle::new)
            .collect();
        handles.sort();
        Ok(handles)
    }

    async fn exists(&self, handle: &BlobHandle) -> Result<bool> {
        Ok(self.blobs.read().map_err(poisoned)?.contains_key(handle.key()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_artifact;

    #[tokio::test]
    async fn cache_put_get_roundtrip() {
        let cache = MemoryArtifactCache::new();
        let artifact = sample_artifact();

        let id = cache.put(artifact.clone()).await.unwrap();
        let loaded = cache.get(&id).await.unwrap();

        assert_eq!(*loaded, artifact);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn replace_keeps_old_snapshots_intact() {
        let cache = MemoryArtifactCache::new();
        let artifact = sample_artifact();
        let id = cache.put(artifact.clone()).await.unwrap();

        let before = cache.get(&id).await.unwrap();
        let updated = artifact.rediscovered(
            Some(["order".to_string()].into()),
            artifact.summary.clone(),
            artifact.graph.clone(),
            artifact.petri_net.clone(),
        );
        cache.replace(updated).await.unwrap();
        let after = cache.get(&id).await.unwrap();

        assert_eq!(before.generation, 0);
        assert_eq!(before.selection, None);
        assert_eq!(after.generation, 1);
        assert!(after.selection.is_some());
    }

    #[tokio::test]
    async fn replace_after_invalidate_is_not_found() {
        let cache = MemoryArtifactCache::new();
        let artifact = sample_artifact();
        let id = cache.put(artifact.clone()).await.unwrap();

        assert!(cache.invalidate(&id).await.unwrap());
        assert!(!cache.invalidate(&id).await.unwrap());

        let err = cache.replace(artifact).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
        assert!(!cache.contains(&id).await.unwrap());
    }

    #[tokio::test]
    async fn blob_store_roundtrip_and_delete() {
        let store = MemoryBlobStore::new();

        let handle = store.store("logs/a.jsonocel", b"raw".to_vec()).await.unwrap();
        store.store("artifacts/a.json", b"{}".to_vec()).await.unwrap();

        assert_eq!(store.load(&handle).await.unwrap(), b"raw");
        assert_eq!(store.list("logs/").await.unwrap(), vec![handle.clone()]);

        store.delete(&handle).await.unwrap();
        store.delete(&handle).await.unwrap();
        assert!(!store.exists(&handle).await.unwrap());
        assert!(matches!(
            store.load(&handle).await.unwrap_err(),
            EngineError::NotFound { .. }
        ));
        assert_eq!(store.blob_count(), 1);
    }
}
