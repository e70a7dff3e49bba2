//! Artifact cache persisted through a [`BlobStore`].

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::traits::blob::{BlobHandle, BlobStore};
use crate::traits::cache::ArtifactCache;
use crate::types::artifact::{ArtifactId, DiscoveryArtifact};

/// Serializes each artifact as JSON under `"{prefix}{id}.json"`.
///
/// Survives restarts when the blob store does. Atomicity of `replace`
/// comes from the blob store's atomic overwrite; the superseded JSON is
/// not retained.
pub struct BlobArtifactCache<B: BlobStore> {
    blobs: B,
    prefix: String,
}

impl<B: BlobStore> BlobArtifactCache<B> {
    /// Create a cache storing artifacts under `prefix`.
    pub fn new(blobs: B, prefix: impl Into<String>) -> Self {
        Self {
            blobs,
            prefix: prefix.into(),
        }
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    fn key(&self, id: &ArtifactId) -> String {
        format!("{}{}.json", self.prefix, id)
    }

    fn handle(&self, id: &ArtifactId) -> BlobHandle {
        BlobHandle::new(self.key(id))
    }

    async fn write(&self, artifact: &DiscoveryArtifact) -> Result<()> {
        let bytes = serde_json::to_vec(artifact)?;
        debug!(artifact_id = %artifact.id, bytes = bytes.len(), "Writing artifact blob");
        self.blobs.store(&self.key(&artifact.id), bytes).await?;
        Ok(())
    }

    fn not_found(id: &ArtifactId) -> EngineError {
        EngineError::NotFound { id: id.to_string() }
    }
}

#[async_trait]
impl<B: BlobStore> ArtifactCache for BlobArtifactCache<B> {
    async fn put(&self, artifact: DiscoveryArtifact) -> Result<ArtifactId> {
        self.write(&artifact).await?;
        Ok(artifact.id)
    }

    async fn get(&self, id: &ArtifactId) -> Result<Arc<DiscoveryArtifact>> {
        let bytes = match self.blobs.load(&self.handle(id)).await {
            Ok(bytes) => bytes,
            Err(EngineError::NotFound { .. }) => return Err(Self::not_found(id)),
            Err(e) => return Err(e),
        };
        let artifact: DiscoveryArtifact = serde_json::from_slice(&bytes)?;
        Ok(Arc::new(artifact))
    }

    async fn replace(&self, artifact: DiscoveryArtifact) -> Result<Arc<DiscoveryArtifact>> {
        if !self.blobs.exists(&self.handle(&artifact.id)).await? {
            return Err(Self::not_found(&artifact.id));
        }
        self.write(&artifact).await?;
        Ok(Arc::new(artifact))
    }

    async fn invalidate(&self, id: &ArtifactId) -> Result<bool> {
        let handle = self.handle(id);
        let existed = self.blobs.exists(&handle).await?;
        self.blobs.delete(&handle).await?;
        Ok(existed)
    }

    async fn list(&self) -> Result<Vec<ArtifactId>> {
        let handles = self.blobs.list(&self.prefix).await?;
        Ok(handles
            .iter()
            .filter_map(|handle| {
                handle
                    .key()
                    .strip_prefix(self.prefix.as_str())?
                    .strip_suffix(".json")?
                    .parse()
                    .ok()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::memory::MemoryBlobStore;
    use crate::testing::sample_artifact;

    fn cache() -> BlobArtifactCache<MemoryBlobStore> {
        BlobArtifactCache::new(MemoryBlobStore::new(), "artifacts/")
    }

    #[tokio::test]
    async fn roundtrip_is_structurally_equal() {
        let cache = cache();
        let artifact = sample_artifact();

        let id = cache.put(artifact.clone()).await.unwrap();
        let loaded = cache.get(&id).await.unwrap();

        assert_eq!(*loaded, artifact);
        assert_eq!(cache.list().await.unwrap(), vec![id]);
    }

    #[tokio::test]
    async fn replace_overwrites_under_same_key() {
        let cache = cache();
        let artifact = sample_artifact();
        let id = cache.put(artifact.clone()).await.unwrap();

        let updated = artifact.rediscovered(
            None,
            artifact.summary.clone(),
            Default::default(),
            artifact.petri_net.clone(),
        );
        cache.replace(updated).await.unwrap();

        let loaded = cache.get(&id).await.unwrap();
        assert_eq!(loaded.generation, 1);
        assert!(loaded.graph.activities.is_empty());
        assert_eq!(cache.blobs().blob_count(), 1);
    }

    #[tokio::test]
    async fn missing_entries() {
        let cache = cache();
        let artifact = sample_artifact();

        assert!(matches!(
            cache.get(&artifact.id).await.unwrap_err(),
            EngineError::NotFound { .. }
        ));
        assert!(matches!(
            cache.replace(artifact.clone()).await.unwrap_err(),
            EngineError::NotFound { .. }
        ));
        assert!(!cache.invalidate(&artifact.id).await.unwrap());
    }

    #[tokio::test]
    async fn list_ignores_foreign_keys() {
        let cache = cache();
        let id = cache.put(sample_artifact()).await.unwrap();
        cache
            .blobs()
            .store("artifacts/notes.txt", b"x".to_vec())
            .await
            .unwrap();
        cache
            .blobs()
            .store("logs/raw.jsonocel", b"x".to_vec())
            .await
            .unwrap();

        assert_eq!(cache.list().await.unwrap(), vec![id]);
    }
}
