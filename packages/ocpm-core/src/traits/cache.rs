//! Discovery cache abstraction.
//!
//! One artifact per uploaded log. Readers receive an immutable snapshot
//! (`Arc`), so a read racing an update sees either the old or the new
//! artifact as a whole.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::types::artifact::{ArtifactId, DiscoveryArtifact};

#[async_trait]
pub trait ArtifactCache: Send + Sync {
    /// Store a new artifact under its own id.
    async fn put(&self, artifact: DiscoveryArtifact) -> Result<ArtifactId>;

    /// Snapshot of a cached artifact.
    ///
    /// Fails with `EngineError::NotFound` when the id has no entry.
    async fn get(&self, id: &ArtifactId) -> Result<Arc<DiscoveryArtifact>>;

    /// Replace an existing artifact in place (same id). The superseded
    /// form is not retained.
    ///
    /// Fails with `EngineError::NotFound` when the entry was evicted.
    async fn replace(&self, artifact: DiscoveryArtifact) -> Result<Arc<DiscoveryArtifact>>;

    /// Drop an artifact. Returns whether an entry existed.
    async fn invalidate(&self, id: &ArtifactId) -> Result<bool>;

    /// Ids of all cached artifacts.
    async fn list(&self) -> Result<Vec<ArtifactId>>;

    /// Whether an artifact is cached.
    async fn contains(&self, id: &ArtifactId) -> Result<bool> {
        match self.get(id).await {
            Ok(_) => Ok(true),
            Err(crate::error::EngineError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
