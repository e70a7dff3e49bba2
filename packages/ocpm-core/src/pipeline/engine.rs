//! The DiscoveryEngine - main entry point of the library.
//!
//! Ties the stages together:
//! 1. `ingest` parses an upload, discovers both models and caches them
//! 2. `filter` re-discovers only when the object-type selection changes,
//!    then turns percentages into thresholds and render parameters
//! 3. `evict` / `evict_expired` drop artifacts and their raw uploads
//!
//! The cache is the only shared mutable state. Re-discovery of one
//! artifact runs under that artifact's async mutex, so two filter requests
//! with different selections never interleave their updates. Readers are
//! never blocked: they get whichever `Arc` snapshot is current.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::pipeline::adapter::discover_both;
use crate::pipeline::params::params_for;
use crate::pipeline::threshold::{compute_thresholds, Thresholds};
use crate::pipeline::type_filter::{apply_type_filter, rediscover, Rediscovery};
use crate::traits::{
    blob::BlobStore,
    cache::ArtifactCache,
    miner::{EventLog, LogMiner},
    renderer::{ModelView, Rendered, Renderer},
};
use crate::types::{
    artifact::{ArtifactId, DiscoveryArtifact},
    config::EngineConfig,
    filter::{FilterSpec, VisualizationKind},
    log::LogSummary,
    render::RenderParams,
};

/// Result of ingesting one upload.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub artifact_id: ArtifactId,
    pub object_types: BTreeSet<String>,
    pub summary: LogSummary,
    /// Flow-graph parameters for the configured default filter
    pub params: RenderParams,
}

/// Result of one filter request: parameters plus the snapshot they apply to.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub artifact: Arc<DiscoveryArtifact>,
    pub params: RenderParams,
    /// Whether this request ran discovery again
    pub rediscovered: bool,
    /// Effective object-type selection; `None` means the full log
    pub selection: Option<BTreeSet<String>>,
}

impl FilterOutcome {
    /// The model selected by the request's visualization kind.
    pub fn model(&self) -> ModelView<'_> {
        match self.params.kind {
            VisualizationKind::FlowGraph => ModelView::FlowGraph(&self.artifact.graph),
            VisualizationKind::PetriNet => ModelView::PetriNet(&self.artifact.petri_net),
        }
    }

    pub fn render<R: Renderer + ?Sized>(&self, renderer: &R) -> Result<Rendered> {
        renderer.render(self.model(), &self.params)
    }
}

/// Discovery cache and filter pipeline over pluggable collaborators.
///
/// # Example
///
/// ```rust,ignore
/// let engine = DiscoveryEngine::new(JsonOcelMiner::new(), MemoryArtifactCache::new(), MemoryBlobStore::new());
///
/// let ingested = engine.ingest("orders.jsonocel", &bytes).await?;
///
/// // Threshold-only change: served from the cached artifact
/// let spec = FilterSpec::default().with_activity_percent(40);
/// let outcome = engine.filter(&ingested.artifact_id, &spec, VisualizationKind::FlowGraph).await?;
///
/// // Selection change: re-discovers once, then cached again
/// let spec = spec.with_object_types(["order"]);
/// let outcome = engine.filter(&ingested.artifact_id, &spec, VisualizationKind::PetriNet).await?;
/// let dot = outcome.render(&DotRenderer::new())?;
/// ```
pub struct DiscoveryEngine<M: LogMiner, C: ArtifactCache, B: BlobStore> {
    miner: M,
    cache: C,
    blobs: B,
    config: EngineConfig,
    locks: DashMap<ArtifactId, Arc<Mutex<()>>>,
}

impl<M: LogMiner, C: ArtifactCache, B: BlobStore> DiscoveryEngine<M, C, B> {
    /// Create an engine with the default configuration.
    pub fn new(miner: M, cache: C, blobs: B) -> Self {
        Self::with_config(miner, cache, blobs, EngineConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(miner: M, cache: C, blobs: B, config: EngineConfig) -> Self {
        Self {
            miner,
            cache,
            blobs,
            config,
            locks: DashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn miner(&self) -> &M {
        &self.miner
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// Parse an upload, discover both models and cache them.
    ///
    /// Nothing is stored unless parsing and discovery succeed.
    pub async fn ingest(&self, source_name: &str, raw: &[u8]) -> Result<IngestOutcome> {
        let source_digest = hex::encode(Sha256::digest(raw));
        info!(source = %source_name, bytes = raw.len(), digest = %source_digest, "Ingesting log");

        let log = self.miner.parse(raw)?;
        let summary = log.summary();
        let (graph, petri_net) = discover_both(&self.miner, &log)?;
        debug!(
            activities = graph.activities.len(),
            edges = graph.edge_count(),
            places = petri_net.places.len(),
            transitions = petri_net.transitions.len(),
            "Discovered models"
        );

        let id = ArtifactId::new();
        let source_key = self
            .blobs
            .store(&format!("{}{}.jsonocel", self.config.log_prefix, id), raw.to_vec())
            .await?;

        let now = Utc::now();
        let artifact = DiscoveryArtifact {
            id,
            source_name: source_name.to_string(),
            source_digest,
            source_key: source_key.clone(),
            object_types: summary.object_types.clone(),
            selection: None,
            summary: summary.clone(),
            graph,
            petri_net,
            created_at: now,
            updated_at: now,
            generation: 0,
        };

        let default_filter = &self.config.default_filter;
        let thresholds = compute_thresholds(
            &artifact.graph,
            default_filter.activity_percent,
            default_filter.path_percent,
            default_filter.annotation_metric,
            default_filter.annotation_metric.edge_metric(),
        );
        let params = params_for(VisualizationKind::FlowGraph, default_filter, thresholds);

        if let Err(e) = self.cache.put(artifact).await {
            if let Err(cleanup) = self.blobs.delete(&source_key).await {
                warn!(key = %source_key, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(e);
        }

        info!(
            artifact_id = %id,
            object_types = summary.object_types.len(),
            events = summary.event_count,
            objects = summary.object_count,
            "Artifact cached"
        );

        Ok(IngestOutcome {
            artifact_id: id,
            object_types: summary.object_types.clone(),
            summary,
            params,
        })
    }

    /// Serve one filter interaction.
    ///
    /// Percent values and the metric only change the thresholds. A changed
    /// object-type selection re-discovers both models from the stored
    /// upload and replaces the cached artifact. On any failure the cached
    /// artifact is left as it was.
    pub async fn filter(
        &self,
        id: &ArtifactId,
        spec: &FilterSpec,
        kind: VisualizationKind,
    ) -> Result<FilterOutcome> {
        let cached = self.cache.get(id).await?;
        let decision = apply_type_filter(
            cached.selection.as_ref(),
            spec.selected_object_types.as_ref(),
            &cached.object_types,
        )?;

        let (artifact, rediscovered) = if decision.needs_rediscovery {
            self.rediscover_locked(id, &decision.selection).await?
        } else {
            debug!(artifact_id = %id, "Reusing cached artifact");
            (cached, false)
        };

        let thresholds = match kind {
            VisualizationKind::FlowGraph => compute_thresholds(
                &artifact.graph,
                spec.activity_percent,
                spec.path_percent,
                spec.annotation_metric,
                spec.annotation_metric.edge_metric(),
            ),
            VisualizationKind::PetriNet => Thresholds::default(),
        };
        let params = params_for(kind, spec, thresholds);

        info!(
            artifact_id = %id,
            kind = %kind,
            rediscovered,
            activity_threshold = params.activity_threshold,
            edge_threshold = params.edge_threshold,
            "Filter request served"
        );

        Ok(FilterOutcome {
            artifact,
            params,
            rediscovered,
            selection: decision.selection,
        })
    }

    /// Re-discover under the artifact's lock.
    async fn rediscover_locked(
        &self,
        id: &ArtifactId,
        selection: &Option<BTreeSet<String>>,
    ) -> Result<(Arc<DiscoveryArtifact>, bool)> {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            self.rediscover_current(id, selection).await
        };
        drop(lock);
        self.release_lock(id);
        result
    }

    /// The stored selection is checked again once the lock is held: a
    /// concurrent request may already have produced the wanted structures.
    async fn rediscover_current(
        &self,
        id: &ArtifactId,
        selection: &Option<BTreeSet<String>>,
    ) -> Result<(Arc<DiscoveryArtifact>, bool)> {
        let current = self.cache.get(id).await?;
        if current.selection == *selection {
            debug!(artifact_id = %id, "Selection already discovered by a concurrent request");
            return Ok((current, false));
        }

        info!(artifact_id = %id, selection = ?selection, "Re-discovering for new object-type selection");
        let raw = self.blobs.load(&current.source_key).await?;
        let log = self.miner.parse(&raw)?;
        let Rediscovery {
            summary,
            graph,
            petri_net,
        } = rediscover(&self.miner, &log, selection.as_ref())?;

        let updated = current.rediscovered(selection.clone(), summary, graph, petri_net);
        let stored = self.cache.replace(updated).await?;
        debug!(artifact_id = %id, generation = stored.generation, "Artifact replaced");
        Ok((stored, true))
    }

    /// Remove a cached artifact and its stored upload.
    ///
    /// Once the cache entry is gone the eviction counts as done; a failure
    /// to delete the upload afterwards is logged, not returned.
    pub async fn evict(&self, id: &ArtifactId) -> Result<()> {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            self.evict_current(id).await
        };
        drop(lock);
        self.release_lock(id);
        result
    }

    async fn evict_current(&self, id: &ArtifactId) -> Result<()> {
        let artifact = self.cache.get(id).await?;
        if !self.cache.invalidate(id).await? {
            return Err(EngineError::NotFound { id: id.to_string() });
        }
        if let Err(e) = self.blobs.delete(&artifact.source_key).await {
            warn!(
                artifact_id = %id,
                key = %artifact.source_key,
                error = %e,
                "Failed to remove evicted upload"
            );
        }

        info!(artifact_id = %id, "Artifact evicted");
        Ok(())
    }

    /// Evict every artifact created more than `artifact_ttl` before `now`.
    ///
    /// Returns the number of evicted artifacts. Artifacts removed
    /// concurrently are skipped.
    pub async fn evict_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut evicted = 0;
        for id in self.cache.list().await? {
            let artifact = match self.cache.get(&id).await {
                Ok(artifact) => artifact,
                Err(EngineError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            };
            if !artifact.is_expired(now, self.config.artifact_ttl) {
                continue;
            }
            match self.evict(&id).await {
                Ok(()) => evicted += 1,
                Err(EngineError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        if evicted > 0 {
            info!(evicted, "Expired artifacts swept");
        } else {
            debug!("No expired artifacts");
        }
        Ok(evicted)
    }

    /// Snapshot of a cached artifact.
    pub async fn artifact(&self, id: &ArtifactId) -> Result<Arc<DiscoveryArtifact>> {
        self.cache.get(id).await
    }

    /// Snapshots of every cached artifact, oldest first.
    ///
    /// Artifacts evicted while listing are skipped.
    pub async fn artifacts(&self) -> Result<Vec<Arc<DiscoveryArtifact>>> {
        let mut artifacts = Vec::new();
        for id in self.cache.list().await? {
            match self.cache.get(&id).await {
                Ok(artifact) => artifacts.push(artifact),
                Err(EngineError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        artifacts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(artifacts)
    }

    fn lock_for(&self, id: &ArtifactId) -> Arc<Mutex<()>> {
        self.locks.entry(*id).or_default().clone()
    }

    /// Drop the lock entry of `id` unless another request still holds a
    /// handle to it. Callers drop their own handle first.
    fn release_lock(&self, id: &ArtifactId) {
        self.locks.remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::miners::JsonOcelMiner;
    use crate::stores::memory::{MemoryArtifactCache, MemoryBlobStore};
    use crate::testing::sample_ocel;
    use crate::traits::blob::BlobHandle;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory blob store whose deletes can be made to fail.
    #[derive(Default)]
    struct FlakyBlobStore {
        inner: MemoryBlobStore,
        fail_delete: AtomicBool,
    }

    #[async_trait]
    impl BlobStore for FlakyBlobStore {
        async fn store(&self, key: &str, bytes: Vec<u8>) -> Result<BlobHandle> {
            self.inner.store(key, bytes).await
        }

        async fn load(&self, handle: &BlobHandle) -> Result<Vec<u8>> {
            self.inner.load(handle).await
        }

        async fn delete(&self, handle: &BlobHandle) -> Result<()> {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(EngineError::storage("disk unavailable"));
            }
            self.inner.delete(handle).await
        }

        async fn list(&self, prefix: &str) -> Result<Vec<BlobHandle>> {
            self.inner.list(prefix).await
        }
    }

    fn engine() -> DiscoveryEngine<JsonOcelMiner, MemoryArtifactCache, FlakyBlobStore> {
        DiscoveryEngine::new(
            JsonOcelMiner::new(),
            MemoryArtifactCache::new(),
            FlakyBlobStore::default(),
        )
    }

    #[tokio::test]
    async fn evicting_unknown_ids_leaves_no_lock_entries() {
        let engine = engine();

        for _ in 0..100 {
            let err = engine.evict(&ArtifactId::new()).await.unwrap_err();
            assert!(matches!(err, EngineError::NotFound { .. }));
        }

        assert_eq!(engine.locks.len(), 0);
    }

    #[tokio::test]
    async fn lock_entries_are_released_after_rediscovery_and_evict() {
        let engine = engine();
        let id = engine.ingest("sample.jsonocel", &sample_ocel()).await.unwrap().artifact_id;

        let spec = FilterSpec::default().with_object_types(["order"]);
        let outcome = engine
            .filter(&id, &spec, VisualizationKind::FlowGraph)
            .await
            .unwrap();
        assert!(outcome.rediscovered);
        assert_eq!(engine.locks.len(), 0);

        engine.evict(&id).await.unwrap();
        assert_eq!(engine.locks.len(), 0);

        // rediscovery against an evicted artifact fails without leaking
        let err = engine.rediscover_locked(&id, &None).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
        assert_eq!(engine.locks.len(), 0);
    }

    #[tokio::test]
    async fn failed_upload_delete_still_evicts() {
        let engine = engine();
        let id = engine.ingest("sample.jsonocel", &sample_ocel()).await.unwrap().artifact_id;

        engine.blobs().fail_delete.store(true, Ordering::SeqCst);
        engine.evict(&id).await.unwrap();

        assert!(engine.cache().is_empty());
        assert!(matches!(
            engine.evict(&id).await.unwrap_err(),
            EngineError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn artifacts_lists_every_cached_snapshot() {
        let engine = engine();
        let first = engine.ingest("first.jsonocel", &sample_ocel()).await.unwrap().artifact_id;
        let second = engine.ingest("second.jsonocel", &sample_ocel()).await.unwrap().artifact_id;

        let listed = engine.artifacts().await.unwrap();
        let mut ids: Vec<ArtifactId> = listed.iter().map(|a| a.id).collect();
        ids.sort();
        let mut expected = vec![first, second];
        expected.sort();
        assert_eq!(ids, expected);

        engine.evict(&first).await.unwrap();
        let listed = engine.artifacts().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].source_name, "second.jsonocel");
    }
}
