//! Object-Centric Discovery Cache and Percentile Filtering Engine
//!
//! Ingests object-centric event logs, discovers a directly-follows graph
//! and a Petri net per upload, caches both, and turns interactive filter
//! requests (activity/path percentages, object-type selection, annotation
//! metric) into the parameters a renderer needs.
//!
//! # Design Philosophy
//!
//! - Discovery is expensive, filtering is cheap: only a changed object-type
//!   selection re-runs the miner; slider changes reuse the cached artifact
//! - Mining, caching, persistence and rendering sit behind traits so each
//!   can be swapped (or faked in tests)
//! - A failed request never leaves a half-updated artifact behind
//!
//! # Usage
//!
//! ```rust,ignore
//! use ocpm_core::{
//!     DiscoveryEngine, DotRenderer, FilterSpec, JsonOcelMiner, MemoryArtifactCache,
//!     MemoryBlobStore, Metric, VisualizationKind,
//! };
//!
//! let engine = DiscoveryEngine::new(
//!     JsonOcelMiner::new(),
//!     MemoryArtifactCache::new(),
//!     MemoryBlobStore::new(),
//! );
//!
//! let ingested = engine.ingest("orders.jsonocel", &bytes).await?;
//!
//! let spec = FilterSpec::default()
//!     .with_activity_percent(60)
//!     .with_metric(Metric::Events)
//!     .with_object_types(["order", "item"]);
//! let outcome = engine
//!     .filter(&ingested.artifact_id, &spec, VisualizationKind::FlowGraph)
//!     .await?;
//! let dot = outcome.render(&DotRenderer::new())?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator abstractions (LogMiner, ArtifactCache, BlobStore, Renderer)
//! - [`types`] - Graph, Petri net, filter, artifact and configuration types
//! - [`pipeline`] - Adapter, thresholds, type filter, params and the engine
//! - [`stores`] - Cache and blob store implementations
//! - [`miners`] - OCEL JSON miner
//! - [`renderers`] - Graphviz DOT renderer
//! - [`testing`] - Counting miner and fixtures

pub mod error;
pub mod miners;
pub mod pipeline;
pub mod renderers;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{DiscoveryError, EngineError, ParseError, Result};
pub use traits::{
    blob::{BlobHandle, BlobStore},
    cache::ArtifactCache,
    miner::{EventLog, LogMiner, RawEdge, RawOcdfg, RawOcpn, RawTransition, RawTypedNet},
    renderer::{ModelView, Rendered, Renderer},
};
pub use types::{
    artifact::{ArtifactId, DiscoveryArtifact},
    config::EngineConfig,
    filter::{FilterSpec, Orientation, VisualizationKind},
    graph::{ActivityCounts, EdgeCounts, EdgeKey, EdgeTable, MetricCounts, ObjectCentricGraph},
    log::LogSummary,
    metric::{EdgeMetric, Metric},
    petri::{NetArc, NodeId, PetriNet, Place, PlaceId, Transition, TransitionId},
    render::RenderParams,
};

// Re-export the engine and pipeline components
pub use pipeline::{
    apply_type_filter, build_params, compute_thresholds, compute_thresholds_by_name, discover,
    DiscoveryEngine, FilterOutcome, IngestOutcome, Thresholds, TypeFilterDecision,
};

// Re-export implementations
pub use miners::{JsonOcelMiner, OcelLog};
pub use renderers::DotRenderer;
pub use stores::{BlobArtifactCache, FsBlobStore, MemoryArtifactCache, MemoryBlobStore};

// Re-export testing utilities
pub use testing::CountingMiner;
