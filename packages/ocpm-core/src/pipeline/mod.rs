//! Discovery pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Shape normalization of mined models (adapter)
//! - Object-type selection and re-discovery gating (type_filter)
//! - Percent-to-threshold conversion (threshold)
//! - Render parameter assembly (params)
//! - Caching and eviction (engine)

pub mod adapter;
pub mod engine;
pub mod params;
pub mod threshold;
pub mod type_filter;

pub use adapter::{discover, discover_both, normalize_graph, normalize_petri_net, DiscoveredModel};
pub use engine::{DiscoveryEngine, FilterOutcome, IngestOutcome};
pub use params::{build_params, params_for};
pub use threshold::{
    compute_thresholds, compute_thresholds_by_name, cutoff_index, percentile_threshold, Thresholds,
};
pub use type_filter::{
    apply_type_filter, rediscover, resolve_selection, Rediscovery, TypeFilterDecision,
};
