//! Log-mining provider abstraction.
//!
//! The engine never parses or mines logs itself. A [`LogMiner`] turns raw
//! bytes into an [`EventLog`] and mines it into the provider's native
//! shapes ([`RawOcdfg`], [`RawOcpn`]), which the adapter in
//! [`crate::pipeline::adapter`] normalizes.
//!
//! Mining is CPU-bound and deterministic: methods are synchronous, run to
//! completion on the caller's thread, and a failure is never retried.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ocpm_core::{JsonOcelMiner, LogMiner};
//!
//! let miner = JsonOcelMiner::new();
//! let log = miner.parse(&raw_bytes)?;
//! let orders_only = miner.subset_by_object_types(&log, &["order".into()].into())?;
//! let raw_graph = miner.discover_graph(&orders_only)?;
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DiscoveryResult, ParseResult};
use crate::types::log::LogSummary;

/// A parsed object-centric event log. Immutable once parsed.
pub trait EventLog: Send + Sync {
    fn object_types(&self) -> BTreeSet<String>;

    fn event_count(&self) -> usize;

    fn object_count(&self) -> usize;

    fn summary(&self) -> LogSummary {
        LogSummary {
            object_types: self.object_types(),
            event_count: self.event_count(),
            object_count: self.object_count(),
        }
    }
}

/// External mining library.
pub trait LogMiner: Send + Sync {
    type Log: EventLog;

    /// Parse raw upload bytes.
    fn parse(&self, raw: &[u8]) -> ParseResult<Self::Log>;

    /// Object types present in the log.
    fn object_types(&self, log: &Self::Log) -> BTreeSet<String> {
        log.object_types()
    }

    /// Derived log holding only objects of `types` and the events related
    /// to them.
    fn subset_by_object_types(
        &self,
        log: &Self::Log,
        types: &BTreeSet<String>,
    ) -> DiscoveryResult<Self::Log>;

    /// Mine the object-centric directly-follows graph.
    fn discover_graph(&self, log: &Self::Log) -> DiscoveryResult<RawOcdfg>;

    /// Mine the object-centric Petri net.
    fn discover_petri_net(&self, log: &Self::Log) -> DiscoveryResult<RawOcpn>;
}

/// Identifier collections by object type.
pub type TypedIds = BTreeMap<String, BTreeSet<String>>;

/// One directed edge of one object type with its contributing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
    pub ids: BTreeSet<String>,
}

/// Flow graph as mining libraries usually return it: keyed by metric name
/// first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOcdfg {
    pub activities: BTreeSet<String>,
    pub object_types: BTreeSet<String>,
    /// Metric name -> activity -> object type -> contributing ids
    pub activities_ot: BTreeMap<String, BTreeMap<String, TypedIds>>,
    /// Metric name -> object type -> edges
    pub edges: BTreeMap<String, BTreeMap<String, Vec<RawEdge>>>,
    /// Object type -> activity -> objects starting there
    #[serde(default)]
    pub start_activities: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
    /// Object type -> activity -> objects ending there
    #[serde(default)]
    pub end_activities: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

/// Transition of a per-type net; silent when `label` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransition {
    pub name: String,
    pub label: Option<String>,
}

/// Petri net of a single object type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTypedNet {
    pub places: Vec<String>,
    pub transitions: Vec<RawTransition>,
    /// (source name, target name) in the net's own namespace
    pub arcs: Vec<(String, String)>,
    #[serde(default)]
    pub initial_marking: BTreeSet<String>,
    #[serde(default)]
    pub final_marking: BTreeSet<String>,
}

/// Object-centric Petri net as one net per object type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOcpn {
    pub activities: BTreeSet<String>,
    /// Object type -> net
    pub nets: BTreeMap<String, RawTypedNet>,
    /// Object type -> activity -> whether it handles several objects at once
    #[serde(default)]
    pub double_arcs_on_activity: BTreeMap<String, BTreeMap<String, bool>>,
}
