//! Testing utilities including a call-counting miner and fixtures.
//!
//! Useful for asserting how often an application triggers discovery
//! without wiring up a real mining backend.

use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{DiscoveryError, DiscoveryResult, ParseResult};
use crate::miners::JsonOcelMiner;
use crate::pipeline::adapter::discover_both;
use crate::traits::blob::BlobHandle;
use crate::traits::miner::{EventLog, LogMiner, RawOcdfg, RawOcpn};
use crate::types::artifact::{ArtifactId, DiscoveryArtifact};
use crate::types::graph::{ActivityCounts, EdgeCounts, EdgeKey, EdgeTable, ObjectCentricGraph};

/// Wraps a miner and counts calls.
///
/// Clones share their counters, so a test can keep one handle while the
/// engine owns another.
///
/// # Example
///
/// ```rust,ignore
/// let miner = CountingMiner::new(JsonOcelMiner::new());
/// let engine = DiscoveryEngine::new(miner.clone(), MemoryArtifactCache::new(), MemoryBlobStore::new());
///
/// engine.ingest("log.jsonocel", &sample_ocel()).await?;
/// assert_eq!(miner.graph_calls(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CountingMiner<M> {
    inner: M,
    parse_calls: Arc<AtomicUsize>,
    subset_calls: Arc<AtomicUsize>,
    graph_calls: Arc<AtomicUsize>,
    petri_net_calls: Arc<AtomicUsize>,
    fail_discovery: Arc<AtomicBool>,
}

impl<M: LogMiner> CountingMiner<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            parse_calls: Arc::default(),
            subset_calls: Arc::default(),
            graph_calls: Arc::default(),
            petri_net_calls: Arc::default(),
            fail_discovery: Arc::default(),
        }
    }

    /// Make every following discovery call fail (or succeed again).
    pub fn set_fail_discovery(&self, fail: bool) {
        self.fail_discovery.store(fail, Ordering::SeqCst);
    }

    pub fn parse_calls(&self) -> usize {
        self.parse_calls.load(Ordering::SeqCst)
    }

    pub fn subset_calls(&self) -> usize {
        self.subset_calls.load(Ordering::SeqCst)
    }

    /// Number of `discover_graph` calls.
    pub fn graph_calls(&self) -> usize {
        self.graph_calls.load(Ordering::SeqCst)
    }

    /// Number of `discover_petri_net` calls.
    pub fn petri_net_calls(&self) -> usize {
        self.petri_net_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> DiscoveryResult<()> {
        if self.fail_discovery.load(Ordering::SeqCst) {
            return Err(DiscoveryError::Mining("injected failure".into()));
        }
        Ok(())
    }
}

impl<M: LogMiner> LogMiner for CountingMiner<M> {
    type Log = M::Log;

    fn parse(&self, raw: &[u8]) -> ParseResult<Self::Log> {
        self.parse_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.parse(raw)
    }

    fn subset_by_object_types(
        &self,
        log: &Self::Log,
        types: &BTreeSet<String>,
    ) -> DiscoveryResult<Self::Log> {
        self.subset_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.subset_by_object_types(log, types)
    }

    fn discover_graph(&self, log: &Self::Log) -> DiscoveryResult<RawOcdfg> {
        self.graph_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.inner.discover_graph(log)
    }

    fn discover_petri_net(&self, log: &Self::Log) -> DiscoveryResult<RawOcpn> {
        self.petri_net_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        self.inner.discover_petri_net(log)
    }
}

/// A small OCEL 1.0 JSON log.
///
/// - `o1` is placed with items `i1`, `i2`, picked with `i1`, then paid
/// - `i2` is picked on its own
/// - `o2` is only placed
pub fn sample_ocel() -> Vec<u8> {
    br#"{
        "ocel:global-log": {
            "ocel:version": "1.0",
            "ocel:ordering": "timestamp",
            "ocel:attribute-names": ["price"],
            "ocel:object-types": ["order", "item"]
        },
        "ocel:events": {
            "e3": {
                "ocel:activity": "Pick Item",
                "ocel:timestamp": "2023-01-01 11:00:00",
                "ocel:omap": ["i2"],
                "ocel:vmap": {}
            },
            "e1": {
                "ocel:activity": "Place Order",
                "ocel:timestamp": "2023-01-01T09:00:00Z",
                "ocel:omap": ["o1", "i1", "i2"],
                "ocel:vmap": {"price": 30.5}
            },
            "e2": {
                "ocel:activity": "Pick Item",
                "ocel:timestamp": "2023-01-01T10:00:00+00:00",
                "ocel:omap": ["o1", "i1"],
                "ocel:vmap": {}
            },
            "e4": {
                "ocel:activity": "Pay Order",
                "ocel:timestamp": "2023-01-01T12:00:00",
                "ocel:omap": ["o1"],
                "ocel:vmap": {}
            },
            "e5": {
                "ocel:activity": "Place Order",
                "ocel:timestamp": "2023-01-01T13:00:00.500Z",
                "ocel:omap": ["o2"],
                "ocel:vmap": {"price": 12.0}
            }
        },
        "ocel:objects": {
            "o1": {"ocel:type": "order", "ocel:ovmap": {}},
            "o2": {"ocel:type": "order", "ocel:ovmap": {}},
            "i1": {"ocel:type": "item", "ocel:ovmap": {}},
            "i2": {"ocel:type": "item", "ocel:ovmap": {}}
        }
    }"#
    .to_vec()
}

/// Two activities and one edge: `A` with 5 events, `B` with 10 events and
/// `A -> B` backed by 3 event couples, all of type `order`.
pub fn scenario_graph() -> ObjectCentricGraph {
    let mut graph = ObjectCentricGraph::new();
    graph.object_types.insert("order".into());

    for (activity, events) in [("A", 5), ("B", 10)] {
        let mut counts = ActivityCounts::default();
        for n in 0..events {
            let event = format!("{activity}{n}");
            let object = format!("o{n}");
            counts.events.insert("order", event.clone());
            counts.unique_objects.insert("order", object.clone());
            counts.total_objects.insert("order", format!("{event}|{object}"));
        }
        graph.activities.insert(activity.into(), counts);
    }

    let mut edge = EdgeCounts::default();
    for n in 0..3 {
        edge.event_couples.insert(format!("A{n}|B{n}"));
        edge.unique_objects.insert(format!("o{n}"));
        edge.total_objects.insert(format!("A{n}|B{n}|o{n}"));
    }
    let mut table = EdgeTable::new();
    table.insert(EdgeKey::new("A", "B"), edge);
    graph.edges.insert("order".into(), table);

    graph
}

/// Artifact discovered from [`sample_ocel`] over the full log.
pub fn sample_artifact() -> DiscoveryArtifact {
    let miner = JsonOcelMiner::new();
    let log = miner.parse(&sample_ocel()).expect("sample log parses");
    let (graph, petri_net) = discover_both(&miner, &log).expect("sample log mines");
    let summary = log.summary();
    let now = Utc::now();

    DiscoveryArtifact {
        id: ArtifactId::new(),
        source_name: "sample.jsonocel".into(),
        source_digest: String::new(),
        source_key: BlobHandle::new("logs/sample.jsonocel"),
        object_types: summary.object_types.clone(),
        selection: None,
        summary,
        graph,
        petri_net,
        created_at: now,
        updated_at: now,
        generation: 0,
    }
}
