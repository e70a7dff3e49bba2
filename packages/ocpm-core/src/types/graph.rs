//! Aggregated object-centric directly-follows graph.
//!
//! Every count is backed by the collection of identifiers that contribute
//! to it, so a count is always the cardinality of a set and two graphs can
//! be compared structurally.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::types::metric::{EdgeMetric, Metric};

/// Contributing identifiers of one metric, split by object type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricCounts {
    by_type: BTreeMap<String, BTreeSet<String>>,
}

impl MetricCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object_type: impl Into<String>, id: impl Into<String>) {
        self.by_type
            .entry(object_type.into())
            .or_default()
            .insert(id.into());
    }

    /// Replace the collection for one object type.
    pub fn set(&mut self, object_type: impl Into<String>, ids: BTreeSet<String>) {
        self.by_type.insert(object_type.into(), ids);
    }

    /// Number of distinct identifiers across all object types.
    ///
    /// An event related to objects of two types contributes once.
    pub fn count(&self) -> usize {
        if self.by_type.len() == 1 {
            return self.by_type.values().next().map_or(0, BTreeSet::len);
        }
        self.by_type
            .values()
            .flatten()
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Number of identifiers contributed by one object type.
    pub fn count_for(&self, object_type: &str) -> usize {
        self.by_type.get(object_type).map_or(0, BTreeSet::len)
    }

    pub fn object_types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }

    pub fn get(&self, object_type: &str) -> Option<&BTreeSet<String>> {
        self.by_type.get(object_type)
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.values().all(BTreeSet::is_empty)
    }
}

/// Per-metric counts of one activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCounts {
    pub events: MetricCounts,
    pub unique_objects: MetricCounts,
    pub total_objects: MetricCounts,
}

impl ActivityCounts {
    pub fn metric(&self, metric: Metric) -> &MetricCounts {
        match metric {
            Metric::Events => &self.events,
            Metric::UniqueObjects => &self.unique_objects,
            Metric::TotalObjects => &self.total_objects,
        }
    }

    pub fn metric_mut(&mut self, metric: Metric) -> &mut MetricCounts {
        match metric {
            Metric::Events => &mut self.events,
            Metric::UniqueObjects => &mut self.unique_objects,
            Metric::TotalObjects => &mut self.total_objects,
        }
    }

    pub fn frequency(&self, metric: Metric) -> usize {
        self.metric(metric).count()
    }
}

/// Directed activity pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    pub source: String,
    pub target: String,
}

impl EdgeKey {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Per-metric contributing identifiers of one edge of one object type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCounts {
    pub event_couples: BTreeSet<String>,
    pub unique_objects: BTreeSet<String>,
    pub total_objects: BTreeSet<String>,
}

impl EdgeCounts {
    pub fn metric(&self, metric: EdgeMetric) -> &BTreeSet<String> {
        match metric {
            EdgeMetric::EventCouples => &self.event_couples,
            EdgeMetric::UniqueObjects => &self.unique_objects,
            EdgeMetric::TotalObjects => &self.total_objects,
        }
    }

    pub fn metric_mut(&mut self, metric: EdgeMetric) -> &mut BTreeSet<String> {
        match metric {
            EdgeMetric::EventCouples => &mut self.event_couples,
            EdgeMetric::UniqueObjects => &mut self.unique_objects,
            EdgeMetric::TotalObjects => &mut self.total_objects,
        }
    }

    pub fn frequency(&self, metric: EdgeMetric) -> usize {
        self.metric(metric).len()
    }
}

/// Serialized form of one edge (JSON maps cannot be keyed by pairs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeEntry {
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub counts: EdgeCounts,
}

/// Edges of one object type keyed by (source, target).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<EdgeEntry>", into = "Vec<EdgeEntry>")]
pub struct EdgeTable(BTreeMap<EdgeKey, EdgeCounts>);

impl EdgeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &EdgeKey) -> Option<&EdgeCounts> {
        self.0.get(key)
    }

    pub fn entry(&mut self, key: EdgeKey) -> &mut EdgeCounts {
        self.0.entry(key).or_default()
    }

    pub fn insert(&mut self, key: EdgeKey, counts: EdgeCounts) {
        self.0.insert(key, counts);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EdgeKey, &EdgeCounts)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &EdgeKey> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<EdgeEntry>> for EdgeTable {
    fn from(entries: Vec<EdgeEntry>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|e| (EdgeKey::new(e.source, e.target), e.counts))
                .collect(),
        )
    }
}

impl From<EdgeTable> for Vec<EdgeEntry> {
    fn from(table: EdgeTable) -> Self {
        table
            .0
            .into_iter()
            .map(|(key, counts)| EdgeEntry {
                source: key.source,
                target: key.target,
                counts,
            })
            .collect()
    }
}

/// Activity -> identifiers of the objects whose lifecycle starts (or ends) there.
pub type BoundaryActivities = BTreeMap<String, BTreeSet<String>>;

/// The aggregated discovery result for one (possibly type-filtered) log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCentricGraph {
    pub object_types: BTreeSet<String>,
    pub activities: BTreeMap<String, ActivityCounts>,
    /// Object type -> edges of that type
    pub edges: BTreeMap<String, EdgeTable>,
    #[serde(default)]
    pub start_activities: BTreeMap<String, BoundaryActivities>,
    #[serde(default)]
    pub end_activities: BTreeMap<String, BoundaryActivities>,
}

impl ObjectCentricGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scalar frequency of every activity under `metric`.
    pub fn activity_frequencies(&self, metric: Metric) -> Vec<(&str, usize)> {
        self.activities
            .iter()
            .map(|(name, counts)| (name.as_str(), counts.frequency(metric)))
            .collect()
    }

    /// Frequency of every (object type, edge) pair under `metric`.
    pub fn edge_frequencies(
        &self,
        metric: EdgeMetric,
    ) -> impl Iterator<Item = (&str, &EdgeKey, usize)> {
        self.edges.iter().flat_map(move |(object_type, table)| {
            table
                .iter()
                .map(move |(key, counts)| (object_type.as_str(), key, counts.frequency(metric)))
        })
    }

    /// Total number of edges across all object types.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(EdgeTable::len).sum()
    }

    /// Check the structural invariants: edge endpoints are known activities
    /// and no present edge has an empty metric collection.
    pub fn validate(&self) -> DiscoveryResult<()> {
        for (object_type, table) in &self.edges {
            for (key, counts) in table.iter() {
                if !self.activities.contains_key(&key.source)
                    || !self.activities.contains_key(&key.target)
                {
                    return Err(DiscoveryError::DanglingEdge {
                        object_type: object_type.clone(),
                        source_activity: key.source.clone(),
                        target_activity: key.target.clone(),
                    });
                }
                for metric in EdgeMetric::ALL {
                    if counts.metric(metric).is_empty() {
                        return Err(DiscoveryError::EmptyEdgeMetric {
                            object_type: object_type.clone(),
                            source_activity: key.source.clone(),
                            target_activity: key.target.clone(),
                            metric: metric.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn metric_count_is_union_across_types() {
        let mut counts = MetricCounts::new();
        counts.set("order", ids(&["e1", "e2"]));
        counts.set("item", ids(&["e2", "e3"]));

        assert_eq!(counts.count(), 3);
        assert_eq!(counts.count_for("order"), 2);
        assert_eq!(counts.count_for("missing"), 0);
    }

    #[test]
    fn validate_rejects_unknown_endpoint() {
        let mut graph = ObjectCentricGraph::new();
        graph.activities.insert("A".into(), ActivityCounts::default());
        let mut table = EdgeTable::new();
        table.insert(
            EdgeKey::new("A", "Z"),
            EdgeCounts {
                event_couples: ids(&["e1|e2"]),
                unique_objects: ids(&["o1"]),
                total_objects: ids(&["e1|e2|o1"]),
            },
        );
        graph.edges.insert("order".into(), table);

        let err = graph.validate().unwrap_err();
        assert!(matches!(err, DiscoveryError::DanglingEdge { .. }));
    }

    #[test]
    fn validate_rejects_empty_edge_metric() {
        let mut graph = ObjectCentricGraph::new();
        graph.activities.insert("A".into(), ActivityCounts::default());
        graph.activities.insert("B".into(), ActivityCounts::default());
        let mut table = EdgeTable::new();
        table.insert(
            EdgeKey::new("A", "B"),
            EdgeCounts {
                event_couples: ids(&["e1|e2"]),
                ..Default::default()
            },
        );
        graph.edges.insert("order".into(), table);

        let err = graph.validate().unwrap_err();
        assert!(matches!(err, DiscoveryError::EmptyEdgeMetric { ref metric, .. } if metric == "unique_objects"));
    }

    #[test]
    fn edge_table_serializes_as_list() {
        let mut table = EdgeTable::new();
        table.entry(EdgeKey::new("A", "B")).event_couples.insert("e1|e2".into());

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json[0]["source"], "A");
        assert_eq!(json[0]["target"], "B");
        assert_eq!(json[0]["event_couples"][0], "e1|e2");

        let back: EdgeTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
    }
}
