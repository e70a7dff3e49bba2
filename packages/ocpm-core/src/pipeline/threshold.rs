//! Percentile thresholds.
//!
//! Turns "percent to keep" sliders into absolute frequency cutoffs. The
//! frequencies are sorted descending and the cutoff is the value at
//! `floor(percent * N / 100)`, clamped to the last index. Rendering only
//! the values at or above the cutoff keeps roughly the top `percent` of
//! activities (or edges) by volume.
//!
//! Pure functions over an immutable graph: safe to call repeatedly and
//! concurrently.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::graph::ObjectCentricGraph;
use crate::types::metric::{EdgeMetric, Metric};

/// Absolute cutoffs derived from percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub activity: u64,
    pub edge: u64,
}

/// Index into a descending-sorted sequence of `len` values.
pub fn cutoff_index(percent: u8, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let percent = usize::from(percent.min(100));
    (percent * len / 100).min(len - 1)
}

/// Cutoff value for `frequencies`; 0 when there are none.
pub fn percentile_threshold(mut frequencies: Vec<usize>, percent: u8) -> u64 {
    if frequencies.is_empty() {
        return 0;
    }
    frequencies.sort_unstable_by(|a, b| b.cmp(a));
    frequencies[cutoff_index(percent, frequencies.len())] as u64
}

/// Activity and edge cutoffs of `graph`.
///
/// Edge frequencies of every object type are pooled into one sequence.
pub fn compute_thresholds(
    graph: &ObjectCentricGraph,
    activity_percent: u8,
    path_percent: u8,
    activity_metric: Metric,
    edge_metric: EdgeMetric,
) -> Thresholds {
    let activity_frequencies = graph
        .activity_frequencies(activity_metric)
        .into_iter()
        .map(|(_, frequency)| frequency)
        .collect();
    let edge_frequencies = graph
        .edge_frequencies(edge_metric)
        .map(|(_, _, frequency)| frequency)
        .collect();

    Thresholds {
        activity: percentile_threshold(activity_frequencies, activity_percent),
        edge: percentile_threshold(edge_frequencies, path_percent),
    }
}

/// [`compute_thresholds`] with metric names as supplied by callers.
///
/// Both names are resolved before anything is computed; an unknown name
/// fails with `EngineError::InvalidMetric`. The edge name `events` means
/// `event_couples`.
pub fn compute_thresholds_by_name(
    graph: &ObjectCentricGraph,
    activity_percent: u8,
    path_percent: u8,
    activity_metric: &str,
    edge_metric: &str,
) -> Result<Thresholds> {
    let activity_metric: Metric = activity_metric.parse()?;
    let edge_metric: EdgeMetric = edge_metric.parse()?;
    Ok(compute_thresholds(
        graph,
        activity_percent,
        path_percent,
        activity_metric,
        edge_metric,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::testing::scenario_graph;
    use proptest::prelude::*;

    #[test]
    fn scenario_two_activities_one_edge() {
        let graph = scenario_graph();

        let thresholds = compute_thresholds(&graph, 50, 50, Metric::Events, EdgeMetric::EventCouples);

        // [10, 5] -> index 1 -> 5; [3] -> index 0 -> 3
        assert_eq!(thresholds, Thresholds { activity: 5, edge: 3 });
    }

    #[test]
    fn zero_percent_keeps_only_the_maximum() {
        let graph = scenario_graph();
        let thresholds = compute_thresholds(&graph, 0, 0, Metric::Events, EdgeMetric::EventCouples);
        assert_eq!(thresholds.activity, 10);
        assert_eq!(thresholds.edge, 3);
    }

    #[test]
    fn hundred_percent_keeps_everything() {
        let graph = scenario_graph();
        let thresholds =
            compute_thresholds(&graph, 100, 100, Metric::Events, EdgeMetric::EventCouples);
        assert_eq!(thresholds.activity, 5);
        assert_eq!(thresholds.edge, 3);
    }

    #[test]
    fn empty_graph_has_zero_thresholds() {
        let graph = ObjectCentricGraph::new();
        let thresholds = compute_thresholds(&graph, 50, 50, Metric::Events, EdgeMetric::EventCouples);
        assert_eq!(thresholds, Thresholds::default());
    }

    #[test]
    fn cutoff_index_clamps() {
        assert_eq!(cutoff_index(0, 4), 0);
        assert_eq!(cutoff_index(25, 4), 1);
        assert_eq!(cutoff_index(99, 4), 3);
        assert_eq!(cutoff_index(100, 4), 3);
        assert_eq!(cutoff_index(200, 4), 3);
        assert_eq!(cutoff_index(50, 0), 0);
    }

    #[test]
    fn by_name_maps_events_to_event_couples() {
        let graph = scenario_graph();
        let thresholds = compute_thresholds_by_name(&graph, 50, 50, "events", "events").unwrap();
        assert_eq!(thresholds, Thresholds { activity: 5, edge: 3 });
    }

    #[test]
    fn by_name_rejects_unknown_metric() {
        let graph = scenario_graph();
        let err = compute_thresholds_by_name(&graph, 50, 50, "bogus", "events").unwrap_err();
        assert!(matches!(err, EngineError::InvalidMetric { ref name } if name == "bogus"));

        let err = compute_thresholds_by_name(&graph, 50, 50, "events", "bogus").unwrap_err();
        assert!(matches!(err, EngineError::InvalidMetric { .. }));
    }

    proptest! {
        #[test]
        fn threshold_is_deterministic(
            values in prop::collection::vec(0usize..1_000, 0..50),
            percent in 0u8..=100,
        ) {
            let a = percentile_threshold(values.clone(), percent);
            let b = percentile_threshold(values, percent);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn threshold_never_rises_with_percent(
            values in prop::collection::vec(0usize..1_000, 1..50),
            low in 0u8..=100,
            high in 0u8..=100,
        ) {
            let (low, high) = if low <= high { (low, high) } else { (high, low) };
            let at_low = percentile_threshold(values.clone(), low);
            let at_high = percentile_threshold(values, high);
            prop_assert!(at_high <= at_low);
        }

        #[test]
        fn threshold_is_one_of_the_values(
            values in prop::collection::vec(0usize..1_000, 1..50),
            percent in 0u8..=100,
        ) {
            let threshold = percentile_threshold(values.clone(), percent);
            prop_assert!(values.iter().any(|v| *v as u64 == threshold));
            let max = *values.iter().max().unwrap() as u64;
            let min = *values.iter().min().unwrap() as u64;
            prop_assert!(threshold <= max && threshold >= min);
            if percent == 0 {
                prop_assert_eq!(threshold, max);
            }
            if percent == 100 {
                prop_assert_eq!(threshold, min);
            }
        }

        #[test]
        fn kept_share_is_at_least_percent(
            values in prop::collection::vec(1usize..1_000, 1..50),
            percent in 1u8..=100,
        ) {
            let threshold = percentile_threshold(values.clone(), percent);
            let kept = values.iter().filter(|v| **v as u64 >= threshold).count();
            // the index floor(p*N/100) is always kept, so at least that many + 1
            let expected = (usize::from(percent) * values.len() / 100).min(values.len() - 1) + 1;
            prop_assert!(kept >= expected);
        }
    }
}
