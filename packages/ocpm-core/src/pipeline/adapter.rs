//! Graph model adapter.
//!
//! Normalizes the mining provider's native output into the engine's
//! aggregate structures:
//! - [`RawOcdfg`] is keyed metric -> activity -> object type; the engine
//!   wants activity -> metric -> object type.
//! - [`RawOcpn`] is one net per object type; the engine wants one net with
//!   type-tagged places and arcs, and visible transitions shared by label.
//!
//! Discovery failures are propagated unchanged and never retried.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::traits::miner::{LogMiner, RawOcdfg, RawOcpn};
use crate::types::filter::VisualizationKind;
use crate::types::graph::{EdgeKey, ObjectCentricGraph};
use crate::types::ids::{escape_part, join_escaped};
use crate::types::metric::{EdgeMetric, Metric};
use crate::types::petri::{NetArc, NodeId, PetriNet, Place, PlaceId, Transition, TransitionId};

/// A normalized discovery result.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveredModel {
    FlowGraph(ObjectCentricGraph),
    PetriNet(PetriNet),
}

/// Mine one model from `log` and normalize it.
pub fn discover<M: LogMiner>(
    miner: &M,
    log: &M::Log,
    kind: VisualizationKind,
) -> DiscoveryResult<DiscoveredModel> {
    match kind {
        VisualizationKind::FlowGraph => {
            let raw = miner.discover_graph(log)?;
            normalize_graph(raw).map(DiscoveredModel::FlowGraph)
        }
        VisualizationKind::PetriNet => {
            let raw = miner.discover_petri_net(log)?;
            normalize_petri_net(raw).map(DiscoveredModel::PetriNet)
        }
    }
}

/// Mine and normalize both models of an artifact.
pub fn discover_both<M: LogMiner>(
    miner: &M,
    log: &M::Log,
) -> DiscoveryResult<(ObjectCentricGraph, PetriNet)> {
    let graph = normalize_graph(miner.discover_graph(log)?)?;
    let net = normalize_petri_net(miner.discover_petri_net(log)?)?;
    Ok((graph, net))
}

/// Transpose a metric-keyed graph into the activity-keyed aggregate.
///
/// Metric names the engine does not know (performance metrics, for
/// instance) are skipped.
pub fn normalize_graph(raw: RawOcdfg) -> DiscoveryResult<ObjectCentricGraph> {
    let mut graph = ObjectCentricGraph {
        object_types: raw.object_types,
        ..Default::default()
    };

    for activity in raw.activities {
        graph.activities.entry(activity).or_default();
    }

    for (metric_name, by_activity) in raw.activities_ot {
        let Ok(metric) = metric_name.parse::<Metric>() else {
            debug!(metric = %metric_name, "Skipping unsupported activity metric");
            continue;
        };
        for (activity, by_type) in by_activity {
            let counts = graph.activities.entry(activity).or_default();
            for (object_type, ids) in by_type {
                graph.object_types.insert(object_type.clone());
                counts.metric_mut(metric).set(object_type, ids);
            }
        }
    }

    for (metric_name, by_type) in raw.edges {
        let Ok(metric) = metric_name.parse::<EdgeMetric>() else {
            debug!(metric = %metric_name, "Skipping unsupported edge metric");
            continue;
        };
        for (object_type, edges) in by_type {
            graph.object_types.insert(object_type.clone());
            let table = graph.edges.entry(object_type).or_default();
            for edge in edges.into_iter().filter(|e| !e.ids.is_empty()) {
                table
                    .entry(EdgeKey::new(edge.source, edge.target))
                    .metric_mut(metric)
                    .extend(edge.ids);
            }
        }
    }
    graph.edges.retain(|_, table| !table.is_empty());

    graph.start_activities = raw.start_activities;
    graph.end_activities = raw.end_activities;

    graph.validate()?;
    Ok(graph)
}

/// Separator of per-type node ids (`order@source`).
const NODE_SEPARATOR: char = '@';

/// Flatten per-type nets into one object-centric net.
///
/// Places and silent transitions are namespaced by object type; visible
/// transitions are keyed by their escaped label, so they never contain an
/// unescaped separator and cannot collide with a namespaced id.
pub fn normalize_petri_net(raw: RawOcpn) -> DiscoveryResult<PetriNet> {
    let mut net = PetriNet::new();

    for (object_type, typed) in raw.nets {
        let variable_activities: BTreeSet<&str> = raw
            .double_arcs_on_activity
            .get(&object_type)
            .map(|by_activity| {
                by_activity
                    .iter()
                    .filter(|(_, double)| **double)
                    .map(|(activity, _)| activity.as_str())
                    .collect()
            })
            .unwrap_or_default();

        let mut places: BTreeMap<&str, PlaceId> = BTreeMap::new();
        for name in &typed.places {
            let id = PlaceId(join_escaped(
                &[object_type.as_str(), name.as_str()],
                NODE_SEPARATOR,
            ));
            net.places.insert(
                id.clone(),
                Place {
                    object_type: object_type.clone(),
                    initial: typed.initial_marking.contains(name),
                    r#final: typed.final_marking.contains(name),
                },
            );
            places.insert(name.as_str(), id);
        }

        let mut transitions: BTreeMap<&str, (TransitionId, Option<&str>)> = BTreeMap::new();
        for transition in &typed.transitions {
            let id = match &transition.label {
                Some(label) => TransitionId(escape_part(label, NODE_SEPARATOR)),
                None => TransitionId(join_escaped(
                    &[object_type.as_str(), transition.name.as_str()],
                    NODE_SEPARATOR,
                )),
            };
            net.transitions.entry(id.clone()).or_insert_with(|| Transition {
                label: transition.label.clone(),
            });
            transitions.insert(
                transition.name.as_str(),
                (id, transition.label.as_deref()),
            );
        }

        let resolve = |name: &str| -> DiscoveryResult<(NodeId, bool)> {
            if let Some(id) = places.get(name) {
                return Ok((NodeId::Place(id.clone()), false));
            }
            if let Some((id, label)) = transitions.get(name) {
                let variable = label.is_some_and(|l| variable_activities.contains(l));
                return Ok((NodeId::Transition(id.clone()), variable));
            }
            Err(DiscoveryError::DanglingArc {
                object_type: object_type.clone(),
                endpoint: name.to_string(),
            })
        };

        for (source, target) in &typed.arcs {
            let (source, source_variable) = resolve(source)?;
            let (target, target_variable) = resolve(target)?;
            net.arcs.push(NetArc {
                source,
                target,
                object_type: object_type.clone(),
                variable: source_variable || target_variable,
            });
        }
    }

    net.validate()?;
    Ok(net)
}
