//! OCEL 1.0 JSON miner.
//!
//! Reads the `ocel:events` / `ocel:objects` tables of a JSON-OCEL upload
//! and mines per-object-type directly-follows relations from each object's
//! lifecycle (its events ordered by timestamp, then event id).
//!
//! The Petri net is DFG-shaped: per object type a source place feeding the
//! start activities, one place per directly-follows pair, and a sink place
//! fed by the end activities.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::{DiscoveryResult, ParseError, ParseResult};
use crate::traits::miner::{
    EventLog, LogMiner, RawEdge, RawOcdfg, RawOcpn, RawTransition, RawTypedNet, TypedIds,
};
use crate::types::graph::EdgeCounts;
use crate::types::ids::join_escaped;
use crate::types::metric::{EdgeMetric, Metric};

const SOURCE_PLACE: &str = "p:source";
const SINK_PLACE: &str = "p:sink";
const ID_SEPARATOR: char = '|';

#[derive(Debug, Deserialize)]
struct JsonOcel {
    #[serde(rename = "ocel:events")]
    events: Option<BTreeMap<String, JsonEvent>>,
    #[serde(rename = "ocel:objects")]
    objects: Option<BTreeMap<String, JsonObject>>,
}

#[derive(Debug, Deserialize)]
struct JsonEvent {
    #[serde(rename = "ocel:activity")]
    activity: String,
    #[serde(rename = "ocel:timestamp")]
    timestamp: String,
    #[serde(rename = "ocel:omap", default)]
    omap: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct JsonObject {
    #[serde(rename = "ocel:type")]
    object_type: String,
}

/// One event with its related objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcelEvent {
    pub id: String,
    pub activity: String,
    pub timestamp: DateTime<Utc>,
    /// Related object ids, deduplicated, in upload order
    pub objects: Vec<String>,
}

/// A parsed OCEL log. Events are kept ordered by (timestamp, id); every
/// related object has an entry in the object table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcelLog {
    events: Vec<OcelEvent>,
    /// Object id -> object type
    objects: BTreeMap<String, String>,
}

impl OcelLog {
    pub fn events(&self) -> &[OcelEvent] {
        &self.events
    }

    pub fn object_type(&self, object: &str) -> Option<&str> {
        self.objects.get(object).map(String::as_str)
    }

    /// Events of every object, in order.
    pub fn lifecycles(&self) -> BTreeMap<&str, Vec<&OcelEvent>> {
        let mut lifecycles: BTreeMap<&str, Vec<&OcelEvent>> = BTreeMap::new();
        for event in &self.events {
            for object in &event.objects {
                lifecycles.entry(object.as_str()).or_default().push(event);
            }
        }
        lifecycles
    }
}

impl EventLog for OcelLog {
    fn object_types(&self) -> BTreeSet<String> {
        self.objects.values().cloned().collect()
    }

    fn event_count(&self) -> usize {
        self.events.len()
    }

    fn object_count(&self) -> usize {
        self.objects.len()
    }
}

fn parse_timestamp(event: &str, value: &str) -> ParseResult<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ParseError::Timestamp {
            event: event.to_string(),
            value: value.to_string(),
        })
}

/// Directly-follows data of one object type.
#[derive(Default)]
struct TypeFlow<'a> {
    activities: BTreeSet<&'a str>,
    starts: BTreeMap<&'a str, BTreeSet<String>>,
    ends: BTreeMap<&'a str, BTreeSet<String>>,
    pairs: BTreeMap<(&'a str, &'a str), EdgeCounts>,
    /// Activities with an event relating several objects of this type
    variable: BTreeSet<&'a str>,
}

fn type_flows(log: &OcelLog) -> BTreeMap<&str, TypeFlow<'_>> {
    let mut flows: BTreeMap<&str, TypeFlow<'_>> = BTreeMap::new();

    for event in &log.events {
        let mut per_type: BTreeMap<&str, usize> = BTreeMap::new();
        for object in &event.objects {
            if let Some(object_type) = log.object_type(object) {
                *per_type.entry(object_type).or_default() += 1;
            }
        }
        for (object_type, count) in per_type {
            let flow = flows.entry(object_type).or_default();
            flow.activities.insert(event.activity.as_str());
            if count > 1 {
                flow.variable.insert(event.activity.as_str());
            }
        }
    }

    for (object, lifecycle) in log.lifecycles() {
        let Some(object_type) = log.object_type(object) else {
            continue;
        };
        let flow = flows.entry(object_type).or_default();

        if let (Some(first), Some(last)) = (lifecycle.first(), lifecycle.last()) {
            flow.starts
                .entry(first.activity.as_str())
                .or_default()
                .insert(object.to_string());
            flow.ends
                .entry(last.activity.as_str())
                .or_default()
                .insert(object.to_string());
        }

        for pair in lifecycle.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let counts = flow
                .pairs
                .entry((from.activity.as_str(), to.activity.as_str()))
                .or_default();
            counts
                .metric_mut(EdgeMetric::EventCouples)
                .insert(join_escaped(&[from.id.as_str(), to.id.as_str()], ID_SEPARATOR));
            counts
                .metric_mut(EdgeMetric::UniqueObjects)
                .insert(object.to_string());
            counts
                .metric_mut(EdgeMetric::TotalObjects)
                .insert(join_escaped(
                    &[from.id.as_str(), to.id.as_str(), object],
                    ID_SEPARATOR,
                ));
        }
    }

    flows
}

fn boundary(
    activities: &BTreeMap<&str, BTreeSet<String>>,
) -> BTreeMap<String, BTreeSet<String>> {
    activities
        .iter()
        .map(|(activity, objects)| (activity.to_string(), objects.clone()))
        .collect()
}

/// Reference [`LogMiner`] for OCEL 1.0 JSON uploads.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOcelMiner;

impl JsonOcelMiner {
    pub fn new() -> Self {
        Self
    }
}

impl LogMiner for JsonOcelMiner {
    type Log = OcelLog;

    fn parse(&self, raw: &[u8]) -> ParseResult<OcelLog> {
        let json: JsonOcel = serde_json::from_slice(raw)?;
        let raw_events = json
            .events
            .ok_or_else(|| ParseError::MissingField("ocel:events".into()))?;
        let raw_objects = json
            .objects
            .ok_or_else(|| ParseError::MissingField("ocel:objects".into()))?;

        let objects: BTreeMap<String, String> = raw_objects
            .into_iter()
            .map(|(id, object)| (id, object.object_type))
            .collect();

        let mut events = Vec::with_capacity(raw_events.len());
        for (id, event) in raw_events {
            let timestamp = parse_timestamp(&id, &event.timestamp)?;
            let mut related = Vec::with_capacity(event.omap.len());
            for object in event.omap {
                if !objects.contains_key(&object) {
                    return Err(ParseError::UnknownObject { event: id, object });
                }
                if !related.contains(&object) {
                    related.push(object);
                }
            }
            events.push(OcelEvent {
                id,
                activity: event.activity,
                timestamp,
                objects: related,
            });
        }
        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

        debug!(events = events.len(), objects = objects.len(), "Parsed OCEL log");
        Ok(OcelLog { events, objects })
    }

    fn subset_by_object_types(
        &self,
        log: &OcelLog,
        types: &BTreeSet<String>,
    ) -> DiscoveryResult<OcelLog> {
        let objects: BTreeMap<String, String> = log
            .objects
            .iter()
            .filter(|(_, object_type)| types.contains(*object_type))
            .map(|(id, object_type)| (id.clone(), object_type.clone()))
            .collect();

        let events = log
            .events
            .iter()
            .filter_map(|event| {
                let related: Vec<String> = event
                    .objects
                    .iter()
                    .filter(|object| objects.contains_key(*object))
                    .cloned()
                    .collect();
                (!related.is_empty()).then(|| OcelEvent {
                    objects: related,
                    ..event.clone()
                })
            })
            .collect();

        Ok(OcelLog { events, objects })
    }

    fn discover_graph(&self, log: &OcelLog) -> DiscoveryResult<RawOcdfg> {
        let mut events: BTreeMap<String, TypedIds> = BTreeMap::new();
        let mut unique_objects: BTreeMap<String, TypedIds> = BTreeMap::new();
        let mut total_objects: BTreeMap<String, TypedIds> = BTreeMap::new();

        for event in &log.events {
            for object in &event.objects {
                let Some(object_type) = log.object_type(object) else {
                    continue;
                };
                let activity = event.activity.clone();
                events
                    .entry(activity.clone())
                    .or_default()
                    .entry(object_type.to_string())
                    .or_default()
                    .insert(event.id.clone());
                unique_objects
                    .entry(activity.clone())
                    .or_default()
                    .entry(object_type.to_string())
                    .or_default()
                    .insert(object.clone());
                total_objects
                    .entry(activity)
                    .or_default()
                    .entry(object_type.to_string())
                    .or_default()
                    .insert(join_escaped(&[event.id.as_str(), object.as_str()], ID_SEPARATOR));
            }
        }

        let mut raw = RawOcdfg {
            activities: log.events.iter().map(|e| e.activity.clone()).collect(),
            object_types: log.object_types(),
            ..Default::default()
        };
        raw.activities_ot.insert(Metric::Events.as_str().into(), events);
        raw.activities_ot
            .insert(Metric::UniqueObjects.as_str().into(), unique_objects);
        raw.activities_ot
            .insert(Metric::TotalObjects.as_str().into(), total_objects);

        for (object_type, flow) in type_flows(log) {
            for metric in EdgeMetric::ALL {
                let edges = flow
                    .pairs
                    .iter()
                    .map(|((source, target), counts)| RawEdge {
                        source: source.to_string(),
                        target: target.to_string(),
                        ids: counts.metric(metric).clone(),
                    })
                    .collect();
                raw.edges
                    .entry(metric.as_str().into())
                    .or_default()
                    .insert(object_type.to_string(), edges);
            }
            raw.start_activities
                .insert(object_type.to_string(), boundary(&flow.starts));
            raw.end_activities
                .insert(object_type.to_string(), boundary(&flow.ends));
        }

        Ok(raw)
    }

    fn discover_petri_net(&self, log: &OcelLog) -> DiscoveryResult<RawOcpn> {
        let transition = |activity: &str| format!("t:{activity}");

        let mut raw = RawOcpn::default();
        for (object_type, flow) in type_flows(log) {
            let mut net = RawTypedNet {
                places: vec![SOURCE_PLACE.to_string(), SINK_PLACE.to_string()],
                initial_marking: [SOURCE_PLACE.to_string()].into(),
                final_marking: [SINK_PLACE.to_string()].into(),
                ..Default::default()
            };

            for activity in flow.activities.iter().copied() {
                raw.activities.insert(activity.to_string());
                net.transitions.push(RawTransition {
                    name: transition(activity),
                    label: Some(activity.to_string()),
                });
            }
            for activity in flow.starts.keys().copied() {
                net.arcs.push((SOURCE_PLACE.to_string(), transition(activity)));
            }
            for activity in flow.ends.keys().copied() {
                net.arcs.push((transition(activity), SINK_PLACE.to_string()));
            }
            // pair places are numbered; activity names may contain any character
            for (n, &(from, to)) in flow.pairs.keys().enumerate() {
                let place = format!("p:{n}");
                net.places.push(place.clone());
                net.arcs.push((transition(from), place.clone()));
                net.arcs.push((place, transition(to)));
            }

            raw.double_arcs_on_activity.insert(
                object_type.to_string(),
                flow.activities
                    .iter()
                    .map(|activity| (activity.to_string(), flow.variable.contains(activity)))
                    .collect(),
            );
            raw.nets.insert(object_type.to_string(), net);
        }

        Ok(raw)
    }
}
