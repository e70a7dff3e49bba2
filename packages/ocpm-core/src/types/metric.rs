//! Metric names for activity and edge annotations.
//!
//! Activities and edges are counted by three metrics each. The edge side
//! names its event metric `event_couples` (pairs of consecutive events),
//! so the shared annotation choice `events` maps onto it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Activity metric (also the user-facing annotation choice).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Number of events of the activity
    Events,
    /// Number of distinct objects touched by the activity
    #[default]
    UniqueObjects,
    /// Number of (event, object) relations of the activity
    TotalObjects,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Events, Metric::UniqueObjects, Metric::TotalObjects];

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Events => "events",
            Metric::UniqueObjects => "unique_objects",
            Metric::TotalObjects => "total_objects",
        }
    }

    /// Edge metric used when this metric annotates the whole graph.
    pub fn edge_metric(self) -> EdgeMetric {
        EdgeMetric::from(self)
    }

    /// Short label used in rendered annotations.
    pub fn abbreviation(self) -> &'static str {
        match self {
            Metric::Events => "E",
            Metric::UniqueObjects => "UO",
            Metric::TotalObjects => "TO",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "events" => Ok(Metric::Events),
            "unique_objects" => Ok(Metric::UniqueObjects),
            "total_objects" => Ok(Metric::TotalObjects),
            other => Err(EngineError::InvalidMetric {
                name: other.to_string(),
            }),
        }
    }
}

/// Edge metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMetric {
    /// Number of (source event, target event) couples
    EventCouples,
    /// Number of distinct objects flowing along the edge
    UniqueObjects,
    /// Number of (event couple, object) relations along the edge
    TotalObjects,
}

impl EdgeMetric {
    pub const ALL: [EdgeMetric; 3] = [
        EdgeMetric::EventCouples,
        EdgeMetric::UniqueObjects,
        EdgeMetric::TotalObjects,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeMetric::EventCouples => "event_couples",
            EdgeMetric::UniqueObjects => "unique_objects",
            EdgeMetric::TotalObjects => "total_objects",
        }
    }
}

impl From<Metric> for EdgeMetric {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::Events => EdgeMetric::EventCouples,
            Metric::UniqueObjects => EdgeMetric::UniqueObjects,
            Metric::TotalObjects => EdgeMetric::TotalObjects,
        }
    }
}

impl fmt::Display for EdgeMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeMetric {
    type Err = EngineError;

    /// Accepts `events` as an alias of `event_couples`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "events" | "event_couples" => Ok(EdgeMetric::EventCouples),
            "unique_objects" => Ok(EdgeMetric::UniqueObjects),
            "total_objects" => Ok(EdgeMetric::TotalObjects),
            other => Err(EngineError::InvalidMetric {
                name: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_maps_to_event_couples() {
        assert_eq!(Metric::Events.edge_metric(), EdgeMetric::EventCouples);
        assert_eq!("events".parse::<EdgeMetric>().unwrap(), EdgeMetric::EventCouples);
        assert_eq!(Metric::UniqueObjects.edge_metric(), EdgeMetric::UniqueObjects);
        assert_eq!(Metric::TotalObjects.edge_metric(), EdgeMetric::TotalObjects);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = "bogus".parse::<Metric>().unwrap_err();
        assert!(matches!(err, EngineError::InvalidMetric { ref name } if name == "bogus"));
        assert!("event_couples".parse::<Metric>().is_err());
        assert!("bogus".parse::<EdgeMetric>().is_err());
    }

    #[test]
    fn tokens_round_trip_through_display() {
        for metric in Metric::ALL {
            assert_eq!(metric.to_string().parse::<Metric>().unwrap(), metric);
        }
        for metric in EdgeMetric::ALL {
            assert_eq!(metric.to_string().parse::<EdgeMetric>().unwrap(), metric);
        }
    }

    #[test]
    fn serde_uses_snake_case_tokens() {
        let json = serde_json::to_string(&Metric::UniqueObjects).unwrap();
        assert_eq!(json, "\"unique_objects\"");
        let edge: EdgeMetric = serde_json::from_str("\"event_couples\"").unwrap();
        assert_eq!(edge, EdgeMetric::EventCouples);
    }
}
