//! Object-centric Petri net.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DiscoveryError, DiscoveryResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionId(pub String);

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Either end of an arc.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NodeId {
    Place(PlaceId),
    Transition(TransitionId),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Place(id) => id.fmt(f),
            NodeId::Transition(id) => id.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub object_type: String,
    /// Holds a token in the initial marking
    #[serde(default)]
    pub initial: bool,
    /// Holds a token in the final marking
    #[serde(default)]
    pub r#final: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Visible activity label; `None` for silent transitions
    pub label: Option<String>,
}

impl Transition {
    pub fn is_silent(&self) -> bool {
        self.label.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetArc {
    pub source: NodeId,
    pub target: NodeId,
    pub object_type: String,
    /// Consumes or produces several objects of the type at once
    #[serde(default)]
    pub variable: bool,
}

/// Places, transitions and the ordered arcs between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetriNet {
    pub places: BTreeMap<PlaceId, Place>,
    pub transitions: BTreeMap<TransitionId, Transition>,
    pub arcs: Vec<NetArc>,
}

impl PetriNet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        match node {
            NodeId::Place(id) => self.places.contains_key(id),
            NodeId::Transition(id) => self.transitions.contains_key(id),
        }
    }

    /// Every arc endpoint must be a place or transition of this net.
    pub fn validate(&self) -> DiscoveryResult<()> {
        for arc in &self.arcs {
            for endpoint in [&arc.source, &arc.target] {
                if !self.contains(endpoint) {
                    return Err(DiscoveryError::DanglingArc {
                        object_type: arc.object_type.clone(),
                        endpoint: endpoint.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Transitions with a visible label.
    pub fn visible_transitions(&self) -> impl Iterator<Item = (&TransitionId, &str)> {
        self.transitions
            .iter()
            .filter_map(|(id, t)| t.label.as_deref().map(|label| (id, label)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(id: &str) -> NodeId {
        NodeId::Place(PlaceId(id.to_string()))
    }

    fn transition(id: &str) -> NodeId {
        NodeId::Transition(TransitionId(id.to_string()))
    }

    #[test]
    fn validate_accepts_connected_net() {
        let mut net = PetriNet::new();
        net.places.insert(
            PlaceId("order@source".into()),
            Place {
                object_type: "order".into(),
                initial: true,
                r#final: false,
            },
        );
        net.transitions.insert(
            TransitionId("Create".into()),
            Transition {
                label: Some("Create".into()),
            },
        );
        net.arcs.push(NetArc {
            source: place("order@source"),
            target: transition("Create"),
            object_type: "order".into(),
            variable: false,
        });

        assert!(net.validate().is_ok());
        assert_eq!(net.visible_transitions().count(), 1);
    }

    #[test]
    fn validate_rejects_dangling_arc() {
        let mut net = PetriNet::new();
        net.arcs.push(NetArc {
            source: place("nowhere"),
            target: transition("Create"),
            object_type: "order".into(),
            variable: false,
        });

        let err = net.validate().unwrap_err();
        assert!(matches!(err, DiscoveryError::DanglingArc { ref endpoint, .. } if endpoint == "nowhere"));
    }
}
