//! Filter request types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::types::metric::Metric;

/// Layout direction of the rendered model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    LeftToRight,
    TopToBottom,
}

impl Orientation {
    /// Graphviz `rankdir` token.
    pub fn rankdir(self) -> &'static str {
        match self {
            Orientation::LeftToRight => "LR",
            Orientation::TopToBottom => "TB",
        }
    }
}

impl FromStr for Orientation {
    type Err = String;

    /// Accepts the layout tokens (`LR`/`TB`) and the UI names
    /// (`horizontal`/`vertical`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lr" | "horizontal" | "left_to_right" => Ok(Orientation::LeftToRight),
            "tb" | "vertical" | "top_to_bottom" => Ok(Orientation::TopToBottom),
            other => Err(format!("unknown orientation: {other}")),
        }
    }
}

/// Which discovered model a filter request visualizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationKind {
    /// Object-centric directly-follows graph
    #[default]
    FlowGraph,
    /// Object-centric Petri net
    PetriNet,
}

impl fmt::Display for VisualizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VisualizationKind::FlowGraph => "flow_graph",
            VisualizationKind::PetriNet => "petri_net",
        })
    }
}

impl FromStr for VisualizationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flow_graph" | "ocdfg" | "dfg" => Ok(VisualizationKind::FlowGraph),
            "petri_net" | "ocpn" | "petri" => Ok(VisualizationKind::PetriNet),
            other => Err(format!("unknown visualization kind: {other}")),
        }
    }
}

/// Parameters of one filter interaction.
///
/// `activity_percent` and `path_percent` are "percent to keep": 100 keeps
/// every activity/edge, lower values raise the frequency cutoff so only
/// roughly the most frequent share stays visible. 0 still keeps the
/// activities/edges tied for the highest frequency. Values above 100 are
/// treated as 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub activity_percent: u8,
    pub path_percent: u8,
    /// Object types to keep; `None`, empty, or the full set means no
    /// type filtering.
    pub selected_object_types: Option<BTreeSet<String>>,
    /// Metric for activity annotations and thresholds; the edge metric is
    /// derived from it.
    pub annotation_metric: Metric,
    pub orientation: Orientation,
    /// Renderer format token, passed through untouched
    pub output_format: String,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            activity_percent: 100,
            path_percent: 100,
            selected_object_types: None,
            annotation_metric: Metric::UniqueObjects,
            orientation: Orientation::LeftToRight,
            output_format: "svg".to_string(),
        }
    }
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activity_percent(mut self, percent: u8) -> Self {
        self.activity_percent = percent;
        self
    }

    pub fn with_path_percent(mut self, percent: u8) -> Self {
        self.path_percent = percent;
        self
    }

    pub fn with_object_types(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.selected_object_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.annotation_metric = metric;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = format.into();
        self
    }
}
