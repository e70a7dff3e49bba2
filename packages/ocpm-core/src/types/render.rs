//! Parameter set handed to the renderer.

use serde::{Deserialize, Serialize};

use crate::types::filter::{Orientation, VisualizationKind};
use crate::types::metric::{EdgeMetric, Metric};

/// Aggregation applied to performance annotations.
pub const PERFORMANCE_AGGREGATION: &str = "mean";

/// Background color of every rendered model.
pub const BACKGROUND_COLOR: &str = "white";

/// Annotation mode of flow-graph renderings.
pub const ANNOTATION: &str = "frequency";

/// Everything a renderer needs besides the model itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderParams {
    pub kind: VisualizationKind,
    pub annotation: String,
    pub activity_metric: Metric,
    pub edge_metric: EdgeMetric,
    /// Activities below this frequency are not drawn
    pub activity_threshold: u64,
    /// Edges below this frequency are not drawn
    pub edge_threshold: u64,
    pub performance_aggregation: String,
    pub bgcolor: String,
    pub orientation: Orientation,
    pub rankdir: String,
    pub format: String,
}

impl RenderParams {
    pub fn keeps_activity(&self, frequency: usize) -> bool {
        frequency as u64 >= self.activity_threshold
    }

    pub fn keeps_edge(&self, frequency: usize) -> bool {
        frequency as u64 >= self.edge_threshold
    }
}
