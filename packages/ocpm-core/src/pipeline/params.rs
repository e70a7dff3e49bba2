//! Rendering parameter builder.

use crate::pipeline::threshold::Thresholds;
use crate::types::filter::{FilterSpec, Orientation, VisualizationKind};
use crate::types::metric::Metric;
use crate::types::render::{RenderParams, ANNOTATION, BACKGROUND_COLOR, PERFORMANCE_AGGREGATION};

/// Assemble the renderer's parameter set. No side effects.
///
/// Performance aggregation and background color are fixed presentation
/// defaults.
pub fn build_params(
    kind: VisualizationKind,
    metric: Metric,
    thresholds: Thresholds,
    orientation: Orientation,
    output_format: &str,
) -> RenderParams {
    RenderParams {
        kind,
        annotation: ANNOTATION.to_string(),
        activity_metric: metric,
        edge_metric: metric.edge_metric(),
        activity_threshold: thresholds.activity,
        edge_threshold: thresholds.edge,
        performance_aggregation: PERFORMANCE_AGGREGATION.to_string(),
        bgcolor: BACKGROUND_COLOR.to_string(),
        orientation,
        rankdir: orientation.rankdir().to_string(),
        format: output_format.to_string(),
    }
}

/// [`build_params`] taking presentation choices from a filter request.
pub fn params_for(kind: VisualizationKind, spec: &FilterSpec, thresholds: Thresholds) -> RenderParams {
    build_params(
        kind,
        spec.annotation_metric,
        thresholds,
        spec.orientation,
        &spec.output_format,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::metric::EdgeMetric;

    #[test]
    fn fixed_presentation_defaults() {
        let params = build_params(
            VisualizationKind::FlowGraph,
            Metric::Events,
            Thresholds { activity: 5, edge: 3 },
            Orientation::TopToBottom,
            "svg",
        );

        assert_eq!(params.performance_aggregation, "mean");
        assert_eq!(params.bgcolor, "white");
        assert_eq!(params.rankdir, "TB");
        assert_eq!(params.edge_metric, EdgeMetric::EventCouples);
        assert_eq!(params.activity_threshold, 5);
        assert_eq!(params.edge_threshold, 3);
        assert_eq!(params.format, "svg");
    }

    #[test]
    fn takes_choices_from_filter_spec() {
        let spec = FilterSpec::default()
            .with_metric(Metric::TotalObjects)
            .with_output_format("png");
        let params = params_for(VisualizationKind::PetriNet, &spec, Thresholds::default());

        assert_eq!(params.kind, VisualizationKind::PetriNet);
        assert_eq!(params.activity_metric, Metric::TotalObjects);
        assert_eq!(params.edge_metric, EdgeMetric::TotalObjects);
        assert_eq!(params.rankdir, "LR");
        assert_eq!(params.format, "png");
    }
}
