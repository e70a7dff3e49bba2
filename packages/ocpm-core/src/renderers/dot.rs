//! Graphviz DOT renderer.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::error::{EngineError, Result};
use crate::traits::renderer::{ModelView, Rendered, Renderer};
use crate::types::filter::VisualizationKind;
use crate::types::graph::ObjectCentricGraph;
use crate::types::petri::{NodeId, PetriNet};
use crate::types::render::RenderParams;

/// Colors assigned to object types in sorted order, cycling.
const PALETTE: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#17becf",
];

/// Renders models as Graphviz source.
///
/// Output is DOT text whatever `params.format` says; turning it into the
/// requested image format is left to the `dot` binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotRenderer;

impl DotRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DotRenderer {
    fn render(&self, model: ModelView<'_>, params: &RenderParams) -> Result<Rendered> {
        let dot = match (model, params.kind) {
            (ModelView::FlowGraph(graph), VisualizationKind::FlowGraph) => {
                flow_graph_dot(graph, params)
            }
            (ModelView::PetriNet(net), VisualizationKind::PetriNet) => petri_net_dot(net, params),
            (_, kind) => {
                return Err(EngineError::Render(format!(
                    "model does not match requested visualization {kind}"
                )))
            }
        };
        Ok(Rendered::Text(dot))
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn color_of(object_types: &BTreeSet<String>, object_type: &str) -> &'static str {
    let index = object_types
        .iter()
        .position(|t| t == object_type)
        .unwrap_or_default();
    PALETTE[index % PALETTE.len()]
}

fn header(out: &mut String, name: &str, params: &RenderParams) {
    let _ = writeln!(out, "digraph {name} {{");
    let _ = writeln!(
        out,
        "  graph [rankdir={}, bgcolor=\"{}\"];",
        params.rankdir,
        escape(&params.bgcolor)
    );
}

fn flow_graph_dot(graph: &ObjectCentricGraph, params: &RenderParams) -> String {
    let abbreviation = params.activity_metric.abbreviation();
    let mut out = String::new();
    header(&mut out, "ocdfg", params);
    let _ = writeln!(
        out,
        "  node [shape=box, style=\"rounded,filled\", fillcolor=\"white\", fontname=\"Helvetica\"];"
    );

    let kept: BTreeSet<&str> = graph
        .activity_frequencies(params.activity_metric)
        .into_iter()
        .filter(|(_, frequency)| params.keeps_activity(*frequency))
        .map(|(name, _)| name)
        .collect();

    for activity in &kept {
        let counts = graph.activities[*activity].metric(params.activity_metric);
        let mut label = format!("{}\\n{abbreviation}={}", escape(activity), counts.count());
        for object_type in counts.object_types() {
            let _ = write!(
                label,
                "\\n{} {abbreviation}={}",
                escape(object_type),
                counts.count_for(object_type)
            );
        }
        let _ = writeln!(out, "  \"a:{}\" [label=\"{label}\"];", escape(activity));
    }

    for (marker, boundaries, incoming) in [
        ("start", &graph.start_activities, false),
        ("end", &graph.end_activities, true),
    ] {
        for (object_type, activities) in boundaries {
            let color = color_of(&graph.object_types, object_type);
            let node = format!("{marker}:{}", escape(object_type));
            let _ = writeln!(
                out,
                "  \"{node}\" [shape=circle, style=filled, fillcolor=\"{color}\", fontcolor=\"white\", label=\"{}\"];",
                escape(object_type)
            );
            for (activity, objects) in activities {
                if !kept.contains(activity.as_str()) {
                    continue;
                }
                let activity_node = format!("a:{}", escape(activity));
                let (from, to) = if incoming {
                    (activity_node, node.clone())
                } else {
                    (node.clone(), activity_node)
                };
                let _ = writeln!(
                    out,
                    "  \"{from}\" -> \"{to}\" [color=\"{color}\", style=dashed, label=\"{}\"];",
                    objects.len()
                );
            }
        }
    }

    for (object_type, key, frequency) in graph.edge_frequencies(params.edge_metric) {
        if !params.keeps_edge(frequency)
            || !kept.contains(key.source.as_str())
            || !kept.contains(key.target.as_str())
        {
            continue;
        }
        let color = color_of(&graph.object_types, object_type);
        let _ = writeln!(
            out,
            "  \"a:{}\" -> \"a:{}\" [color=\"{color}\", label=\"{} {abbreviation}={frequency}\"];",
            escape(&key.source),
            escape(&key.target),
            escape(object_type)
        );
    }

    out.push_str("}\n");
    out
}

fn node_name(node: &NodeId) -> String {
    match node {
        NodeId::Place(id) => format!("place:{}", escape(&id.0)),
        NodeId::Transition(id) => format!("transition:{}", escape(&id.0)),
    }
}

fn petri_net_dot(net: &PetriNet, params: &RenderParams) -> String {
    let object_types: BTreeSet<String> = net
        .places
        .values()
        .map(|place| place.object_type.clone())
        .collect();

    let mut out = String::new();
    header(&mut out, "ocpn", params);

    for (id, place) in &net.places {
        let color = color_of(&object_types, &place.object_type);
        let shape = if place.r#final { "doublecircle" } else { "circle" };
        let (style, label) = if place.initial {
            ("filled", escape(&place.object_type))
        } else {
            ("solid", String::new())
        };
        let _ = writeln!(
            out,
            "  \"{}\" [shape={shape}, style={style}, color=\"{color}\", fillcolor=\"{color}\", label=\"{label}\", width=0.4];",
            node_name(&NodeId::Place(id.clone()))
        );
    }

    for (id, transition) in &net.transitions {
        let node = node_name(&NodeId::Transition(id.clone()));
        match &transition.label {
            Some(label) => {
                let _ = writeln!(out, "  \"{node}\" [shape=box, label=\"{}\"];", escape(label));
            }
            None => {
                let _ = writeln!(
                    out,
                    "  \"{node}\" [shape=box, style=filled, fillcolor=\"black\", label=\"\", width=0.15];"
                );
            }
        }
    }

    for arc in &net.arcs {
        let color = color_of(&object_types, &arc.object_type);
        // a "c:bg:c" color list draws a double line
        let color = if arc.variable {
            format!("{color}:{}:{color}", escape(&params.bgcolor))
        } else {
            color.to_string()
        };
        let _ = writeln!(
            out,
            "  \"{}\" -> \"{}\" [color=\"{color}\"];",
            node_name(&arc.source),
            node_name(&arc.target)
        );
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::params::build_params;
    use crate::pipeline::threshold::Thresholds;
    use crate::testing::{sample_artifact, scenario_graph};
    use crate::types::filter::Orientation;
    use crate::types::metric::Metric;

    fn text(rendered: Rendered) -> String {
        match rendered {
            Rendered::Text(text) => text,
            Rendered::Bytes(_) => panic!("expected text output"),
        }
    }

    #[test]
    fn flow_graph_honors_thresholds() {
        let graph = scenario_graph();
        let renderer = DotRenderer::new();

        let all = build_params(
            VisualizationKind::FlowGraph,
            Metric::Events,
            Thresholds { activity: 5, edge: 3 },
            Orientation::TopToBottom,
            "svg",
        );
        let dot = text(renderer.render(ModelView::FlowGraph(&graph), &all).unwrap());
        assert!(dot.contains("rankdir=TB"));
        assert!(dot.contains("bgcolor=\"white\""));
        assert!(dot.contains("\"a:A\""));
        assert!(dot.contains("\"a:A\" -> \"a:B\""));

        let top = build_params(
            VisualizationKind::FlowGraph,
            Metric::Events,
            Thresholds { activity: 10, edge: 3 },
            Orientation::LeftToRight,
            "svg",
        );
        let dot = text(renderer.render(ModelView::FlowGraph(&graph), &top).unwrap());
        assert!(!dot.contains("\"a:A\" ["));
        assert!(dot.contains("\"a:B\" ["));
        // an edge is dropped with its source activity
        assert!(!dot.contains("\"a:A\" -> \"a:B\""));
    }

    #[test]
    fn petri_net_draws_variable_arcs_doubled() {
        let artifact = sample_artifact();
        let params = build_params(
            VisualizationKind::PetriNet,
            Metric::Events,
            Thresholds::default(),
            Orientation::LeftToRight,
            "svg",
        );

        let dot = text(
            DotRenderer::new()
                .render(ModelView::PetriNet(&artifact.petri_net), &params)
                .unwrap(),
        );
        assert!(dot.starts_with("digraph ocpn {"));
        assert!(dot.contains("shape=doublecircle"));
        assert!(dot.contains(":white:"));
    }

    #[test]
    fn mismatched_model_is_a_render_error() {
        let graph = scenario_graph();
        let params = build_params(
            VisualizationKind::PetriNet,
            Metric::Events,
            Thresholds::default(),
            Orientation::LeftToRight,
            "svg",
        );
        let err = DotRenderer::new()
            .render(ModelView::FlowGraph(&graph), &params)
            .unwrap_err();
        assert!(matches!(err, EngineError::Render(_)));
    }
}
