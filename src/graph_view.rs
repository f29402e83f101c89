use crate::graph_state::{EntityNode, Relation};
use crate::layout_force::{LayoutForce, LayoutStateForce};
use crate::node_shapes::EntityNodeShape;
use eframe::egui::{
    self, Color32, Shape, Stroke,
    epaint::{ColorMode, PathStroke},
};
use egui_graphs::{
    DefaultEdgeShape, DisplayEdge, DisplayNode, DrawContext, EdgeProps, Graph,
    GraphView, Node,
};
use petgraph::graph::DefaultIx;
use petgraph::stable_graph::{IndexType, StableGraph};
use petgraph::{Directed, EdgeType};

// ------------------------------------------------------------------
// Type aliases for graph types
// ------------------------------------------------------------------

pub type ExplorerGraph = StableGraph<EntityNode, Relation>;

pub type ExplorerGraphDisplay =
    Graph<EntityNode, Relation, Directed, DefaultIx, EntityNodeShape, RelationEdgeShape>;

pub type ExplorerGraphView<'a> = GraphView<
    'a,
    EntityNode,
    Relation,
    Directed,
    DefaultIx,
    EntityNodeShape,
    RelationEdgeShape,
    LayoutStateForce,
    LayoutForce,
>;

/// Wrap a raw entity graph in the display type, seeding node labels with
/// the raw formulas. The typeset pass later replaces them with display
/// text.
pub fn setup_graph_display(g: &ExplorerGraph) -> ExplorerGraphDisplay {
    let mut graph = ExplorerGraphDisplay::from(g);
    for (idx, node) in g.node_indices().zip(g.node_weights()) {
        if let Some(graph_node) = graph.node_mut(idx) {
            graph_node.set_label(node.formula.clone());
        }
    }
    let edge_indices: Vec<_> = graph.edges_iter().map(|(idx, _)| idx).collect();
    for edge_idx in edge_indices {
        if let Some(edge) = graph.edge_mut(edge_idx) {
            edge.set_label(String::new());
        }
    }
    graph
}

// ------------------------------------------------------------------
// Custom edge shape for visualization
// ------------------------------------------------------------------

/// Edge shape driven by the relation's visual hint: arrowed relations use
/// the default directed rendering tinted with the hint color, plain
/// variable links render as simple center-to-center line segments.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RelationEdgeShape {
    default_impl: DefaultEdgeShape,
    color: Color32,
    width: f32,
    arrow: bool,
}

impl From<EdgeProps<Relation>> for RelationEdgeShape {
    fn from(props: EdgeProps<Relation>) -> Self {
        let hint = props.payload.hint;
        let mut default_impl = DefaultEdgeShape::from(props);
        default_impl.width = hint.width;
        Self {
            default_impl,
            color: hint.color,
            width: hint.width,
            arrow: hint.arrow,
        }
    }
}

impl<N: Clone, Ty: EdgeType, Ix: IndexType, D: DisplayNode<N, Relation, Ty, Ix>>
    DisplayEdge<N, Relation, Ty, Ix, D> for RelationEdgeShape
{
    fn is_inside(
        &self,
        start: &Node<N, Relation, Ty, Ix, D>,
        end: &Node<N, Relation, Ty, Ix, D>,
        pos: egui::Pos2,
    ) -> bool {
        self.default_impl.is_inside(start, end, pos)
    }

    fn shapes(
        &mut self,
        start: &Node<N, Relation, Ty, Ix, D>,
        end: &Node<N, Relation, Ty, Ix, D>,
        ctx: &DrawContext,
    ) -> Vec<egui::Shape> {
        if !self.arrow {
            let points = [
                ctx.meta.canvas_to_screen_pos(start.location()),
                ctx.meta.canvas_to_screen_pos(end.location()),
            ];
            let stroke = Stroke::new(
                ctx.meta.canvas_to_screen_size(self.width),
                self.color,
            );
            return vec![Shape::LineSegment { points, stroke }];
        }

        self.default_impl
            .shapes(start, end, ctx)
            .into_iter()
            .map(|shape| tint_shape(shape, self.color))
            .collect()
    }

    fn update(&mut self, state: &EdgeProps<Relation>) {
        self.color = state.payload.hint.color;
        self.width = state.payload.hint.width;
        self.arrow = state.payload.hint.arrow;
        self.default_impl.width = self.width;
        DisplayEdge::<N, Relation, Ty, Ix, D>::update(&mut self.default_impl, state);
    }

    fn extra_bounds(
        &self,
        start: &Node<N, Relation, Ty, Ix, D>,
        end: &Node<N, Relation, Ty, Ix, D>,
    ) -> Option<(egui::Pos2, egui::Pos2)> {
        self.default_impl.extra_bounds(start, end)
    }
}

/// Repaint a default edge shape with the hint color, keeping geometry.
fn tint_shape(shape: Shape, color: Color32) -> Shape {
    match shape {
        Shape::LineSegment { points, mut stroke } => {
            stroke.color = color;
            Shape::LineSegment { points, stroke }
        }
        Shape::Path(mut path) => {
            if path.fill != Color32::TRANSPARENT {
                path.fill = color;
            }
            path.stroke = PathStroke {
                color: ColorMode::Solid(color),
                ..path.stroke
            };
            Shape::Path(path)
        }
        Shape::Circle(mut circle) => {
            circle.fill = color;
            Shape::Circle(circle)
        }
        Shape::CubicBezier(mut bezier) => {
            bezier.stroke = PathStroke {
                color: ColorMode::Solid(color),
                ..bezier.stroke
            };
            Shape::CubicBezier(bezier)
        }
        Shape::QuadraticBezier(mut bezier) => {
            bezier.stroke = PathStroke {
                color: ColorMode::Solid(color),
                ..bezier.stroke
            };
            Shape::QuadraticBezier(bezier)
        }
        Shape::Text(mut text) => {
            text.override_text_color = Some(color);
            Shape::Text(text)
        }
        Shape::Vec(shapes) => Shape::Vec(
            shapes
                .into_iter()
                .map(|s| tint_shape(s, color))
                .collect(),
        ),
        other => other,
    }
}

