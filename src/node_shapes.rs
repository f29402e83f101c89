use eframe::egui::{
    self, Color32, FontFamily, FontId, Pos2, Shape, Stroke, Vec2,
    epaint::{CircleShape, TextShape},
};
use egui_graphs::{DisplayNode, DrawContext, NodeProps};
use petgraph::{EdgeType, stable_graph::IndexType};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::graph_state::{EntityKind, EntityNode};

const NODE_RADIUS: f32 = 10.0;
const LABEL_GAP: f32 = 8.0;
const LABEL_FONT: f32 = 14.0;

// Shapes are constructed by the graph widget, so the label toggle reaches
// them through a static rather than through the store.
static LABEL_VISIBILITY: AtomicBool = AtomicBool::new(true);

pub fn set_label_visibility(always: bool) {
    LABEL_VISIBILITY.store(always, Ordering::Relaxed);
}

fn labels_always() -> bool {
    LABEL_VISIBILITY.load(Ordering::Relaxed)
}

/// Fill color per entity kind.
pub fn kind_color(kind: EntityKind) -> Color32 {
    match kind {
        EntityKind::Constant => Color32::from_rgb(46, 139, 87),
        EntityKind::Variable => Color32::from_rgb(65, 105, 225),
        EntityKind::Equation => Color32::from_rgb(205, 60, 60),
        EntityKind::Derivation => Color32::from_rgb(230, 200, 60),
    }
}

/// Circle node colored by entity kind; the label (the typeset formula) is
/// pushed away from the graph center so it does not overlap edges.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityNodeShape {
    pos: Pos2,
    selected: bool,
    dragged: bool,
    hovered: bool,
    fill: Color32,
    label_text: String,
    radius: f32,
    label_font: f32,
    label_gap: f32,
}

impl From<NodeProps<EntityNode>> for EntityNodeShape {
    fn from(props: NodeProps<EntityNode>) -> Self {
        Self {
            pos: props.location(),
            selected: props.selected,
            dragged: props.dragged,
            hovered: props.hovered,
            fill: kind_color(props.payload.kind),
            label_text: props.label,
            radius: NODE_RADIUS,
            label_font: LABEL_FONT,
            label_gap: LABEL_GAP,
        }
    }
}

impl<E: Clone, Ty: EdgeType, Ix: IndexType> DisplayNode<EntityNode, E, Ty, Ix>
    for EntityNodeShape
{
    fn closest_boundary_point(&self, dir: Vec2) -> Pos2 {
        self.pos + dir.normalized() * self.radius
    }

    fn shapes(&mut self, ctx: &DrawContext) -> Vec<Shape> {
        let mut res = Vec::with_capacity(2);
        let center_screen = ctx.meta.canvas_to_screen_pos(self.pos);
        let radius_screen = ctx.meta.canvas_to_screen_size(self.radius);

        res.push(
            CircleShape {
                center: center_screen,
                radius: radius_screen,
                fill: self.fill,
                stroke: self.effective_stroke(),
            }
            .into(),
        );

        if !self.should_show_label() {
            return res;
        }

        let galley = self.label_galley(ctx);
        let label_pos = self.label_pos(ctx, &galley);
        res.push(TextShape::new(label_pos, galley, self.fill).into());
        res
    }

    fn update(&mut self, state: &NodeProps<EntityNode>) {
        self.pos = state.location();
        self.selected = state.selected;
        self.dragged = state.dragged;
        self.hovered = state.hovered;
        self.fill = kind_color(state.payload.kind);
        self.label_text = state.label.clone();
    }

    fn is_inside(&self, pos: Pos2) -> bool {
        (pos - self.pos).length() <= self.radius
    }
}

impl EntityNodeShape {
    fn should_show_label(&self) -> bool {
        labels_always() || self.selected || self.dragged || self.hovered
    }

    fn effective_stroke(&self) -> Stroke {
        if self.selected {
            Stroke::new(3.0, Color32::from_rgb(30, 30, 30))
        } else {
            Stroke::new(1.5, Color32::WHITE)
        }
    }

    fn label_galley(&self, ctx: &DrawContext) -> std::sync::Arc<egui::Galley> {
        let color = if self.selected || self.hovered {
            ctx.ctx.style().visuals.strong_text_color()
        } else {
            ctx.ctx.style().visuals.text_color()
        };
        ctx.ctx.fonts_mut(|f| {
            f.layout_no_wrap(
                self.label_text.clone(),
                FontId::new(self.label_font, FontFamily::Proportional),
                color,
            )
        })
    }

    fn label_pos(
        &self,
        ctx: &DrawContext,
        galley: &std::sync::Arc<egui::Galley>,
    ) -> Pos2 {
        let graph_center = ctx.meta.graph_bounds().center();
        let mut direction = self.pos - graph_center;
        if direction.length_sq() < f32::EPSILON {
            direction = Vec2::new(0.0, -1.0);
        } else {
            direction = direction.normalized();
        }

        let radius_screen = ctx.meta.canvas_to_screen_size(self.radius);
        let gap_screen = ctx.meta.canvas_to_screen_size(self.label_gap);
        let support = 0.5
            * (direction.x.abs() * galley.size().x
                + direction.y.abs() * galley.size().y);

        let node_screen = ctx.meta.canvas_to_screen_pos(self.pos);
        let center_screen =
            node_screen + direction * (radius_screen + gap_screen + support);

        Pos2::new(
            center_screen.x - galley.size().x / 2.0,
            center_screen.y - galley.size().y / 2.0,
        )
    }
}
