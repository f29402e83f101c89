use crate::actions::Action;
use crate::graph_view::ExplorerGraphView;
use crate::layout_force::request_reheat;
use crate::node_shapes::set_label_visibility;
use crate::state::State;
use crate::store::Store;
use eframe::egui;
use egui_graphs::{SettingsInteraction, SettingsNavigation};
use petgraph::stable_graph::NodeIndex;

// Pointer movement below this is still a click, not a drag.
const DRAG_THRESHOLD: f32 = 2.0;

pub struct ExplorerApp {
    state: State,
    drag_from: Option<NodeIndex>,
    drag_started: bool,
}

impl ExplorerApp {
    pub fn new(store: Store) -> Self {
        Self {
            state: State::new(store),
            drag_from: None,
            drag_started: false,
        }
    }

    /// Click and drag handling on top of the graph view. Clicking a node
    /// selects it, clicking empty canvas clears the selection, and a
    /// completed node drag re-typesets immediately.
    fn handle_pointer(
        &mut self,
        pointer: &egui::PointerState,
        hovered: Option<NodeIndex>,
        pending: &mut Vec<Action>,
    ) {
        if pointer.primary_pressed() && hovered.is_some() {
            self.drag_from = hovered;
            self.drag_started = false;
        }

        if pointer.primary_down()
            && self.drag_from.is_some()
            && pointer.delta().length() > DRAG_THRESHOLD
        {
            self.drag_started = true;
        }

        // Keep the simulation warm while a node is being moved.
        if self.drag_started {
            request_reheat();
        }

        if pointer.primary_released() {
            if self.drag_started {
                pending.push(Action::NodeDragReleased);
            } else {
                match hovered {
                    Some(idx) => {
                        if let Some(id) = self.state.store.graph.id_of(idx) {
                            pending.push(Action::SelectNode { id });
                        }
                    }
                    None => pending.push(Action::ClearSelection),
                }
            }
            self.drag_from = None;
            self.drag_started = false;
        }
    }

    fn hover_tooltip(
        &self,
        ui: &egui::Ui,
        pointer: &egui::PointerState,
        hovered: Option<NodeIndex>,
    ) {
        // No tooltip mid-drag; it would chase the pointer.
        if self.drag_started || pointer.primary_down() {
            return;
        }
        let Some(idx) = hovered else {
            return;
        };
        let Some(node) = self.state.store.graph.display().node(idx) else {
            return;
        };
        let Some(pos) = pointer.hover_pos() else {
            return;
        };
        let kind = node.payload().kind;
        let description = node.payload().description.clone();
        let label = node.label();

        egui::Area::new(egui::Id::new("entity_tooltip"))
            .fixed_pos(pos + egui::vec2(12.0, 12.0))
            .order(egui::Order::Tooltip)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.strong(label);
                    ui.label(format!("{kind}"));
                    ui.label(description);
                });
            });
    }

    fn side_panel(&mut self, ctx: &egui::Context, pending: &mut Vec<Action>) {
        egui::SidePanel::left("details_panel")
            .default_width(280.0)
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(8.0))
            .show(ctx, |ui| {
                ui.heading("Equation Explorer");
                ui.separator();

                let mut show_labels = self.state.store.show_labels;
                if ui.checkbox(&mut show_labels, "Show labels").changed() {
                    pending.push(Action::SetShowLabels { show: show_labels });
                }
                ui.separator();

                match self.state.store.graph.selected().map(String::from) {
                    Some(id) => self.selection_details(ui, &id),
                    None => {
                        ui.label("Click a node to inspect it.");
                        ui.label("Clicking an equation reveals its derivations.");
                    }
                }

                ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                    ui.label(format!(
                        "Nodes: {}  Edges: {}",
                        self.state.store.graph.node_count(),
                        self.state.store.graph.edge_count()
                    ));
                    ui.separator();
                });
            });
    }

    fn selection_details(&self, ui: &mut egui::Ui, id: &str) {
        let Some(entity) = self.state.store.graph.entity(id) else {
            return;
        };

        ui.strong(format!("{}", entity.kind));
        ui.label(entity.formula.clone());
        ui.label(entity.description.clone());

        let templates = self.state.store.graph.templates_for(id);
        if !templates.is_empty() {
            ui.separator();
            ui.strong("Derivations");
            for template in templates {
                ui.label(format!(
                    "solves for {}: {}",
                    template.solves_for, template.description
                ));
            }
        }

        let (incoming, outgoing) = self.state.store.graph.connections(id);
        ui.separator();
        ui.strong(format!("Incoming ({})", incoming.len()));
        for connection in incoming {
            ui.label(format!(
                "  ← {} ({})",
                connection.formula, connection.kind
            ));
            if let Some(text) = connection.description {
                ui.small(text);
            }
        }
        ui.strong(format!("Outgoing ({})", outgoing.len()));
        for connection in outgoing {
            ui.label(format!(
                "  → {} ({})",
                connection.formula, connection.kind
            ));
            if let Some(text) = connection.description {
                ui.small(text);
            }
        }
    }

    fn graph_panel(&mut self, ctx: &egui::Context, pending: &mut Vec<Action>) {
        egui::CentralPanel::default()
            .frame(egui::Frame::central_panel(&ctx.style()).inner_margin(8.0))
            .show(ctx, |ui| {
                if self.state.store.layout_reheat_needed {
                    request_reheat();
                    self.state.store.layout_reheat_needed = false;
                }

                let settings_interaction = SettingsInteraction::new()
                    .with_dragging_enabled(true)
                    .with_node_clicking_enabled(true);
                let settings_navigation = SettingsNavigation::new()
                    .with_zoom_and_pan_enabled(true)
                    .with_fit_to_screen_enabled(false);

                ui.add(
                    &mut ExplorerGraphView::new(self.state.store.graph.display_mut())
                        .with_interactions(&settings_interaction)
                        .with_navigations(&settings_navigation),
                );

                let pointer = ui.input(|i| i.pointer.clone());
                let hovered = self.state.store.graph.display().hovered_node();

                self.handle_pointer(&pointer, hovered, pending);
                self.hover_tooltip(ui, &pointer, hovered);
            });
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);

        set_label_visibility(self.state.store.show_labels);

        let mut pending: Vec<Action> = Vec::new();
        self.side_panel(ctx, &mut pending);
        self.graph_panel(ctx, &mut pending);

        for action in pending {
            self.state.dispatch(action);
        }
        self.state.flush_actions();
        self.state.flush_effects(now);

        // The simulation advances one step per frame.
        ctx.request_repaint();
    }
}
