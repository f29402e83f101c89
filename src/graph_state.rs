// Graph state module - the incremental graph model behind the explorer.
//
// Catalog nodes (constants, variables, equations) are created once by
// `build_graph` and never destroyed. Derivation nodes exist exactly while
// their parent equation is expanded; this module is the only writer of
// that subset of the node/edge sets.

use crate::catalog::Catalog;
use crate::graph_view::{ExplorerGraph, ExplorerGraphDisplay, setup_graph_display};
use crate::layout_force::ring_positions;
use eframe::egui::{Color32, Pos2};
use petgraph::Direction;
use petgraph::stable_graph::NodeIndex;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Radius of the circle on which freshly materialized derivation nodes are
/// placed around their parent equation. A placement hint for the layout,
/// not a constraint.
const DERIVATION_RING_RADIUS: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Constant,
    Variable,
    Equation,
    Derivation,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Constant => "constant",
            EntityKind::Variable => "variable",
            EntityKind::Equation => "equation",
            EntityKind::Derivation => "derivation",
        };
        f.write_str(name)
    }
}

/// Node payload: one constant, variable, equation or derivation.
#[derive(Debug, Clone)]
pub struct EntityNode {
    pub id: String,
    pub kind: EntityKind,
    /// Raw formula markup, e.g. `\(E=mc^2\)`.
    pub formula: String,
    pub description: String,
    /// Meaningful for equations only.
    pub expanded: bool,
    /// Id of the owning equation; set for derivation nodes only.
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    UsesVariable,
    ReducesTo,
    DerivativeRelationship,
    DerivationLink,
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RelationKind::UsesVariable => "uses variable",
            RelationKind::ReducesTo => "reduces to",
            RelationKind::DerivativeRelationship => "derivative relationship",
            RelationKind::DerivationLink => "derivation link",
        };
        f.write_str(name)
    }
}

/// Visual encoding consumed by the edge shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EdgeHint {
    pub color: Color32,
    pub width: f32,
    pub arrow: bool,
}

/// Edge payload: a directed semantic link between two entities.
#[derive(Debug, Clone)]
pub struct Relation {
    pub kind: RelationKind,
    pub description: Option<String>,
    pub hint: EdgeHint,
}

impl Relation {
    pub fn of_kind(kind: RelationKind) -> Self {
        let hint = match kind {
            // Plain gray link lines.
            RelationKind::UsesVariable => EdgeHint {
                color: Color32::from_rgb(153, 153, 153),
                width: 1.5,
                arrow: false,
            },
            RelationKind::ReducesTo => EdgeHint {
                color: Color32::from_rgb(255, 165, 0),
                width: 3.0,
                arrow: true,
            },
            RelationKind::DerivativeRelationship => EdgeHint {
                color: Color32::from_rgb(60, 160, 60),
                width: 2.0,
                arrow: true,
            },
            RelationKind::DerivationLink => EdgeHint {
                color: Color32::from_rgb(200, 180, 90),
                width: 2.0,
                arrow: true,
            },
        };
        Self {
            kind,
            description: None,
            hint,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_hint(mut self, color: Color32, width: f32) -> Self {
        self.hint.color = color;
        self.hint.width = width;
        self
    }
}

/// One neighbor of a node, described for display.
#[derive(Debug, Clone)]
pub struct Connection {
    pub formula: String,
    pub kind: RelationKind,
    pub description: Option<String>,
}

/// Owned copy of a catalog derivation template, kept so expansion does not
/// need the catalog after build time.
#[derive(Debug, Clone)]
pub struct DerivationTemplate {
    pub id: String,
    pub formula: String,
    pub description: String,
    pub solves_for: String,
}

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("duplicate node id {id}")]
    DuplicateId { id: String },
    #[error("relationship endpoint {id} is not a catalog node")]
    UnknownEndpoint { id: String },
}

/// The whole mutable graph: display graph, id index, derivation templates
/// and the single selection. All mutation goes through the methods below;
/// node indices never leak into the public id-based API.
pub struct GraphState {
    display: ExplorerGraphDisplay,
    ids: HashMap<String, NodeIndex>,
    templates: HashMap<String, Vec<DerivationTemplate>>,
    selected: Option<String>,
}

/// Flattens a validated catalog into the initial, non-expanded graph:
/// entity nodes, one `UsesVariable` edge per declared variable reference
/// and the declared cross-equation relationships. No derivation nodes.
pub fn build_graph(catalog: &Catalog) -> Result<GraphState, BuildError> {
    let mut g = ExplorerGraph::new();
    let mut ids: HashMap<String, NodeIndex> = HashMap::new();
    let mut templates: HashMap<String, Vec<DerivationTemplate>> = HashMap::new();

    let add_node = |g: &mut ExplorerGraph,
                        ids: &mut HashMap<String, NodeIndex>,
                        node: EntityNode|
     -> Result<NodeIndex, BuildError> {
        if ids.contains_key(&node.id) {
            return Err(BuildError::DuplicateId { id: node.id });
        }
        let id = node.id.clone();
        let idx = g.add_node(node);
        ids.insert(id, idx);
        Ok(idx)
    };

    for c in &catalog.constants {
        add_node(
            &mut g,
            &mut ids,
            EntityNode {
                id: c.id.to_string(),
                kind: EntityKind::Constant,
                formula: c.formula.to_string(),
                description: c.description.to_string(),
                expanded: false,
                parent: None,
            },
        )?;
    }
    for v in &catalog.variables {
        add_node(
            &mut g,
            &mut ids,
            EntityNode {
                id: v.id.to_string(),
                kind: EntityKind::Variable,
                formula: v.formula.to_string(),
                description: v.description.to_string(),
                expanded: false,
                parent: None,
            },
        )?;
    }
    for eq in &catalog.equations {
        let eq_idx = add_node(
            &mut g,
            &mut ids,
            EntityNode {
                id: eq.id.to_string(),
                kind: EntityKind::Equation,
                formula: eq.formula.to_string(),
                description: eq.description.to_string(),
                expanded: false,
                parent: None,
            },
        )?;
        for var_id in eq.variables {
            // Catalog validation guarantees the target exists.
            if let Some(&var_idx) = ids.get(*var_id) {
                g.add_edge(
                    eq_idx,
                    var_idx,
                    Relation::of_kind(RelationKind::UsesVariable),
                );
            }
        }
        if !eq.derivations.is_empty() {
            templates.insert(
                eq.id.to_string(),
                eq.derivations
                    .iter()
                    .map(|d| DerivationTemplate {
                        id: d.id.to_string(),
                        formula: d.formula.to_string(),
                        description: d.description.to_string(),
                        solves_for: d.solves_for.to_string(),
                    })
                    .collect(),
            );
        }
    }

    // Template ids enter the node id namespace at expand time, so they
    // must not collide with entity ids or with each other.
    let mut template_ids: std::collections::HashSet<&str> = std::collections::HashSet::new();
    for list in templates.values() {
        for template in list {
            if ids.contains_key(template.id.as_str())
                || !template_ids.insert(template.id.as_str())
            {
                return Err(BuildError::DuplicateId {
                    id: template.id.clone(),
                });
            }
        }
    }

    for rel in &catalog.relationships {
        let source = *ids.get(rel.source).ok_or_else(|| BuildError::UnknownEndpoint {
            id: rel.source.to_string(),
        })?;
        let target = *ids.get(rel.target).ok_or_else(|| BuildError::UnknownEndpoint {
            id: rel.target.to_string(),
        })?;
        g.add_edge(
            source,
            target,
            Relation::of_kind(rel.kind)
                .with_description(rel.description)
                .with_hint(rel.color, rel.width),
        );
    }

    Ok(GraphState {
        display: setup_graph_display(&g),
        ids,
        templates,
        selected: None,
    })
}

impl GraphState {
    pub fn display(&self) -> &ExplorerGraphDisplay {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut ExplorerGraphDisplay {
        &mut self.display
    }

    pub fn node_count(&self) -> usize {
        self.display.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.display.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.ids.get(id).copied()
    }

    pub fn id_of(&self, idx: NodeIndex) -> Option<String> {
        self.display.node(idx).map(|n| n.payload().id.clone())
    }

    pub fn entity(&self, id: &str) -> Option<&EntityNode> {
        let idx = self.index_of(id)?;
        self.display.node(idx).map(|n| n.payload())
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn templates_for(&self, id: &str) -> &[DerivationTemplate] {
        self.templates.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Materialize the derivation nodes of an equation, linking each to the
    /// equation and placing it on a ring around the parent's current
    /// position. No-op unless `id` names a collapsed equation. Idempotent.
    pub fn expand(&mut self, id: &str) -> bool {
        let Some(&eq_idx) = self.ids.get(id) else {
            return false;
        };
        match self.display.node(eq_idx) {
            Some(node)
                if node.payload().kind == EntityKind::Equation
                    && !node.payload().expanded => {}
            _ => return false,
        }

        let center = self
            .display
            .node(eq_idx)
            .map(|n| n.location())
            .unwrap_or(Pos2::ZERO);
        let templates = self.templates.get(id).cloned().unwrap_or_default();
        let positions = ring_positions(center, DERIVATION_RING_RADIUS, templates.len());

        for (template, pos) in templates.iter().zip(positions) {
            let child_idx = self.display.add_node(EntityNode {
                id: template.id.clone(),
                kind: EntityKind::Derivation,
                formula: template.formula.clone(),
                description: template.description.clone(),
                expanded: false,
                parent: Some(id.to_string()),
            });
            if let Some(node) = self.display.node_mut(child_idx) {
                node.set_label(template.formula.clone());
                node.set_location(pos);
            }
            self.ids.insert(template.id.clone(), child_idx);
            self.display.add_edge_with_label(
                eq_idx,
                child_idx,
                Relation::of_kind(RelationKind::DerivationLink),
                String::new(),
            );
        }

        if let Some(node) = self.display.node_mut(eq_idx) {
            node.payload_mut().expanded = true;
        }
        true
    }

    /// Remove every node parented to `id` together with its incident
    /// edges. No-op unless `id` names an expanded equation.
    pub fn collapse(&mut self, id: &str) -> bool {
        let Some(&eq_idx) = self.ids.get(id) else {
            return false;
        };
        match self.display.node(eq_idx) {
            Some(node) if node.payload().expanded => {}
            _ => return false,
        }

        let children: Vec<(NodeIndex, String)> = self
            .display
            .nodes_iter()
            .filter(|(_, node)| node.payload().parent.as_deref() == Some(id))
            .map(|(idx, node)| (idx, node.payload().id.clone()))
            .collect();

        for (idx, child_id) in children {
            // StableGraph drops incident edges with the node.
            self.display.remove_node(idx);
            self.ids.remove(&child_id);
            if self.selected.as_deref() == Some(child_id.as_str()) {
                self.selected = None;
            }
        }

        if let Some(node) = self.display.node_mut(eq_idx) {
            node.payload_mut().expanded = false;
        }
        true
    }

    /// Single-selection state machine: selecting a node deselects (and, for
    /// equations, collapses) the previous one; selecting an equation expands
    /// it; selecting anything else only changes the selection. Returns
    /// whether anything changed.
    pub fn select(&mut self, id: &str) -> bool {
        if self.selected.as_deref() == Some(id) {
            return false;
        }
        if !self.ids.contains_key(id) {
            return false;
        }

        self.clear_selection();

        // Selecting a derivation of the previously selected equation: the
        // collapse above removed the target, so the selection stays empty.
        let Some(&idx) = self.ids.get(id) else {
            return true;
        };

        self.selected = Some(id.to_string());
        self.set_display_selected(idx, true);
        self.expand(id);
        true
    }

    /// Drop the selection, collapsing the deselected equation if needed.
    pub fn clear_selection(&mut self) -> bool {
        let Some(prev) = self.selected.take() else {
            return false;
        };
        if let Some(&prev_idx) = self.ids.get(&prev) {
            self.set_display_selected(prev_idx, false);
        }
        self.collapse(&prev);
        true
    }

    fn set_display_selected(&mut self, idx: NodeIndex, selected: bool) {
        if let Some(node) = self.display.node_mut(idx) {
            node.set_selected(selected);
        }
    }

    /// Incoming and outgoing relations of a node, for the details panel.
    pub fn connections(&self, id: &str) -> (Vec<Connection>, Vec<Connection>) {
        let Some(&idx) = self.ids.get(id) else {
            return (Vec::new(), Vec::new());
        };

        let describe = |other: NodeIndex, relation: &Relation| {
            self.display.node(other).map(|n| Connection {
                formula: n.payload().formula.clone(),
                kind: relation.kind,
                description: relation.description.clone(),
            })
        };

        let incoming = self
            .display
            .edges_directed(idx, Direction::Incoming)
            .filter_map(|edge| describe(edge.source(), edge.weight().payload()))
            .collect();
        let outgoing = self
            .display
            .edges_directed(idx, Direction::Outgoing)
            .filter_map(|edge| describe(edge.target(), edge.weight().payload()))
            .collect();

        (incoming, outgoing)
    }

    /// Sorted node ids, for comparing whole-graph snapshots.
    pub fn node_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Sorted (source id, target id, kind) triples.
    pub fn edge_triples(&self) -> Vec<(String, String, RelationKind)> {
        let mut triples: Vec<(String, String, RelationKind)> = self
            .display
            .g()
            .edge_references()
            .filter_map(|edge| {
                Some((
                    self.id_of(edge.source())?,
                    self.id_of(edge.target())?,
                    edge.weight().payload().kind,
                ))
            })
            .collect();
        triples.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        triples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DerivationDef, EquationDef, load_catalog};

    fn demo_state() -> GraphState {
        let catalog = load_catalog().expect("builtin catalog must validate");
        build_graph(&catalog).expect("builtin catalog must build")
    }

    fn snapshot(state: &GraphState) -> (Vec<String>, Vec<(String, String, RelationKind)>) {
        (state.node_ids(), state.edge_triples())
    }

    #[test]
    fn variable_edges_match_catalog_exactly() {
        let catalog = load_catalog().unwrap();
        let state = build_graph(&catalog).unwrap();
        let edges = state.edge_triples();

        for eq in &catalog.equations {
            let built: Vec<&str> = edges
                .iter()
                .filter(|(s, _, k)| s == eq.id && *k == RelationKind::UsesVariable)
                .map(|(_, t, _)| t.as_str())
                .collect();
            let mut expected: Vec<&str> = eq.variables.to_vec();
            let mut built_sorted = built.clone();
            built_sorted.sort();
            expected.sort();
            assert_eq!(built_sorted, expected, "variable edges of {}", eq.id);
        }
    }

    #[test]
    fn initial_graph_has_no_derivations() {
        let state = demo_state();
        for id in state.node_ids() {
            let entity = state.entity(&id).unwrap();
            assert_ne!(entity.kind, EntityKind::Derivation);
            assert!(!entity.expanded);
        }
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut catalog = load_catalog().unwrap();
        let dup = catalog.variables[0].clone();
        catalog.variables.push(dup);

        match build_graph(&catalog) {
            Err(BuildError::DuplicateId { id }) => assert_eq!(id, "variable_m"),
            other => panic!("expected DuplicateId, got {:?}", other.err()),
        }
    }

    #[test]
    fn template_id_shadowing_an_entity_is_rejected_at_build() {
        let mut catalog = load_catalog().unwrap();
        catalog.equations.push(EquationDef {
            id: "equation_Shadow",
            formula: r"\(x=y\)",
            description: "Derivation id shadows an existing variable",
            variables: &["variable_m"],
            derivations: &[DerivationDef {
                id: "variable_m",
                formula: r"\(y=x\)",
                description: "Shadows the mass variable",
                solves_for: "variable_m",
            }],
        });

        match build_graph(&catalog) {
            Err(BuildError::DuplicateId { id }) => assert_eq!(id, "variable_m"),
            other => panic!("expected DuplicateId, got {:?}", other.err()),
        }
    }

    #[test]
    fn expansion_materializes_every_template() {
        let catalog = load_catalog().unwrap();
        for eq in catalog.equations.iter().filter(|e| !e.derivations.is_empty()) {
            let mut state = build_graph(&catalog).unwrap();
            assert!(state.expand(eq.id));
            assert!(state.entity(eq.id).unwrap().expanded);
            for template in eq.derivations {
                assert!(state.contains(template.id), "missing {}", template.id);
            }
        }
    }

    #[test]
    fn expand_then_collapse_is_identity() {
        let mut state = demo_state();
        let before = snapshot(&state);

        assert!(state.expand("equation_MassEnergyEquivalence"));
        assert!(state.collapse("equation_MassEnergyEquivalence"));

        assert_eq!(snapshot(&state), before);
    }

    #[test]
    fn expand_is_idempotent() {
        let mut state = demo_state();
        assert!(state.expand("equation_MassEnergyEquivalence"));
        let after_first = snapshot(&state);

        assert!(!state.expand("equation_MassEnergyEquivalence"));
        assert_eq!(snapshot(&state), after_first);
    }

    #[test]
    fn collapse_on_collapsed_equation_is_noop() {
        let mut state = demo_state();
        let before = snapshot(&state);
        assert!(!state.collapse("equation_MassEnergyEquivalence"));
        assert_eq!(snapshot(&state), before);
    }

    #[test]
    fn expand_rejects_non_equations_and_unknown_ids() {
        let mut state = demo_state();
        let before = snapshot(&state);
        assert!(!state.expand("variable_m"));
        assert!(!state.expand("no_such_node"));
        assert_eq!(snapshot(&state), before);
    }

    #[test]
    fn selecting_equation_materializes_its_derivations() {
        let mut state = demo_state();
        let (nodes_before, edges_before) = snapshot(&state);

        assert!(state.select("equation_MassEnergyEquivalence"));

        let (nodes_after, edges_after) = snapshot(&state);
        let new_nodes: Vec<&String> = nodes_after
            .iter()
            .filter(|id| !nodes_before.contains(id))
            .collect();
        let new_edges: Vec<_> = edges_after
            .iter()
            .filter(|e| !edges_before.contains(e))
            .collect();

        assert_eq!(new_nodes.len(), 2);
        for id in &new_nodes {
            let entity = state.entity(id).unwrap();
            assert_eq!(entity.kind, EntityKind::Derivation);
            assert_eq!(
                entity.parent.as_deref(),
                Some("equation_MassEnergyEquivalence")
            );
        }
        assert_eq!(new_edges.len(), 2);
        for (source, _, kind) in &new_edges {
            assert_eq!(source, "equation_MassEnergyEquivalence");
            assert_eq!(*kind, RelationKind::DerivationLink);
        }
    }

    #[test]
    fn selecting_another_equation_collapses_the_first() {
        let mut state = demo_state();
        assert!(state.select("equation_MassEnergyEquivalence"));
        assert!(state.select("equation_NewtonSecondLaw"));

        assert!(!state.contains("derivation_c_from_MassEnergyEquivalence"));
        assert!(!state.contains("derivation_m_from_MassEnergyEquivalence"));
        assert!(state.contains("derivation_m_from_NewtonSecondLaw"));
        assert!(state.contains("derivation_a_from_NewtonSecondLaw"));
        assert_eq!(state.selected(), Some("equation_NewtonSecondLaw"));

        let derivations: Vec<String> = state
            .node_ids()
            .into_iter()
            .filter(|id| state.entity(id).unwrap().kind == EntityKind::Derivation)
            .collect();
        assert_eq!(derivations.len(), 2);
    }

    #[test]
    fn selecting_a_variable_changes_nothing_but_selection() {
        let mut state = demo_state();
        let before = snapshot(&state);

        assert!(state.select("variable_m"));

        assert_eq!(snapshot(&state), before);
        assert_eq!(state.selected(), Some("variable_m"));
    }

    #[test]
    fn reselecting_the_same_node_is_noop() {
        let mut state = demo_state();
        assert!(state.select("equation_MassEnergyEquivalence"));
        let after = snapshot(&state);
        assert!(!state.select("equation_MassEnergyEquivalence"));
        assert_eq!(snapshot(&state), after);
    }

    #[test]
    fn clearing_selection_collapses_the_equation() {
        let mut state = demo_state();
        let before = snapshot(&state);

        assert!(state.select("equation_LinearMomentum"));
        assert!(state.clear_selection());

        assert_eq!(snapshot(&state), before);
        assert_eq!(state.selected(), None);
        assert!(!state.clear_selection());
    }

    #[test]
    fn selecting_a_derivation_of_the_selected_equation_is_safe() {
        let mut state = demo_state();
        assert!(state.select("equation_MassEnergyEquivalence"));
        // The collapse triggered by switching selection removes the target.
        assert!(state.select("derivation_c_from_MassEnergyEquivalence"));
        assert_eq!(state.selected(), None);
        assert!(!state.contains("derivation_c_from_MassEnergyEquivalence"));
    }

    #[test]
    fn connections_carry_relationship_descriptions() {
        let state = demo_state();
        let (incoming, outgoing) = state.connections("equation_MassEnergyEquivalence");

        let reduces: Vec<&Connection> = incoming
            .iter()
            .filter(|c| c.kind == RelationKind::ReducesTo)
            .collect();
        assert_eq!(reduces.len(), 1);
        assert!(
            reduces[0]
                .description
                .as_deref()
                .is_some_and(|d| d.contains("momentum"))
        );

        // Variable links carry no prose.
        assert!(
            outgoing
                .iter()
                .filter(|c| c.kind == RelationKind::UsesVariable)
                .all(|c| c.description.is_none())
        );
    }

    #[test]
    fn derivation_nodes_are_placed_around_the_parent() {
        let mut state = demo_state();
        let eq_idx = state.index_of("equation_MassEnergyEquivalence").unwrap();
        if let Some(node) = state.display_mut().node_mut(eq_idx) {
            node.set_location(Pos2::new(100.0, 50.0));
        }

        assert!(state.expand("equation_MassEnergyEquivalence"));

        for template in ["derivation_c_from_MassEnergyEquivalence",
            "derivation_m_from_MassEnergyEquivalence"]
        {
            let idx = state.index_of(template).unwrap();
            let pos = state.display().node(idx).unwrap().location();
            let dx = pos.x - 100.0;
            let dy = pos.y - 50.0;
            let dist = (dx * dx + dy * dy).sqrt();
            assert!((dist - DERIVATION_RING_RADIUS).abs() < 1e-3);
        }
    }
}
