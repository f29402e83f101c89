// Force-directed layout: spring forces along edges toward a fixed link
// distance, charge repulsion between all node pairs and a weak centering
// force. Runs one integration step per frame until the simulation cools;
// mutations reheat it.

use eframe::egui::{self, Pos2, Vec2};
use egui_graphs::{DisplayEdge, DisplayNode, Graph, Layout, LayoutState};
use petgraph::EdgeType;
use petgraph::graph::IndexType;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

const LINK_DISTANCE: f32 = 75.0;
const CHARGE: f32 = 500.0;
const CENTER_STRENGTH: f32 = 0.05;
const SPRING_STRENGTH: f32 = 0.1;
const DAMPING: f32 = 0.85;
const ALPHA_DECAY: f32 = 0.02;
const ALPHA_MIN: f32 = 0.005;
const TIME_STEP: f32 = 1.0 / 60.0;

// Initial ring placement before the simulation takes over.
const BASE_RING_RADIUS: f32 = 120.0;
const RING_RADIUS_PER_NODE: f32 = 4.0;

static REHEAT: AtomicBool = AtomicBool::new(false);

/// Restore simulation energy so the graph re-settles after a mutation.
pub fn request_reheat() {
    REHEAT.store(true, Ordering::Relaxed);
}

/// Evenly spaced positions on a circle, starting at the top and going
/// clockwise. Used both for the initial placement and for the derivation
/// ring around an expanded equation.
pub fn ring_positions(center: Pos2, radius: f32, count: usize) -> Vec<Pos2> {
    (0..count)
        .map(|i| {
            let angle = -std::f32::consts::FRAC_PI_2
                + (i as f32) * std::f32::consts::TAU / (count as f32);
            Pos2::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutStateForce {
    pub link_distance: f32,
    pub charge: f32,
    pub center_strength: f32,
    pub damping: f32,
    /// Simulation energy; decays toward zero, reheated on mutation.
    pub alpha: f32,
    pub alpha_decay: f32,
    initialized: bool,
    velocities: HashMap<usize, (f32, f32)>,
}

impl Default for LayoutStateForce {
    fn default() -> Self {
        Self {
            link_distance: LINK_DISTANCE,
            charge: CHARGE,
            center_strength: CENTER_STRENGTH,
            damping: DAMPING,
            alpha: 1.0,
            alpha_decay: ALPHA_DECAY,
            initialized: false,
            velocities: HashMap::new(),
        }
    }
}

impl LayoutState for LayoutStateForce {}

#[derive(Debug, Clone, Default)]
pub struct LayoutForce {
    state: LayoutStateForce,
}

impl Layout<LayoutStateForce> for LayoutForce {
    fn from_state(state: LayoutStateForce) -> impl Layout<LayoutStateForce> {
        Self { state }
    }

    fn next<N, E, Ty, Ix, Dn, De>(
        &mut self,
        g: &mut Graph<N, E, Ty, Ix, Dn, De>,
        ui: &egui::Ui,
    ) where
        N: Clone,
        E: Clone,
        Ty: EdgeType,
        Ix: IndexType,
        Dn: DisplayNode<N, E, Ty, Ix>,
        De: DisplayEdge<N, E, Ty, Ix, Dn>,
    {
        if REHEAT.swap(false, Ordering::Relaxed) {
            self.state.alpha = 1.0;
        }

        let indices: Vec<petgraph::stable_graph::NodeIndex<Ix>> =
            g.g().node_indices().collect();
        let n = indices.len();
        if n == 0 {
            return;
        }

        let rect = ui.available_rect_before_wrap();
        let center = rect.center();

        if !self.state.initialized {
            let radius = BASE_RING_RADIUS + (n as f32) * RING_RADIUS_PER_NODE;
            for (idx, pos) in indices.iter().zip(ring_positions(center, radius, n)) {
                if let Some(node) = g.node_mut(*idx) {
                    node.set_location(pos);
                }
            }
            self.state.initialized = true;
        }

        if self.state.alpha < ALPHA_MIN {
            return;
        }

        let mut positions: HashMap<usize, Pos2> = HashMap::with_capacity(n);
        let mut pinned: Vec<usize> = Vec::new();
        for &idx in &indices {
            if let Some(node) = g.node(idx) {
                positions.insert(idx.index(), node.location());
                // A dragged node is pinned for the whole gesture.
                if node.dragged() {
                    pinned.push(idx.index());
                }
            }
        }

        let mut rng = rand::rng();
        let mut forces: HashMap<usize, Vec2> = HashMap::with_capacity(n);

        // Pairwise charge repulsion.
        for i in 0..n {
            for j in (i + 1)..n {
                let a = indices[i].index();
                let b = indices[j].index();
                let (Some(&pa), Some(&pb)) = (positions.get(&a), positions.get(&b))
                else {
                    continue;
                };
                let mut delta = pa - pb;
                if delta.length_sq() < 1e-6 {
                    // Coincident nodes: separate along a random direction.
                    let angle: f32 = rng.random_range(0.0..std::f32::consts::TAU);
                    delta = Vec2::angled(angle);
                }
                let dist_sq = delta.length_sq().max(25.0);
                let push = delta.normalized() * (self.state.charge / dist_sq);
                *forces.entry(a).or_default() += push;
                *forces.entry(b).or_default() -= push;
            }
        }

        // Spring force along every edge toward the link distance.
        for edge in g.g().edge_references() {
            let a = edge.source().index();
            let b = edge.target().index();
            if a == b {
                continue;
            }
            let (Some(&pa), Some(&pb)) = (positions.get(&a), positions.get(&b)) else {
                continue;
            };
            let delta = pa - pb;
            let dist = delta.length().max(1e-3);
            let stretch = dist - self.state.link_distance;
            let pull = (delta / dist) * (stretch * SPRING_STRENGTH);
            *forces.entry(a).or_default() -= pull;
            *forces.entry(b).or_default() += pull;
        }

        // Weak pull toward the canvas center.
        for (&key, &pos) in &positions {
            *forces.entry(key).or_default() += (center - pos) * self.state.center_strength;
        }

        // Integrate with damped velocities; skip pinned nodes.
        let alpha = self.state.alpha;
        for &idx in &indices {
            let key = idx.index();
            if pinned.contains(&key) {
                self.state.velocities.insert(key, (0.0, 0.0));
                continue;
            }
            let force = forces.get(&key).copied().unwrap_or_default();
            let (vx, vy) = self.state.velocities.get(&key).copied().unwrap_or_default();
            let velocity = Vec2::new(vx, vy) + force * alpha * TIME_STEP * 60.0;
            let velocity = velocity * self.state.damping;
            self.state.velocities.insert(key, (velocity.x, velocity.y));

            if let (Some(node), Some(&pos)) = (g.node_mut(idx), positions.get(&key)) {
                node.set_location(pos + velocity * TIME_STEP * 60.0 * 0.1);
            }
        }

        // Drop velocities of removed nodes.
        self.state
            .velocities
            .retain(|key, _| positions.contains_key(key));

        self.state.alpha *= 1.0 - self.state.alpha_decay;
    }

    fn state(&self) -> LayoutStateForce {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_positions_lie_on_the_circle() {
        let center = Pos2::new(10.0, -5.0);
        let positions = ring_positions(center, 50.0, 7);
        assert_eq!(positions.len(), 7);
        for pos in positions {
            let dist = (pos - center).length();
            assert!((dist - 50.0).abs() < 1e-3);
        }
    }

    #[test]
    fn ring_positions_are_evenly_spaced() {
        let center = Pos2::ZERO;
        let positions = ring_positions(center, 100.0, 4);
        let chord = (positions[0] - positions[1]).length();
        for pair in positions.windows(2) {
            assert!(((pair[0] - pair[1]).length() - chord).abs() < 1e-3);
        }
    }

    #[test]
    fn empty_ring_is_empty() {
        assert!(ring_positions(Pos2::ZERO, 50.0, 0).is_empty());
    }

    #[test]
    fn default_state_matches_simulation_constants() {
        let state = LayoutStateForce::default();
        assert_eq!(state.link_distance, 75.0);
        assert!(state.alpha >= 1.0);
        assert!(state.alpha_decay > 0.0 && state.alpha_decay < 1.0);
    }
}
