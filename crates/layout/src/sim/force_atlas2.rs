use std::time::{Duration, Instant};

use crate::cache::PositionCache;
use crate::config::ForceAtlas2Config;
use crate::dispatcher::LayoutMode;
use crate::graph::{GraphIndex, IndexedEdge};
use crate::strategy::LayoutStrategy;
use crate::types::{Dimensions, Edge, Node, Position};

use super::{Bodies, MIN_DISTANCE_SQ, resolve_overlaps};

/// Continuous-force layout with gravity and mass-weighted repulsion.
///
/// Repulsion skips pairs beyond `barnes_hut_cutoff / theta`. The run ends on
/// a wall-clock budget rather than a convergence test.
pub struct ForceAtlas2 {
    bodies: Bodies,
    edges: Vec<IndexedEdge>,
    config: ForceAtlas2Config,
    budget: Duration,
    started_at: Option<Instant>,
    forces: Vec<(f64, f64)>,
    running: bool,
    ticks: u64,
}

impl ForceAtlas2 {
    pub fn new(nodes: &[Node], edges: &[Edge], dims: Dimensions, config: &ForceAtlas2Config) -> Self {
        let index = GraphIndex::new(nodes, edges);
        Self {
            bodies: Bodies::from_nodes(nodes, dims),
            edges: index
                .edges()
                .iter()
                .filter(|e| e.source != e.target)
                .copied()
                .collect(),
            config: config.clone(),
            budget: config.duration_for(nodes.len()),
            started_at: None,
            forces: vec![(0.0, 0.0); nodes.len()],
            running: false,
            ticks: 0,
        }
    }

    pub fn bodies(&self) -> &Bodies {
        &self.bodies
    }

    /// Replaces the wall-clock budget chosen from the graph size.
    pub fn set_budget(&mut self, budget: Duration) {
        self.budget = budget;
    }

    /// Pulls every free body toward the world origin, not the canvas centre.
    fn apply_gravity(&mut self) {
        let k = self.config.gravity * self.config.scaling_ratio;
        for (body, force) in self.bodies.items.iter().zip(self.forces.iter_mut()) {
            if body.is_pinned() {
                continue;
            }
            let (x, y) = (body.position.x, body.position.y);
            let distance = (x * x + y * y).max(MIN_DISTANCE_SQ).sqrt();
            let factor = k * body.mass / distance;
            force.0 -= x * factor;
            force.1 -= y * factor;
        }
    }

    fn apply_repulsion(&mut self) {
        let cutoff = self.config.cutoff();
        let cutoff_sq = cutoff * cutoff;
        let kr = self.config.repulsion * self.config.scaling_ratio;
        let lin_log = self.config.lin_log_mode;
        let grid = self.bodies.grid(cutoff);
        let items = &self.bodies.items;
        let forces = &mut self.forces;
        grid.for_each_near_pair(|i, j| {
            let dx = items[j].position.x - items[i].position.x;
            let dy = items[j].position.y - items[i].position.y;
            let d2 = dx * dx + dy * dy;
            if d2 > cutoff_sq {
                return;
            }
            let d2 = d2.max(MIN_DISTANCE_SQ);
            let d = d2.sqrt();
            let masses = items[i].mass * items[j].mass;
            let magnitude = if lin_log { kr * masses / d } else { kr * masses / d2 };
            let (fx, fy) = (dx / d * magnitude, dy / d * magnitude);
            forces[i].0 -= fx;
            forces[i].1 -= fy;
            forces[j].0 += fx;
            forces[j].1 += fy;
        });
    }

    fn apply_attraction(&mut self) {
        let items = &self.bodies.items;
        for edge in &self.edges {
            let (s, t) = (&items[edge.source], &items[edge.target]);
            let dx = t.position.x - s.position.x;
            let dy = t.position.y - s.position.y;
            let d2 = dx * dx + dy * dy;
            if d2 < MIN_DISTANCE_SQ {
                continue;
            }
            let d = d2.sqrt();
            let weight = edge.weight.powf(self.config.edge_weight_influence);
            let stretch = if self.config.lin_log_mode { d.ln_1p() } else { d };
            let magnitude = self.config.attraction * weight * stretch;
            let (fx, fy) = (dx / d * magnitude, dy / d * magnitude);
            self.forces[edge.source].0 += fx;
            self.forces[edge.source].1 += fy;
            self.forces[edge.target].0 -= fx;
            self.forces[edge.target].1 -= fy;
        }
    }

    fn integrate(&mut self) {
        let friction = self.config.friction;
        let max = self.config.max_displacement;
        for (body, &(fx, fy)) in self.bodies.items.iter_mut().zip(&self.forces) {
            if body.hold_pin() {
                continue;
            }
            body.vx = (body.vx + fx) * friction;
            body.vy = (body.vy + fy) * friction;
            body.displace(body.vx, body.vy, max);
        }
    }

    fn expired(&self) -> bool {
        self.started_at
            .is_some_and(|started| started.elapsed() >= self.budget)
    }
}

impl LayoutStrategy for ForceAtlas2 {
    fn mode(&self) -> LayoutMode {
        LayoutMode::ForceAtlas2
    }

    fn start(&mut self) {
        if self.bodies.is_empty() {
            return;
        }
        self.started_at = Some(Instant::now());
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn tick(&mut self) {
        if !self.running {
            return;
        }
        if self.expired() {
            self.running = false;
            tracing::info!(ticks = self.ticks, budget = ?self.budget, "force atlas 2 time budget spent");
            return;
        }

        self.forces.iter_mut().for_each(|f| *f = (0.0, 0.0));
        self.apply_gravity();
        self.apply_repulsion();
        self.apply_attraction();
        self.integrate();
        if self.config.prevent_overlap {
            resolve_overlaps(
                &mut self.bodies,
                2.0 * self.config.node_size,
                self.config.overlap_iterations,
            );
        }

        self.ticks += 1;
        tracing::trace!(tick = self.ticks, "force atlas 2 tick");
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn ticks(&self) -> u64 {
        self.ticks
    }

    fn pin(&mut self, id: &str, position: Position) -> bool {
        self.bodies.pin(id, position)
    }

    fn unpin(&mut self, id: &str) -> bool {
        self.bodies.unpin(id)
    }

    fn is_pinned(&self, id: &str) -> bool {
        self.bodies.is_pinned(id)
    }

    fn set_position(&mut self, id: &str, position: Position) -> bool {
        self.bodies.set_position(id, position)
    }

    /// Starts a fresh time budget from the current positions.
    fn reheat(&mut self) {
        for body in &mut self.bodies.items {
            body.vx = 0.0;
            body.vy = 0.0;
        }
        self.start();
    }

    fn write_positions(&self, cache: &mut PositionCache) {
        self.bodies.write_to(cache);
    }
}
