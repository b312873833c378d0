use crate::cache::PositionCache;
use crate::config::{CoolingProfile, ForceConfig};
use crate::dispatcher::LayoutMode;
use crate::graph::GraphIndex;
use crate::strategy::LayoutStrategy;
use crate::types::{Dimensions, Edge, Node, Position};

use super::{Bodies, MIN_DISTANCE_SQ};

/// Energy a reheat restores when the simulation had cooled below it.
const REHEAT_ALPHA: f64 = 0.3;
/// Per-tick velocity cap.
const MAX_VELOCITY: f64 = 100.0;

#[derive(Debug, Clone, Copy)]
struct Link {
    source: usize,
    target: usize,
    distance: f64,
    strength: f64,
    /// Share of the correction applied to the source.
    bias: f64,
}

/// Classic spring/charge simulation with alpha cooling.
///
/// Springs are short and stiff inside a cluster and long and loose between
/// clusters. Graphs above the size threshold switch to the coarser cooling
/// profile: faster decay, higher floor, shorter repulsion range and fewer
/// collision passes.
pub struct ForceSimulation {
    bodies: Bodies,
    links: Vec<Link>,
    config: ForceConfig,
    profile: CoolingProfile,
    center: Position,
    alpha: f64,
    running: bool,
    ticks: u64,
}

impl ForceSimulation {
    pub fn new(nodes: &[Node], edges: &[Edge], dims: Dimensions, config: &ForceConfig) -> Self {
        let index = GraphIndex::new(nodes, edges);
        let links = index
            .edges()
            .iter()
            .filter(|e| e.source != e.target)
            .map(|e| {
                let same_cluster = nodes[e.source].cluster_key() == nodes[e.target].cluster_key();
                let (distance, strength) = if same_cluster {
                    (config.link_distance_intra, config.link_strength_intra)
                } else {
                    (config.link_distance_inter, config.link_strength_inter)
                };
                let (ds, dt) = (index.degree(e.source) as f64, index.degree(e.target) as f64);
                Link {
                    source: e.source,
                    target: e.target,
                    distance,
                    // busy nodes move less per link
                    strength: strength / ds.min(dt).max(1.0),
                    bias: ds / (ds + dt),
                }
            })
            .collect();

        Self {
            bodies: Bodies::from_nodes(nodes, dims),
            links,
            config: config.clone(),
            profile: config.profile_for(nodes.len()),
            center: dims.center(),
            alpha: 1.0,
            running: false,
            ticks: 0,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn bodies(&self) -> &Bodies {
        &self.bodies
    }

    fn apply_links(&mut self) {
        let items = &mut self.bodies.items;
        for link in &self.links {
            let (s, t) = (&items[link.source], &items[link.target]);
            let mut dx = t.position.x + t.vx - s.position.x - s.vx;
            let mut dy = t.position.y + t.vy - s.position.y - s.vy;
            let len = (dx * dx + dy * dy).max(MIN_DISTANCE_SQ).sqrt();
            let k = (len - link.distance) / len * self.alpha * link.strength;
            dx *= k;
            dy *= k;
            items[link.target].vx -= dx * (1.0 - link.bias);
            items[link.target].vy -= dy * (1.0 - link.bias);
            items[link.source].vx += dx * link.bias;
            items[link.source].vy += dy * link.bias;
        }
    }

    fn apply_charge(&mut self) {
        let range = self.profile.distance_max;
        let range_sq = range * range;
        let strength = self.config.charge * self.alpha;
        let grid = self.bodies.grid(range);
        let items = &mut self.bodies.items;
        grid.for_each_near_pair(|i, j| {
            let dx = items[j].position.x - items[i].position.x;
            let dy = items[j].position.y - items[i].position.y;
            let d2 = dx * dx + dy * dy;
            if d2 > range_sq {
                return;
            }
            let w = strength / d2.max(MIN_DISTANCE_SQ);
            items[i].vx -= dx * w;
            items[i].vy -= dy * w;
            items[j].vx += dx * w;
            items[j].vy += dy * w;
        });
    }

    fn apply_center(&mut self) {
        let k = self.config.center_strength * self.alpha;
        for body in &mut self.bodies.items {
            body.vx += (self.center.x - body.position.x) * k;
            body.vy += (self.center.y - body.position.y) * k;
        }
    }

    /// Soft collision on predicted positions: radius plus padding per node.
    fn apply_collisions(&mut self) {
        let padding = self.config.collision_padding;
        let strength = self.config.collision_strength;
        let widest = self
            .bodies
            .items
            .iter()
            .map(|b| b.size)
            .fold(0.0, f64::max);
        let cell = 2.0 * (widest + padding);
        if !(cell > 0.0) {
            return;
        }
        for _ in 0..self.profile.collide_iterations {
            let grid = self.bodies.grid(cell);
            let items = &mut self.bodies.items;
            grid.for_each_near_pair(|i, j| {
                let r = items[i].size + items[j].size + 2.0 * padding;
                let mut dx = items[i].position.x + items[i].vx - items[j].position.x - items[j].vx;
                let mut dy = items[i].position.y + items[i].vy - items[j].position.y - items[j].vy;
                let d2 = dx * dx + dy * dy;
                if d2 >= r * r {
                    return;
                }
                if d2 < 1e-12 {
                    dx = 1e-3 * (1.0 + i as f64 - j as f64);
                    dy = 1e-3;
                }
                let len = (dx * dx + dy * dy).sqrt();
                let k = (r - len) / len * strength;
                let (ri, rj) = (items[i].size.powi(2), items[j].size.powi(2));
                let share = if ri + rj > 0.0 { rj / (ri + rj) } else { 0.5 };
                items[i].vx += dx * k * share;
                items[i].vy += dy * k * share;
                items[j].vx -= dx * k * (1.0 - share);
                items[j].vy -= dy * k * (1.0 - share);
            });
        }
    }

    fn integrate(&mut self) {
        let keep = 1.0 - self.profile.velocity_decay;
        for body in &mut self.bodies.items {
            if body.hold_pin() {
                continue;
            }
            body.vx *= keep;
            body.vy *= keep;
            let (vx, vy) = super::clamp_length(body.vx, body.vy, MAX_VELOCITY);
            body.vx = vx;
            body.vy = vy;
            body.displace(vx, vy, MAX_VELOCITY);
        }
    }
}

impl LayoutStrategy for ForceSimulation {
    fn mode(&self) -> LayoutMode {
        LayoutMode::Force
    }

    fn start(&mut self) {
        self.running = !self.bodies.is_empty();
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn tick(&mut self) {
        if !self.running {
            return;
        }
        self.alpha += (0.0 - self.alpha) * self.profile.alpha_decay;

        self.apply_links();
        self.apply_charge();
        self.apply_center();
        self.apply_collisions();
        self.integrate();

        self.ticks += 1;
        tracing::trace!(tick = self.ticks, alpha = self.alpha, "force tick");
        if self.alpha < self.profile.alpha_min {
            self.running = false;
            tracing::debug!(ticks = self.ticks, "force simulation settled");
        }
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

    fn reheat(&mut self) {
        self.alpha = self.alpha.max(REHEAT_ALPHA);
        self.start();
    }

    fn write_positions(&self, cache: &mut PositionCache) {
        self.bodies.write_to(cache);
    }
}
