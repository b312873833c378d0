use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cache::PositionCache;
use crate::config::{OpenOrdConfig, Stage, StageParams};
use crate::dispatcher::LayoutMode;
use crate::graph::{GraphIndex, IndexedEdge};
use crate::strategy::LayoutStrategy;
use crate::types::{Dimensions, Edge, Node, Position};

use super::grid::SpatialGrid;
use super::{Bodies, MIN_DISTANCE_SQ, resolve_overlaps};

/// Multi-stage simulated annealing layout.
///
/// Runs `liquid → expansion → cooldown → crunch → simmer`, each stage with its
/// own iteration budget, temperature, attraction and damping, and stops
/// itself once the last stage's budget is spent.
pub struct OpenOrd {
    bodies: Bodies,
    edges: Vec<IndexedEdge>,
    config: OpenOrdConfig,
    rng: StdRng,
    grid: Option<SpatialGrid>,
    stage: usize,
    stage_iteration: usize,
    running: bool,
    ticks: u64,
}

impl OpenOrd {
    pub fn new(
        nodes: &[Node],
        edges: &[Edge],
        dims: Dimensions,
        config: &OpenOrdConfig,
        seed: u64,
    ) -> Self {
        let index = GraphIndex::new(nodes, edges);
        let mut this = Self {
            bodies: Bodies::from_nodes(nodes, dims),
            edges: index
                .edges()
                .iter()
                .filter(|e| e.source != e.target)
                .copied()
                .collect(),
            config: config.clone(),
            rng: StdRng::seed_from_u64(seed),
            grid: None,
            stage: 0,
            stage_iteration: 0,
            running: false,
            ticks: 0,
        };
        this.skip_empty_stages();
        this
    }

    pub fn bodies(&self) -> &Bodies {
        &self.bodies
    }

    /// Current stage, or `None` once the schedule is exhausted.
    pub fn stage(&self) -> Option<Stage> {
        self.params().map(|p| p.stage)
    }

    pub fn stage_iteration(&self) -> usize {
        self.stage_iteration
    }

    pub fn temperature(&self) -> f64 {
        self.params().map_or(0.0, |p| p.temperature)
    }

    fn params(&self) -> Option<StageParams> {
        self.config.schedule.get(self.stage).copied()
    }

    fn skip_empty_stages(&mut self) {
        while self
            .config
            .schedule
            .get(self.stage)
            .is_some_and(|p| p.iterations == 0)
        {
            self.stage += 1;
        }
    }

    fn apply_repulsion(&mut self) {
        let rebuild = self.config.grid_rebuild_interval.max(1);
        if self.grid.is_none() || self.ticks % rebuild == 0 {
            self.grid = Some(self.bodies.grid(self.config.grid_cell_size));
        }
        let Some(grid) = &self.grid else {
            return;
        };
        let cutoff_sq = self.config.repulsion_cutoff * self.config.repulsion_cutoff;
        let repulsion = self.config.repulsion;
        let items = &mut self.bodies.items;
        grid.for_each_near_pair(|i, j| {
            let dx = items[j].position.x - items[i].position.x;
            let dy = items[j].position.y - items[i].position.y;
            let d2 = dx * dx + dy * dy;
            if d2 > cutoff_sq {
                return;
            }
            let d2 = d2.max(MIN_DISTANCE_SQ);
            let d = d2.sqrt();
            let magnitude = repulsion / d2;
            let (fx, fy) = (dx / d * magnitude, dy / d * magnitude);
            items[i].vx -= fx;
            items[i].vy -= fy;
            items[j].vx += fx;
            items[j].vy += fy;
        });
    }

    fn apply_attraction(&mut self, params: StageParams) {
        let ideal = self.config.ideal_edge_length;
        let keep = 1.0 - self.config.edge_cutoff;
        let scale = params.attraction * self.config.attraction_scale;
        let items = &mut self.bodies.items;
        for edge in &self.edges {
            let dx = items[edge.target].position.x - items[edge.source].position.x;
            let dy = items[edge.target].position.y - items[edge.source].position.y;
            let d2 = dx * dx + dy * dy;
            if d2 < MIN_DISTANCE_SQ {
                continue;
            }
            let d = d2.sqrt();
            // long edges pull as if shorter so they cannot run away
            let effective = if d > ideal { ideal + (d - ideal) * keep } else { d };
            let magnitude = scale * effective * edge.weight;
            let (fx, fy) = (dx / d * magnitude, dy / d * magnitude);
            items[edge.source].vx += fx;
            items[edge.source].vy += fy;
            items[edge.target].vx -= fx;
            items[edge.target].vy -= fy;
        }
    }

    fn apply_jitter(&mut self, params: StageParams) {
        let amplitude = params.temperature * self.config.jitter_scale;
        if amplitude <= 0.0 {
            return;
        }
        for body in &mut self.bodies.items {
            if body.is_pinned() {
                continue;
            }
            body.vx += self.rng.random_range(-1.0..=1.0) * amplitude;
            body.vy += self.rng.random_range(-1.0..=1.0) * amplitude;
        }
    }

    fn integrate(&mut self, params: StageParams) {
        let max = (params.temperature * self.config.displacement_scale).max(0.0);
        for body in &mut self.bodies.items {
            if body.hold_pin() {
                continue;
            }
            body.displace(body.vx * params.damping, body.vy * params.damping, max);
        }
    }

    fn advance_stage(&mut self) {
        self.stage_iteration += 1;
        let Some(params) = self.params() else {
            return;
        };
        if self.stage_iteration < params.iterations {
            return;
        }
        self.stage += 1;
        self.stage_iteration = 0;
        self.skip_empty_stages();
        match self.params() {
            Some(next) => tracing::info!(
                stage = ?next.stage,
                temperature = next.temperature,
                "open ord entering stage"
            ),
            None => {
                self.running = false;
                tracing::info!(ticks = self.ticks, "open ord schedule finished");
            }
        }
    }
}

impl LayoutStrategy for OpenOrd {
    fn mode(&self) -> LayoutMode {
        LayoutMode::OpenOrd
    }

    fn start(&mut self) {
        self.running = !self.bodies.is_empty() && self.params().is_some();
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn tick(&mut self) {
        if !self.running {
            return;
        }
        let Some(params) = self.params() else {
            self.running = false;
            return;
        };

        for body in &mut self.bodies.items {
            body.vx = 0.0;
            body.vy = 0.0;
        }
        self.apply_repulsion();
        self.apply_attraction(params);
        self.apply_jitter(params);
        self.integrate(params);
        if self.config.prevent_overlap {
            resolve_overlaps(
                &mut self.bodies,
                2.0 * self.config.node_size,
                self.config.overlap_iterations,
            );
        }

        self.ticks += 1;
        tracing::trace!(tick = self.ticks, stage = ?params.stage, "open ord tick");
        self.advance_stage();
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

    /// A finished schedule re-runs its final stage.
    fn reheat(&mut self) {
        if self.params().is_none() {
            let last = self
                .config
                .schedule
                .iter()
                .rposition(|p| p.iterations > 0);
            let Some(last) = last else {
                return;
            };
            self.stage = last;
            self.stage_iteration = 0;
        }
        self.start();
    }

    fn write_positions(&self, cache: &mut PositionCache) {
        self.bodies.write_to(cache);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::min_free_distance;

    fn short_schedule() -> OpenOrdConfig {
        let mut config = OpenOrdConfig::default();
        for (params, iterations) in config.schedule.iter_mut().zip([5, 4, 3, 2, 1]) {
            params.iterations = iterations;
        }
        config
    }

    fn sample(n: usize) -> (Vec<Node>, Vec<Edge>) {
        let nodes = (0..n)
            .map(|i| {
                Node::new(format!("n{i}"), "t")
                    .with_position((i % 6) as f64 * 40.0 + 100.0, (i / 6) as f64 * 40.0 + 100.0)
            })
            .collect();
        let edges = (1..n)
            .map(|i| Edge::new(format!("e{i}"), format!("n{}", i - 1), format!("n{i}")))
            .collect();
        (nodes, edges)
    }

    #[test]
    fn test_walks_every_stage_then_stops() {
        let (nodes, edges) = sample(12);
        let mut sim = OpenOrd::new(&nodes, &edges, Dimensions::default(), &short_schedule(), 1);
        sim.start();
        let mut seen = Vec::new();
        while sim.is_running() {
            if let Some(stage) = sim.stage() {
                if seen.last() != Some(&stage) {
                    seen.push(stage);
                }
            }
            sim.tick();
        }
        assert_eq!(
            seen,
            vec![Stage::Liquid, Stage::Expansion, Stage::Cooldown, Stage::Crunch, Stage::Simmer]
        );
        assert_eq!(sim.ticks(), 15);
        assert!(sim.stage().is_none());
    }

    #[test]
    fn test_stage_change_resets_counter_and_temperature() {
        let (nodes, edges) = sample(6);
        let mut sim = OpenOrd::new(&nodes, &edges, Dimensions::default(), &short_schedule(), 1);
        sim.start();
        for _ in 0..15 - 3 {
            sim.tick();
        }
        assert_eq!(sim.stage(), Some(Stage::Crunch));
        assert_eq!(sim.stage_iteration(), 0);
        assert_eq!(sim.temperature(), 250.0);
    }

    #[test]
    fn test_no_overlap_after_ticks() {
        let (nodes, edges) = sample(30);
        let config = short_schedule();
        let mut sim = OpenOrd::new(&nodes, &edges, Dimensions::default(), &config, 7);
        sim.start();
        while sim.is_running() {
            sim.tick();
            assert!(min_free_distance(sim.bodies()) >= 2.0 * config.node_size - 1e-6);
        }
        assert!(sim.bodies().positions().all(|(_, p)| p.is_finite()));
    }

    fn dense_blob(n: usize) -> Vec<Node> {
        (0..n)
            .map(|i| {
                let a = i as f64 * 2.399963;
                let r = 2.0 * (i as f64).sqrt();
                Node::new(format!("n{i}"), "t").with_position(300.0 + r * a.cos(), 200.0 + r * a.sin())
            })
            .collect()
    }

    #[test]
    fn test_dense_seed_cleared_every_tick() {
        let nodes = dense_blob(400);
        let config = OpenOrdConfig::default();
        let mut sim = OpenOrd::new(&nodes, &[], Dimensions::default(), &config, 3);
        sim.start();
        for _ in 0..3 {
            sim.tick();
            assert!(min_free_distance(sim.bodies()) >= 2.0 * config.node_size - 1e-6);
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let (nodes, edges) = sample(10);
        let run = || {
            let mut sim = OpenOrd::new(&nodes, &edges, Dimensions::default(), &short_schedule(), 42);
            sim.start();
            while sim.is_running() {
                sim.tick();
            }
            sim.bodies().positions().map(|(_, p)| p).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_reheat_reruns_last_stage() {
        let (nodes, edges) = sample(4);
        let mut sim = OpenOrd::new(&nodes, &edges, Dimensions::default(), &short_schedule(), 3);
        sim.start();
        while sim.is_running() {
            sim.tick();
        }
        sim.reheat();
        assert_eq!(sim.stage(), Some(Stage::Simmer));
        assert!(sim.is_running());
        sim.tick();
        assert!(!sim.is_running());
    }
}
