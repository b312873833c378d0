use crate::analytic::{self, AnalyticKind};
use crate::cache::PositionCache;
use crate::config::LayoutSettings;
use crate::dispatcher::LayoutMode;
use crate::sim::Bodies;
use crate::types::{Dimensions, Edge, Node, Position};

/// Capability surface shared by every layout the dispatcher can run.
///
/// `stop` is idempotent and `tick` on a stopped strategy does nothing, so a
/// caller holding a stale handle can never move a node.
pub trait LayoutStrategy {
    fn mode(&self) -> LayoutMode;

    fn start(&mut self);
    fn stop(&mut self);
    /// Advances exactly one step.
    fn tick(&mut self);
    fn is_running(&self) -> bool;
    /// Steps taken since construction.
    fn ticks(&self) -> u64;

    /// Holds `id` at `position` and removes it from integration until unpinned.
    fn pin(&mut self, id: &str, position: Position) -> bool;
    fn unpin(&mut self, id: &str) -> bool;
    fn is_pinned(&self, id: &str) -> bool;
    /// Moves `id` without pinning it.
    fn set_position(&mut self, id: &str, position: Position) -> bool;

    /// Restarts a settled strategy from its current positions.
    fn reheat(&mut self);

    fn write_positions(&self, cache: &mut PositionCache);

    fn is_physics(&self) -> bool {
        self.mode().is_physics()
    }
}

/// One-shot analytic placement wrapped as a strategy.
///
/// `start` computes the layout once and the result is final: the strategy
/// never reports itself running, and drags become direct overrides.
pub struct AnalyticRun {
    kind: AnalyticKind,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    dims: Dimensions,
    settings: LayoutSettings,
    bodies: Bodies,
    placed: bool,
}

impl AnalyticRun {
    pub fn new(
        kind: AnalyticKind,
        nodes: &[Node],
        edges: &[Edge],
        dims: Dimensions,
        settings: &LayoutSettings,
    ) -> Self {
        Self {
            kind,
            nodes: nodes.to_vec(),
            edges: edges.to_vec(),
            dims,
            settings: settings.clone(),
            bodies: Bodies::from_nodes(nodes, dims),
            placed: false,
        }
    }

    pub fn kind(&self) -> AnalyticKind {
        self.kind
    }

    pub fn is_placed(&self) -> bool {
        self.placed
    }

    pub fn bodies(&self) -> &Bodies {
        &self.bodies
    }
}

impl LayoutStrategy for AnalyticRun {
    fn mode(&self) -> LayoutMode {
        match self.kind {
            AnalyticKind::Circle => LayoutMode::Circle,
            AnalyticKind::Radial => LayoutMode::Radial,
            AnalyticKind::Hierarchy => LayoutMode::Hierarchy,
            AnalyticKind::Fast => LayoutMode::Fast,
        }
    }

    fn start(&mut self) {
        if self.placed {
            return;
        }
        analytic::run(self.kind, &mut self.nodes, &self.edges, self.dims, &self.settings);
        self.bodies = Bodies::from_nodes(&self.nodes, self.dims);
        self.placed = true;
        // the source copies are only needed for the single run
        self.nodes = Vec::new();
        self.edges = Vec::new();
        tracing::debug!(kind = ?self.kind, nodes = self.bodies.len(), "analytic layout placed");
    }

    fn stop(&mut self) {}

    fn tick(&mut self) {}

    fn is_running(&self) -> bool {
        false
    }

    fn ticks(&self) -> u64 {
        u64::from(self.placed)
    }

    /// Analytic layouts have no dynamics to suspend; a pin is a plain override.
    fn pin(&mut self, id: &str, position: Position) -> bool {
        self.bodies.set_position(id, position)
    }

    fn unpin(&mut self, _id: &str) -> bool {
        false
    }

    fn is_pinned(&self, _id: &str) -> bool {
        false
    }

    fn set_position(&mut self, id: &str, position: Position) -> bool {
        self.bodies.set_position(id, position)
    }

    fn reheat(&mut self) {}

    fn write_positions(&self, cache: &mut PositionCache) {
        if self.placed {
            self.bodies.write_to(cache);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(n: usize) -> Vec<Node> {
        (0..n).map(|i| Node::new(format!("n{i}"), "t")).collect()
    }

    #[test]
    fn test_places_once_and_never_runs() {
        let mut run = AnalyticRun::new(
            AnalyticKind::Circle,
            &nodes(8),
            &[],
            Dimensions::default(),
            &LayoutSettings::default(),
        );
        assert!(!run.is_placed());
        run.start();
        assert!(run.is_placed());
        assert!(!run.is_running());
        assert!(!run.is_physics());

        let mut cache = PositionCache::new();
        run.write_positions(&mut cache);
        assert_eq!(cache.len(), 8);
        assert!(cache.iter().all(|(_, p)| p.is_finite()));
    }

    #[test]
    fn test_pin_is_a_direct_override() {
        let mut run = AnalyticRun::new(
            AnalyticKind::Fast,
            &nodes(3),
            &[],
            Dimensions::default(),
            &LayoutSettings::default(),
        );
        run.start();
        let target = Position::new(12.0, 34.0);
        assert!(run.pin("n1", target));
        assert!(!run.is_pinned("n1"));
        let mut cache = PositionCache::new();
        run.write_positions(&mut cache);
        assert_eq!(cache.get("n1"), Some(target));
        assert!(!run.pin("missing", target));
    }

    #[test]
    fn test_unplaced_run_writes_nothing() {
        let run = AnalyticRun::new(
            AnalyticKind::Radial,
            &nodes(3),
            &[],
            Dimensions::default(),
            &LayoutSettings::default(),
        );
        let mut cache = PositionCache::new();
        run.write_positions(&mut cache);
        assert!(cache.is_empty());
    }
}
