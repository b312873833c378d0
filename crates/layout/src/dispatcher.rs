use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crossbeam_channel::{Receiver, Sender};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::analytic::AnalyticKind;
use crate::cache::PositionCache;
use crate::config::LayoutSettings;
use crate::sim::{ForceAtlas2, ForceSimulation, OpenOrd};
use crate::strategy::{AnalyticRun, LayoutStrategy};
use crate::types::{Dimensions, Edge, LayoutError, Node, Position, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    Force,
    #[serde(rename = "force-atlas2")]
    ForceAtlas2,
    OpenOrd,
    Circle,
    Radial,
    Hierarchy,
    Fast,
}

impl LayoutMode {
    pub const ALL: [LayoutMode; 7] = [
        LayoutMode::Force,
        LayoutMode::ForceAtlas2,
        LayoutMode::OpenOrd,
        LayoutMode::Circle,
        LayoutMode::Radial,
        LayoutMode::Hierarchy,
        LayoutMode::Fast,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutMode::Force => "force",
            LayoutMode::ForceAtlas2 => "force-atlas2",
            LayoutMode::OpenOrd => "open-ord",
            LayoutMode::Circle => "circle",
            LayoutMode::Radial => "radial",
            LayoutMode::Hierarchy => "hierarchy",
            LayoutMode::Fast => "fast",
        }
    }

    /// Tick-driven simulations, as opposed to one-shot placements.
    pub fn is_physics(self) -> bool {
        self.analytic_kind().is_none()
    }

    pub fn analytic_kind(self) -> Option<AnalyticKind> {
        match self {
            LayoutMode::Circle => Some(AnalyticKind::Circle),
            LayoutMode::Radial => Some(AnalyticKind::Radial),
            LayoutMode::Hierarchy => Some(AnalyticKind::Hierarchy),
            LayoutMode::Fast => Some(AnalyticKind::Fast),
            LayoutMode::Force | LayoutMode::ForceAtlas2 | LayoutMode::OpenOrd => None,
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        LayoutMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| LayoutError::UnknownMode(s.to_string()))
    }
}

/// Fire-and-forget requests for the dispatcher, applied in FIFO order by `pump`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMessage {
    LayoutChange { mode: LayoutMode },
    Reheat,
}

/// Strategy lifecycle transitions, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Started(LayoutMode),
    Stopped(LayoutMode),
}

/// Permission to run one frame of the strategy that was active when it was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTicket {
    generation: u64,
}

impl FrameTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Owns the single active layout strategy and the position cache it writes.
///
/// Every activation stops the outgoing strategy before the incoming one is
/// started and bumps the session generation, so frames scheduled for the old
/// strategy are refused instead of ticking a strategy that no longer owns the
/// cache.
pub struct LayoutDispatcher {
    settings: LayoutSettings,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    dims: Dimensions,
    active: Option<Box<dyn LayoutStrategy>>,
    fingerprint: u64,
    cache: PositionCache,
    generation: u64,
    journal: Vec<Lifecycle>,
    sender: Sender<LayoutMessage>,
    receiver: Receiver<LayoutMessage>,
}

impl LayoutDispatcher {
    pub fn new(settings: LayoutSettings) -> Result<Self> {
        settings.validate()?;
        let (sender, receiver) = crossbeam_channel::unbounded();
        Ok(Self {
            settings,
            nodes: Vec::new(),
            edges: Vec::new(),
            dims: Dimensions::default(),
            active: None,
            fingerprint: 0,
            cache: PositionCache::new(),
            generation: 0,
            journal: Vec::new(),
            sender,
            receiver,
        })
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn cache(&self) -> &PositionCache {
        &self.cache
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn mode(&self) -> Option<LayoutMode> {
        self.active.as_ref().map(|s| s.mode())
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|s| s.is_running())
    }

    /// Whether the active strategy integrates forces; drags pin instead of override.
    pub fn is_physics(&self) -> bool {
        self.active.as_ref().is_some_and(|s| s.is_physics())
    }

    pub fn ticks(&self) -> u64 {
        self.active.as_ref().map_or(0, |s| s.ticks())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn journal(&self) -> &[Lifecycle] {
        &self.journal
    }

    /// Producer side of the message channel. Any number may exist.
    pub fn sender(&self) -> Sender<LayoutMessage> {
        self.sender.clone()
    }

    /// Switches to `mode` over the given graph.
    ///
    /// Re-activating the running physics mode with the same node and edge ids
    /// keeps the current strategy. Anything else tears down the active
    /// strategy and starts a new one seeded from the position cache.
    pub fn activate(
        &mut self,
        mode: LayoutMode,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        dims: Dimensions,
    ) -> Result<()> {
        if !dims.is_valid() {
            return Err(LayoutError::InvalidDimensions {
                width: dims.width,
                height: dims.height,
            });
        }

        let fingerprint = fingerprint(&nodes, &edges);
        let unchanged = self.mode() == Some(mode)
            && mode.is_physics()
            && self.is_running()
            && fingerprint == self.fingerprint
            && dims == self.dims;
        if unchanged {
            tracing::debug!(%mode, "layout already running over the same graph");
            self.nodes = nodes;
            self.edges = edges;
            return Ok(());
        }

        self.teardown();
        self.generation += 1;

        let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        self.cache.retain(|id| ids.contains(id));

        self.nodes = nodes;
        self.edges = edges;
        self.dims = dims;
        self.fingerprint = fingerprint;
        self.seed_positions();

        let mut strategy = self.build(mode);
        strategy.start();
        strategy.write_positions(&mut self.cache);
        self.journal.push(Lifecycle::Started(mode));
        tracing::debug!(
            %mode,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            generation = self.generation,
            "layout started"
        );
        self.active = Some(strategy);
        Ok(())
    }

    /// Re-activates the current graph under another mode.
    pub fn switch_mode(&mut self, mode: LayoutMode) -> Result<()> {
        let nodes = std::mem::take(&mut self.nodes);
        let edges = std::mem::take(&mut self.edges);
        self.activate(mode, nodes, edges, self.dims)
    }

    /// Restarts a settled simulation without discarding positions.
    pub fn reheat(&mut self) {
        let Some(strategy) = self.active.as_mut() else {
            return;
        };
        if !strategy.is_physics() {
            return;
        }
        let was_running = strategy.is_running();
        strategy.reheat();
        if !was_running && strategy.is_running() {
            tracing::debug!(mode = %strategy.mode(), "layout reheated");
        }
    }

    /// Drains queued messages in arrival order. Returns how many were applied.
    pub fn pump(&mut self) -> Result<usize> {
        let mut applied = 0;
        while let Ok(message) = self.receiver.try_recv() {
            match message {
                LayoutMessage::LayoutChange { mode } => self.switch_mode(mode)?,
                LayoutMessage::Reheat => self.reheat(),
            }
            applied += 1;
        }
        Ok(applied)
    }

    pub fn request_frame(&self) -> FrameTicket {
        FrameTicket {
            generation: self.generation,
        }
    }

    /// Ticks the active strategy once and syncs the cache.
    ///
    /// Returns `false` when the ticket predates the latest activation or
    /// shutdown, or when nothing is running.
    pub fn run_frame(&mut self, ticket: FrameTicket) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "dropping stale frame"
            );
            return false;
        }
        let Some(strategy) = self.active.as_mut() else {
            return false;
        };
        if !strategy.is_running() {
            return false;
        }
        strategy.tick();
        strategy.write_positions(&mut self.cache);
        true
    }

    /// Requests and runs a frame in one step.
    pub fn tick(&mut self) -> bool {
        let ticket = self.request_frame();
        self.run_frame(ticket)
    }

    /// Ticks until the strategy stops on its own or `max_frames` run out.
    pub fn run_until_settled(&mut self, max_frames: u64) -> u64 {
        let mut frames = 0;
        while frames < max_frames && self.tick() {
            frames += 1;
        }
        frames
    }

    /// Stops the active strategy and invalidates every outstanding ticket.
    pub fn shutdown(&mut self) {
        self.teardown();
        self.generation += 1;
    }

    /// Holds `id` at `position`: a pin for simulations, an override otherwise.
    pub fn pin(&mut self, id: &str, position: Position) -> bool {
        let Some(strategy) = self.active.as_mut() else {
            return false;
        };
        if !strategy.pin(id, position) {
            return false;
        }
        self.cache.set(id, position)
    }

    pub fn unpin(&mut self, id: &str) -> bool {
        self.active.as_mut().is_some_and(|s| s.unpin(id))
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        self.active.as_ref().is_some_and(|s| s.is_pinned(id))
    }

    /// Moves `id` in both the strategy and the cache without pinning it.
    pub fn set_position(&mut self, id: &str, position: Position) -> bool {
        let Some(strategy) = self.active.as_mut() else {
            return false;
        };
        if !strategy.set_position(id, position) {
            return false;
        }
        self.cache.set(id, position)
    }

    fn teardown(&mut self) {
        if let Some(mut strategy) = self.active.take() {
            let mode = strategy.mode();
            strategy.stop();
            self.journal.push(Lifecycle::Stopped(mode));
            tracing::debug!(%mode, ticks = strategy.ticks(), "layout stopped");
        }
    }

    /// Cache first, then the node's own position, then a seeded random spot.
    fn seed_positions(&mut self) {
        let mut rng = StdRng::seed_from_u64(self.settings.seed);
        let (width, height) = (self.dims.width, self.dims.height);
        for node in &mut self.nodes {
            let seeded = self
                .cache
                .get(&node.id)
                .or(node.position.filter(Position::is_finite))
                .unwrap_or_else(|| {
                    Position::new(rng.random_range(0.0..width), rng.random_range(0.0..height))
                });
            node.position = Some(seeded);
        }
    }

    fn build(&self, mode: LayoutMode) -> Box<dyn LayoutStrategy> {
        let (nodes, edges, dims) = (&self.nodes, &self.edges, self.dims);
        match mode {
            LayoutMode::Force => Box::new(ForceSimulation::new(nodes, edges, dims, &self.settings.force)),
            LayoutMode::ForceAtlas2 => Box::new(ForceAtlas2::new(
                nodes,
                edges,
                dims,
                &self.settings.force_atlas2,
            )),
            LayoutMode::OpenOrd => Box::new(OpenOrd::new(
                nodes,
                edges,
                dims,
                &self.settings.open_ord,
                self.settings.seed,
            )),
            LayoutMode::Circle => self.analytic(AnalyticKind::Circle),
            LayoutMode::Radial => self.analytic(AnalyticKind::Radial),
            LayoutMode::Hierarchy => self.analytic(AnalyticKind::Hierarchy),
            LayoutMode::Fast => self.analytic(AnalyticKind::Fast),
        }
    }

    fn analytic(&self, kind: AnalyticKind) -> Box<dyn LayoutStrategy> {
        Box::new(AnalyticRun::new(
            kind,
            &self.nodes,
            &self.edges,
            self.dims,
            &self.settings,
        ))
    }
}

impl Drop for LayoutDispatcher {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn fingerprint(nodes: &[Node], edges: &[Edge]) -> u64 {
    let mut hasher = DefaultHasher::new();
    nodes.len().hash(&mut hasher);
    for node in nodes {
        node.id.hash(&mut hasher);
    }
    edges.len().hash(&mut hasher);
    for edge in edges {
        edge.id.hash(&mut hasher);
        edge.source.hash(&mut hasher);
        edge.target.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(n: usize) -> (Vec<Node>, Vec<Edge>) {
        let nodes = (0..n).map(|i| Node::new(format!("n{i}"), "t")).collect();
        let edges = (1..n)
            .map(|i| Edge::new(format!("e{i}"), "n0", format!("n{i}")))
            .collect();
        (nodes, edges)
    }

    fn dispatcher() -> LayoutDispatcher {
        LayoutDispatcher::new(LayoutSettings::default()).unwrap()
    }

    #[test]
    fn test_mode_names_round_trip() {
        for mode in LayoutMode::ALL {
            assert_eq!(mode.as_str().parse::<LayoutMode>().unwrap(), mode);
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{mode}\""));
        }
        assert_eq!("Force_Atlas2".parse::<LayoutMode>().unwrap(), LayoutMode::ForceAtlas2);
        assert!(matches!(
            "spring".parse::<LayoutMode>(),
            Err(LayoutError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        let (nodes, edges) = graph(3);
        let mut d = dispatcher();
        let err = d
            .activate(LayoutMode::Force, nodes, edges, Dimensions::new(0.0, 100.0))
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidDimensions { .. }));
        assert!(d.mode().is_none());
    }

    #[test]
    fn test_stop_before_start() {
        let (nodes, edges) = graph(6);
        let mut d = dispatcher();
        d.activate(LayoutMode::Force, nodes.clone(), edges.clone(), Dimensions::default())
            .unwrap();
        assert!(d.is_running());
        d.activate(LayoutMode::OpenOrd, nodes, edges, Dimensions::default())
            .unwrap();
        assert_eq!(
            d.journal(),
            &[
                Lifecycle::Started(LayoutMode::Force),
                Lifecycle::Stopped(LayoutMode::Force),
                Lifecycle::Started(LayoutMode::OpenOrd),
            ]
        );
        assert_eq!(d.mode(), Some(LayoutMode::OpenOrd));
    }

    #[test]
    fn test_stale_ticket_is_refused() {
        let (nodes, edges) = graph(5);
        let mut d = dispatcher();
        d.activate(LayoutMode::Force, nodes, edges, Dimensions::default())
            .unwrap();
        let ticket = d.request_frame();
        d.switch_mode(LayoutMode::ForceAtlas2).unwrap();
        assert!(!d.run_frame(ticket));
        assert_eq!(d.ticks(), 0);
        assert!(d.run_frame(d.request_frame()));
        assert_eq!(d.ticks(), 1);
    }

    #[test]
    fn test_shutdown_cancels_pending_frames() {
        let (nodes, edges) = graph(5);
        let mut d = dispatcher();
        d.activate(LayoutMode::Force, nodes, edges, Dimensions::default())
            .unwrap();
        let ticket = d.request_frame();
        d.shutdown();
        assert!(!d.run_frame(ticket));
        assert!(d.mode().is_none());
        assert_eq!(d.journal().last(), Some(&Lifecycle::Stopped(LayoutMode::Force)));
    }

    #[test]
    fn test_same_graph_keeps_running_strategy() {
        let (nodes, edges) = graph(5);
        let mut d = dispatcher();
        d.activate(LayoutMode::Force, nodes.clone(), edges.clone(), Dimensions::default())
            .unwrap();
        d.tick();
        d.tick();
        d.activate(LayoutMode::Force, nodes.clone(), edges, Dimensions::default())
            .unwrap();
        assert_eq!(d.ticks(), 2);
        assert_eq!(d.journal().len(), 1);

        // one edge fewer restarts from the cache
        let before = d.cache().get("n3").unwrap();
        let (_, mut edges) = graph(5);
        edges.pop();
        d.activate(LayoutMode::Force, nodes, edges, Dimensions::default())
            .unwrap();
        assert_eq!(d.ticks(), 0);
        assert_eq!(d.cache().get("n3"), Some(before));
    }

    #[test]
    fn test_seeding_prefers_cache_then_node_position() {
        let mut d = dispatcher();
        let nodes = vec![
            Node::new("a", "t").with_position(10.0, 20.0),
            Node::new("b", "t"),
        ];
        d.activate(LayoutMode::Force, nodes, Vec::new(), Dimensions::default())
            .unwrap();
        assert_eq!(d.cache().get("a"), Some(Position::new(10.0, 20.0)));
        let b = d.cache().get("b").unwrap();
        assert!(b.x >= 0.0 && b.x < 900.0 && b.y >= 0.0 && b.y < 530.0);

        d.set_position("a", Position::new(300.0, 300.0));
        let nodes = vec![
            Node::new("a", "t").with_position(10.0, 20.0),
            Node::new("b", "t"),
            Node::new("c", "t"),
        ];
        d.activate(LayoutMode::Force, nodes, Vec::new(), Dimensions::default())
            .unwrap();
        assert_eq!(d.cache().get("a"), Some(Position::new(300.0, 300.0)));
        assert_eq!(d.cache().get("b"), Some(b));
    }

    #[test]
    fn test_analytic_is_final_immediately() {
        let (nodes, edges) = graph(7);
        let mut d = dispatcher();
        d.activate(LayoutMode::Circle, nodes, edges, Dimensions::default())
            .unwrap();
        assert!(!d.is_running());
        assert!(!d.is_physics());
        assert_eq!(d.cache().len(), 7);
        assert!(!d.tick());
    }

    #[test]
    fn test_messages_apply_in_order() {
        let (nodes, edges) = graph(4);
        let mut d = dispatcher();
        d.activate(LayoutMode::Force, nodes, edges, Dimensions::default())
            .unwrap();
        let tx = d.sender();
        tx.send(LayoutMessage::LayoutChange { mode: LayoutMode::Radial }).unwrap();
        tx.send(LayoutMessage::LayoutChange { mode: LayoutMode::OpenOrd }).unwrap();
        tx.send(LayoutMessage::Reheat).unwrap();
        assert_eq!(d.pump().unwrap(), 3);
        assert_eq!(d.mode(), Some(LayoutMode::OpenOrd));
        assert!(d.is_running());
        assert_eq!(d.pump().unwrap(), 0);
    }

    #[test]
    fn test_reheat_restarts_settled_force() {
        let (nodes, edges) = graph(4);
        let mut d = dispatcher();
        d.activate(LayoutMode::Force, nodes, edges, Dimensions::default())
            .unwrap();
        let frames = d.run_until_settled(10_000);
        assert!(frames > 0);
        assert!(!d.is_running());
        d.reheat();
        assert!(d.is_running());
    }

    #[test]
    fn test_pin_reaches_strategy_and_cache() {
        let (nodes, edges) = graph(4);
        let mut d = dispatcher();
        d.activate(LayoutMode::Force, nodes, edges, Dimensions::default())
            .unwrap();
        let at = Position::new(1.0, 2.0);
        assert!(d.pin("n2", at));
        assert!(d.is_pinned("n2"));
        d.tick();
        assert_eq!(d.cache().get("n2"), Some(at));
        assert!(d.unpin("n2"));
        assert!(!d.unpin("n2"));
        assert!(!d.pin("ghost", at));
    }

    #[test]
    fn test_empty_graph_is_a_no_op() {
        let mut d = dispatcher();
        for mode in LayoutMode::ALL {
            d.activate(mode, Vec::new(), Vec::new(), Dimensions::default())
                .unwrap();
            assert!(!d.tick());
            assert!(d.cache().is_empty());
        }
    }
}
