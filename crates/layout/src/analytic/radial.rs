use petgraph::Undirected;
use petgraph::algo::dijkstra;
use petgraph::graph::NodeIndex;

use crate::config::RadialConfig;
use crate::graph::GraphIndex;
use crate::types::{Dimensions, Edge, Node};

use super::{max_size, ring_points, ring_radius_for};

/// Result of the breadth-first ring assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadialLevels {
    /// Index of the hub node.
    pub hub: usize,
    /// BFS depth from the hub per node; `None` when unreachable.
    pub levels: Vec<Option<usize>>,
}

impl RadialLevels {
    pub fn deepest(&self) -> usize {
        self.levels.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// Picks the highest-degree node (first wins ties) and measures BFS depth from it.
pub fn radial_levels(nodes: &[Node], edges: &[Edge]) -> Option<RadialLevels> {
    if nodes.is_empty() {
        return None;
    }
    let index = GraphIndex::new(nodes, edges);
    let mut hub = 0;
    for i in 1..index.len() {
        if index.degree(i) > index.degree(hub) {
            hub = i;
        }
    }

    let graph = index.to_digraph().into_edge_type::<Undirected>();
    let distances = dijkstra(&graph, NodeIndex::new(hub), None, |_| 1usize);
    let levels = (0..index.len())
        .map(|i| distances.get(&NodeIndex::new(i)).copied())
        .collect();

    Some(RadialLevels { hub, levels })
}

/// Concentric rings around the hub, one per BFS depth.
///
/// Ring `L` sits at `L × level_gap` unless it needs more room for its nodes.
/// Every ring stays at least one gap outside the ring before it, so a crowded
/// shallow ring pushes the deeper ones out with it. Unreachable nodes share
/// one ring beyond the deepest reachable one.
pub fn radial(nodes: &mut [Node], edges: &[Edge], dims: Dimensions, config: &RadialConfig) {
    let Some(levels) = radial_levels(nodes, edges) else {
        return;
    };
    let center = dims.center();
    let spacing = 2.0 * max_size(nodes) + 4.0;

    let deepest = levels.deepest();
    let mut rings: Vec<Vec<usize>> = vec![Vec::new(); deepest + 1];
    let mut orphans = Vec::new();
    for (i, level) in levels.levels.iter().enumerate() {
        match level {
            Some(level) => rings[*level].push(i),
            None => orphans.push(i),
        }
    }

    let step = config.level_gap.max(spacing);
    let mut outermost: Option<f64> = None;
    for (level, members) in rings.iter().enumerate() {
        let mut radius =
            (level as f64 * config.level_gap).max(ring_radius_for(members.len(), spacing));
        if let Some(inner) = outermost {
            radius = radius.max(inner + step);
        }
        outermost = Some(radius);
        for (&i, point) in members.iter().zip(ring_points(center, radius, members.len())) {
            nodes[i].position = Some(point);
        }
    }

    if !orphans.is_empty() {
        let radius = ((deepest + 1) as f64 * config.level_gap)
            .max(outermost.unwrap_or(0.0) + step)
            .max(ring_radius_for(orphans.len(), spacing));
        for (&i, point) in orphans.iter().zip(ring_points(center, radius, orphans.len())) {
            nodes[i].position = Some(point);
        }
    }
}
