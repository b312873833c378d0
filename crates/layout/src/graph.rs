use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::types::{Edge, Node};

/// An edge whose endpoints both resolved to node indices.
#[derive(Debug, Clone, Copy)]
pub struct IndexedEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
    /// Position of the edge in the caller's edge list.
    pub original: usize,
}

/// Dense index over one node/edge snapshot.
///
/// Edges with a dangling endpoint are dropped here, so nothing downstream
/// applies forces for them or draws them.
#[derive(Debug, Clone)]
pub struct GraphIndex {
    ids: Vec<String>,
    lookup: HashMap<String, usize>,
    edges: Vec<IndexedEdge>,
    degree: Vec<usize>,
    dropped: usize,
}

impl GraphIndex {
    pub fn new(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut ids = Vec::with_capacity(nodes.len());
        let mut lookup = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            ids.push(node.id.clone());
            // first occurrence wins on duplicate ids
            lookup.entry(node.id.clone()).or_insert(i);
        }

        let mut indexed = Vec::with_capacity(edges.len());
        let mut degree = vec![0usize; nodes.len()];
        let mut dropped = 0;
        for (original, edge) in edges.iter().enumerate() {
            match (lookup.get(&edge.source), lookup.get(&edge.target)) {
                (Some(&source), Some(&target)) => {
                    degree[source] += 1;
                    degree[target] += 1;
                    indexed.push(IndexedEdge {
                        source,
                        target,
                        weight: edge.effective_weight(),
                        original,
                    });
                }
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            tracing::debug!(dropped, "ignoring edges with a missing endpoint");
        }

        Self {
            ids,
            lookup,
            edges: indexed,
            degree,
            dropped,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.lookup.get(id).copied()
    }

    pub fn id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    pub fn edges(&self) -> &[IndexedEdge] {
        &self.edges
    }

    pub fn degree(&self, index: usize) -> usize {
        self.degree[index]
    }

    /// Number of edges dropped for a dangling endpoint.
    pub fn dropped_edges(&self) -> usize {
        self.dropped
    }

    /// Directed petgraph view; node weights are dense indices, `NodeIndex::new(i)` maps back.
    pub fn to_digraph(&self) -> DiGraph<usize, f64> {
        let mut graph = DiGraph::with_capacity(self.len(), self.edges.len());
        for i in 0..self.len() {
            graph.add_node(i);
        }
        for edge in &self.edges {
            graph.add_edge(
                NodeIndex::new(edge.source),
                NodeIndex::new(edge.target),
                edge.weight,
            );
        }
        graph
    }

    /// Undirected adjacency lists in edge-insertion order.
    pub fn neighbors(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.len()];
        for edge in &self.edges {
            if edge.source == edge.target {
                continue;
            }
            adjacency[edge.source].push(edge.target);
            adjacency[edge.target].push(edge.source);
        }
        adjacency
    }
}
