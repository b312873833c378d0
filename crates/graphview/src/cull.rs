use graphlens_layout::{Edge, Node, Position, PositionCache};

use crate::lod::{DetailTier, RenderStyle};
use crate::viewport::Rect;

#[derive(Debug, Clone, PartialEq)]
pub struct VisibleNode {
    pub id: String,
    pub node_type: String,
    pub label: Option<String>,
    pub size: f64,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisibleEdge {
    pub id: String,
    pub source: Position,
    pub target: Position,
    pub edge_type: Option<String>,
}

/// What the drawing layer gets for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSet {
    pub nodes: Vec<VisibleNode>,
    pub edges: Vec<VisibleEdge>,
    pub tier: DetailTier,
    pub style: RenderStyle,
    pub bounds: Rect,
}

/// Keeps nodes whose cached position is inside `bounds`, and edges whose
/// bounding box touches it.
///
/// Nodes without a cached position are not drawn. Edges with an endpoint that
/// has no cached position, including dangling ids, are dropped.
pub fn cull(
    nodes: &[Node],
    edges: &[Edge],
    cache: &PositionCache,
    bounds: Rect,
    tier: DetailTier,
) -> RenderSet {
    let visible_nodes = nodes
        .iter()
        .filter_map(|node| {
            let position = cache.get(&node.id)?;
            bounds.contains(position).then(|| VisibleNode {
                id: node.id.clone(),
                node_type: node.node_type.clone(),
                label: node.label.clone(),
                size: node.size,
                position,
            })
        })
        .collect();

    let visible_edges = edges
        .iter()
        .filter_map(|edge| {
            let source = cache.get(&edge.source)?;
            let target = cache.get(&edge.target)?;
            let bbox = Rect::new(source.x, source.y, target.x, target.y);
            bounds.intersects(&bbox).then(|| VisibleEdge {
                id: edge.id.clone(),
                source,
                target,
                edge_type: edge.edge_type.clone(),
            })
        })
        .collect();

    RenderSet {
        nodes: visible_nodes,
        edges: visible_edges,
        tier,
        style: tier.style(),
        bounds,
    }
}
