use std::collections::VecDeque;

use crate::config::HierarchyConfig;
use crate::graph::GraphIndex;
use crate::types::{Dimensions, Edge, Node, Position};

use super::{grid_points, max_size};

/// Spanning forest built from edge direction (source is the parent).
struct Forest {
    roots: Vec<usize>,
    children: Vec<Vec<usize>>,
    depth: Vec<Option<usize>>,
}

fn build_forest(index: &GraphIndex) -> Forest {
    let n = index.len();
    let mut incoming = vec![0usize; n];
    let mut out: Vec<Vec<usize>> = vec![Vec::new(); n];
    for edge in index.edges() {
        if edge.source == edge.target {
            continue;
        }
        incoming[edge.target] += 1;
        out[edge.source].push(edge.target);
    }

    let mut roots: Vec<usize> = (0..n).filter(|&i| incoming[i] == 0).collect();
    if roots.is_empty() && n > 0 {
        roots.push(0);
    }

    // Each node hangs under the first parent that reaches it.
    let mut children = vec![Vec::new(); n];
    let mut depth = vec![None; n];
    for &root in &roots {
        if depth[root].is_some() {
            continue;
        }
        depth[root] = Some(0);
        let mut queue = VecDeque::from([root]);
        while let Some(parent) = queue.pop_front() {
            let parent_depth = depth[parent].unwrap_or(0);
            for &child in &out[parent] {
                if depth[child].is_none() {
                    depth[child] = Some(parent_depth + 1);
                    children[parent].push(child);
                    queue.push_back(child);
                }
            }
        }
    }

    Forest {
        roots,
        children,
        depth,
    }
}

/// Leaves under each node; a subtree's horizontal share is proportional to it.
fn leaf_counts(forest: &Forest, n: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n];
    let mut order = Vec::with_capacity(n);
    let mut stack: Vec<usize> = forest.roots.clone();
    while let Some(node) = stack.pop() {
        order.push(node);
        stack.extend(forest.children[node].iter().copied());
    }
    for &node in order.iter().rev() {
        counts[node] = if forest.children[node].is_empty() {
            1
        } else {
            forest.children[node].iter().map(|&c| counts[c]).sum()
        };
    }
    counts
}

/// Parent→child tree layout; each root owns a band `width / roots` wide.
///
/// Depth runs down the y axis and sibling order across x. Nodes no root
/// reaches are lined up in rows beneath the tree.
pub fn hierarchy(nodes: &mut [Node], edges: &[Edge], dims: Dimensions, config: &HierarchyConfig) {
    if nodes.is_empty() {
        return;
    }
    let index = GraphIndex::new(nodes, edges);
    let forest = build_forest(&index);
    let leaves = leaf_counts(&forest, index.len());

    let band = dims.width / forest.roots.len() as f64;
    let mut max_depth = 0;
    // (node, left edge of its span, span width)
    let mut stack: Vec<(usize, f64, f64)> = forest
        .roots
        .iter()
        .enumerate()
        .map(|(i, &root)| (root, i as f64 * band, band))
        .collect();
    while let Some((node, left, width)) = stack.pop() {
        let depth = forest.depth[node].unwrap_or(0);
        max_depth = max_depth.max(depth);
        nodes[node].position = Some(Position::new(
            left + width / 2.0,
            config.top_margin + depth as f64 * config.level_gap,
        ));

        let total = leaves[node].max(1) as f64;
        let mut cursor = left;
        for &child in &forest.children[node] {
            let share = width * leaves[child] as f64 / total;
            stack.push((child, cursor, share));
            cursor += share;
        }
    }

    let orphans: Vec<usize> = (0..index.len())
        .filter(|&i| forest.depth[i].is_none())
        .collect();
    if !orphans.is_empty() {
        let spacing = config.orphan_spacing.max(2.0 * max_size(nodes) + 4.0);
        let columns = ((dims.width / spacing).floor() as usize).max(1);
        let origin = Position::new(
            spacing / 2.0,
            config.top_margin + (max_depth + 2) as f64 * config.level_gap,
        );
        for (&i, point) in orphans.iter().zip(grid_points(origin, orphans.len(), columns, spacing)) {
            nodes[i].position = Some(point);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_below_parent_within_band() {
        let mut nodes: Vec<Node> = ["r1", "a", "b", "r2", "c"]
            .iter()
            .map(|id| Node::new(*id, "t"))
            .collect();
        let edges = vec![
            Edge::new("1", "r1", "a"),
            Edge::new("2", "r1", "b"),
            Edge::new("3", "r2", "c"),
        ];
        let dims = Dimensions::new(800.0, 600.0);
        hierarchy(&mut nodes, &edges, dims, &HierarchyConfig::default());

        let pos = |i: usize| nodes[i].position.unwrap();
        assert_eq!(pos(0).x, 200.0);
        assert_eq!(pos(3).x, 600.0);
        assert!(pos(1).y > pos(0).y);
        assert!(pos(1).x < pos(2).x);
        assert!(pos(1).x >= 0.0 && pos(2).x <= 400.0);
        assert!(pos(4).x >= 400.0);
    }

    #[test]
    fn test_cycle_without_root_uses_first_node() {
        let mut nodes: Vec<Node> = ["a", "b", "c"].iter().map(|id| Node::new(*id, "t")).collect();
        let edges = vec![
            Edge::new("1", "a", "b"),
            Edge::new("2", "b", "c"),
            Edge::new("3", "c", "a"),
        ];
        hierarchy(&mut nodes, &edges, Dimensions::new(300.0, 300.0), &HierarchyConfig::default());
        let ys: Vec<f64> = nodes.iter().map(|n| n.position.unwrap().y).collect();
        assert_eq!(ys, vec![50.0, 150.0, 250.0]);
    }

    #[test]
    fn test_unreachable_cycle_goes_below_tree() {
        let mut nodes: Vec<Node> = ["root", "child", "x", "y"]
            .iter()
            .map(|id| Node::new(*id, "t"))
            .collect();
        let edges = vec![
            Edge::new("1", "root", "child"),
            Edge::new("2", "x", "y"),
            Edge::new("3", "y", "x"),
        ];
        hierarchy(&mut nodes, &edges, Dimensions::new(400.0, 400.0), &HierarchyConfig::default());
        let tree_bottom = nodes[1].position.unwrap().y;
        assert!(nodes[2].position.unwrap().y > tree_bottom);
        assert!(nodes[3].position.unwrap().y > tree_bottom);
    }
}
