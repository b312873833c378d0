use std::collections::HashMap;

use crate::config::FastConfig;
use crate::types::{Dimensions, Node, Position};

use super::{grid_points, max_size, ring_points};

/// Number of rings (after the center slot) needed for `count` nodes.
fn rings_needed(count: usize, capacity: usize) -> usize {
    let mut remaining = count.saturating_sub(1);
    let mut ring = 0;
    while remaining > 0 {
        ring += 1;
        remaining = remaining.saturating_sub(capacity * ring);
    }
    ring
}

/// Center slot first, then rings holding `capacity × ring` nodes each.
fn cluster_points(center: Position, count: usize, capacity: usize, gap: f64) -> Vec<Position> {
    let mut points = Vec::with_capacity(count);
    if count == 0 {
        return points;
    }
    points.push(center);
    let mut ring = 0;
    while points.len() < count {
        ring += 1;
        let take = (capacity * ring).min(count - points.len());
        points.extend(ring_points(center, ring as f64 * gap, take));
    }
    points
}

/// Quick clustered starting layout in linear time.
///
/// Nodes sharing a `subgraph` get one grid cell each and are packed in
/// concentric rings inside it; nodes without one go on a plain grid below the
/// cells. With no subgraph anywhere the whole set is a plain grid.
pub fn fast(nodes: &mut [Node], dims: Dimensions, config: &FastConfig) {
    if nodes.is_empty() {
        return;
    }
    let clearance = 2.0 * max_size(nodes) + 4.0;
    let spacing = config.grid_spacing.max(clearance);

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut group_of: HashMap<&str, usize> = HashMap::new();
    let mut ungrouped = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        match node.subgraph.as_deref() {
            Some(key) => {
                let slot = *group_of.entry(key).or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                });
                groups[slot].push(i);
            }
            None => ungrouped.push(i),
        }
    }

    let positions: Vec<Position> = if groups.is_empty() {
        let columns = (nodes.len() as f64).sqrt().ceil() as usize;
        let width = (columns.max(1) - 1) as f64 * spacing;
        let origin = Position::new((dims.width - width) / 2.0, spacing / 2.0);
        grid_points(origin, nodes.len(), columns, spacing)
    } else {
        let capacity = config.ring_capacity.max(1);
        let gap = config.ring_gap.max(clearance);
        let largest = groups.iter().map(Vec::len).max().unwrap_or(1);
        let cell = 2.0 * rings_needed(largest, capacity) as f64 * gap + gap;
        let columns = (groups.len() as f64).sqrt().ceil() as usize;

        let mut positions = vec![Position::ORIGIN; nodes.len()];
        for (g, members) in groups.iter().enumerate() {
            let center = Position::new(
                (g % columns) as f64 * cell + cell / 2.0,
                (g / columns) as f64 * cell + cell / 2.0,
            );
            for (&i, point) in members.iter().zip(cluster_points(center, members.len(), capacity, gap)) {
                positions[i] = point;
            }
        }

        let rows = groups.len().div_ceil(columns);
        let origin = Position::new(spacing / 2.0, rows as f64 * cell + spacing / 2.0);
        let grid_columns = ((columns as f64 * cell / spacing).floor() as usize).max(1);
        for (&i, point) in ungrouped
            .iter()
            .zip(grid_points(origin, ungrouped.len(), grid_columns, spacing))
        {
            positions[i] = point;
        }
        positions
    };

    for (node, position) in nodes.iter_mut().zip(positions) {
        node.position = Some(position);
    }
}
