//! One-shot placement functions.
//!
//! Each function writes a position to every node exactly once and keeps no
//! state between calls. Identical input order and dimensions always produce
//! identical coordinates.

mod circle;
mod fast;
mod hierarchy;
mod radial;

pub use circle::circle;
pub use fast::fast;
pub use hierarchy::hierarchy;
pub use radial::{RadialLevels, radial, radial_levels};

use std::f64::consts::TAU;

use crate::config::LayoutSettings;
use crate::types::{Dimensions, Edge, Node, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticKind {
    Circle,
    Radial,
    Hierarchy,
    Fast,
}

/// Runs the placement for `kind` over `nodes` in place.
pub fn run(
    kind: AnalyticKind,
    nodes: &mut [Node],
    edges: &[Edge],
    dims: Dimensions,
    settings: &LayoutSettings,
) {
    if nodes.is_empty() {
        return;
    }
    match kind {
        AnalyticKind::Circle => circle(nodes, dims, &settings.circle),
        AnalyticKind::Radial => radial(nodes, edges, dims, &settings.radial),
        AnalyticKind::Hierarchy => hierarchy(nodes, edges, dims, &settings.hierarchy),
        AnalyticKind::Fast => fast(nodes, dims, &settings.fast),
    }
}

/// Largest rendered radius in the set, used to keep rings and grids from overlapping.
pub(crate) fn max_size(nodes: &[Node]) -> f64 {
    nodes
        .iter()
        .map(|n| n.size)
        .filter(|s| s.is_finite())
        .fold(0.0, f64::max)
}

/// Smallest ring radius that fits `count` nodes `spacing` apart along the arc.
pub(crate) fn ring_radius_for(count: usize, spacing: f64) -> f64 {
    if count <= 1 {
        0.0
    } else {
        count as f64 * spacing / TAU
    }
}

/// `count` evenly spaced points on a ring, starting at twelve o'clock.
pub(crate) fn ring_points(center: Position, radius: f64, count: usize) -> Vec<Position> {
    (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64 - TAU / 4.0;
            Position::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect()
}

/// Row-major grid of `count` cells, `spacing` apart, starting at `origin`.
pub(crate) fn grid_points(origin: Position, count: usize, columns: usize, spacing: f64) -> Vec<Position> {
    let columns = columns.max(1);
    (0..count)
        .map(|i| {
            Position::new(
                origin.x + (i % columns) as f64 * spacing,
                origin.y + (i / columns) as f64 * spacing,
            )
        })
        .collect()
}
