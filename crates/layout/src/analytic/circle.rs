use crate::config::CircleConfig;
use crate::types::{Dimensions, Node};

use super::{max_size, ring_points, ring_radius_for};

/// Places nodes on one ring at equal angles, in input order.
pub fn circle(nodes: &mut [Node], dims: Dimensions, config: &CircleConfig) {
    if nodes.is_empty() {
        return;
    }
    let center = config.center.unwrap_or_else(|| dims.center());
    let fitted = (dims.width.min(dims.height) / 2.0 - config.margin).max(0.0);
    // never shrink the ring below what keeps neighbours apart
    let minimum = ring_radius_for(nodes.len(), 2.0 * max_size(nodes) + 4.0);
    let radius = config.radius.unwrap_or(fitted).max(minimum);

    let points = ring_points(center, radius, nodes.len());
    for (node, point) in nodes.iter_mut().zip(points) {
        node.position = Some(point);
    }
}
