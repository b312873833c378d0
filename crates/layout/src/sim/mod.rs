//! Tick-driven physics layouts and the state they share.

mod force;
mod force_atlas2;
pub mod grid;
mod open_ord;

pub use force::ForceSimulation;
pub use force_atlas2::ForceAtlas2;
pub use open_ord::OpenOrd;

use std::collections::HashMap;
use std::f64::consts::TAU;

use crate::cache::PositionCache;
use crate::types::{Dimensions, Node, Position};

use grid::SpatialGrid;

/// Squared-distance floor applied before any division.
pub(crate) const MIN_DISTANCE_SQ: f64 = 1.0;

/// Per-node simulation state.
#[derive(Debug, Clone)]
pub struct Body {
    pub position: Position,
    pub vx: f64,
    pub vy: f64,
    pub mass: f64,
    pub size: f64,
    /// While set, the body sits here and skips integration.
    pub pin: Option<Position>,
}

impl Body {
    pub fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }

    /// Moves by `(dx, dy)` capped to `max` in length.
    pub(crate) fn displace(&mut self, dx: f64, dy: f64, max: f64) {
        let (dx, dy) = clamp_length(dx, dy, max);
        self.position.x += dx;
        self.position.y += dy;
    }

    /// Pinned bodies snap to their pin and lose all velocity.
    pub(crate) fn hold_pin(&mut self) -> bool {
        match self.pin {
            Some(pin) => {
                self.position = pin;
                self.vx = 0.0;
                self.vy = 0.0;
                true
            }
            None => false,
        }
    }
}

pub(crate) fn clamp_length(dx: f64, dy: f64, max: f64) -> (f64, f64) {
    if !dx.is_finite() || !dy.is_finite() {
        return (0.0, 0.0);
    }
    let len2 = dx * dx + dy * dy;
    if len2 > max * max {
        let s = max / len2.sqrt();
        (dx * s, dy * s)
    } else {
        (dx, dy)
    }
}

/// Bodies in node order plus the id lookup every strategy needs.
#[derive(Debug, Clone)]
pub struct Bodies {
    ids: Vec<String>,
    lookup: HashMap<String, usize>,
    pub(crate) items: Vec<Body>,
}

impl Bodies {
    /// Seeds from each node's position, falling back to the canvas center.
    pub fn from_nodes(nodes: &[Node], dims: Dimensions) -> Self {
        let center = dims.center();
        let mut ids = Vec::with_capacity(nodes.len());
        let mut lookup = HashMap::with_capacity(nodes.len());
        let mut items = Vec::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            ids.push(node.id.clone());
            lookup.entry(node.id.clone()).or_insert(i);
            let position = node.position.filter(Position::is_finite).unwrap_or(center);
            items.push(Body {
                position,
                vx: 0.0,
                vy: 0.0,
                mass: node.mass(),
                size: if node.size.is_finite() { node.size.max(0.0) } else { 0.0 },
                pin: None,
            });
        }
        Self { ids, lookup, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Body> {
        self.lookup.get(id).map(|&i| &self.items[i])
    }

    pub fn pin(&mut self, id: &str, position: Position) -> bool {
        if !position.is_finite() {
            return false;
        }
        let Some(&i) = self.lookup.get(id) else {
            return false;
        };
        let body = &mut self.items[i];
        body.pin = Some(position);
        body.hold_pin();
        true
    }

    pub fn unpin(&mut self, id: &str) -> bool {
        match self.lookup.get(id) {
            Some(&i) => self.items[i].pin.take().is_some(),
            None => false,
        }
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        self.get(id).is_some_and(Body::is_pinned)
    }

    /// Teleports a body without pinning it.
    pub fn set_position(&mut self, id: &str, position: Position) -> bool {
        if !position.is_finite() {
            return false;
        }
        let Some(&i) = self.lookup.get(id) else {
            return false;
        };
        let body = &mut self.items[i];
        body.position = position;
        body.vx = 0.0;
        body.vy = 0.0;
        if body.pin.is_some() {
            body.pin = Some(position);
        }
        true
    }

    pub fn write_to(&self, cache: &mut PositionCache) {
        for (id, body) in self.ids.iter().zip(&self.items) {
            cache.set(id, body.position);
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = (&str, Position)> {
        self.ids
            .iter()
            .zip(&self.items)
            .map(|(id, body)| (id.as_str(), body.position))
    }

    pub(crate) fn grid(&self, cell: f64) -> SpatialGrid {
        SpatialGrid::build(cell, self.items.iter().map(|b| &b.position))
    }
}

/// Pushes apart every pair closer than `min_distance`.
///
/// Repeats until a full pass finds no overlap, for at least `iterations`
/// passes and at least one pass per body. Free pairs still too close after
/// that are spread apart about their centroid. Pinned bodies stay put; a free
/// body overlapping a pinned one takes the whole correction.
pub(crate) fn resolve_overlaps(bodies: &mut Bodies, min_distance: f64, iterations: usize) {
    if bodies.len() < 2 || !(min_distance > 0.0) {
        return;
    }
    let min_sq = min_distance * min_distance;
    for _ in 0..iterations.max(bodies.len()) {
        let grid = bodies.grid(min_distance);
        let mut moved = false;
        let items = &mut bodies.items;
        grid.for_each_near_pair(|i, j| {
            let (pi, pj) = (items[i].position, items[j].position);
            let (fixed_i, fixed_j) = (items[i].is_pinned(), items[j].is_pinned());
            if fixed_i && fixed_j {
                return;
            }
            let mut dx = pj.x - pi.x;
            let mut dy = pj.y - pi.y;
            let d2 = dx * dx + dy * dy;
            if d2 >= min_sq {
                return;
            }
            let mut d = d2.sqrt();
            if d < 1e-9 {
                // coincident: separate along a direction derived from the pair
                let angle = (i * 31 + j * 17) as f64 * 0.618_034 * TAU;
                dx = angle.cos();
                dy = angle.sin();
                d = 1.0;
            }
            let (ux, uy) = (dx / d, dy / d);
            let deficit = (min_distance - d.min(min_distance)) * (1.0 + 1e-6) + 1e-9;
            let (share_i, share_j) = match (fixed_i, fixed_j) {
                (true, false) => (0.0, 1.0),
                (false, true) => (1.0, 0.0),
                _ => (0.5, 0.5),
            };
            items[i].position.x -= ux * deficit * share_i;
            items[i].position.y -= uy * deficit * share_i;
            items[j].position.x += ux * deficit * share_j;
            items[j].position.y += uy * deficit * share_j;
            moved = true;
        });
        if !moved {
            return;
        }
    }
    spread_free_bodies(bodies, min_distance);
}

/// Scales free bodies about their centroid so the closest free pair ends up
/// at least `min_distance` apart.
fn spread_free_bodies(bodies: &mut Bodies, min_distance: f64) {
    let grid = bodies.grid(min_distance);
    let items = &bodies.items;
    let mut closest = f64::INFINITY;
    grid.for_each_near_pair(|i, j| {
        if !items[i].is_pinned() && !items[j].is_pinned() {
            closest = closest.min(items[i].position.distance(&items[j].position));
        }
    });
    if !(closest < min_distance) || closest < 1e-9 {
        return;
    }

    let free: Vec<usize> = (0..items.len()).filter(|&i| !items[i].is_pinned()).collect();
    let count = free.len() as f64;
    let cx = free.iter().map(|&i| items[i].position.x).sum::<f64>() / count;
    let cy = free.iter().map(|&i| items[i].position.y).sum::<f64>() / count;
    let scale = min_distance / closest * (1.0 + 1e-6);
    for &i in &free {
        let body = &mut bodies.items[i];
        body.position.x = cx + (body.position.x - cx) * scale;
        body.position.y = cy + (body.position.y - cy) * scale;
    }
    tracing::debug!(scale, bodies = free.len(), "spread free bodies to clear overlaps");
}

/// Smallest centre distance between two free bodies; test helper.
#[cfg(test)]
pub(crate) fn min_free_distance(bodies: &Bodies) -> f64 {
    let mut best = f64::INFINITY;
    for i in 0..bodies.items.len() {
        for j in (i + 1)..bodies.items.len() {
            if bodies.items[i].is_pinned() || bodies.items[j].is_pinned() {
                continue;
            }
            best = best.min(bodies.items[i].position.distance(&bodies.items[j].position));
        }
    }
    best
}
