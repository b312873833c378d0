use std::collections::HashMap;

use crate::types::Position;

const NEIGHBORS: [(i32, i32); 9] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Uniform bucket grid for approximate pair searches.
///
/// Only pairs in the same or adjacent cells are visited, so a cell size at
/// least as large as the interaction range finds every pair in range.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell: f64,
    bins: HashMap<(i32, i32), Vec<usize>>,
    cells: Vec<(i32, i32)>,
}

impl SpatialGrid {
    pub fn build<'a>(cell: f64, positions: impl ExactSizeIterator<Item = &'a Position>) -> Self {
        let cell = if cell.is_finite() && cell > 0.0 { cell } else { 1.0 };
        let mut bins: HashMap<(i32, i32), Vec<usize>> = HashMap::with_capacity(positions.len() * 2);
        let mut cells = Vec::with_capacity(positions.len());
        for (i, p) in positions.enumerate() {
            let key = (Self::coord(p.x, cell), Self::coord(p.y, cell));
            bins.entry(key).or_default().push(i);
            cells.push(key);
        }
        Self { cell, bins, cells }
    }

    fn coord(v: f64, cell: f64) -> i32 {
        // saturating cast keeps far outliers in the edge buckets
        (v / cell).floor() as i32
    }

    pub fn cell_size(&self) -> f64 {
        self.cell
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Calls `f(i, j)` once for every unordered pair `i < j` in neighbouring cells.
    pub fn for_each_near_pair(&self, mut f: impl FnMut(usize, usize)) {
        for (i, &(gx, gy)) in self.cells.iter().enumerate() {
            for (dx, dy) in NEIGHBORS {
                // the edge buckets have no neighbour past the i32 range
                let (Some(nx), Some(ny)) = (gx.checked_add(dx), gy.checked_add(dy)) else {
                    continue;
                };
                if let Some(bucket) = self.bins.get(&(nx, ny)) {
                    for &j in bucket {
                        if j <= i {
                            continue;
                        }
                        f(i, j);
                    }
                }
            }
        }
    }
}
