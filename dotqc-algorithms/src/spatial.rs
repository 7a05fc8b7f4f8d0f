//! Spatial indexing for efficient neighbor lookup.
#![allow(clippy::cast_possible_truncation)]

use std::collections::HashMap;

use dotqc_core::{NeighborSearch, Point};
use rayon::prelude::*;

/// Spatial grid for efficient 2D neighbor queries.
///
/// The image plane is divided into square cells; each cell keeps the indices
/// of the points that fall inside it, in insertion order.
#[derive(Debug, Default)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<(i32, i32), Vec<usize>>,
    min_cell: (i32, i32),
    max_cell: (i32, i32),
}

impl SpatialGrid {
    /// Create a new, empty spatial grid.
    ///
    /// Non-positive or NaN cell sizes fall back to one pixel.
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 1.0 };
        Self {
            cell_size,
            cells: HashMap::new(),
            min_cell: (i32::MAX, i32::MAX),
            max_cell: (i32::MIN, i32::MIN),
        }
    }

    /// Build a grid holding every point of `points`, keyed by index.
    pub fn from_points(points: &[Point], cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (idx, point) in points.iter().enumerate() {
            grid.insert(point, idx);
        }
        grid
    }

    fn cell_of(&self, x: f64, y: f64) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Insert a point index at the point's location.
    pub fn insert(&mut self, point: &Point, idx: usize) {
        let cell = self.cell_of(point.x, point.y);
        self.min_cell = (self.min_cell.0.min(cell.0), self.min_cell.1.min(cell.1));
        self.max_cell = (self.max_cell.0.max(cell.0), self.max_cell.1.max(cell.1));
        self.cells.entry(cell).or_default().push(idx);
    }

    /// Collect the indices of all points within `radius` (inclusive) of `center`.
    ///
    /// `out` is cleared first. Indices come out in cell raster order, then
    /// insertion order, so repeated queries are reproducible.
    pub fn within_radius(&self, points: &[Point], center: &Point, radius: f64, out: &mut Vec<usize>) {
        out.clear();
        let radius_sq = radius * radius;
        let (x0, y0) = self.cell_of(center.x - radius, center.y - radius);
        let (x1, y1) = self.cell_of(center.x + radius, center.y + radius);

        for cy in y0.max(self.min_cell.1)..=y1.min(self.max_cell.1) {
            for cx in x0.max(self.min_cell.0)..=x1.min(self.max_cell.0) {
                if let Some(cell) = self.cells.get(&(cx, cy)) {
                    out.extend(
                        cell.iter()
                            .copied()
                            .filter(|&j| center.distance_sq(&points[j]) <= radius_sq),
                    );
                }
            }
        }
    }

    /// Squared distance from `points[idx]` to its closest other point.
    ///
    /// Searches outward ring by ring and stops once no unvisited cell can
    /// hold anything closer. Returns infinity if the point is alone.
    pub fn nearest_other_sq(&self, points: &[Point], idx: usize) -> f64 {
        let p = points[idx];
        let (cx, cy) = self.cell_of(p.x, p.y);
        let max_ring = (cx - self.min_cell.0)
            .abs()
            .max((self.max_cell.0 - cx).abs())
            .max((cy - self.min_cell.1).abs())
            .max((self.max_cell.1 - cy).abs());

        let mut best = f64::INFINITY;
        for ring in 0..=max_ring.max(0) {
            for dy in -ring..=ring {
                for dx in -ring..=ring {
                    if dx.abs() != ring && dy.abs() != ring {
                        continue;
                    }
                    if let Some(cell) = self.cells.get(&(cx + dx, cy + dy)) {
                        for &j in cell {
                            if j != idx {
                                best = best.min(p.distance_sq(&points[j]));
                            }
                        }
                    }
                }
            }
            // Anything outside this ring is at least `ring` whole cells away.
            let reach = f64::from(ring) * self.cell_size;
            if best <= reach * reach {
                break;
            }
        }
        best
    }
}

/// Nearest-neighbor search backed by a [`SpatialGrid`].
#[derive(Clone, Debug)]
pub struct GridNeighborSearch {
    cell_size: f64,
}

impl Default for GridNeighborSearch {
    fn default() -> Self {
        Self { cell_size: 32.0 }
    }
}

impl GridNeighborSearch {
    /// Create a search with the given grid cell size (pixels).
    pub fn new(cell_size: f64) -> Self {
        Self { cell_size }
    }
}

impl NeighborSearch for GridNeighborSearch {
    fn nearest_distances(&self, points: &[Point]) -> Vec<f64> {
        if points.len() < 2 {
            return Vec::new();
        }
        let grid = SpatialGrid::from_points(points, self.cell_size);
        (0..points.len())
            .into_par_iter()
            .map(|idx| grid.nearest_other_sq(points, idx).sqrt())
            .collect()
    }

    fn name(&self) -> &'static str {
        "SpatialGrid"
    }
}
