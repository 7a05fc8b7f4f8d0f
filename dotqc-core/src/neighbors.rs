//! Nearest-neighbor search capability.

use crate::point::Point;

/// Trait for nearest-neighbor search over a 2D point set.
pub trait NeighborSearch: Send + Sync {
    /// For every point, the distance to its closest *other* point.
    ///
    /// Coincident points count as neighbors at distance zero. Returns an
    /// empty vector when fewer than two points are given, since no point
    /// then has a neighbor.
    fn nearest_distances(&self, points: &[Point]) -> Vec<f64>;

    /// Returns the name of the search structure.
    fn name(&self) -> &'static str;
}

/// Exhaustive pairwise search.
///
/// Quadratic in the number of points; serves as the reference other
/// implementations are checked against.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceSearch;

impl NeighborSearch for BruteForceSearch {
    fn nearest_distances(&self, points: &[Point]) -> Vec<f64> {
        if points.len() < 2 {
            return Vec::new();
        }
        points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                points
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, q)| p.distance_sq(q))
                    .fold(f64::INFINITY, f64::min)
                    .sqrt()
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "BruteForce"
    }
}
