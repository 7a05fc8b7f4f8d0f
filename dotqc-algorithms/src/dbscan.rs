//! Grid-accelerated DBSCAN over marker points.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::must_use_candidate
)]

use dotqc_core::clustering::{Clustering, PointClusterer, NOISE};
use dotqc_core::{MetricsConfig, Point};

use crate::spatial::SpatialGrid;

/// DBSCAN parameters.
#[derive(Clone, Debug)]
pub struct DbscanConfig {
    /// Neighborhood radius (inclusive).
    pub epsilon: f64,
    /// Neighborhood size, the point itself included, that makes a core point.
    pub min_points: usize,
}

impl Default for DbscanConfig {
    fn default() -> Self {
        Self {
            epsilon: 30.0,
            min_points: 6,
        }
    }
}

impl From<&MetricsConfig> for DbscanConfig {
    fn from(config: &MetricsConfig) -> Self {
        Self {
            epsilon: config.eps,
            min_points: config.min_samples,
        }
    }
}

/// Density-based clustering over a spatial grid.
pub struct DbscanClustering {
    config: DbscanConfig,
}

/// Reusable buffers for repeated clustering runs.
#[derive(Default)]
pub struct DbscanState {
    visited: Vec<bool>,
    noise: Vec<bool>,
    neighbors: Vec<usize>,
    seeds: Vec<usize>,
}

/// Mutable tracking state used during DBSCAN clustering.
struct TrackingState<'a> {
    visited: &'a mut [bool],
    noise: &'a mut [bool],
    labels: &'a mut [i32],
}

impl DbscanClustering {
    /// Create a clusterer with the given parameters.
    pub fn new(config: DbscanConfig) -> Self {
        Self { config }
    }

    /// Fresh reusable buffers.
    pub fn create_state(&self) -> DbscanState {
        DbscanState::default()
    }

    /// Cluster `points`, reusing the buffers in `state`.
    ///
    /// Points are visited in index order; a border point reachable from
    /// several clusters joins the first one that reaches it.
    pub fn cluster_with_state(&self, points: &[Point], state: &mut DbscanState) -> Clustering {
        let n = points.len();
        if n == 0 || n < self.config.min_points {
            return Clustering::all_noise(n);
        }

        let grid = SpatialGrid::from_points(points, self.config.epsilon.max(1.0));
        let mut labels = vec![NOISE; n];

        if state.visited.len() < n {
            state.visited.resize(n, false);
            state.noise.resize(n, false);
        }
        state.visited[..n].fill(false);
        state.noise[..n].fill(false);

        let neighbors_buffer = &mut state.neighbors;
        let seeds_buffer = &mut state.seeds;
        let mut tracking = TrackingState {
            visited: &mut state.visited[..n],
            noise: &mut state.noise[..n],
            labels: &mut labels,
        };

        let mut current_cluster_id = 0;
        for i in 0..n {
            if tracking.visited[i] {
                continue;
            }
            tracking.visited[i] = true;

            grid.within_radius(points, &points[i], self.config.epsilon, neighbors_buffer);

            if neighbors_buffer.len() < self.config.min_points {
                tracking.noise[i] = true;
            } else {
                tracking.labels[i] = current_cluster_id;
                seeds_buffer.clear();
                seeds_buffer.extend_from_slice(neighbors_buffer);
                self.expand_cluster(
                    &grid,
                    points,
                    seeds_buffer,
                    current_cluster_id,
                    &mut tracking,
                    neighbors_buffer,
                );
                current_cluster_id += 1;
            }
        }

        log::trace!(
            "dbscan: {} points, {} clusters (eps={}, min_points={})",
            n,
            current_cluster_id,
            self.config.epsilon,
            self.config.min_points
        );

        Clustering {
            labels,
            num_clusters: current_cluster_id as usize,
        }
    }

    fn expand_cluster(
        &self,
        grid: &SpatialGrid,
        points: &[Point],
        seeds: &mut Vec<usize>,
        cluster_id: i32,
        tracking: &mut TrackingState,
        neighbors: &mut Vec<usize>,
    ) {
        let mut i = 0;
        while i < seeds.len() {
            let current_p = seeds[i];
            i += 1;

            if tracking.noise[current_p] {
                tracking.noise[current_p] = false;
                tracking.labels[current_p] = cluster_id;
            }

            if !tracking.visited[current_p] {
                tracking.visited[current_p] = true;
                tracking.labels[current_p] = cluster_id;

                grid.within_radius(points, &points[current_p], self.config.epsilon, neighbors);
                if neighbors.len() >= self.config.min_points {
                    seeds.extend_from_slice(neighbors);
                }
            } else if tracking.labels[current_p] == NOISE {
                tracking.labels[current_p] = cluster_id;
            }
        }
    }
}

impl PointClusterer for DbscanClustering {
    fn cluster(&self, points: &[Point]) -> Clustering {
        let mut state = self.create_state();
        self.cluster_with_state(points, &mut state)
    }

    fn name(&self) -> &'static str {
        "DBSCAN"
    }
}
