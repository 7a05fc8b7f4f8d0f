//! Distribution metrics over marker points.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::must_use_candidate
)]

use dotqc_core::{
    Clustering, Metrics, MetricsConfig, NeighborSearch, Point, PointClusterer,
};

use crate::dbscan::{DbscanClustering, DbscanConfig};
use crate::spatial::GridNeighborSearch;

/// Nearest-neighbor distance summary.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NeighborStats {
    /// Smallest nearest-neighbor distance; `None` for fewer than two points.
    pub min_distance: Option<f64>,
    /// Population standard deviation over mean; `None` for fewer than two
    /// points or a zero mean.
    pub cv: Option<f64>,
}

impl NeighborStats {
    /// Summarize a list of per-point nearest-neighbor distances.
    pub fn from_distances(distances: &[f64]) -> Self {
        if distances.len() < 2 {
            return Self::default();
        }
        let n = distances.len() as f64;
        let min_distance = distances.iter().copied().fold(f64::INFINITY, f64::min);
        let mean = distances.iter().sum::<f64>() / n;
        let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
        let cv = (mean > 0.0).then(|| variance.sqrt() / mean);
        Self {
            min_distance: Some(min_distance),
            cv,
        }
    }
}

/// Returns true if some point's nearest other point is strictly closer than `min_gap`.
pub fn has_overlap(points: &[Point], min_gap: f64) -> bool {
    has_overlap_with(&GridNeighborSearch::default(), points, min_gap)
}

/// [`has_overlap`] with an explicit neighbor search.
pub fn has_overlap_with<S: NeighborSearch + ?Sized>(search: &S, points: &[Point], min_gap: f64) -> bool {
    if points.len() < 2 {
        return false;
    }
    search.nearest_distances(points).iter().any(|&d| d < min_gap)
}

fn dbscan(eps: f64, min_samples: usize) -> DbscanClustering {
    DbscanClustering::new(DbscanConfig {
        epsilon: eps,
        min_points: min_samples,
    })
}

fn cluster_if_enough<C: PointClusterer + ?Sized>(
    clusterer: &C,
    points: &[Point],
    min_samples: usize,
) -> Clustering {
    if points.len() < min_samples {
        Clustering::all_noise(points.len())
    } else {
        clusterer.cluster(points)
    }
}

/// Size of the largest density cluster.
///
/// 0 when there are fewer than `min_samples` points or every point is noise.
pub fn max_cluster_size(points: &[Point], eps: f64, min_samples: usize) -> usize {
    cluster_if_enough(&dbscan(eps, min_samples), points, min_samples)
        .statistics()
        .max_cluster_size
}

/// Number of density clusters; 0 when there are fewer than `min_samples` points.
pub fn cluster_count(points: &[Point], eps: f64, min_samples: usize) -> usize {
    cluster_if_enough(&dbscan(eps, min_samples), points, min_samples).num_clusters
}

/// Normalized entropy of point counts over a `grid_n` x `grid_n` grid.
///
/// 1.0 means points are spread evenly over the cells, 0.0 that they all share
/// one cell. No points gives 0.0. Points on the far edges fold into the last
/// row/column.
pub fn grid_uniformity(points: &[Point], height: u32, width: u32, grid_n: usize) -> f64 {
    if points.is_empty() || grid_n < 2 {
        return 0.0;
    }
    let cell_w = f64::from(width) / grid_n as f64;
    let cell_h = f64::from(height) / grid_n as f64;
    let last = grid_n - 1;

    let mut hist = vec![0usize; grid_n * grid_n];
    for p in points {
        let ix = ((p.x / cell_w).floor().max(0.0) as usize).min(last);
        let iy = ((p.y / cell_h).floor().max(0.0) as usize).min(last);
        hist[iy * grid_n + ix] += 1;
    }

    let total = points.len() as f64;
    let mut entropy = 0.0;
    for &count in hist.iter().filter(|&&c| c > 0) {
        let p = count as f64 / total;
        entropy -= p * p.ln();
    }
    entropy / ((grid_n * grid_n) as f64).ln()
}

/// Nearest-neighbor distance statistics.
pub fn nearest_neighbor_stats(points: &[Point]) -> NeighborStats {
    nearest_neighbor_stats_with(&GridNeighborSearch::default(), points)
}

/// [`nearest_neighbor_stats`] with an explicit neighbor search.
pub fn nearest_neighbor_stats_with<S: NeighborSearch + ?Sized>(search: &S, points: &[Point]) -> NeighborStats {
    if points.len() < 2 {
        return NeighborStats::default();
    }
    NeighborStats::from_distances(&search.nearest_distances(points))
}

/// Computes metrics over a point set with pluggable search and clustering.
pub struct MetricEngine<S = GridNeighborSearch, C = DbscanClustering> {
    search: S,
    clusterer: C,
    config: MetricsConfig,
}

impl MetricEngine {
    /// Engine using the spatial grid search and DBSCAN from `config`.
    pub fn new(config: MetricsConfig) -> Self {
        let clusterer = DbscanClustering::new(DbscanConfig::from(&config));
        Self {
            search: GridNeighborSearch::new(config.eps.max(config.min_gap()).max(1.0)),
            clusterer,
            config,
        }
    }
}

impl<S: NeighborSearch, C: PointClusterer> MetricEngine<S, C> {
    /// Engine with explicit capability implementations.
    pub fn with_parts(search: S, clusterer: C, config: MetricsConfig) -> Self {
        Self {
            search,
            clusterer,
            config,
        }
    }

    /// Every metric for `points` in a `width` x `height` image.
    ///
    /// Runs the neighbor search and the clustering once each.
    pub fn compute(&self, points: &[Point], height: u32, width: u32) -> Metrics {
        let distances = if points.len() < 2 {
            Vec::new()
        } else {
            self.search.nearest_distances(points)
        };
        let min_gap = self.config.min_gap();
        let overlap = distances.iter().any(|&d| d < min_gap);
        let neighbor_stats = NeighborStats::from_distances(&distances);

        let clustering = cluster_if_enough(&self.clusterer, points, self.config.min_samples);
        let stats = clustering.statistics();

        let metrics = Metrics {
            overlap,
            max_cluster: stats.max_cluster_size,
            uniformity: grid_uniformity(points, height, width, self.config.grid_n),
            spot_count: points.len(),
            min_nn_distance: neighbor_stats.min_distance,
            nn_cv: neighbor_stats.cv,
            cluster_count: stats.num_clusters,
        };
        log::debug!(
            "metrics via {}/{}: {} points, {} clusters, {} noise, uniformity {:.4}",
            self.search.name(),
            self.clusterer.name(),
            metrics.spot_count,
            metrics.cluster_count,
            stats.noise_points,
            metrics.uniformity
        );
        metrics
    }
}

/// Every metric for `points` with the default search and clustering.
pub fn compute_metrics(points: &[Point], height: u32, width: u32, config: &MetricsConfig) -> Metrics {
    MetricEngine::new(config.clone()).compute(points, height, width)
}
