//! Clustering traits and types.

use crate::point::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cluster label assigned to points that belong to no cluster.
pub const NOISE: i32 = -1;

/// Result of running a clustering algorithm over a point set.
///
/// `labels[i]` is the cluster of `points[i]`: `0..num_clusters` for cluster
/// members, [`NOISE`] otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Clustering {
    /// Per-point cluster labels.
    pub labels: Vec<i32>,
    /// Number of distinct non-noise clusters.
    pub num_clusters: usize,
}

impl Clustering {
    /// A clustering in which every point is noise.
    #[must_use]
    pub fn all_noise(len: usize) -> Self {
        Self {
            labels: vec![NOISE; len],
            num_clusters: 0,
        }
    }

    /// Returns the number of member points per cluster.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.num_clusters];
        for &label in &self.labels {
            if label >= 0 {
                if let Some(size) = sizes.get_mut(label as usize) {
                    *size += 1;
                }
            }
        }
        sizes
    }

    /// Returns the number of noise points.
    #[must_use]
    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&label| label == NOISE).count()
    }

    /// Summarizes the clustering.
    #[must_use]
    pub fn statistics(&self) -> ClusteringStatistics {
        let sizes = self.cluster_sizes();
        ClusteringStatistics {
            num_clusters: self.num_clusters,
            max_cluster_size: sizes.iter().copied().max().unwrap_or(0),
            noise_points: self.noise_count(),
        }
    }
}

/// Statistics from a clustering run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusteringStatistics {
    /// Number of clusters found.
    pub num_clusters: usize,
    /// Size of the largest cluster (0 when there are none).
    pub max_cluster_size: usize,
    /// Number of points classified as noise.
    pub noise_points: usize,
}

/// Trait for density-based point clustering algorithms.
pub trait PointClusterer: Send + Sync {
    /// Assigns every point to a cluster or to noise.
    fn cluster(&self, points: &[Point]) -> Clustering;

    /// Returns the name of the algorithm.
    fn name(&self) -> &'static str;
}
