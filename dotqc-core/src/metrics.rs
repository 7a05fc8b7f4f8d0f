//! Distribution metrics and quality labels.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Quality label of a dot distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Label {
    /// Acceptable distribution.
    A,
    /// Unacceptable distribution.
    B,
}

impl Label {
    /// Returns true for the acceptable label.
    #[must_use]
    pub fn is_acceptable(self) -> bool {
        self == Label::A
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::A => f.write_str("A"),
            Label::B => f.write_str("B"),
        }
    }
}

/// Statistics computed over the combined marker point set.
///
/// `None` marks a statistic that is undefined for the given points (fewer
/// than two markers, or a zero mean for the variation coefficient). It is
/// never folded into `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Metrics {
    /// True if some marker is closer than the minimum gap to another.
    pub overlap: bool,
    /// Size of the largest density cluster (0 when there is none).
    pub max_cluster: usize,
    /// Normalized grid entropy in `[0, 1]`.
    pub uniformity: f64,
    /// Number of markers analysed.
    pub spot_count: usize,
    /// Smallest nearest-neighbor distance.
    pub min_nn_distance: Option<f64>,
    /// Coefficient of variation of nearest-neighbor distances.
    pub nn_cv: Option<f64>,
    /// Number of density clusters.
    pub cluster_count: usize,
}
