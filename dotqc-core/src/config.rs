//! Analysis configuration.
//!
//! Every tunable of the pipeline lives here with its default. Nothing in the
//! algorithms crate reads process-wide constants; each operation receives the
//! relevant section of [`AnalysisConfig`] explicitly.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the multi-threshold spot detector.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SpotDetectorConfig {
    /// Minimum blob area in pixels (default: 100).
    pub min_area: f64,
    /// Maximum blob area in pixels (default: 400).
    pub max_area: f64,
    /// First binarization threshold (default: 100).
    pub min_threshold: u32,
    /// Thresholds stop strictly below this value (default: 500).
    pub max_threshold: u32,
    /// Increment between binarization thresholds (default: 10).
    pub threshold_step: u32,
    /// Centers closer than this across thresholds merge into one blob (default: 10.0).
    pub min_dist_between_blobs: f64,
    /// Number of thresholds a blob must appear at to be reported (default: 2).
    pub min_repeatability: usize,
}

impl Default for SpotDetectorConfig {
    fn default() -> Self {
        Self {
            min_area: 100.0,
            max_area: 400.0,
            min_threshold: 100,
            max_threshold: 500,
            threshold_step: 10,
            min_dist_between_blobs: 10.0,
            min_repeatability: 2,
        }
    }
}

impl SpotDetectorConfig {
    /// Set the accepted blob area range.
    #[must_use]
    pub fn with_area_range(mut self, min_area: f64, max_area: f64) -> Self {
        self.min_area = min_area;
        self.max_area = max_area;
        self
    }

    /// Set the binarization threshold range.
    #[must_use]
    pub fn with_threshold_range(mut self, min_threshold: u32, max_threshold: u32) -> Self {
        self.min_threshold = min_threshold;
        self.max_threshold = max_threshold;
        self
    }

    /// Set the threshold step.
    #[must_use]
    pub fn with_threshold_step(mut self, step: u32) -> Self {
        self.threshold_step = step;
        self
    }

    /// Set the minimum repeatability.
    #[must_use]
    pub fn with_min_repeatability(mut self, repeatability: usize) -> Self {
        self.min_repeatability = repeatability;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.threshold_step == 0 {
            return Err(Error::ConfigError("threshold_step must be positive".into()));
        }
        if self.min_area > self.max_area {
            return Err(Error::ConfigError(format!(
                "detector min_area {} exceeds max_area {}",
                self.min_area, self.max_area
            )));
        }
        if self.min_threshold > self.max_threshold {
            return Err(Error::ConfigError(format!(
                "min_threshold {} exceeds max_threshold {}",
                self.min_threshold, self.max_threshold
            )));
        }
        if self.min_repeatability == 0 {
            return Err(Error::ConfigError(
                "min_repeatability must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for filling large saturated regions with synthetic dots.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct RegionFillerConfig {
    /// Minimum contour area for a region to be filled (default: 200).
    pub min_area: f64,
    /// Maximum contour area for a region to be filled (default: 20000).
    pub max_area: f64,
    /// Binarization threshold; pixels strictly brighter are foreground (default: 200).
    pub threshold: u8,
    /// Radius of the painted marker circles (default: 5).
    pub dot_radius: u32,
    /// Spacing of the sampling grid (default: 8).
    pub dot_step: u32,
    /// Side of the elliptical closing kernel; must be odd (default: 9).
    pub morph_kernel_size: u32,
}

impl Default for RegionFillerConfig {
    fn default() -> Self {
        Self {
            min_area: 200.0,
            max_area: 20_000.0,
            threshold: 200,
            dot_radius: 5,
            dot_step: 8,
            morph_kernel_size: 9,
        }
    }
}

impl RegionFillerConfig {
    /// Set the accepted region area range.
    #[must_use]
    pub fn with_area_range(mut self, min_area: f64, max_area: f64) -> Self {
        self.min_area = min_area;
        self.max_area = max_area;
        self
    }

    /// Set the binarization threshold.
    #[must_use]
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the sampling grid spacing.
    #[must_use]
    pub fn with_dot_step(mut self, step: u32) -> Self {
        self.dot_step = step;
        self
    }

    /// Set the painted dot radius.
    #[must_use]
    pub fn with_dot_radius(mut self, radius: u32) -> Self {
        self.dot_radius = radius;
        self
    }

    /// Set the closing kernel size.
    #[must_use]
    pub fn with_morph_kernel_size(mut self, size: u32) -> Self {
        self.morph_kernel_size = size;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.dot_step == 0 {
            return Err(Error::ConfigError("dot_step must be positive".into()));
        }
        if self.morph_kernel_size % 2 == 0 || self.morph_kernel_size > 511 {
            return Err(Error::ConfigError(format!(
                "morph_kernel_size must be odd and at most 511, got {}",
                self.morph_kernel_size
            )));
        }
        if i32::try_from(self.dot_radius).is_err() {
            return Err(Error::ConfigError(format!(
                "dot_radius {} is out of range",
                self.dot_radius
            )));
        }
        if self.min_area > self.max_area {
            return Err(Error::ConfigError(format!(
                "region min_area {} exceeds max_area {}",
                self.min_area, self.max_area
            )));
        }
        Ok(())
    }
}

/// Configuration for the distribution metrics.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct MetricsConfig {
    /// Nominal marker radius in pixels (default: 5).
    pub marker_radius: f64,
    /// DBSCAN neighborhood radius in pixels (default: 30.0).
    pub eps: f64,
    /// DBSCAN minimum neighborhood size, the point itself included (default: 6).
    pub min_samples: usize,
    /// Cells per side of the uniformity grid (default: 12).
    pub grid_n: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            marker_radius: 5.0,
            eps: 30.0,
            min_samples: 6,
            grid_n: 12,
        }
    }
}

impl MetricsConfig {
    /// Minimum allowed distance between marker centers: `2 * radius + 1`.
    #[must_use]
    pub fn min_gap(&self) -> f64 {
        2.0 * self.marker_radius + 1.0
    }

    /// Set the marker radius.
    #[must_use]
    pub fn with_marker_radius(mut self, radius: f64) -> Self {
        self.marker_radius = radius;
        self
    }

    /// Set the DBSCAN radius.
    #[must_use]
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Set the DBSCAN minimum samples.
    #[must_use]
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Set the uniformity grid resolution.
    #[must_use]
    pub fn with_grid_n(mut self, grid_n: usize) -> Self {
        self.grid_n = grid_n;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.grid_n < 2 {
            return Err(Error::ConfigError(format!(
                "grid_n must be at least 2, got {}",
                self.grid_n
            )));
        }
        if self.min_samples == 0 {
            return Err(Error::ConfigError("min_samples must be at least 1".into()));
        }
        if self.eps.is_nan() || self.eps < 0.0 {
            return Err(Error::ConfigError(format!(
                "eps must be non-negative, got {}",
                self.eps
            )));
        }
        if self.marker_radius.is_nan() || self.marker_radius < 0.0 {
            return Err(Error::ConfigError(format!(
                "marker_radius must be non-negative, got {}",
                self.marker_radius
            )));
        }
        Ok(())
    }
}

/// Thresholds of the acceptance rule.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct ClassifierConfig {
    /// Largest cluster must be strictly smaller than this (default: 15).
    pub max_cluster_threshold: usize,
    /// Uniformity must be at least this (default: 0.89).
    pub uniformity_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_cluster_threshold: 15,
            uniformity_threshold: 0.89,
        }
    }
}

impl ClassifierConfig {
    fn validate(&self) -> Result<()> {
        if self.uniformity_threshold.is_nan() {
            return Err(Error::ConfigError("uniformity_threshold must be a number".into()));
        }
        Ok(())
    }
}

/// Full pipeline configuration.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct AnalysisConfig {
    /// Spot detector settings.
    pub detector: SpotDetectorConfig,
    /// Region filler settings.
    pub filler: RegionFillerConfig,
    /// Metric engine settings.
    pub metrics: MetricsConfig,
    /// Classifier thresholds.
    pub classifier: ClassifierConfig,
}

impl AnalysisConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum cluster threshold of the classifier.
    #[must_use]
    pub fn with_max_cluster_threshold(mut self, threshold: usize) -> Self {
        self.classifier.max_cluster_threshold = threshold;
        self
    }

    /// Set the uniformity threshold of the classifier.
    #[must_use]
    pub fn with_uniformity_threshold(mut self, threshold: f64) -> Self {
        self.classifier.uniformity_threshold = threshold;
        self
    }

    /// Set the spot detector area range.
    #[must_use]
    pub fn with_area_range(mut self, min_area: f64, max_area: f64) -> Self {
        self.detector = self.detector.with_area_range(min_area, max_area);
        self
    }

    /// Set the spot detector threshold range.
    #[must_use]
    pub fn with_threshold_range(mut self, min_threshold: u32, max_threshold: u32) -> Self {
        self.detector = self
            .detector
            .with_threshold_range(min_threshold, max_threshold);
        self
    }

    /// Set the DBSCAN radius.
    #[must_use]
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.metrics.eps = eps;
        self
    }

    /// Set the DBSCAN minimum samples.
    #[must_use]
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.metrics.min_samples = min_samples;
        self
    }

    /// Set the minimum area of regions handed to the region filler.
    #[must_use]
    pub fn with_big_region_min_area(mut self, min_area: f64) -> Self {
        self.filler.min_area = min_area;
        self
    }

    /// Checks every section for values the algorithms cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        self.filler.validate()?;
        self.metrics.validate()?;
        self.classifier.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.classifier.max_cluster_threshold, 15);
        assert_relative_eq!(config.classifier.uniformity_threshold, 0.89);
        assert_relative_eq!(config.detector.min_area, 100.0);
        assert_relative_eq!(config.detector.max_area, 400.0);
        assert_eq!(config.detector.min_threshold, 100);
        assert_eq!(config.detector.max_threshold, 500);
        assert_relative_eq!(config.metrics.eps, 30.0);
        assert_eq!(config.metrics.min_samples, 6);
        assert_relative_eq!(config.filler.min_area, 200.0);
        assert_relative_eq!(config.filler.max_area, 20_000.0);
        assert_relative_eq!(config.metrics.min_gap(), 11.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = AnalysisConfig::new()
            .with_max_cluster_threshold(20)
            .with_uniformity_threshold(0.5)
            .with_area_range(50.0, 2000.0)
            .with_threshold_range(80, 255)
            .with_eps(12.5)
            .with_min_samples(3)
            .with_big_region_min_area(500.0);

        assert_eq!(config.classifier.max_cluster_threshold, 20);
        assert_relative_eq!(config.classifier.uniformity_threshold, 0.5);
        assert_relative_eq!(config.detector.min_area, 50.0);
        assert_relative_eq!(config.detector.max_area, 2000.0);
        assert_eq!(config.detector.min_threshold, 80);
        assert_eq!(config.detector.max_threshold, 255);
        assert_relative_eq!(config.metrics.eps, 12.5);
        assert_eq!(config.metrics.min_samples, 3);
        assert_relative_eq!(config.filler.min_area, 500.0);
        // The filler range is independent of the detector range.
        assert_relative_eq!(config.filler.max_area, 20_000.0);
    }

    #[test]
    fn test_min_gap_follows_radius() {
        let metrics = MetricsConfig::default().with_marker_radius(3.0);
        assert_relative_eq!(metrics.min_gap(), 7.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AnalysisConfig::default();
        config.metrics.grid_n = 1;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let mut config = AnalysisConfig::default();
        config.filler.dot_step = 0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.filler.morph_kernel_size = 8;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.detector.threshold_step = 0;
        assert!(config.validate().is_err());

        let config = AnalysisConfig::default().with_area_range(500.0, 100.0);
        assert!(config.validate().is_err());

        let config = AnalysisConfig::default().with_eps(f64::NAN);
        assert!(config.validate().is_err());

        let config = AnalysisConfig::default().with_min_samples(0);
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.filler.morph_kernel_size = 513;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.filler.dot_radius = u32::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan_uniformity_threshold() {
        let config = AnalysisConfig::default().with_uniformity_threshold(f64::NAN);
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let config = AnalysisConfig::default().with_uniformity_threshold(1.0);
        assert!(config.validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"metrics": {"eps": 12.0}, "classifier": {}}"#).unwrap();
        assert_relative_eq!(config.metrics.eps, 12.0);
        assert_eq!(config.metrics.min_samples, 6);
        assert_eq!(config.detector, SpotDetectorConfig::default());
    }
}
