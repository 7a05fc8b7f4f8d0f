//! High-level analysis combining detection, region filling, metrics and classification.

use dotqc_core::error::{Error, Result};
use dotqc_core::{AnalysisConfig, Label, Metrics, PointSet};
use image::RgbImage;
use rayon::prelude::*;

use crate::classify::classify_metrics;
use crate::metrics::MetricEngine;
use crate::region::fill_large_bright_regions;
use crate::spot::detect_spots;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of analysing one image.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Quality label.
    pub label: Label,
    /// Every computed metric.
    pub metrics: Metrics,
    /// Markers found by the spot detector.
    pub detected_count: usize,
    /// Synthetic markers sampled inside large bright regions.
    pub filled_count: usize,
    /// Copy of the input with synthetic markers painted on.
    pub annotated: RgbImage,
}

/// Image-free part of an [`AnalysisResult`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisSummary {
    /// Quality label.
    pub label: Label,
    /// Every computed metric.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub metrics: Metrics,
    /// Markers found by the spot detector.
    pub detected_count: usize,
    /// Synthetic markers from region filling.
    pub filled_count: usize,
}

impl AnalysisResult {
    /// Drop the annotated image.
    #[must_use]
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            label: self.label,
            metrics: self.metrics,
            detected_count: self.detected_count,
            filled_count: self.filled_count,
        }
    }
}

/// Analyse the dot distribution of one RGB image.
///
/// The spot detector reads the source image; the region filler paints a copy
/// that becomes the annotated output. Their points are concatenated, detected
/// first, and fed to the metric engine and the classifier.
///
/// # Errors
/// [`Error::EmptyImage`] for a zero-sized image and [`Error::ConfigError`]
/// when `config` fails validation.
pub fn analyse(image: &RgbImage, config: &AnalysisConfig) -> Result<AnalysisResult> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }
    config.validate()?;

    let detection = detect_spots(image, &config.detector);

    let mut annotated = image.clone();
    let filled = fill_large_bright_regions(&mut annotated, &config.filler, true).unwrap_or_default();

    let detected_count = detection.points.len();
    let filled_count = filled.len();
    let mut points: PointSet = detection.points;
    points.extend(filled);
    debug_assert!(points.iter().all(|p| p.within(width, height)));

    let metrics = MetricEngine::new(config.metrics.clone()).compute(&points, height, width);
    let label = classify_metrics(&metrics, &config.classifier);

    log::debug!(
        "{width}x{height}: {detected_count} detected + {filled_count} filled -> label {label}"
    );

    Ok(AnalysisResult {
        label,
        metrics,
        detected_count,
        filled_count,
        annotated,
    })
}

/// Analyse independent images in parallel. Results keep the input order.
pub fn analyse_batch(images: &[RgbImage], config: &AnalysisConfig) -> Vec<Result<AnalysisResult>> {
    images.par_iter().map(|image| analyse(image, config)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_empty_image_is_rejected() {
        let image = RgbImage::new(0, 10);
        let err = analyse(&image, &AnalysisConfig::default()).unwrap_err();
        assert_eq!(err, Error::EmptyImage { width: 0, height: 10 });
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let image = RgbImage::new(4, 4);
        let mut config = AnalysisConfig::default();
        config.metrics.grid_n = 0;
        assert!(matches!(analyse(&image, &config), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_dark_image() {
        let image = RgbImage::from_pixel(64, 48, Rgb([5, 5, 5]));
        let result = analyse(&image, &AnalysisConfig::default()).unwrap();
        assert_eq!(result.label, Label::B);
        assert_eq!(result.metrics, Metrics::default());
        assert_eq!(result.annotated, image);

        let summary = result.summary();
        assert_eq!(summary.detected_count, 0);
        assert_eq!(summary.filled_count, 0);
    }

    #[test]
    fn test_single_pixel_image() {
        let image = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        let result = analyse(&image, &AnalysisConfig::default()).unwrap();
        assert_eq!(result.metrics.spot_count, 0);
    }
}
