//! Multi-threshold bright spot detection.
//!
//! The grayscale image is binarized at a ladder of thresholds. At each level
//! the 8-connected bright components are measured (area, centroid, radius)
//! and filtered by area and polarity. Centers that persist across levels are
//! grouped, and every group seen often enough becomes one keypoint. Shape
//! regularity is not filtered, so irregular blobs are kept.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::must_use_candidate
)]

use dotqc_core::{Blob, BlobDetector, Point, PointSet, SpotDetectorConfig};
use image::{GrayImage, RgbImage};

use crate::gray::{binarize, label_components, normalize, to_grayscale, NormalizedImage};

/// Output of [`detect_spots`].
#[derive(Debug, Clone)]
pub struct SpotDetection {
    /// Blob centroids.
    pub points: PointSet,
    /// Blob areas derived from the reported diameters.
    pub areas: Vec<f64>,
    /// Grayscale input scaled to `[0, 1]`.
    pub normalized: NormalizedImage,
}

/// One component measured at a single threshold level.
#[derive(Debug, Clone, Copy)]
struct Center {
    location: Point,
    radius: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct ComponentStats {
    area: usize,
    sum_x: f64,
    sum_y: f64,
}

/// Bright blob detector scanning a range of binarization thresholds.
#[derive(Clone, Debug, Default)]
pub struct SpotDetector {
    config: SpotDetectorConfig,
}

impl SpotDetector {
    /// Create a detector with the given configuration.
    pub fn new(config: SpotDetectorConfig) -> Self {
        Self { config }
    }

    /// Measure the qualifying bright components at one threshold level.
    fn find_centers(&self, gray: &GrayImage, level: u8) -> Vec<Center> {
        let binary = binarize(gray, level);
        let labels = label_components(&binary);
        let (width, height) = labels.dimensions();

        let num_labels = labels.pixels().map(|p| p[0] as usize).max().unwrap_or(0);
        if num_labels == 0 {
            return Vec::new();
        }

        let mut stats = vec![ComponentStats::default(); num_labels + 1];
        let mut boundaries: Vec<Vec<(u32, u32)>> = vec![Vec::new(); num_labels + 1];
        for (x, y, pixel) in labels.enumerate_pixels() {
            let label = pixel[0];
            if label == 0 {
                continue;
            }
            let entry = &mut stats[label as usize];
            entry.area += 1;
            entry.sum_x += f64::from(x);
            entry.sum_y += f64::from(y);

            let on_boundary = x == 0
                || y == 0
                || x + 1 == width
                || y + 1 == height
                || labels.get_pixel(x - 1, y)[0] != label
                || labels.get_pixel(x + 1, y)[0] != label
                || labels.get_pixel(x, y - 1)[0] != label
                || labels.get_pixel(x, y + 1)[0] != label;
            if on_boundary {
                boundaries[label as usize].push((x, y));
            }
        }

        let mut centers = Vec::new();
        for (label, component) in stats.iter().enumerate().skip(1) {
            let area = component.area as f64;
            if component.area == 0 || area < self.config.min_area || area > self.config.max_area {
                continue;
            }

            let location = Point::new(component.sum_x / area, component.sum_y / area);

            // Bright-on-dark only: the centroid itself must be foreground.
            let (cx, cy) = (location.x.round() as u32, location.y.round() as u32);
            if cx >= width || cy >= height || binary.get_pixel(cx, cy)[0] == 0 {
                continue;
            }

            let mut dists: Vec<f64> = boundaries[label]
                .iter()
                .map(|&(x, y)| location.distance(&Point::new(f64::from(x), f64::from(y))))
                .collect();
            dists.sort_by(f64::total_cmp);
            let radius = (dists[(dists.len() - 1) / 2] + dists[dists.len() / 2]) / 2.0;

            centers.push(Center { location, radius });
        }
        centers
    }

    /// Thresholds scanned for this configuration. Levels at or above 255
    /// cannot produce foreground and are skipped.
    fn levels(&self) -> impl Iterator<Item = u8> + '_ {
        let step = self.config.threshold_step.max(1) as usize;
        (self.config.min_threshold..self.config.max_threshold)
            .step_by(step)
            .take_while(|&t| t < 255)
            .map(|t| t as u8)
    }
}

impl BlobDetector for SpotDetector {
    fn detect(&self, gray: &GrayImage) -> Vec<Blob> {
        // Each group is kept sorted by radius; its middle element stands in
        // for the whole group when matching new centers.
        let mut groups: Vec<Vec<Center>> = Vec::new();

        for level in self.levels() {
            let current = self.find_centers(gray, level);
            log::trace!("threshold {level}: {} candidate components", current.len());

            let mut new_groups = Vec::new();
            for center in current {
                let mut is_new = true;
                for group in &mut groups {
                    let median = group[group.len() / 2];
                    let dist = median.location.distance(&center.location);
                    is_new = dist >= self.config.min_dist_between_blobs
                        && dist >= median.radius
                        && dist >= center.radius;
                    if !is_new {
                        group.push(center);
                        let mut k = group.len() - 1;
                        while k > 0 && group[k].radius < group[k - 1].radius {
                            group.swap(k, k - 1);
                            k -= 1;
                        }
                        break;
                    }
                }
                if is_new {
                    new_groups.push(vec![center]);
                }
            }
            groups.extend(new_groups);
        }

        groups
            .into_iter()
            .filter(|group| group.len() >= self.config.min_repeatability)
            .map(|group| {
                let n = group.len() as f64;
                let sum_x: f64 = group.iter().map(|c| c.location.x).sum();
                let sum_y: f64 = group.iter().map(|c| c.location.y).sum();
                let size = group[group.len() / 2].radius * 2.0;
                Blob::new(Point::new(sum_x / n, sum_y / n), size)
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "MultiThreshold"
    }
}

/// Locate bright markers in an RGB image.
///
/// Returns blob centroids, their areas (`size² · π / 4`) and the normalized
/// grayscale. Never fails; an image without qualifying blobs gives empty
/// point and area sequences.
pub fn detect_spots(image: &RgbImage, config: &SpotDetectorConfig) -> SpotDetection {
    let gray = to_grayscale(image);
    let detector = SpotDetector::new(config.clone());
    if detector.levels().next().is_none() {
        log::warn!(
            "threshold range {}..{} scans no level below 255",
            config.min_threshold,
            config.max_threshold
        );
    }
    let blobs = detector.detect(&gray);
    log::debug!("{}: {} spots detected", detector.name(), blobs.len());

    SpotDetection {
        points: blobs.iter().map(|b| b.center).collect(),
        areas: blobs.iter().map(Blob::area).collect(),
        normalized: normalize(&gray),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    fn canvas() -> RgbImage {
        RgbImage::from_pixel(120, 120, Rgb([10, 10, 10]))
    }

    #[test]
    fn test_blank_image_has_no_spots() {
        let detection = detect_spots(&canvas(), &SpotDetectorConfig::default());
        assert!(detection.points.is_empty());
        assert!(detection.areas.is_empty());
        assert_eq!(detection.normalized.dimensions(), (120, 120));
    }

    #[test]
    fn test_single_dot_is_found() {
        let mut img = canvas();
        draw_filled_circle_mut(&mut img, (40, 60), 8, Rgb([255, 255, 255]));

        let detection = detect_spots(&img, &SpotDetectorConfig::default());
        assert_eq!(detection.points.len(), 1);
        assert_relative_eq!(detection.points[0].x, 40.0, epsilon = 0.5);
        assert_relative_eq!(detection.points[0].y, 60.0, epsilon = 0.5);
        // Diameter is close to the drawn one.
        let area = detection.areas[0];
        assert!(area > 100.0 && area < 300.0, "area {area}");
    }

    #[test]
    fn test_area_filter() {
        let mut img = canvas();
        // Too small (area ~13) and too large (area ~1250) for 100..400.
        draw_filled_circle_mut(&mut img, (20, 20), 2, Rgb([255, 255, 255]));
        draw_filled_circle_mut(&mut img, (80, 80), 20, Rgb([255, 255, 255]));

        let detection = detect_spots(&img, &SpotDetectorConfig::default());
        assert!(detection.points.is_empty());
    }

    #[test]
    fn test_irregular_shapes_are_kept() {
        let mut img = canvas();
        // Elongated 30x6 bar: area 180, far from circular.
        draw_filled_rect_mut(&mut img, Rect::at(30, 50).of_size(30, 6), Rgb([240, 240, 240]));

        let detection = detect_spots(&img, &SpotDetectorConfig::default());
        assert_eq!(detection.points.len(), 1);
        assert_relative_eq!(detection.points[0].x, 44.5, epsilon = 0.01);
        assert_relative_eq!(detection.points[0].y, 52.5, epsilon = 0.01);
    }

    #[test]
    fn test_dark_blobs_are_ignored() {
        let mut img = RgbImage::from_pixel(100, 100, Rgb([250, 250, 250]));
        draw_filled_circle_mut(&mut img, (50, 50), 8, Rgb([0, 0, 0]));
        let detection = detect_spots(&img, &SpotDetectorConfig::default());
        // The bright background is far above max_area; the dark disk never binarizes bright.
        assert!(detection.points.is_empty());
    }

    #[test]
    fn test_dim_dot_below_repeatability() {
        let mut img = canvas();
        // Brightness 105 only clears the first threshold (100).
        draw_filled_circle_mut(&mut img, (60, 60), 8, Rgb([105, 105, 105]));
        let detection = detect_spots(&img, &SpotDetectorConfig::default());
        assert!(detection.points.is_empty());

        let detector = SpotDetector::new(SpotDetectorConfig::default().with_min_repeatability(1));
        assert_eq!(detector.detect(&to_grayscale(&img)).len(), 1);
    }

    #[test]
    fn test_levels_stop_below_saturation() {
        let detector = SpotDetector::new(SpotDetectorConfig::default());
        let levels: Vec<u8> = detector.levels().collect();
        assert_eq!(levels.first(), Some(&100));
        assert_eq!(levels.last(), Some(&250));
        assert_eq!(levels.len(), 16);
    }

    #[test]
    fn test_single_pixel_image() {
        let img = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        assert!(detect_spots(&img, &SpotDetectorConfig::default()).points.is_empty());

        let config = SpotDetectorConfig::default()
            .with_area_range(0.0, 400.0)
            .with_min_repeatability(1);
        let detection = detect_spots(&img, &config);
        assert_eq!(detection.points, vec![Point::new(0.0, 0.0)]);
    }
}
