//! Recovery of marker positions inside large saturated regions.
//!
//! Markers printed too close together merge into one bright patch that the
//! spot detector reports as a single oversized blob (or not at all). Each such
//! patch is sampled on a regular grid so the metrics still see individual
//! markers, and the samples are painted onto the annotated image.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::must_use_candidate
)]

use std::collections::VecDeque;

use dotqc_core::{Point, PointSet, RegionFillerConfig};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::drawing::draw_filled_circle_mut;
use imageproc::point::Point as PixelPoint;
use imageproc::rect::Rect;

use crate::gray::{binarize, label_components, to_grayscale, LabelImage};
use crate::morphology::{close, ellipse_kernel};

/// Color of the painted synthetic markers.
pub const MARKER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Filled interior of an external contour, restricted to its bounding box.
#[derive(Debug, Clone)]
pub struct RegionMask {
    bounds: Rect,
    inside: Vec<bool>,
}

impl RegionMask {
    /// Returns true if image pixel `(x, y)` lies inside the region.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let lx = x - self.bounds.left();
        let ly = y - self.bounds.top();
        if lx < 0 || ly < 0 || lx >= self.bounds.width() as i32 || ly >= self.bounds.height() as i32 {
            return false;
        }
        self.inside[ly as usize * self.bounds.width() as usize + lx as usize]
    }

    /// Number of pixels inside the region.
    pub fn pixel_count(&self) -> usize {
        self.inside.iter().filter(|&&v| v).count()
    }
}

/// A bright region whose contour area lies in the configured range.
#[derive(Debug, Clone)]
pub struct BrightRegion {
    /// Area enclosed by the contour polygon.
    pub area: f64,
    /// Bounding rectangle of the contour.
    pub bounds: Rect,
    /// Interior mask, holes included.
    pub mask: RegionMask,
}

impl BrightRegion {
    /// Grid points inside the region, `step` apart and offset by `step / 2`
    /// from the bounding rectangle's origin. Row-major order.
    pub fn sample_points(&self, step: u32) -> Vec<(i32, i32)> {
        let step = step.max(1);
        let offset = (step / 2) as i32;
        let (x0, y0) = (self.bounds.left(), self.bounds.top());
        let (x1, y1) = (x0 + self.bounds.width() as i32, y0 + self.bounds.height() as i32);

        let mut samples = Vec::new();
        for y in (y0 + offset..y1).step_by(step as usize) {
            for x in (x0 + offset..x1).step_by(step as usize) {
                if self.mask.contains(x, y) {
                    samples.push((x, y));
                }
            }
        }
        samples
    }
}

/// Area enclosed by a closed pixel polygon (shoelace formula).
fn polygon_area(points: &[PixelPoint<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area: i64 = 0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y);
    }
    twice_area.abs() as f64 / 2.0
}

fn bounding_rect(points: &[PixelPoint<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
    for p in points {
        x0 = x0.min(p.x);
        y0 = y0.min(p.y);
        x1 = x1.max(p.x);
        y1 = y1.max(p.y);
    }
    Some(Rect::at(x0, y0).of_size((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32))
}

/// Interior of the component `label`: every pixel of the bounding box that
/// cannot reach the outside without crossing the component.
fn interior_mask(labels: &LabelImage, label: u32, bounds: Rect) -> RegionMask {
    let w = bounds.width() as usize;
    let h = bounds.height() as usize;
    // One pixel of padding guarantees a connected outside ring to start from.
    let pw = w + 2;
    let ph = h + 2;
    let is_wall = |px: usize, py: usize| -> bool {
        if px == 0 || py == 0 || px > w || py > h {
            return false;
        }
        let x = bounds.left() as u32 + (px - 1) as u32;
        let y = bounds.top() as u32 + (py - 1) as u32;
        labels.get_pixel(x, y)[0] == label
    };

    let mut outside = vec![false; pw * ph];
    let mut queue = VecDeque::from([(0usize, 0usize)]);
    outside[0] = true;
    while let Some((px, py)) = queue.pop_front() {
        let neighbors = [
            (px.wrapping_sub(1), py),
            (px + 1, py),
            (px, py.wrapping_sub(1)),
            (px, py + 1),
        ];
        for (nx, ny) in neighbors {
            if nx >= pw || ny >= ph {
                continue;
            }
            let idx = ny * pw + nx;
            if !outside[idx] && !is_wall(nx, ny) {
                outside[idx] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    let mut inside = vec![false; w * h];
    for ly in 0..h {
        for lx in 0..w {
            inside[ly * w + lx] = !outside[(ly + 1) * pw + lx + 1];
        }
    }
    RegionMask { bounds, inside }
}

/// Top-level outer contours of a binary image, in image coordinates.
///
/// The image is traced inside a one pixel background frame, so components
/// touching the left edge still come back as outer borders.
fn external_contours(binary: &GrayImage) -> Vec<Contour<i32>> {
    let (width, height) = binary.dimensions();
    let mut framed = GrayImage::new(width + 2, height + 2);
    image::imageops::replace(&mut framed, binary, 1, 1);

    find_contours::<i32>(&framed)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|mut c| {
            for p in &mut c.points {
                p.x -= 1;
                p.y -= 1;
            }
            c
        })
        .collect()
}

/// Find the bright regions of `image` whose external contour area lies in
/// `[config.min_area, config.max_area]`.
///
/// The image is binarized at `config.threshold` and closed with an elliptical
/// kernel before contour extraction, so markers separated by thin dark seams
/// form one region.
pub fn find_bright_regions(image: &RgbImage, config: &RegionFillerConfig) -> Vec<BrightRegion> {
    let gray = to_grayscale(image);
    let binary = binarize(&gray, config.threshold);
    let closed = close(&binary, &ellipse_kernel(config.morph_kernel_size));
    let labels = label_components(&closed);

    let mut regions = Vec::new();
    for contour in external_contours(&closed) {
        let area = polygon_area(&contour.points);
        if area < config.min_area || area > config.max_area {
            log::trace!("skipping contour with area {area}");
            continue;
        }
        let Some(bounds) = bounding_rect(&contour.points) else {
            continue;
        };
        let start = contour.points[0];
        let label = labels.get_pixel(start.x as u32, start.y as u32)[0];
        let mask = interior_mask(&labels, label, bounds);
        regions.push(BrightRegion { area, bounds, mask });
    }
    regions
}

/// Fill large bright regions of `image` with synthetic marker dots.
///
/// Every sampled grid point inside a qualifying region is painted as a filled
/// [`MARKER_COLOR`] circle of radius `config.dot_radius`. Contours are taken
/// from the image as it was on entry, so painting never feeds back into
/// detection. Returns the sampled points when `record_points` is set.
pub fn fill_large_bright_regions(
    image: &mut RgbImage,
    config: &RegionFillerConfig,
    record_points: bool,
) -> Option<PointSet> {
    let regions = find_bright_regions(image, config);

    let radius = i32::try_from(config.dot_radius).unwrap_or(i32::MAX);
    let mut filled = Vec::new();
    for region in &regions {
        let samples = region.sample_points(config.dot_step);
        log::trace!(
            "filling region at ({}, {}) area {} with {} dots",
            region.bounds.left(),
            region.bounds.top(),
            region.area,
            samples.len()
        );
        for (x, y) in samples {
            draw_filled_circle_mut(image, (x, y), radius, MARKER_COLOR);
            if record_points {
                filled.push(Point::from((x, y)));
            }
        }
    }
    log::debug!(
        "{} large regions filled with {} synthetic dots",
        regions.len(),
        filled.len()
    );

    record_points.then_some(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};

    fn dark(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([0, 0, 0]))
    }

    #[test]
    fn test_polygon_area() {
        let square = [
            PixelPoint::new(0, 0),
            PixelPoint::new(10, 0),
            PixelPoint::new(10, 10),
            PixelPoint::new(0, 10),
        ];
        assert_eq!(polygon_area(&square), 100.0);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }

    #[test]
    fn test_square_region_is_sampled() {
        let mut img = dark(100, 100);
        draw_filled_rect_mut(&mut img, Rect::at(20, 30).of_size(40, 24), Rgb([255, 255, 255]));

        let regions = find_bright_regions(&img, &RegionFillerConfig::default());
        assert_eq!(regions.len(), 1);
        let region = &regions[0];
        // Contour runs through pixel centers: (40 - 1) * (24 - 1).
        assert_eq!(region.area, 897.0);
        assert_eq!(region.bounds, Rect::at(20, 30).of_size(40, 24));
        assert_eq!(region.mask.pixel_count(), 40 * 24);

        let points = fill_large_bright_regions(&mut img, &RegionFillerConfig::default(), true)
            .expect("points were requested");
        // x: 24, 32, 40, 48, 56; y: 34, 42, 50.
        assert_eq!(points.len(), 15);
        assert_eq!(points[0], Point::new(24.0, 34.0));
        assert_eq!(points[14], Point::new(56.0, 50.0));
        assert_eq!(*img.get_pixel(24, 34), MARKER_COLOR);
    }

    #[test]
    fn test_small_region_is_ignored() {
        let mut img = dark(60, 60);
        draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(10, 10), Rgb([255, 255, 255]));
        let before = img.clone();

        let points = fill_large_bright_regions(&mut img, &RegionFillerConfig::default(), true);
        assert_eq!(points, Some(Vec::new()));
        assert_eq!(img, before);
    }

    #[test]
    fn test_without_recording_still_paints() {
        let mut img = dark(80, 80);
        draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(30, 30), Rgb([230, 230, 230]));

        let result = fill_large_bright_regions(&mut img, &RegionFillerConfig::default(), false);
        assert!(result.is_none());
        assert_eq!(*img.get_pixel(14, 14), MARKER_COLOR);
    }

    #[test]
    fn test_ring_interior_includes_hole() {
        let mut img = dark(80, 80);
        draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(50, 50), Rgb([255, 255, 255]));
        draw_filled_rect_mut(&mut img, Rect::at(25, 25).of_size(20, 20), Rgb([0, 0, 0]));

        let regions = find_bright_regions(&img, &RegionFillerConfig::default());
        assert_eq!(regions.len(), 1);
        assert!(regions[0].mask.contains(35, 35));
        assert_eq!(regions[0].mask.pixel_count(), 50 * 50);
    }

    #[test]
    fn test_closing_merges_nearby_patches() {
        let mut img = dark(100, 60);
        draw_filled_rect_mut(&mut img, Rect::at(10, 20).of_size(20, 20), Rgb([255, 255, 255]));
        draw_filled_rect_mut(&mut img, Rect::at(33, 20).of_size(20, 20), Rgb([255, 255, 255]));

        let regions = find_bright_regions(&img, &RegionFillerConfig::default());
        assert_eq!(regions.len(), 1);
        assert!(regions[0].mask.contains(31, 30));

        let apart = find_bright_regions(
            &img,
            &RegionFillerConfig::default().with_morph_kernel_size(1),
        );
        assert_eq!(apart.len(), 2);
    }

    #[test]
    fn test_oversized_region_is_ignored() {
        let mut img = RgbImage::from_pixel(200, 200, Rgb([255, 255, 255]));
        let points = fill_large_bright_regions(&mut img, &RegionFillerConfig::default(), true);
        assert_eq!(points, Some(Vec::new()));
    }

    #[test]
    fn test_edge_touching_regions_are_filled() {
        // 30x30 squares flush against the left, top, right and bottom edges.
        for origin in [(0, 15), (15, 0), (30, 15), (15, 30)] {
            let mut img = dark(60, 60);
            draw_filled_rect_mut(
                &mut img,
                Rect::at(origin.0, origin.1).of_size(30, 30),
                Rgb([255, 255, 255]),
            );

            let regions = find_bright_regions(&img, &RegionFillerConfig::default());
            assert_eq!(regions.len(), 1, "square at {origin:?}");
            assert_eq!(regions[0].area, 841.0);
            assert_eq!(regions[0].bounds, Rect::at(origin.0, origin.1).of_size(30, 30));
            assert_eq!(regions[0].mask.pixel_count(), 900);

            let points = fill_large_bright_regions(&mut img, &RegionFillerConfig::default(), true)
                .expect("points were requested");
            assert_eq!(points.len(), 16, "square at {origin:?}");
            assert_eq!(points[0], Point::from((origin.0 + 4, origin.1 + 4)));
        }
    }

    #[test]
    fn test_full_height_bar_on_left_edge() {
        let mut img = dark(60, 60);
        draw_filled_rect_mut(&mut img, Rect::at(0, 0).of_size(30, 60), Rgb([255, 255, 255]));

        let regions = find_bright_regions(&img, &RegionFillerConfig::default());
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 29.0 * 59.0);
    }

    #[test]
    fn test_disk_samples_stay_inside() {
        let (cx, cy, r) = (60, 60, 30);
        let mut img = dark(120, 120);
        draw_filled_circle_mut(&mut img, (cx, cy), r, Rgb([255, 255, 255]));

        let regions = find_bright_regions(&img, &RegionFillerConfig::default());
        assert_eq!(regions.len(), 1);
        let region = &regions[0];
        let samples = region.sample_points(8);
        assert!(!samples.is_empty());

        let dist_sq = |x: i32, y: i32| (x - cx).pow(2) + (y - cy).pow(2);
        for &(x, y) in &samples {
            assert!(region.mask.contains(x, y));
            assert!(dist_sq(x, y) <= (r + 1).pow(2), "({x}, {y}) outside the disk");
        }

        // Every grid position well inside the disk is sampled.
        let (x0, y0) = (region.bounds.left() + 4, region.bounds.top() + 4);
        for y in (y0..=region.bounds.bottom()).step_by(8) {
            for x in (x0..=region.bounds.right()).step_by(8) {
                if dist_sq(x, y) <= (r - 2).pow(2) {
                    assert!(samples.contains(&(x, y)), "({x}, {y}) not sampled");
                }
            }
        }
    }

    #[test]
    fn test_single_pixel_image_has_no_regions() {
        let img = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        assert!(find_bright_regions(&img, &RegionFillerConfig::default()).is_empty());
    }

    #[test]
    fn test_markers_are_clipped_to_image() {
        let mut img = dark(60, 60);
        draw_filled_rect_mut(&mut img, Rect::at(10, 10).of_size(30, 30), Rgb([255, 255, 255]));
        let config = RegionFillerConfig::default().with_dot_radius(100);

        fill_large_bright_regions(&mut img, &config, false);
        // Every marker covers the whole image.
        assert!(img.pixels().all(|p| *p == MARKER_COLOR));
    }
}
