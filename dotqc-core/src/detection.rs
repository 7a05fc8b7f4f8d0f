//! Blob candidates and the blob detector capability.

use std::f64::consts::PI;

use image::GrayImage;

use crate::point::Point;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A bright blob reported by a detector.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Blob {
    /// Blob centroid.
    pub center: Point,
    /// Detector-reported diameter (pixels).
    pub size: f64,
}

impl Blob {
    /// Creates a new blob candidate.
    #[must_use]
    pub const fn new(center: Point, size: f64) -> Self {
        Self { center, size }
    }

    /// Area of a disk with the reported diameter: `size² · π / 4`.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.size * self.size * PI / 4.0
    }
}

/// Trait for bright blob detectors.
///
/// Implementations receive a single-channel intensity image and return the
/// bright-on-dark blobs they find. Detection never fails: an image without
/// qualifying blobs yields an empty vector.
pub trait BlobDetector: Send + Sync {
    /// Detects bright blobs in a grayscale image.
    fn detect(&self, gray: &GrayImage) -> Vec<Blob>;

    /// Returns the name of the detector.
    fn name(&self) -> &'static str;
}
