//! Grayscale conversion, binarization and component labelling.
#![allow(clippy::cast_possible_truncation)]

use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::region_labelling::{connected_components, Connectivity};

/// Single-channel image with intensities scaled to `[0, 1]`.
pub type NormalizedImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Per-pixel component labels; 0 is background.
pub type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Convert an RGB image to 8-bit luma using BT.601 weights.
///
/// Fixed-point arithmetic with 14 fractional bits, rounded.
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let luma = (4899 * u32::from(r) + 9617 * u32::from(g) + 1868 * u32::from(b) + 8192) >> 14;
        Luma([luma as u8])
    })
}

/// Scale 8-bit intensities to `[0, 1]`.
pub fn normalize(gray: &GrayImage) -> NormalizedImage {
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([f32::from(gray.get_pixel(x, y)[0]) / 255.0])
    })
}

/// Pixels strictly brighter than `level` become 255, the rest 0.
pub fn binarize(gray: &GrayImage, level: u8) -> GrayImage {
    threshold(gray, level, ThresholdType::Binary)
}

/// Label the 8-connected foreground components of a binary image.
///
/// A single-pixel image is labelled directly, since `connected_components`
/// cannot handle one.
pub fn label_components(binary: &GrayImage) -> LabelImage {
    if binary.width() * binary.height() == 1 {
        let label = u32::from(binary.get_pixel(0, 0)[0] != 0);
        return LabelImage::from_pixel(1, 1, Luma([label]));
    }
    connected_components(binary, Connectivity::Eight, Luma([0u8]))
}
