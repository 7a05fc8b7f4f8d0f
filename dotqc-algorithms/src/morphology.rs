//! Binary closing with elliptical kernels.
//!
//! Foreground is any non-zero pixel; outputs are 0/255 masks. Pixels beyond
//! the border are ignored by both passes, so closing never eats into regions
//! that touch the edge.
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use image::{GrayImage, Luma};
use imageproc::morphology::{grayscale_close, Mask};

/// Largest kernel side a [`Mask`] can be built from.
pub const MAX_KERNEL_SIZE: u32 = 511;

/// Ellipse inscribed in a `size` x `size` box, as a 0/255 image.
///
/// Row `dy` spans `±round(c * sqrt(1 - dy²/r²))` columns around the center,
/// matching the usual raster construction of elliptical kernels. `size` is
/// clamped to `1..=MAX_KERNEL_SIZE`.
pub fn ellipse_kernel(size: u32) -> GrayImage {
    let size = size.clamp(1, MAX_KERNEL_SIZE) as i32;
    let r = size / 2;
    let c = size / 2;
    let inv_r2 = if r > 0 {
        1.0 / f64::from(r * r)
    } else {
        0.0
    };

    let mut kernel = GrayImage::new(size as u32, size as u32);
    for i in 0..size {
        let dy = i - r;
        let dx = (f64::from(c) * (f64::from(r * r - dy * dy) * inv_r2).sqrt()).round() as i32;
        for j in (c - dx).max(0)..(c + dx + 1).min(size) {
            kernel.put_pixel(j as u32, i as u32, Luma([255]));
        }
    }
    kernel
}

/// Morphological closing (dilation followed by erosion) of `image` by
/// `kernel`, anchored at the kernel's center.
pub fn close(image: &GrayImage, kernel: &GrayImage) -> GrayImage {
    let cx = (kernel.width() / 2).min(255) as u8;
    let cy = (kernel.height() / 2).min(255) as u8;
    grayscale_close(image, &Mask::from_image(kernel, cx, cy))
}
