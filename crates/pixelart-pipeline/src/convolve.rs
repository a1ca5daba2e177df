//! Square-kernel convolution for edge softening.
//!
//! [`convolve`] filters the R, G, and B channels of an RGBA bitmap with
//! clamp-to-edge border handling; the alpha channel is copied through
//! untouched. The pixelation engine uses [`Kernel::soft_edge`] on the
//! downsampled grid to implement [`EdgeMode::Soft`](crate::EdgeMode::Soft).
//!
//! [`convolve_row`] exposes a single output row so callers can
//! interleave work with other tasks between rows.

use crate::color::to_channel;
use crate::types::{Bitmap, Rgba};

/// Errors from building a [`Kernel`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvolveError {
    /// Kernels must have an odd edge length so they have a center tap.
    #[error("kernel size must be odd and non-zero, got {0}")]
    EvenSize(usize),

    /// The weight count does not match `size * size`.
    #[error("kernel of size {size} needs {expected} weights, got {actual}")]
    WeightCount {
        /// Requested edge length.
        size: usize,
        /// `size * size`.
        expected: usize,
        /// Number of weights supplied.
        actual: usize,
    },
}

/// A square convolution kernel stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f64>,
}

impl Kernel {
    /// Build a kernel from its edge length and row-major weights.
    ///
    /// # Errors
    ///
    /// Returns [`ConvolveError::EvenSize`] if `size` is even or zero, and
    /// [`ConvolveError::WeightCount`] if `weights.len() != size * size`.
    pub fn new(size: usize, weights: Vec<f64>) -> Result<Self, ConvolveError> {
        if size % 2 == 0 {
            return Err(ConvolveError::EvenSize(size));
        }
        let expected = size * size;
        if weights.len() != expected {
            return Err(ConvolveError::WeightCount {
                size,
                expected,
                actual: weights.len(),
            });
        }
        Ok(Self { size, weights })
    }

    /// The normalized 3x3 blur used for soft edges:
    ///
    /// ```text
    /// 1 2 1
    /// 2 4 2  / 16
    /// 1 2 1
    /// ```
    #[must_use]
    pub fn soft_edge() -> Self {
        let weights = [1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0]
            .map(|w: f64| w / 16.0)
            .to_vec();
        Self { size: 3, weights }
    }

    /// Edge length of the kernel.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Weight at row `ky`, column `kx`.
    #[must_use]
    pub fn weight(&self, kx: usize, ky: usize) -> f64 {
        self.weights[ky * self.size + kx]
    }
}

/// Convolve the color channels of `bitmap` with `kernel`.
///
/// Samples outside the image replicate the nearest edge pixel. Each
/// output channel is rounded and clamped to `0..=255`. Alpha is copied
/// from the corresponding input pixel.
#[must_use = "returns the filtered bitmap"]
pub fn convolve(bitmap: &Bitmap, kernel: &Kernel) -> Bitmap {
    let mut out = Bitmap::new(bitmap.width(), bitmap.height());
    for y in 0..bitmap.height() {
        convolve_row(bitmap, kernel, y, &mut out);
    }
    out
}

/// Compute row `y` of the convolution of `input` into `output`.
///
/// `output` must have the same dimensions as `input`; rows outside the
/// image are ignored.
#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
pub fn convolve_row(input: &Bitmap, kernel: &Kernel, y: u32, output: &mut Bitmap) {
    let (width, height) = input.dimensions();
    if y >= height || output.dimensions() != (width, height) {
        return;
    }
    let half = (kernel.size() / 2) as i64;
    let max_x = i64::from(width) - 1;
    let max_y = i64::from(height) - 1;

    for x in 0..width {
        let mut acc = [0.0f64; 3];
        for ky in 0..kernel.size() {
            let sy = (i64::from(y) + ky as i64 - half).clamp(0, max_y) as u32;
            for kx in 0..kernel.size() {
                let sx = (i64::from(x) + kx as i64 - half).clamp(0, max_x) as u32;
                let w = kernel.weight(kx, ky);
                let sample = input.get_pixel(sx, sy).0;
                for (a, &channel) in acc.iter_mut().zip(sample.iter()) {
                    *a = f64::from(channel).mul_add(w, *a);
                }
            }
        }
        let alpha = input.get_pixel(x, y).0[3];
        output.put_pixel(
            x,
            y,
            Rgba([
                to_channel(acc[0]),
                to_channel(acc[1]),
                to_channel(acc[2]),
                alpha,
            ]),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Red left half, blue right half, with varying alpha.
    fn sharp_edge_image() -> Bitmap {
        Bitmap::from_fn(10, 6, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let alpha = (y * 40 + x) as u8;
            if x < 5 {
                Rgba([255, 0, 0, alpha])
            } else {
                Rgba([0, 0, 255, alpha])
            }
        })
    }

    #[test]
    fn even_kernel_is_rejected() {
        assert_eq!(
            Kernel::new(2, vec![0.25; 4]),
            Err(ConvolveError::EvenSize(2))
        );
        assert_eq!(Kernel::new(0, vec![]), Err(ConvolveError::EvenSize(0)));
    }

    #[test]
    fn wrong_weight_count_is_rejected() {
        assert!(matches!(
            Kernel::new(3, vec![1.0; 8]),
            Err(ConvolveError::WeightCount {
                expected: 9,
                actual: 8,
                ..
            })
        ));
    }

    #[test]
    fn soft_edge_kernel_sums_to_one() {
        let kernel = Kernel::soft_edge();
        let mut total = 0.0;
        for ky in 0..3 {
            for kx in 0..3 {
                total += kernel.weight(kx, ky);
            }
        }
        assert!((total - 1.0).abs() < 1e-12);
        assert!((kernel.weight(1, 1) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn identity_kernel_returns_equal_image() {
        let mut weights = vec![0.0; 9];
        weights[4] = 1.0;
        let kernel = Kernel::new(3, weights).unwrap();
        let img = sharp_edge_image();
        assert_eq!(convolve(&img, &kernel), img);
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = Bitmap::new(17, 31);
        let out = convolve(&img, &Kernel::soft_edge());
        assert_eq!(out.dimensions(), (17, 31));
    }

    #[test]
    fn uniform_image_unchanged() {
        let img = Bitmap::from_pixel(6, 6, Rgba([100, 150, 200, 250]));
        assert_eq!(convolve(&img, &Kernel::soft_edge()), img);
    }

    #[test]
    fn blur_smooths_sharp_edge() {
        let img = sharp_edge_image();
        let out = convolve(&img, &Kernel::soft_edge());
        let left = out.get_pixel(4, 3).0;
        let right = out.get_pixel(5, 3).0;
        // Column 4 mixes 1/4 of blue in: red = 255*0.75, blue = 255*0.25.
        assert_eq!(left[0], 191);
        assert_eq!(left[2], 64);
        assert_eq!(right[0], 64);
        assert_eq!(right[2], 191);
        // Far from the edge the colors are untouched.
        assert_eq!(out.get_pixel(0, 0).0[..3], [255, 0, 0]);
        assert_eq!(out.get_pixel(9, 5).0[..3], [0, 0, 255]);
    }

    #[test]
    fn alpha_is_copied_exactly() {
        let img = sharp_edge_image();
        let out = convolve(&img, &Kernel::soft_edge());
        for (a, b) in img.pixels().zip(out.pixels()) {
            assert_eq!(a.0[3], b.0[3]);
        }
    }

    #[test]
    fn input_is_not_mutated() {
        let img = sharp_edge_image();
        let snapshot = img.clone();
        let _ = convolve(&img, &Kernel::soft_edge());
        assert_eq!(img, snapshot);
    }

    #[test]
    fn single_pixel_image_clamps_to_itself() {
        let img = Bitmap::from_pixel(1, 1, Rgba([9, 99, 199, 7]));
        assert_eq!(convolve(&img, &Kernel::soft_edge()), img);
    }

    #[test]
    fn mismatched_output_is_left_alone() {
        let img = sharp_edge_image();
        let mut out = Bitmap::new(3, 3);
        convolve_row(&img, &Kernel::soft_edge(), 0, &mut out);
        assert_eq!(out, Bitmap::new(3, 3));
    }
}
