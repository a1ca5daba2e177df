//! Per-pixel color transforms.
//!
//! Every function here is pure and total: any RGBA input produces an
//! RGBA output, and the alpha channel is never modified. The engine
//! applies [`transform`] to each pixel of the downsampled grid.

use crate::types::{Bitmap, ColorMode, Rgba};

/// The retro palette: 16 classic fantasy-console colors.
///
/// [`ColorMode::Retro`] snaps every pixel to the nearest entry
/// (Euclidean distance in RGB space). Iteration order matters for ties:
/// the first minimum wins.
pub const RETRO_PALETTE: [[u8; 3]; 16] = [
    [0, 0, 0],
    [29, 43, 83],
    [126, 37, 83],
    [0, 135, 81],
    [171, 82, 54],
    [95, 87, 79],
    [194, 195, 199],
    [255, 241, 232],
    [255, 0, 77],
    [255, 163, 0],
    [255, 236, 39],
    [0, 228, 54],
    [41, 173, 255],
    [131, 118, 156],
    [255, 119, 168],
    [255, 204, 170],
];

/// Saturation multiplier used by [`ColorMode::Vibrant`].
pub const VIBRANCE_FACTOR: f64 = 1.5;

/// Apply a color mode to one pixel.
#[must_use]
pub fn transform(color: Rgba<u8>, mode: ColorMode) -> Rgba<u8> {
    match mode {
        ColorMode::Original => color,
        ColorMode::Retro => retro(color),
        ColorMode::Grayscale => grayscale(color),
        ColorMode::Sepia => sepia(color),
        ColorMode::Vibrant => vibrant(color),
    }
}

/// Apply a color mode to every pixel, returning a new bitmap.
#[must_use = "returns the transformed bitmap"]
pub fn transform_bitmap(bitmap: &Bitmap, mode: ColorMode) -> Bitmap {
    let mut out = bitmap.clone();
    if mode != ColorMode::Original {
        for pixel in out.pixels_mut() {
            *pixel = transform(*pixel, mode);
        }
    }
    out
}

/// Weighted luminance: `round(0.299 R + 0.587 G + 0.114 B)`.
#[must_use]
pub fn luma(color: Rgba<u8>) -> u8 {
    let [r, g, b, _] = color.0;
    to_channel(0.114f64.mul_add(
        f64::from(b),
        0.299f64.mul_add(f64::from(r), 0.587 * f64::from(g)),
    ))
}

/// Find the palette entry closest to `rgb`.
///
/// Squared distance is compared so no square root is needed; ordering
/// is identical. Returns black for an empty palette.
#[must_use]
pub fn nearest_palette_color(rgb: [u8; 3], palette: &[[u8; 3]]) -> [u8; 3] {
    let mut best = palette.first().copied().unwrap_or([0, 0, 0]);
    let mut best_distance = u32::MAX;
    for &candidate in palette {
        let distance = squared_distance(rgb, candidate);
        if distance < best_distance {
            best_distance = distance;
            best = candidate;
        }
    }
    best
}

fn squared_distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = i32::from(x) - i32::from(y);
            d.unsigned_abs().pow(2)
        })
        .sum()
}

fn retro(color: Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, a] = color.0;
    let [r, g, b] = nearest_palette_color([r, g, b], &RETRO_PALETTE);
    Rgba([r, g, b, a])
}

fn grayscale(color: Rgba<u8>) -> Rgba<u8> {
    let l = luma(color);
    Rgba([l, l, l, color.0[3]])
}

fn sepia(color: Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, a] = color.0;
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    Rgba([
        to_channel(0.189f64.mul_add(b, 0.393f64.mul_add(r, 0.769 * g))),
        to_channel(0.168f64.mul_add(b, 0.349f64.mul_add(r, 0.686 * g))),
        to_channel(0.131f64.mul_add(b, 0.272f64.mul_add(r, 0.534 * g))),
        a,
    ])
}

fn vibrant(color: Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, a] = color.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == min {
        return color;
    }
    let base = f64::from(min);
    let boost = |c: u8| to_channel((f64::from(c) - base).mul_add(VIBRANCE_FACTOR, base));
    Rgba([boost(r), boost(g), boost(b), a])
}

/// Round to the nearest integer and clamp into the `u8` range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn to_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
