//! Block averaging, the foundation of the downsample stage.

use crate::types::{Bitmap, Rgba};

/// Average color of a rectangular block of pixels.
///
/// The block `[start_x, start_x + block_width) x [start_y, start_y +
/// block_height)` is intersected with the bitmap bounds, so partial
/// blocks at the right and bottom edges average only their in-bounds
/// pixels. Each channel (including alpha) is averaged independently and
/// rounded to the nearest integer, halves rounding up.
///
/// Returns `None` when the intersection is empty.
#[must_use]
pub fn average_color(
    bitmap: &Bitmap,
    start_x: u32,
    start_y: u32,
    block_width: u32,
    block_height: u32,
) -> Option<Rgba<u8>> {
    let end_x = start_x.saturating_add(block_width).min(bitmap.width());
    let end_y = start_y.saturating_add(block_height).min(bitmap.height());
    if start_x >= end_x || start_y >= end_y {
        return None;
    }

    let mut sums = [0u64; 4];
    for y in start_y..end_y {
        for x in start_x..end_x {
            let pixel = bitmap.get_pixel(x, y);
            for (sum, &channel) in sums.iter_mut().zip(pixel.0.iter()) {
                *sum += u64::from(channel);
            }
        }
    }

    let count = u64::from(end_x - start_x) * u64::from(end_y - start_y);
    Some(Rgba(sums.map(|sum| rounded_mean(sum, count))))
}

/// `round(sum / count)` for non-negative integers, halves rounding up.
#[allow(clippy::cast_possible_truncation)]
const fn rounded_mean(sum: u64, count: u64) -> u8 {
    // Every input channel is <= 255, so the mean is too.
    ((sum + count / 2) / count) as u8
}
