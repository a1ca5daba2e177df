//! Image decoding and upload validation.
//!
//! Raw bytes in, RGBA [`Bitmap`] out. Checks run in the order a user
//! would hit them: the byte size first, then the resolution from the
//! image header, then the full decode. Nothing is decoded for an upload
//! that is already over a limit.

use std::io::Cursor;

use image::ImageReader;

use crate::types::{Bitmap, InputError, InputLimits};

/// Decode raw image bytes after checking them against `limits`.
///
/// Supports whatever formats the `image` crate was built with (PNG,
/// JPEG, BMP, WebP in this workspace).
///
/// # Errors
///
/// - [`InputError::FileTooLarge`] if `bytes` exceeds `limits.max_file_bytes`
/// - [`InputError::ResolutionTooLarge`] if the header reports an axis
///   over its limit
/// - [`InputError::InvalidImage`] if the data is empty, unrecognized,
///   corrupt, or decodes to zero pixels
#[must_use = "returns the decoded bitmap"]
pub fn decode_with_limits(bytes: &[u8], limits: &InputLimits) -> Result<Bitmap, InputError> {
    if bytes.len() > limits.max_file_bytes {
        return Err(InputError::FileTooLarge {
            size: bytes.len(),
            limit: limits.max_file_bytes,
        });
    }
    if bytes.is_empty() {
        return Err(InputError::InvalidImage("no image data".into()));
    }

    let (width, height) = header_dimensions(bytes)?;
    check_dimensions(width, height, limits)?;

    let bitmap = image::load_from_memory(bytes)?.to_rgba8();
    check_bitmap(&bitmap, limits)?;
    Ok(bitmap)
}

/// Width and height from the image header, without decoding pixels.
fn header_dimensions(bytes: &[u8]) -> Result<(u32, u32), InputError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| InputError::InvalidImage(e.to_string()))?;
    Ok(reader.into_dimensions()?)
}

/// Validate an already decoded bitmap against `limits`.
///
/// # Errors
///
/// [`InputError::InvalidImage`] for a zero-area bitmap and
/// [`InputError::ResolutionTooLarge`] when an axis is over the limit.
pub fn check_bitmap(bitmap: &Bitmap, limits: &InputLimits) -> Result<(), InputError> {
    let (width, height) = bitmap.dimensions();
    check_dimensions(width, height, limits)
}

fn check_dimensions(width: u32, height: u32, limits: &InputLimits) -> Result<(), InputError> {
    if width == 0 || height == 0 {
        return Err(InputError::InvalidImage(format!(
            "image has no pixels ({width}x{height})"
        )));
    }
    if width > limits.max_width || height > limits.max_height {
        return Err(InputError::ResolutionTooLarge {
            width,
            height,
            max_width: limits.max_width,
            max_height: limits.max_height,
        });
    }
    Ok(())
}
