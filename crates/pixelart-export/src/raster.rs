//! Bitmap to encoded bytes.

use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use pixelart_pipeline::{Bitmap, Dimensions};
use serde::{Deserialize, Serialize};

use crate::ExportError;
use crate::format::{ExportFormat, resolve_format};
use crate::naming::filename;

/// Quality used when none is given.
pub const DEFAULT_QUALITY: f32 = 0.9;

/// How a bitmap should be encoded and named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    /// Requested format. Unsupported formats fall back to PNG.
    pub format: ExportFormat,
    /// Lossy quality in `0.0..=1.0`; only JPEG uses it.
    pub quality: f32,
    /// Custom file name; the extension is appended if missing.
    pub filename: Option<String>,
    /// Append a timestamp to the default file name.
    pub add_timestamp: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: DEFAULT_QUALITY,
            filename: None,
            add_timestamp: true,
        }
    }
}

impl ExportOptions {
    /// Default options for `format`.
    #[must_use]
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }
}

/// An encoded image ready to be saved or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Encoded file contents.
    pub bytes: Vec<u8>,
    /// The format actually used (after fallback).
    pub format: ExportFormat,
    /// Suggested file name including extension.
    pub filename: String,
    /// MIME type of `bytes`.
    pub mime_type: &'static str,
}

/// Encode `bitmap` according to `options`, naming it with the current time.
///
/// # Errors
///
/// Returns [`ExportError::EmptyBitmap`] for a zero-area bitmap and
/// [`ExportError::Encode`] if the encoder fails.
pub fn encode(bitmap: &Bitmap, options: &ExportOptions) -> Result<Export, ExportError> {
    encode_at(bitmap, options, Utc::now())
}

/// [`encode`] with an explicit timestamp for the file name.
///
/// # Errors
///
/// See [`encode`].
pub fn encode_at(
    bitmap: &Bitmap,
    options: &ExportOptions,
    now: DateTime<Utc>,
) -> Result<Export, ExportError> {
    if bitmap.width() == 0 || bitmap.height() == 0 {
        return Err(ExportError::EmptyBitmap);
    }
    let format = resolve_format(options.format);
    let bytes = encode_bytes(bitmap, format, options.quality)?;
    let name = filename(
        format,
        options.filename.as_deref(),
        options.add_timestamp,
        now,
    );
    log::info!(
        "exported {} as {name} ({} bytes)",
        Dimensions::of(bitmap),
        bytes.len()
    );
    Ok(Export {
        bytes,
        format,
        filename: name,
        mime_type: format.mime_type(),
    })
}

/// Encode without naming. `format` is used as given.
///
/// # Errors
///
/// [`ExportError::Encode`] if the encoder fails or is not compiled in.
pub fn encode_bytes(
    bitmap: &Bitmap,
    format: ExportFormat,
    quality: f32,
) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    let (width, height) = bitmap.dimensions();
    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut buf).write_image(
                bitmap.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            )?;
        }
        ExportFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(bitmap.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality)).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
        ExportFormat::WebP => {
            WebPEncoder::new_lossless(&mut buf).write_image(
                bitmap.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            )?;
        }
    }
    Ok(buf)
}

/// Map `0.0..=1.0` to the encoder's `1..=100` scale.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn jpeg_quality(quality: f32) -> u8 {
    let q = if quality.is_finite() {
        quality.clamp(0.0, 1.0)
    } else {
        DEFAULT_QUALITY
    };
    ((q * 100.0).round() as u8).max(1)
}
