//! Download names, size labels, and format recommendations.

use chrono::{DateTime, Utc};
use pixelart_pipeline::{Bitmap, Dimensions};

use crate::format::ExportFormat;
use crate::raster::ExportOptions;

/// Stem of generated file names.
pub const DEFAULT_BASENAME: &str = "pixelated-image";

/// Pixel count above which JPEG is recommended.
pub const LARGE_IMAGE_PIXELS: u64 = 2_000_000;

/// Pixel count above which WebP is recommended.
pub const MEDIUM_IMAGE_PIXELS: u64 = 500_000;

/// Build the download file name.
///
/// A non-empty `custom` name is used as-is, gaining `.<ext>` unless it
/// already ends with it. Otherwise the name is
/// `pixelated-image-<YYYYMMDDTHHMMSS>.<ext>` (UTC), or
/// `pixelated-image.<ext>` when `add_timestamp` is false.
#[must_use]
pub fn filename(
    format: ExportFormat,
    custom: Option<&str>,
    add_timestamp: bool,
    now: DateTime<Utc>,
) -> String {
    let ext = format.extension();
    if let Some(name) = custom.map(str::trim).filter(|n| !n.is_empty()) {
        let suffix = format!(".{ext}");
        return if name.ends_with(&suffix) {
            name.to_owned()
        } else {
            format!("{name}{suffix}")
        };
    }
    if add_timestamp {
        format!("{DEFAULT_BASENAME}-{}.{ext}", now.format("%Y%m%dT%H%M%S"))
    } else {
        format!("{DEFAULT_BASENAME}.{ext}")
    }
}

/// Human-readable byte count: `"0 Bytes"`, `"512 Bytes"`, `"1.5 KB"`.
///
/// Uses 1024-based units up to GB with at most two decimals, trailing
/// zeros removed.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} {}", UNITS[unit])
}

/// Suggested export settings for a bitmap of this size.
///
/// Large images (over 2 MP) get JPEG at 0.8, medium ones (over 0.5 MP)
/// WebP, and small ones lossless PNG.
#[must_use]
pub fn recommended_options(bitmap: &Bitmap) -> ExportOptions {
    let pixels = Dimensions::of(bitmap).pixel_count();
    if pixels > LARGE_IMAGE_PIXELS {
        ExportOptions {
            quality: 0.8,
            ..ExportOptions::new(ExportFormat::Jpeg)
        }
    } else if pixels > MEDIUM_IMAGE_PIXELS {
        ExportOptions::new(ExportFormat::WebP)
    } else {
        ExportOptions::new(ExportFormat::Png)
    }
}
