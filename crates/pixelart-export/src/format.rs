//! Output formats and encoder capability detection.

use std::fmt;
use std::str::FromStr;

use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::ExportError;

/// A downloadable raster format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Lossless, keeps alpha. Always available.
    #[default]
    #[serde(rename = "png")]
    Png,
    /// Lossy, honors quality, drops alpha.
    #[serde(rename = "jpg", alias = "jpeg")]
    Jpeg,
    /// Encoded losslessly; keeps alpha.
    #[serde(rename = "webp")]
    WebP,
}

impl ExportFormat {
    /// Every format in menu order.
    pub const ALL: [Self; 3] = [Self::Png, Self::Jpeg, Self::WebP];

    /// MIME type for the encoded bytes.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Whether [`ExportOptions::quality`](crate::ExportOptions::quality)
    /// affects the output.
    ///
    /// The WebP encoder in use is lossless-only, so only JPEG qualifies.
    #[must_use]
    pub const fn supports_quality(self) -> bool {
        matches!(self, Self::Jpeg)
    }

    /// The corresponding `image` crate format.
    #[must_use]
    pub const fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::WebP => ImageFormat::WebP,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::WebP),
            _ => Err(ExportError::UnknownFormat(s.to_owned())),
        }
    }
}

/// Whether an encoder for `format` is compiled in.
#[must_use]
pub fn is_supported(format: ExportFormat) -> bool {
    format.image_format().writing_enabled()
}

/// Formats that can currently be encoded, in menu order.
#[must_use]
pub fn supported_formats() -> Vec<ExportFormat> {
    ExportFormat::ALL
        .into_iter()
        .filter(|&f| is_supported(f))
        .collect()
}

/// `requested` if it can be encoded, otherwise PNG.
#[must_use]
pub fn resolve_format(requested: ExportFormat) -> ExportFormat {
    resolve_among(requested, &supported_formats())
}

/// `requested` if it is in `available`, otherwise PNG.
#[must_use]
pub fn resolve_among(requested: ExportFormat, available: &[ExportFormat]) -> ExportFormat {
    if available.contains(&requested) {
        requested
    } else {
        log::warn!("{requested} encoding is not available, falling back to png");
        ExportFormat::Png
    }
}
