//! pixelart-export: Pure raster encoders (sans-IO)
//!
//! Turns a processed bitmap into downloadable bytes (PNG, JPEG, WebP),
//! picks a file name, and detects which encoders this build carries.
//! Saving the bytes is the host's job: `pixelart-io` in the browser,
//! the filesystem in the CLI.

pub mod format;
pub mod naming;
pub mod raster;

pub use format::{ExportFormat, is_supported, resolve_among, resolve_format, supported_formats};
pub use naming::{filename, format_file_size, recommended_options};
pub use raster::{DEFAULT_QUALITY, Export, ExportOptions, encode, encode_at, encode_bytes};

/// Errors from encoding an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The encoder rejected the image.
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    /// A format name was not recognized.
    #[error("unknown export format: {0:?}")]
    UnknownFormat(String),

    /// There is nothing to encode.
    #[error("cannot export an empty image")]
    EmptyBitmap,
}
