//! Shared types for the pixelart pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can reference bitmaps
/// without depending on `image` directly.
pub use image::RgbaImage;

/// Re-export the RGBA pixel type.
pub use image::Rgba;

/// An in-memory RGBA8 bitmap.
///
/// The backing buffer always holds exactly `width * height * 4` bytes.
/// Every pipeline stage borrows its input and returns a freshly
/// allocated bitmap; `clone()` is a deep copy.
pub type Bitmap = RgbaImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an existing bitmap.
    #[must_use]
    pub fn of(bitmap: &Bitmap) -> Self {
        Self {
            width: bitmap.width(),
            height: bitmap.height(),
        }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Error returned when parsing an enum value from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Color transform applied to every downsampled pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Keep the averaged colors unchanged.
    #[default]
    Original,
    /// Snap each pixel to the nearest color of the retro palette.
    Retro,
    /// Weighted luminance grayscale.
    Grayscale,
    /// Warm brown sepia tone.
    Sepia,
    /// Saturation boost.
    Vibrant,
}

impl ColorMode {
    /// All color modes, in UI order.
    pub const ALL: [Self; 5] = [
        Self::Original,
        Self::Retro,
        Self::Grayscale,
        Self::Sepia,
        Self::Vibrant,
    ];

    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Retro => "retro",
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::Vibrant => "vibrant",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::new("color mode", s))
    }
}

/// Whether block boundaries stay sharp or are softened by a blur.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMode {
    /// Crisp block edges (no convolution).
    #[default]
    Hard,
    /// 3x3 blur over the downsampled grid.
    Soft,
}

impl EdgeMode {
    /// Both edge modes.
    pub const ALL: [Self; 2] = [Self::Hard, Self::Soft];

    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hard => "hard",
            Self::Soft => "soft",
        }
    }
}

impl fmt::Display for EdgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseError::new("edge mode", s))
    }
}

/// Parameters for one pixelation run.
///
/// The UI clamps `pixel_size` to
/// [`MIN_PIXEL_SIZE`](Self::MIN_PIXEL_SIZE)..=[`MAX_PIXEL_SIZE`](Self::MAX_PIXEL_SIZE),
/// but the engine accepts any positive value, including sizes larger
/// than the image itself. Zero is rejected by
/// [`validate`](Self::validate) before the engine is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelationOptions {
    /// Edge length of one output "pixel" block, in source pixels.
    pub pixel_size: u32,
    /// Color transform applied after downsampling.
    pub color_mode: ColorMode,
    /// Edge softening applied after the color transform.
    pub edge_mode: EdgeMode,
}

impl PixelationOptions {
    /// Smallest pixel size offered by the UI.
    pub const MIN_PIXEL_SIZE: u32 = 1;

    /// Largest pixel size offered by the UI.
    pub const MAX_PIXEL_SIZE: u32 = 50;

    /// Pixel size of the first pass an upload gets from
    /// [`ImageProcessor::load_and_process`](crate::ImageProcessor::load_and_process).
    pub const DEFAULT_PIXEL_SIZE: u32 = 8;

    /// Create options from the three parameters.
    #[must_use]
    pub const fn new(pixel_size: u32, color_mode: ColorMode, edge_mode: EdgeMode) -> Self {
        Self {
            pixel_size,
            color_mode,
            edge_mode,
        }
    }

    /// Copy of these options with `pixel_size` clamped to the UI range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            pixel_size: self
                .pixel_size
                .clamp(Self::MIN_PIXEL_SIZE, Self::MAX_PIXEL_SIZE),
            ..self
        }
    }

    /// Check the invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when `pixel_size` is zero.
    pub fn validate(&self) -> Result<(), String> {
        if self.pixel_size == 0 {
            return Err("pixel size must be at least 1".into());
        }
        Ok(())
    }
}

impl Default for PixelationOptions {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_PIXEL_SIZE,
            ColorMode::Original,
            EdgeMode::Hard,
        )
    }
}

impl fmt::Display for PixelationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}px/{}/{}",
            self.pixel_size, self.color_mode, self.edge_mode
        )
    }
}

/// One of the four ordered pixelation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Block-average reduction to the pixel grid.
    Downsample,
    /// Color mode transform.
    Color,
    /// Optional edge softening.
    Edge,
    /// Nearest-neighbor expansion back to source size.
    Upsample,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Self; 4] = [Self::Downsample, Self::Color, Self::Edge, Self::Upsample];

    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Downsample => "downsample",
            Self::Color => "color",
            Self::Edge => "edge",
            Self::Upsample => "upsample",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ephemeral progress notification emitted at stage boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingProgress {
    /// The stage being reported.
    pub stage: Stage,
    /// Completion percentage of that stage, 0 to 100.
    pub progress: u8,
}

/// Size limits applied to uploaded images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLimits {
    /// Largest accepted encoded file, in bytes.
    pub max_file_bytes: usize,
    /// Largest accepted decoded width, in pixels.
    pub max_width: u32,
    /// Largest accepted decoded height, in pixels.
    pub max_height: u32,
}

impl InputLimits {
    /// Default file size cap: 20 MiB.
    pub const DEFAULT_MAX_FILE_BYTES: usize = 20 * 1024 * 1024;

    /// Default per-axis resolution cap.
    pub const DEFAULT_MAX_DIMENSION: u32 = 5000;
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: Self::DEFAULT_MAX_FILE_BYTES,
            max_width: Self::DEFAULT_MAX_DIMENSION,
            max_height: Self::DEFAULT_MAX_DIMENSION,
        }
    }
}

/// Stable, user-surfaceable codes for rejected inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputErrorKind {
    /// The encoded file exceeds [`InputLimits::max_file_bytes`].
    FileTooLarge,
    /// The decoded image exceeds the resolution limits.
    ResolutionTooLarge,
    /// The bytes could not be decoded as an image.
    InvalidImage,
    /// The host failed to read the file.
    FileReadError,
}

impl InputErrorKind {
    /// The error code string, e.g. `"FILE_TOO_LARGE"`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::ResolutionTooLarge => "RESOLUTION_TOO_LARGE",
            Self::InvalidImage => "INVALID_IMAGE",
            Self::FileReadError => "FILE_READ_ERROR",
        }
    }
}

impl fmt::Display for InputErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Reasons an input image is rejected before processing.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The encoded file is larger than the configured cap.
    #[error("file is {size} bytes, which exceeds the {limit} byte limit")]
    FileTooLarge {
        /// Size of the rejected file.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The decoded image is larger than the configured resolution cap.
    #[error("image is {width}x{height}, which exceeds the {max_width}x{max_height} limit")]
    ResolutionTooLarge {
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
        /// Configured width limit.
        max_width: u32,
        /// Configured height limit.
        max_height: u32,
    },

    /// The data is not a decodable image (or decodes to zero pixels).
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The host could not read the file.
    #[error("failed to read file: {0}")]
    FileRead(String),
}

impl InputError {
    /// The stable error code for this rejection.
    #[must_use]
    pub const fn kind(&self) -> InputErrorKind {
        match self {
            Self::FileTooLarge { .. } => InputErrorKind::FileTooLarge,
            Self::ResolutionTooLarge { .. } => InputErrorKind::ResolutionTooLarge,
            Self::InvalidImage(_) => InputErrorKind::InvalidImage,
            Self::FileRead(_) => InputErrorKind::FileReadError,
        }
    }
}

impl From<image::ImageError> for InputError {
    fn from(err: image::ImageError) -> Self {
        Self::InvalidImage(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Dimensions tests ---

    #[test]
    fn dimensions_of_bitmap() {
        let bitmap = Bitmap::new(7, 3);
        let dims = Dimensions::of(&bitmap);
        assert_eq!(
            dims,
            Dimensions {
                width: 7,
                height: 3
            }
        );
        assert_eq!(dims.pixel_count(), 21);
        assert_eq!(dims.to_string(), "7x3");
    }

    // --- Enum parsing tests ---

    #[test]
    fn color_mode_parses_case_insensitively() {
        assert_eq!("Retro".parse::<ColorMode>().unwrap(), ColorMode::Retro);
        assert_eq!(
            " grayscale ".parse::<ColorMode>().unwrap(),
            ColorMode::Grayscale
        );
    }

    #[test]
    fn color_mode_display_round_trips() {
        for mode in ColorMode::ALL {
            assert_eq!(mode.to_string().parse::<ColorMode>().unwrap(), mode);
        }
    }

    #[test]
    fn unknown_color_mode_is_rejected() {
        let err = "neon".parse::<ColorMode>().unwrap_err();
        assert_eq!(err.to_string(), "unknown color mode: \"neon\"");
    }

    #[test]
    fn edge_mode_parses() {
        assert_eq!("soft".parse::<EdgeMode>().unwrap(), EdgeMode::Soft);
        assert!("blurry".parse::<EdgeMode>().is_err());
    }

    // --- PixelationOptions tests ---

    #[test]
    fn default_options_match_first_pass() {
        let options = PixelationOptions::default();
        assert_eq!(options.pixel_size, 8);
        assert_eq!(options.color_mode, ColorMode::Original);
        assert_eq!(options.edge_mode, EdgeMode::Hard);
    }

    #[test]
    fn clamped_limits_pixel_size_to_ui_range() {
        let big = PixelationOptions::new(500, ColorMode::Sepia, EdgeMode::Soft).clamped();
        assert_eq!(big.pixel_size, 50);
        assert_eq!(big.color_mode, ColorMode::Sepia);
        let zero = PixelationOptions::new(0, ColorMode::Original, EdgeMode::Hard).clamped();
        assert_eq!(zero.pixel_size, 1);
    }

    #[test]
    fn zero_pixel_size_fails_validation() {
        let options = PixelationOptions::new(0, ColorMode::Original, EdgeMode::Hard);
        assert!(options.validate().is_err());
        assert!(PixelationOptions::default().validate().is_ok());
    }

    #[test]
    fn options_serialize_as_camel_case_json() {
        let options = PixelationOptions::new(12, ColorMode::Retro, EdgeMode::Hard);
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(
            json,
            r#"{"pixelSize":12,"colorMode":"retro","edgeMode":"hard"}"#
        );
        let back: PixelationOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }

    // --- InputError tests ---

    #[test]
    fn input_error_kinds_have_stable_codes() {
        let too_large = InputError::FileTooLarge {
            size: 30,
            limit: 20,
        };
        assert_eq!(too_large.kind().code(), "FILE_TOO_LARGE");

        let too_wide = InputError::ResolutionTooLarge {
            width: 6000,
            height: 10,
            max_width: 5000,
            max_height: 5000,
        };
        assert_eq!(too_wide.kind().code(), "RESOLUTION_TOO_LARGE");
        assert_eq!(
            InputError::InvalidImage("x".into()).kind(),
            InputErrorKind::InvalidImage
        );
        assert_eq!(
            InputError::FileRead("x".into()).kind().to_string(),
            "FILE_READ_ERROR"
        );
    }

    #[test]
    fn default_limits() {
        let limits = InputLimits::default();
        assert_eq!(limits.max_file_bytes, 20 * 1024 * 1024);
        assert_eq!(limits.max_width, 5000);
        assert_eq!(limits.max_height, 5000);
    }
}
