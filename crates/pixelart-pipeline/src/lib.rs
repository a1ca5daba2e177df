//! pixelart-pipeline: Pure pixelation pipeline (sans-IO).
//!
//! Turns an RGBA bitmap into pixel art through:
//! downsample (block average) -> color mode -> optional edge softening
//! -> nearest-neighbor upsample.
//!
//! Around the engine sit the pieces an interactive editor needs: a
//! bounded undo/redo [`history`], named [`presets`], upload validation,
//! a parameter [`debounce`]r, and the [`ImageProcessor`] state machine
//! that ties them to two display [`surface`]s.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and bitmaps. Browser interaction lives in `pixelart-io`;
//! encoding for download lives in `pixelart-export`.

pub mod block;
pub mod color;
pub mod convolve;
pub mod debounce;
pub mod engine;
pub mod history;
pub mod input;
pub mod presets;
pub mod processor;
pub mod surface;
pub mod types;

pub use engine::{
    CooperativeYield, NoYield, PixelationEngine, ProgressListener, Yielder, pixelate_blocking,
};
pub use history::{EntryId, HistoryEntry, HistoryManager, HistorySnapshot, MAX_HISTORY_SIZE};
pub use presets::{Category, PRESETS, Preset, PresetId};
pub use processor::{
    ImageProcessor, Outcome, ProcessingTicket, ProcessorConfig, ProcessorError, ProcessorState,
};
pub use surface::{MemorySurface, MemoryTarget, RenderTarget, Surface, SurfaceError};
pub use types::{
    Bitmap, ColorMode, Dimensions, EdgeMode, InputError, InputErrorKind, InputLimits,
    ParseError, PixelationOptions, ProcessingProgress, Rgba, RgbaImage, Stage,
};
