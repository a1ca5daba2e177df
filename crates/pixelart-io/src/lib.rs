//! pixelart-io: Browser I/O for pixelart.
//!
//! Canvas display surfaces for the image processor, `File` reading,
//! Blob downloads, and a `setTimeout`-based yielder so pixelation runs
//! without freezing the page.

pub mod canvas;
pub mod download;
pub mod file;
pub mod timer;

pub use canvas::{CanvasError, CanvasSurface, CanvasTarget};
pub use download::{DownloadError, download_export, trigger_download};
pub use file::{FileReadError, load_file, read_file};
pub use timer::TimerYield;
