//! Reading uploaded files.
//!
//! All functions require a browser environment
//! (`wasm32-unknown-unknown` target).

use pixelart_pipeline::{Dimensions, ImageProcessor, InputError, ProcessorError, Surface, Yielder};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

/// Errors from reading a `File`.
#[derive(Debug, thiserror::Error)]
pub enum FileReadError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for FileReadError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// Read the full contents of a user-selected file.
///
/// Wraps `Blob.arrayBuffer()`.
///
/// # Errors
///
/// Returns [`FileReadError::JsError`] if the read is rejected.
#[allow(clippy::future_not_send)] // WASM is single-threaded; File is !Send
pub async fn read_file(file: &web_sys::File) -> Result<Vec<u8>, FileReadError> {
    let buffer = JsFuture::from(file.array_buffer()).await?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// Read `file` and hand it to `processor`.
///
/// The byte-size limit is checked against `File.size` before reading so
/// oversized uploads are rejected without buffering them. A failed read
/// is recorded on the processor as a `FILE_READ_ERROR`.
///
/// # Errors
///
/// Any [`ProcessorError`] from the load.
#[allow(clippy::future_not_send)] // WASM is single-threaded; File is !Send
pub async fn load_file<S: Surface, Y: Yielder>(
    processor: &mut ImageProcessor<S, Y>,
    file: &web_sys::File,
) -> Result<Dimensions, ProcessorError> {
    log::info!("reading {:?} ({} bytes)", file.name(), file.size());
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let size = file.size() as usize;
    let limit = processor.config().limits.max_file_bytes;
    if size > limit {
        return Err(processor.reject_input(InputError::FileTooLarge { size, limit }));
    }
    match read_file(file).await {
        Ok(bytes) => processor.load_bytes(&bytes),
        Err(err) => Err(processor.report_read_error(&err.to_string())),
    }
}
