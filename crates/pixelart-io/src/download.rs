//! Saving exports through the browser's download manager.
//!
//! There is no "write these bytes to disk" call on the web. An export is
//! wrapped in a `Blob`, exposed under an object URL, and handed to a
//! detached `<a download>` that is clicked once.
//!
//! Requires a browser environment (`wasm32-unknown-unknown` target).

use pixelart_export::Export;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Blob, BlobPropertyBag, Document, HtmlAnchorElement, Url};

/// Errors from starting a download.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// A browser API call returned an error.
    #[error("browser API error: {0}")]
    JsError(String),
}

impl From<JsValue> for DownloadError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

/// An object URL that is revoked when dropped.
struct ObjectUrl(String);

impl ObjectUrl {
    fn for_bytes(data: &[u8], mime_type: &str) -> Result<Self, DownloadError> {
        let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(data));
        let options = BlobPropertyBag::new();
        options.set_type(mime_type);
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
        Ok(Self(Url::create_object_url_with_blob(&blob)?))
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        if Url::revoke_object_url(&self.0).is_err() {
            log::debug!("could not revoke {}", self.0);
        }
    }
}

fn document() -> Result<Document, DownloadError> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| DownloadError::JsError("no document".into()))
}

/// Save an encoded export under its suggested file name.
///
/// # Errors
///
/// See [`trigger_download`].
pub fn download_export(export: &Export) -> Result<(), DownloadError> {
    trigger_download(&export.bytes, &export.filename, export.mime_type)
}

/// Offer `data` to the user as a file called `filename`.
///
/// # Errors
///
/// Returns [`DownloadError::JsError`] if the `Blob`, its URL, or the
/// link element cannot be created.
pub fn trigger_download(data: &[u8], filename: &str, mime_type: &str) -> Result<(), DownloadError> {
    let url = ObjectUrl::for_bytes(data, mime_type)?;
    let link = document()?
        .create_element("a")?
        .dyn_into::<HtmlAnchorElement>()
        .map_err(|_| DownloadError::JsError("<a> is not an anchor element".into()))?;
    link.set_href(&url.0);
    link.set_download(filename);
    // A detached anchor still starts the download when clicked.
    link.click();

    log::info!("download started: {filename} ({} bytes, {mime_type})", data.len());
    Ok(())
}
