//! `<canvas>` display surfaces.
//!
//! A [`CanvasTarget`] names a canvas element; acquiring it fetches the
//! 2D context once so every later draw is a single `putImageData`.

use pixelart_pipeline::{Bitmap, RenderTarget, Surface, SurfaceError};
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

/// Errors from canvas lookups.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// A browser API call returned an error or a required object was missing.
    #[error("canvas API error: {0}")]
    JsError(String),
}

impl From<JsValue> for CanvasError {
    fn from(value: JsValue) -> Self {
        Self::JsError(format!("{value:?}"))
    }
}

impl From<CanvasError> for SurfaceError {
    fn from(err: CanvasError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// A canvas element that may or may not be mounted yet.
#[derive(Debug, Clone)]
pub struct CanvasTarget {
    canvas: Option<HtmlCanvasElement>,
}

impl CanvasTarget {
    /// Wrap an element the host already holds.
    #[must_use]
    pub const fn new(canvas: HtmlCanvasElement) -> Self {
        Self {
            canvas: Some(canvas),
        }
    }

    /// Look up `<canvas id="...">` in the current document.
    ///
    /// A missing element is not an error here; it surfaces as
    /// [`SurfaceError::Unavailable`] on acquisition.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::JsError`] if there is no window or
    /// document.
    pub fn by_id(id: &str) -> Result<Self, CanvasError> {
        let window =
            web_sys::window().ok_or_else(|| CanvasError::JsError("no global window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| CanvasError::JsError("no document".into()))?;
        let canvas = document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok());
        if canvas.is_none() {
            log::warn!("no <canvas id={id:?}> in the document");
        }
        Ok(Self { canvas })
    }
}

impl RenderTarget for CanvasTarget {
    type Surface = CanvasSurface;

    fn acquire(self) -> Result<CanvasSurface, SurfaceError> {
        let canvas = self
            .canvas
            .ok_or_else(|| SurfaceError::Unavailable("canvas element is not mounted".into()))?;
        let context = canvas
            .get_context("2d")
            .map_err(CanvasError::from)?
            .ok_or_else(|| SurfaceError::Unavailable("2d context not supported".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|e| SurfaceError::Unavailable(format!("not a 2d context: {e:?}")))?;
        Ok(CanvasSurface { canvas, context })
    }
}

/// A canvas with its 2D context.
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// The underlying element.
    #[must_use]
    pub const fn element(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Surface for CanvasSurface {
    fn draw(&mut self, bitmap: &Bitmap) -> Result<(), SurfaceError> {
        let (width, height) = bitmap.dimensions();
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        let data =
            ImageData::new_with_u8_clamped_array_and_sh(Clamped(bitmap.as_raw()), width, height)
                .map_err(|e| SurfaceError::Draw(format!("{e:?}")))?;
        self.context
            .put_image_data(&data, 0.0, 0.0)
            .map_err(|e| SurfaceError::Draw(format!("{e:?}")))
    }

    fn clear(&mut self) {
        let width = f64::from(self.canvas.width());
        let height = f64::from(self.canvas.height());
        self.context.clear_rect(0.0, 0.0, width, height);
    }
}
