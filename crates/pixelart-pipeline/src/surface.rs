//! Presentation seams.
//!
//! The processor never knows how bitmaps are shown. It acquires one
//! [`Surface`] for the source image and one for the result from
//! [`RenderTarget`]s at construction time, then pushes complete bitmaps
//! into them. The browser crate implements these over `<canvas>`; the
//! in-memory versions here back native hosts and tests.

use crate::types::Bitmap;

/// Errors raised by a presentation surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    /// The target has no drawable surface (e.g. the element is not
    /// mounted).
    #[error("surface unavailable: {0}")]
    Unavailable(String),

    /// Drawing failed.
    #[error("failed to draw: {0}")]
    Draw(String),
}

/// Something that can display a bitmap.
pub trait Surface {
    /// Replace the surface contents with `bitmap`, resizing as needed.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Draw`] if the host rejects the pixels.
    fn draw(&mut self, bitmap: &Bitmap) -> Result<(), SurfaceError>;

    /// Blank the surface.
    fn clear(&mut self);
}

/// A handle from which a [`Surface`] can be obtained.
pub trait RenderTarget {
    /// Surface produced by this target.
    type Surface: Surface;

    /// Obtain the drawable surface.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Unavailable`] when the target cannot
    /// provide one.
    fn acquire(self) -> Result<Self::Surface, SurfaceError>;
}

/// Keeps the last drawn bitmap in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    contents: Option<Bitmap>,
    draws: usize,
}

impl MemorySurface {
    /// An empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The bitmap currently shown, if any.
    #[must_use]
    pub const fn contents(&self) -> Option<&Bitmap> {
        self.contents.as_ref()
    }

    /// Number of successful draws since creation.
    #[must_use]
    pub const fn draw_count(&self) -> usize {
        self.draws
    }
}

impl Surface for MemorySurface {
    fn draw(&mut self, bitmap: &Bitmap) -> Result<(), SurfaceError> {
        self.contents = Some(bitmap.clone());
        self.draws += 1;
        Ok(())
    }

    fn clear(&mut self) {
        self.contents = None;
    }
}

/// Target yielding a [`MemorySurface`], or failing on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryTarget {
    /// Acquisition succeeds.
    Available,
    /// Acquisition fails with [`SurfaceError::Unavailable`].
    Unmounted,
}

impl RenderTarget for MemoryTarget {
    type Surface = MemorySurface;

    fn acquire(self) -> Result<MemorySurface, SurfaceError> {
        match self {
            Self::Available => Ok(MemorySurface::new()),
            Self::Unmounted => Err(SurfaceError::Unavailable(
                "memory target is unmounted".into(),
            )),
        }
    }
}
