//! The four-stage pixelation engine.
//!
//! ```text
//! source ──► downsample ──► color ──► edge ──► upsample ──► result
//!            (block avg)   (mode)    (blur?)  (nearest)
//! ```
//!
//! Each stage reads the previous stage's complete output and allocates
//! a fresh bitmap; no stage starts before the previous one finishes.
//!
//! # Cooperative scheduling
//!
//! [`PixelationEngine::pixelate`] is `async` so that a host with a
//! single UI thread can keep painting while a large image is processed.
//! At regular row/pixel intervals the engine awaits
//! [`Yielder::yield_now`], handing control back to the executor. The
//! suspension points never change the output: [`pixelate`] and
//! [`pixelate_blocking`] produce identical bitmaps.
//!
//! [`pixelate`]: PixelationEngine::pixelate
//! [`pixelate_blocking`]: pixelate_blocking

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use web_time::Instant;

use crate::block::average_color;
use crate::color;
use crate::convolve::{Kernel, convolve_row};
use crate::types::{
    Bitmap, ColorMode, EdgeMode, PixelationOptions, ProcessingProgress, Rgba, Stage,
};

/// Downsample yields after every this many output rows.
pub const DOWNSAMPLE_YIELD_ROWS: u32 = 10;
/// Color transform yields after every this many pixels.
pub const COLOR_YIELD_PIXELS: usize = 1000;
/// Edge convolution yields after every this many rows.
pub const EDGE_YIELD_ROWS: u32 = 5;
/// Upsample yields after every this many output rows.
pub const UPSAMPLE_YIELD_ROWS: u32 = 20;

/// Hands control back to the host scheduler between chunks of work.
pub trait Yielder {
    /// Suspend once, resuming on a later tick of the executor.
    fn yield_now(&self) -> impl Future<Output = ()>;
}

/// Yields by returning `Pending` once and immediately re-waking itself.
///
/// Works with any executor: the task is rescheduled at the back of the
/// run queue, letting other ready tasks make progress first.
#[derive(Debug, Clone, Copy, Default)]
pub struct CooperativeYield;

impl Yielder for CooperativeYield {
    fn yield_now(&self) -> impl Future<Output = ()> {
        YieldNow { yielded: false }
    }
}

/// Never suspends; the async pipeline runs straight through.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoYield;

impl Yielder for NoYield {
    fn yield_now(&self) -> impl Future<Output = ()> {
        std::future::ready(())
    }
}

struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Receives stage-boundary progress notifications.
///
/// Purely observational: listeners cannot influence the result.
pub trait ProgressListener {
    /// Called with `progress == 0` before a stage and `100` after it.
    fn on_progress(&mut self, progress: ProcessingProgress);
}

impl<F: FnMut(ProcessingProgress)> ProgressListener for F {
    fn on_progress(&mut self, progress: ProcessingProgress) {
        self(progress);
    }
}

/// Runs the downsample → color → edge → upsample pipeline.
pub struct PixelationEngine<Y = CooperativeYield> {
    yielder: Y,
    listeners: Vec<Box<dyn ProgressListener>>,
}

impl Default for PixelationEngine<CooperativeYield> {
    fn default() -> Self {
        Self::new(CooperativeYield)
    }
}

impl<Y: Yielder> PixelationEngine<Y> {
    /// Create an engine that suspends through `yielder`.
    #[must_use]
    pub fn new(yielder: Y) -> Self {
        Self {
            yielder,
            listeners: Vec::new(),
        }
    }

    /// Register a progress listener.
    pub fn subscribe(&mut self, listener: impl ProgressListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Remove every registered listener.
    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    /// Pixelate `source`, yielding to the host periodically.
    ///
    /// The result always has the source dimensions. `options.pixel_size`
    /// must be at least 1 (callers validate this); a pixel size of zero
    /// is treated as 1.
    #[allow(clippy::future_not_send)] // listeners are single-threaded observers
    pub async fn pixelate(&mut self, source: &Bitmap, options: &PixelationOptions) -> Bitmap {
        if source.width() == 0 || source.height() == 0 {
            return Bitmap::new(source.width(), source.height());
        }
        let size = options.pixel_size.max(1);
        let started = Instant::now();

        self.report(Stage::Downsample, 0);
        let downsampled = self.downsample(source, size).await;
        self.report(Stage::Downsample, 100);

        self.report(Stage::Color, 0);
        let colored = self.apply_color(&downsampled, options.color_mode).await;
        self.report(Stage::Color, 100);

        self.report(Stage::Edge, 0);
        let edged = match options.edge_mode {
            EdgeMode::Hard => colored,
            EdgeMode::Soft => self.soften(&colored).await,
        };
        self.report(Stage::Edge, 100);

        self.report(Stage::Upsample, 0);
        let result = self
            .upsample(&edged, source.width(), source.height(), size)
            .await;
        self.report(Stage::Upsample, 100);

        log::debug!(
            "pixelated {}x{} with {options} via {}x{} grid in {:?}",
            source.width(),
            source.height(),
            edged.width(),
            edged.height(),
            started.elapsed(),
        );
        result
    }

    fn report(&mut self, stage: Stage, progress: u8) {
        let event = ProcessingProgress { stage, progress };
        for listener in &mut self.listeners {
            listener.on_progress(event);
        }
    }

    async fn downsample(&self, source: &Bitmap, size: u32) -> Bitmap {
        let (width, height) = downsampled_dimensions(source, size);
        let mut out = Bitmap::new(width, height);
        for y in 0..height {
            downsample_row(source, size, y, &mut out);
            if y % DOWNSAMPLE_YIELD_ROWS == 0 {
                self.yielder.yield_now().await;
            }
        }
        out
    }

    async fn apply_color(&self, bitmap: &Bitmap, mode: ColorMode) -> Bitmap {
        let mut out = bitmap.clone();
        if mode == ColorMode::Original {
            return out;
        }
        for (i, pixel) in out.pixels_mut().enumerate() {
            *pixel = color::transform(*pixel, mode);
            if i % COLOR_YIELD_PIXELS == 0 {
                self.yielder.yield_now().await;
            }
        }
        out
    }

    async fn soften(&self, bitmap: &Bitmap) -> Bitmap {
        let kernel = Kernel::soft_edge();
        let mut out = Bitmap::new(bitmap.width(), bitmap.height());
        for y in 0..bitmap.height() {
            convolve_row(bitmap, &kernel, y, &mut out);
            if y % EDGE_YIELD_ROWS == 0 {
                self.yielder.yield_now().await;
            }
        }
        out
    }

    async fn upsample(&self, grid: &Bitmap, width: u32, height: u32, size: u32) -> Bitmap {
        let mut out = Bitmap::new(width, height);
        for y in 0..height {
            upsample_row(grid, size, y, &mut out);
            if y % UPSAMPLE_YIELD_ROWS == 0 {
                self.yielder.yield_now().await;
            }
        }
        out
    }
}

/// Synchronous pixelation, for callers without an executor.
///
/// Produces exactly the same bitmap as [`PixelationEngine::pixelate`].
#[must_use]
pub fn pixelate_blocking(source: &Bitmap, options: &PixelationOptions) -> Bitmap {
    let mut engine = PixelationEngine::new(NoYield);
    let mut fut = std::pin::pin!(engine.pixelate(source, options));
    let mut cx = Context::from_waker(std::task::Waker::noop());
    loop {
        // `NoYield` never returns `Pending`, so this resolves on the
        // first poll.
        if let Poll::Ready(bitmap) = fut.as_mut().poll(&mut cx) {
            return bitmap;
        }
    }
}

/// Size of the downsampled grid: `floor(dim / size)`, but never below
/// one cell per axis so oversized blocks still produce a 1x1 grid.
#[must_use]
pub fn downsampled_dimensions(source: &Bitmap, size: u32) -> (u32, u32) {
    let size = size.max(1);
    (
        (source.width() / size).max(1),
        (source.height() / size).max(1),
    )
}

fn downsample_row(source: &Bitmap, size: u32, y: u32, out: &mut Bitmap) {
    for x in 0..out.width() {
        // Grid cells always start inside the source, so the block is
        // never empty; the fallback is unreachable.
        let avg = average_color(source, x * size, y * size, size, size)
            .unwrap_or(Rgba([0, 0, 0, 0]));
        out.put_pixel(x, y, avg);
    }
}

fn upsample_row(grid: &Bitmap, size: u32, y: u32, out: &mut Bitmap) {
    let sy = (y / size).min(grid.height() - 1);
    for x in 0..out.width() {
        let sx = (x / size).min(grid.width() - 1);
        out.put_pixel(x, y, *grid.get_pixel(sx, sy));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[allow(clippy::cast_possible_truncation)]
    fn gradient(width: u32, height: u32) -> Bitmap {
        Bitmap::from_fn(width, height, |x, y| {
            Rgba([
                ((x * 7) % 256) as u8,
                ((y * 11) % 256) as u8,
                ((x + y) * 3 % 256) as u8,
                255 - ((x * y) % 128) as u8,
            ])
        })
    }

    fn options(size: u32, color_mode: ColorMode, edge_mode: EdgeMode) -> PixelationOptions {
        PixelationOptions::new(size, color_mode, edge_mode)
    }

    #[tokio::test]
    async fn output_has_source_dimensions() {
        let source = gradient(37, 23);
        let mut engine: PixelationEngine = PixelationEngine::default();
        for size in [1, 2, 5, 10, 50, 100] {
            let out = engine
                .pixelate(&source, &options(size, ColorMode::Retro, EdgeMode::Soft))
                .await;
            assert_eq!(out.dimensions(), (37, 23), "pixel size {size}");
        }
    }

    #[tokio::test]
    async fn hard_original_blocks_are_uniform() {
        let source = gradient(40, 30);
        let size = 4;
        let mut engine: PixelationEngine = PixelationEngine::default();
        let out = engine
            .pixelate(&source, &options(size, ColorMode::Original, EdgeMode::Hard))
            .await;
        for by in 0..(30 / size) {
            for bx in 0..(40 / size) {
                let first = *out.get_pixel(bx * size, by * size);
                for dy in 0..size {
                    for dx in 0..size {
                        assert_eq!(
                            *out.get_pixel(bx * size + dx, by * size + dy),
                            first,
                            "block ({bx},{by}) not uniform"
                        );
                    }
                }
                assert_eq!(
                    Some(first),
                    average_color(&source, bx * size, by * size, size, size)
                );
            }
        }
    }

    #[tokio::test]
    async fn pixel_size_one_hard_original_is_identity() {
        let source = gradient(13, 9);
        let mut engine: PixelationEngine = PixelationEngine::default();
        let out = engine
            .pixelate(&source, &options(1, ColorMode::Original, EdgeMode::Hard))
            .await;
        assert_eq!(out, source);
    }

    #[tokio::test]
    async fn solid_red_grayscale_becomes_76() {
        let source = Bitmap::from_pixel(100, 100, Rgba([255, 0, 0, 255]));
        let mut engine: PixelationEngine = PixelationEngine::default();
        let out = engine
            .pixelate(&source, &options(10, ColorMode::Grayscale, EdgeMode::Hard))
            .await;
        assert_eq!(out.dimensions(), (100, 100));
        assert!(out.pixels().all(|p| *p == Rgba([76, 76, 76, 255])));
    }

    #[tokio::test]
    async fn oversized_pixel_size_fills_with_average() {
        let source = Bitmap::from_fn(6, 4, |x, _| {
            if x < 3 {
                Rgba([0, 0, 0, 255])
            } else {
                Rgba([200, 100, 50, 255])
            }
        });
        assert_eq!(downsampled_dimensions(&source, 64), (1, 1));
        let mut engine: PixelationEngine = PixelationEngine::default();
        let out = engine
            .pixelate(&source, &options(64, ColorMode::Original, EdgeMode::Soft))
            .await;
        assert_eq!(out.dimensions(), (6, 4));
        assert!(out.pixels().all(|p| *p == Rgba([100, 50, 25, 255])));
    }

    #[test]
    fn tall_narrow_image_downsamples_to_one_column() {
        let source = gradient(3, 40);
        assert_eq!(downsampled_dimensions(&source, 5), (1, 8));
    }

    #[tokio::test]
    async fn trailing_partial_blocks_clamp_to_last_cell() {
        // 25 wide with size 10: the grid is 2 cells wide and columns
        // 20..25 repeat the second cell.
        let source = gradient(25, 10);
        let mut engine: PixelationEngine = PixelationEngine::default();
        let out = engine
            .pixelate(&source, &options(10, ColorMode::Original, EdgeMode::Hard))
            .await;
        for x in 20..25 {
            assert_eq!(out.get_pixel(x, 0), out.get_pixel(19, 0));
        }
    }

    #[tokio::test]
    async fn soft_edges_preserve_alpha_of_grid() {
        let source = gradient(32, 32);
        let mut engine: PixelationEngine = PixelationEngine::default();
        let hard = engine
            .pixelate(&source, &options(4, ColorMode::Vibrant, EdgeMode::Hard))
            .await;
        let soft = engine
            .pixelate(&source, &options(4, ColorMode::Vibrant, EdgeMode::Soft))
            .await;
        for (h, s) in hard.pixels().zip(soft.pixels()) {
            assert_eq!(h.0[3], s.0[3]);
        }
        assert_ne!(hard, soft, "soft edges should blend neighboring blocks");
    }

    #[tokio::test]
    async fn source_is_not_mutated() {
        let source = gradient(20, 20);
        let snapshot = source.clone();
        let mut engine: PixelationEngine = PixelationEngine::default();
        let _ = engine
            .pixelate(&source, &options(3, ColorMode::Sepia, EdgeMode::Soft))
            .await;
        assert_eq!(source, snapshot);
    }

    #[tokio::test]
    async fn empty_source_returns_empty_bitmap() {
        let mut engine: PixelationEngine = PixelationEngine::default();
        let out = engine
            .pixelate(&Bitmap::new(0, 5), &PixelationOptions::default())
            .await;
        assert_eq!(out.dimensions(), (0, 5));
    }

    #[tokio::test]
    async fn progress_reports_each_stage_in_order() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let mut engine: PixelationEngine = PixelationEngine::default();
        engine.subscribe(move |p: ProcessingProgress| sink.borrow_mut().push(p));

        let _ = engine
            .pixelate(&gradient(8, 8), &options(2, ColorMode::Original, EdgeMode::Hard))
            .await;

        let expected: Vec<ProcessingProgress> = Stage::ALL
            .into_iter()
            .flat_map(|stage| {
                [
                    ProcessingProgress { stage, progress: 0 },
                    ProcessingProgress {
                        stage,
                        progress: 100,
                    },
                ]
            })
            .collect();
        assert_eq!(*events.borrow(), expected);
    }

    #[tokio::test]
    async fn cleared_listeners_are_not_called() {
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let mut engine: PixelationEngine = PixelationEngine::default();
        engine.subscribe(move |_: ProcessingProgress| *sink.borrow_mut() += 1);
        engine.clear_listeners();
        let _ = engine
            .pixelate(&gradient(4, 4), &PixelationOptions::default())
            .await;
        assert_eq!(*count.borrow(), 0);
    }

    #[tokio::test]
    async fn yielding_does_not_change_output() {
        let source = gradient(64, 48);
        for opts in [
            options(3, ColorMode::Retro, EdgeMode::Soft),
            options(7, ColorMode::Sepia, EdgeMode::Hard),
            options(1, ColorMode::Vibrant, EdgeMode::Soft),
        ] {
            let mut engine = PixelationEngine::new(CooperativeYield);
            let yielded = engine.pixelate(&source, &opts).await;
            let blocking = pixelate_blocking(&source, &opts);
            assert_eq!(yielded, blocking, "mismatch for {opts}");
        }
    }

    #[test]
    fn cooperative_yield_suspends_exactly_once() {
        let mut fut = std::pin::pin!(CooperativeYield.yield_now());
        let mut cx = Context::from_waker(std::task::Waker::noop());
        assert!(fut.as_mut().poll(&mut cx).is_pending());
        assert!(fut.as_mut().poll(&mut cx).is_ready());
    }

    #[test]
    fn zero_pixel_size_is_treated_as_one() {
        let source = gradient(5, 5);
        let out = pixelate_blocking(
            &source,
            &options(0, ColorMode::Original, EdgeMode::Hard),
        );
        assert_eq!(out, source);
    }
}
