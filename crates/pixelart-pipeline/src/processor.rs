//! The image processor: upload, parameter, history, and display state.
//!
//! ```text
//!            load ok                 process
//!   Empty ──────────► Loaded ─────────────────► Processing ──► Ready
//!     ▲                 ▲  load rejected             │  surface    │
//!     │ reset           └───────── Error ◄───────────┘  failure    │
//!     └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A processor owns the current source bitmap, the latest result, the
//! undo/redo log, and the two display surfaces. Hosts feed it bytes and
//! parameters and read back state; it never talks to the browser or
//! the filesystem directly.
//!
//! # Superseded runs
//!
//! Every [`begin`](ImageProcessor::begin) bumps a generation counter and
//! returns a [`ProcessingTicket`] stamped with it. A result handed to
//! [`finish`](ImageProcessor::finish) whose ticket is no longer current
//! is dropped as [`Outcome::Stale`]. Loading a new image, undo/redo, and
//! reset also advance the generation, so results computed against an
//! old source or an abandoned parameter set never reach the screen.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::debounce::{DEFAULT_QUIET_PERIOD, Debouncer};
use crate::engine::{CooperativeYield, PixelationEngine, ProgressListener, Yielder};
use crate::history::{HistoryManager, MAX_HISTORY_SIZE};
use crate::input;
use crate::presets::{self, PresetId};
use crate::surface::{RenderTarget, Surface, SurfaceError};
use crate::types::{
    Bitmap, Dimensions, InputError, InputLimits, PixelationOptions, ProcessingProgress,
};

/// Tunables for an [`ImageProcessor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessorConfig {
    /// Upload limits.
    pub limits: InputLimits,
    /// Number of undo/redo entries kept.
    pub history_capacity: usize,
    /// Quiet period for [`ImageProcessor::request`].
    pub debounce: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            limits: InputLimits::default(),
            history_capacity: MAX_HISTORY_SIZE,
            debounce: DEFAULT_QUIET_PERIOD,
        }
    }
}

/// Lifecycle of the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorState {
    /// No image loaded.
    Empty,
    /// An image is loaded but has not been processed yet.
    Loaded,
    /// A run has begun and not yet finished.
    Processing,
    /// A processed result is displayed.
    Ready,
    /// The last operation failed; the message is user-facing.
    Error(String),
}

impl ProcessorState {
    /// `true` for [`ProcessorState::Processing`].
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        matches!(self, Self::Processing)
    }
}

/// Errors returned by [`ImageProcessor`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    /// The upload was rejected.
    #[error(transparent)]
    Input(#[from] InputError),

    /// Processing was requested before any image was loaded.
    #[error("no image loaded")]
    NoImage,

    /// The requested options cannot be processed.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// A display surface could not be acquired at construction.
    #[error("display surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// Drawing to a display surface failed.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// A claim on one processing run.
///
/// Carries everything the engine needs, so the host may run the engine
/// wherever it likes before handing the result back to
/// [`ImageProcessor::finish`].
#[derive(Debug, Clone)]
#[must_use = "a ticket must be passed to finish() for its result to be displayed"]
pub struct ProcessingTicket {
    generation: u64,
    options: PixelationOptions,
    source: Rc<Bitmap>,
}

impl ProcessingTicket {
    /// Options for this run.
    pub const fn options(&self) -> PixelationOptions {
        self.options
    }

    /// The source bitmap as it was when the run began.
    pub fn source(&self) -> &Bitmap {
        &self.source
    }

    /// Generation stamp.
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// What [`ImageProcessor::finish`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Displayed and recorded in history.
    Applied,
    /// Discarded because a newer run or navigation superseded it.
    Stale,
}

/// Controller tying the engine, history, debouncer, and surfaces together.
pub struct ImageProcessor<S: Surface, Y: Yielder = CooperativeYield> {
    config: ProcessorConfig,
    engine: PixelationEngine<Y>,
    history: HistoryManager,
    debouncer: Debouncer<PixelationOptions>,
    source: Option<Rc<Bitmap>>,
    processed: Option<Bitmap>,
    options: PixelationOptions,
    state: ProcessorState,
    generation: u64,
    progress: Rc<Cell<Option<ProcessingProgress>>>,
    source_surface: S,
    output_surface: S,
}

impl<S: Surface> ImageProcessor<S> {
    /// Create a processor that yields cooperatively during runs.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError::SurfaceUnavailable`] if either target
    /// cannot provide a surface.
    pub fn new<T>(
        source_target: T,
        output_target: T,
        config: ProcessorConfig,
    ) -> Result<Self, ProcessorError>
    where
        T: RenderTarget<Surface = S>,
    {
        Self::with_yielder(source_target, output_target, config, CooperativeYield)
    }
}

impl<S: Surface, Y: Yielder> ImageProcessor<S, Y> {
    /// Create a processor whose engine suspends through `yielder`.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError::SurfaceUnavailable`] if either target
    /// cannot provide a surface.
    pub fn with_yielder<T>(
        source_target: T,
        output_target: T,
        config: ProcessorConfig,
        yielder: Y,
    ) -> Result<Self, ProcessorError>
    where
        T: RenderTarget<Surface = S>,
    {
        let source_surface = acquire(source_target)?;
        let output_surface = acquire(output_target)?;

        let progress = Rc::new(Cell::new(None));
        let mut engine = PixelationEngine::new(yielder);
        let sink = Rc::clone(&progress);
        engine.subscribe(move |p: ProcessingProgress| sink.set(Some(p)));

        Ok(Self {
            config,
            engine,
            history: HistoryManager::with_capacity(config.history_capacity),
            debouncer: Debouncer::new(config.debounce),
            source: None,
            processed: None,
            options: PixelationOptions::default(),
            state: ProcessorState::Empty,
            generation: 0,
            progress,
            source_surface,
            output_surface,
        })
    }

    // --- Loading ---

    /// Decode, validate, and display an uploaded file.
    ///
    /// On success the history and any previous result are cleared and
    /// the state becomes [`ProcessorState::Loaded`]. On rejection the
    /// state becomes [`ProcessorState::Error`] and a previously loaded
    /// image (with its history) is kept.
    ///
    /// # Errors
    ///
    /// [`ProcessorError::Input`] for size, decode, or resolution
    /// failures; [`ProcessorError::Surface`] if the source cannot be drawn.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<Dimensions, ProcessorError> {
        match input::decode_with_limits(bytes, &self.config.limits) {
            Ok(bitmap) => self.install(bitmap),
            Err(err) => Err(self.reject_input(err)),
        }
    }

    /// Same as [`load_bytes`](Self::load_bytes) for a pre-decoded bitmap.
    ///
    /// # Errors
    ///
    /// [`ProcessorError::Input`] for zero-area or oversized bitmaps;
    /// [`ProcessorError::Surface`] if the source cannot be drawn.
    pub fn load_bitmap(&mut self, bitmap: Bitmap) -> Result<Dimensions, ProcessorError> {
        match input::check_bitmap(&bitmap, &self.config.limits) {
            Ok(()) => self.install(bitmap),
            Err(err) => Err(self.reject_input(err)),
        }
    }

    /// Record a host-side read failure (the file never reached us).
    pub fn report_read_error(&mut self, message: &str) -> ProcessorError {
        self.reject_input(InputError::FileRead(message.to_owned()))
    }

    /// Record an upload rejected before its bytes reached the processor.
    ///
    /// Behaves like a failed [`load_bytes`](Self::load_bytes): the state
    /// becomes [`ProcessorState::Error`] and a loaded image is kept.
    pub fn reject_input(&mut self, err: InputError) -> ProcessorError {
        log::warn!("rejected upload ({}): {err}", err.kind());
        self.state = ProcessorState::Error(err.to_string());
        ProcessorError::Input(err)
    }

    fn install(&mut self, bitmap: Bitmap) -> Result<Dimensions, ProcessorError> {
        let dimensions = Dimensions::of(&bitmap);
        if let Err(err) = self.source_surface.draw(&bitmap) {
            self.state = ProcessorState::Error(err.to_string());
            return Err(err.into());
        }
        self.generation += 1;
        self.source = Some(Rc::new(bitmap));
        self.processed = None;
        self.output_surface.clear();
        self.history.clear();
        self.debouncer.cancel();
        self.progress.set(None);
        self.state = ProcessorState::Loaded;
        log::info!("loaded {dimensions} image");
        Ok(dimensions)
    }

    // --- Processing ---

    /// Claim a new run with `options`, superseding any run in flight.
    ///
    /// # Errors
    ///
    /// [`ProcessorError::NoImage`] before a successful load and
    /// [`ProcessorError::InvalidOptions`] for a zero pixel size. Neither
    /// changes the processor state.
    pub fn begin(
        &mut self,
        options: PixelationOptions,
    ) -> Result<ProcessingTicket, ProcessorError> {
        let source = self.source.as_ref().ok_or(ProcessorError::NoImage)?;
        options.validate().map_err(ProcessorError::InvalidOptions)?;

        self.generation += 1;
        self.options = options;
        self.state = ProcessorState::Processing;
        Ok(ProcessingTicket {
            generation: self.generation,
            options,
            source: Rc::clone(source),
        })
    }

    /// Deliver the result of a run started with [`begin`](Self::begin).
    ///
    /// # Errors
    ///
    /// [`ProcessorError::Surface`] if the result cannot be drawn; the
    /// state becomes [`ProcessorState::Error`].
    pub fn finish(
        &mut self,
        ticket: ProcessingTicket,
        result: Bitmap,
    ) -> Result<Outcome, ProcessorError> {
        if ticket.generation != self.generation {
            log::debug!(
                "discarding stale result (generation {} < {})",
                ticket.generation,
                self.generation
            );
            return Ok(Outcome::Stale);
        }
        if let Err(err) = self.output_surface.draw(&result) {
            log::warn!("failed to display result: {err}");
            self.state = ProcessorState::Error(err.to_string());
            return Err(err.into());
        }
        self.history.push_state(&result, ticket.options);
        self.processed = Some(result);
        self.state = ProcessorState::Ready;
        Ok(Outcome::Applied)
    }

    /// Run the engine with `options` and display the result.
    ///
    /// # Errors
    ///
    /// See [`begin`](Self::begin) and [`finish`](Self::finish).
    #[allow(clippy::future_not_send)]
    pub async fn process(&mut self, options: PixelationOptions) -> Result<Outcome, ProcessorError> {
        let ticket = self.begin(options)?;
        let result = self.engine.pixelate(ticket.source(), &ticket.options).await;
        self.finish(ticket, result)
    }

    /// Load `bytes` and immediately run the default options over them.
    ///
    /// This is the first pass an upload gets before the user touches any
    /// control.
    ///
    /// # Errors
    ///
    /// See [`load_bytes`](Self::load_bytes) and [`process`](Self::process).
    #[allow(clippy::future_not_send)]
    pub async fn load_and_process(&mut self, bytes: &[u8]) -> Result<Outcome, ProcessorError> {
        self.load_bytes(bytes)?;
        self.process(PixelationOptions::default()).await
    }

    /// Apply a built-in preset: all three parameters at once, then process.
    ///
    /// # Errors
    ///
    /// See [`process`](Self::process).
    #[allow(clippy::future_not_send)]
    pub async fn apply_preset(&mut self, id: PresetId) -> Result<Outcome, ProcessorError> {
        let preset = presets::preset(id);
        log::debug!("applying preset {id}");
        self.process(preset.options()).await
    }

    // --- Debounced requests ---

    /// Note a parameter change without processing yet.
    ///
    /// Bursts collapse to the last call; the run happens once the
    /// configured quiet period has passed (see
    /// [`process_pending`](Self::process_pending)).
    pub fn request(&mut self, options: PixelationOptions, now: Instant) {
        self.debouncer.request(options, now);
    }

    /// When the pending request becomes due, if any.
    #[must_use]
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Process the pending request if its quiet period has elapsed.
    ///
    /// Returns `Ok(None)` when nothing was due.
    ///
    /// # Errors
    ///
    /// See [`process`](Self::process).
    #[allow(clippy::future_not_send)]
    pub async fn process_pending(
        &mut self,
        now: Instant,
    ) -> Result<Option<Outcome>, ProcessorError> {
        match self.debouncer.take_due(now) {
            Some(options) => self.process(options).await.map(Some),
            None => Ok(None),
        }
    }

    // --- History navigation ---

    /// Show the previous result and restore its options.
    ///
    /// Returns `Ok(false)` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// [`ProcessorError::Surface`] if the restored bitmap cannot be drawn.
    /// The history position is left unchanged in that case.
    pub fn undo(&mut self) -> Result<bool, ProcessorError> {
        let Some(snapshot) = self.history.undo() else {
            return Ok(false);
        };
        if let Err(err) = self.show(snapshot.bitmap, snapshot.options) {
            // The cursor must keep pointing at what is on screen.
            self.history.redo();
            return Err(err);
        }
        Ok(true)
    }

    /// Show the next result and restore its options.
    ///
    /// Returns `Ok(false)` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// [`ProcessorError::Surface`] if the restored bitmap cannot be drawn.
    /// The history position is left unchanged in that case.
    pub fn redo(&mut self) -> Result<bool, ProcessorError> {
        let Some(snapshot) = self.history.redo() else {
            return Ok(false);
        };
        if let Err(err) = self.show(snapshot.bitmap, snapshot.options) {
            self.history.undo();
            return Err(err);
        }
        Ok(true)
    }

    fn show(&mut self, bitmap: Bitmap, options: PixelationOptions) -> Result<(), ProcessorError> {
        self.generation += 1;
        self.debouncer.cancel();
        if let Err(err) = self.output_surface.draw(&bitmap) {
            self.state = ProcessorState::Error(err.to_string());
            return Err(err.into());
        }
        self.processed = Some(bitmap);
        self.options = options;
        self.state = ProcessorState::Ready;
        Ok(())
    }

    /// Drop every history entry but keep the image and current result.
    pub fn clear_history(&mut self) {
        self.history.clear();
        log::debug!("history cleared");
    }

    /// Forget the image, results, and history.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.source = None;
        self.processed = None;
        self.source_surface.clear();
        self.output_surface.clear();
        self.history.clear();
        self.debouncer.cancel();
        self.progress.set(None);
        self.options = PixelationOptions::default();
        self.state = ProcessorState::Empty;
        log::debug!("processor reset");
    }

    // --- Accessors ---

    /// Register an additional progress listener on the engine.
    pub fn subscribe(&mut self, listener: impl ProgressListener + 'static) {
        self.engine.subscribe(listener);
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> &ProcessorState {
        &self.state
    }

    /// Options of the displayed result (or of the run in flight).
    #[must_use]
    pub const fn options(&self) -> PixelationOptions {
        self.options
    }

    /// The displayed result.
    #[must_use]
    pub const fn processed(&self) -> Option<&Bitmap> {
        self.processed.as_ref()
    }

    /// The loaded source image.
    #[must_use]
    pub fn source(&self) -> Option<&Bitmap> {
        self.source.as_deref()
    }

    /// Most recent stage notification of the current run.
    #[must_use]
    pub fn progress(&self) -> Option<ProcessingProgress> {
        self.progress.get()
    }

    /// Undo/redo log, for previews.
    #[must_use]
    pub const fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Whether [`undo`](Self::undo) would do anything.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether [`redo`](Self::redo) would do anything.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Surface showing the source image.
    #[must_use]
    pub const fn source_surface(&self) -> &S {
        &self.source_surface
    }

    /// Surface showing the result.
    #[must_use]
    pub const fn output_surface(&self) -> &S {
        &self.output_surface
    }
}

fn acquire<T: RenderTarget>(target: T) -> Result<T::Surface, ProcessorError> {
    target.acquire().map_err(|err| {
        log::warn!("{err}");
        ProcessorError::SurfaceUnavailable(err.to_string())
    })
}
