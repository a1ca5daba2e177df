//! Macrotask yielding for the browser.

use std::future::Future;

use pixelart_pipeline::Yielder;

/// Yields through `setTimeout(0)`.
///
/// A re-woken task on a microtask queue would starve rendering; a timer
/// callback lets the browser paint and handle input between chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerYield;

impl Yielder for TimerYield {
    fn yield_now(&self) -> impl Future<Output = ()> {
        gloo_timers::future::TimeoutFuture::new(0)
    }
}
