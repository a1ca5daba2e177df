//! Coalescing of rapid parameter changes.
//!
//! A [`Debouncer`] remembers only the latest requested value and a
//! deadline. The host polls [`Debouncer::take_due`] from its own timer
//! (a `setTimeout` callback in the browser, a sleep loop natively); the
//! debouncer itself owns no clock and schedules nothing.

use std::time::Duration;

use web_time::Instant;

/// Default quiet period between the last change and processing.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(150);

/// Holds the most recent value until a quiet period passes.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet_period: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl<T> Debouncer<T> {
    /// A debouncer that waits `quiet_period` after the last request.
    #[must_use]
    pub const fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
        }
    }

    /// Configured quiet period.
    #[must_use]
    pub const fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Record `value`, replacing any pending one and restarting the wait.
    pub fn request(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet_period));
    }

    /// When the pending value becomes due, if there is one.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// `true` while a value is waiting.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if its deadline is at or before `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    /// Take the pending value regardless of the deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    /// Drop the pending value.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(150);

    #[test]
    fn nothing_due_before_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.request(1, start);
        assert_eq!(debouncer.take_due(start + Duration::from_millis(149)), None);
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.take_due(start + QUIET), Some(1));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn burst_coalesces_to_last_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(QUIET);
        for (i, value) in (1..=10).enumerate() {
            let at = start + Duration::from_millis(20) * u32::try_from(i).unwrap_or(0);
            debouncer.request(value, at);
        }
        let last = start + Duration::from_millis(180);
        assert_eq!(debouncer.deadline(), Some(last + QUIET));
        assert_eq!(debouncer.take_due(last + Duration::from_millis(100)), None);
        assert_eq!(debouncer.take_due(last + QUIET), Some(10));
        assert_eq!(debouncer.take_due(last + QUIET * 2), None);
    }

    #[test]
    fn flush_ignores_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.request("a", start);
        assert_eq!(debouncer.flush(), Some("a"));
        assert_eq!(debouncer.flush(), None);
    }

    #[test]
    fn cancel_drops_pending_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(QUIET);
        debouncer.request(5, start);
        debouncer.cancel();
        assert_eq!(debouncer.take_due(start + QUIET), None);
        assert_eq!(debouncer.deadline(), None);
    }

    #[test]
    fn default_uses_150ms() {
        let debouncer: Debouncer<u8> = Debouncer::default();
        assert_eq!(debouncer.quiet_period(), Duration::from_millis(150));
    }
}
