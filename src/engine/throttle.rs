//! Throttle for remote match requests
//!
//! Limits how often keystrokes turn into server requests. The first fire in
//! a quiet period goes through immediately; fires during the window collapse
//! into a single trailing fire at the window's end.

use std::time::{Duration, Instant};

/// Default throttle window for remote requests
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(150);

/// Leading and trailing edge throttle driven by explicit timestamps.
///
/// Holds a single pending flag rather than a queue: whatever the caller
/// reads at fire time (e.g. the latest token) is what gets sent.
#[derive(Debug)]
pub struct Throttle {
    /// Minimum spacing between two fires
    interval: Duration,
    /// End of the current window, if one is open
    window_end: Option<Instant>,
    /// Whether a fire arrived during the open window
    pending: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            window_end: None,
            pending: false,
        }
    }

    /// Request a fire at `now`.
    ///
    /// Returns `true` if the action should run immediately. Otherwise the
    /// request is remembered and reported by a later [`Throttle::poll`].
    pub fn fire(&mut self, now: Instant) -> bool {
        if self.in_window(now) {
            self.pending = true;
            return false;
        }
        self.open_window(now);
        true
    }

    /// Check whether a trailing fire is due at `now`.
    ///
    /// Returns `true` at most once per window, and only if a fire was
    /// requested while the window was open.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.window_end {
            Some(end) if now >= end => {
                self.window_end = None;
                if self.pending {
                    self.open_window(now);
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    /// Drop the open window and any pending fire
    pub fn cancel(&mut self) {
        self.window_end = None;
        self.pending = false;
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn in_window(&self, now: Instant) -> bool {
        self.window_end.is_some_and(|end| now < end)
    }

    fn open_window(&mut self, now: Instant) {
        self.window_end = Some(now + self.interval);
        self.pending = false;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE)
    }
}
