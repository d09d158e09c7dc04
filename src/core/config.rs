//! # Scheduler configuration.
//!
//! Provides [`Config`], the immutable settings injected at construction time.
//!
//! ## Sentinel values
//! - `max_listeners = 0` → unlimited (no listener semaphore created)
//! - `grace = 0s` → `stop(Drain)` gives up immediately and discards the queue

use std::time::Duration;

use crate::units::Timing;

/// Configuration for a [`Scheduler`](crate::Scheduler).
///
/// ## Field semantics
/// - `timing`: dot length; every other duration derives from it
/// - `grace`: maximum wait for a draining stop
/// - `max_listeners`: listener bodies running at once (`0` = unlimited)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use morsekey::{Config, Timing};
///
/// let mut cfg = Config::default();
/// cfg.timing = Timing::from_wpm(20);
/// cfg.grace = Duration::from_secs(2);
///
/// assert_eq!(cfg.timing.dot(), Duration::from_millis(60));
/// assert_eq!(cfg.listener_limit(), None);
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    /// Base timing (dot length and derived durations).
    pub timing: Timing,

    /// Maximum time `stop(StopMode::Drain)` waits for queued units to play.
    ///
    /// When exceeded, the rest of the queue is discarded and
    /// `SchedulerError::GraceExceeded` is returned.
    pub grace: Duration,

    /// Maximum number of listener notifications running concurrently.
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = further notifications wait for a free slot
    ///
    /// Waiting happens inside the notification task, never in the worker.
    pub max_listeners: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns a config with the given dot length and defaults elsewhere.
    pub fn with_dot(dot: Duration) -> Self {
        Self {
            timing: Timing::new(dot),
            ..Self::default()
        }
    }

    /// Returns the listener concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited (no semaphore)
    /// - `Some(n)` → at most `n` concurrent listener bodies
    #[inline]
    pub fn listener_limit(&self) -> Option<usize> {
        if self.max_listeners == 0 {
            None
        } else {
            Some(self.max_listeners)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `timing = Timing::default()` (100 ms dot)
    /// - `grace = 5s`
    /// - `max_listeners = 0` (unlimited)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            grace: Duration::from_secs(5),
            max_listeners: 0,
            bus_capacity: 1024,
        }
    }
}
