//! # Runtime events emitted by the scheduler and its worker.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Worker events**: the playback worker's own lifecycle
//! - **Playback events**: per-entry progress (started, completed, skipped, ...)
//! - **Failure events**: sink errors, listener panics, rejected submissions
//! - **Shutdown events**: stop requests and how they ended
//!
//! The [`Event`] struct carries metadata such as the entry id, the unit, the
//! level of a failed sink command, and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use morsekey::{Event, EventKind, Level, TimingUnit};
//!
//! let ev = Event::new(EventKind::SinkFailed)
//!     .with_entry(7)
//!     .with_unit(TimingUnit::Dash)
//!     .with_level(Level::Off)
//!     .with_reason("relay stuck");
//!
//! assert_eq!(ev.kind, EventKind::SinkFailed);
//! assert_eq!(ev.entry, Some(7));
//! assert_eq!(ev.reason.as_deref(), Some("relay stuck"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::sink::Level;
use crate::units::TimingUnit;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Worker events ===
    /// Playback worker started.
    ///
    /// Sets:
    /// - `count`: units already queued at start
    WorkerStarted,

    /// Playback worker exited normally.
    ///
    /// Sets:
    /// - `reason`: `drained`, `discarded` or `closed`
    /// - `count`: units dropped without playing (discard only)
    WorkerStopped,

    /// Playback worker died (panic); no further unit will be played.
    ///
    /// Sets:
    /// - `reason`: panic message
    WorkerLost,

    // === Playback events ===
    /// Worker began playing an entry.
    ///
    /// Sets:
    /// - `entry`, `unit`
    UnitStarted,

    /// Entry played to the end of its last hold.
    ///
    /// Sets:
    /// - `entry`, `unit`
    UnitCompleted,

    /// Entry carried an empty unit: no commands, no delay.
    ///
    /// Sets:
    /// - `entry`, `unit`
    UnitSkipped,

    /// Entry playback was cut short by a discarding stop.
    ///
    /// Sets:
    /// - `entry`, `unit`
    UnitInterrupted,

    // === Failure events ===
    /// Sink returned an error for one command; playback continued.
    ///
    /// Sets:
    /// - `entry`, `unit`, `level`
    /// - `reason`: sink error message
    SinkFailed,

    /// Completion listener panicked (isolated in its own task).
    ///
    /// Sets:
    /// - `entry`
    /// - `listener`: listener name
    /// - `reason`: panic message
    ListenerPanicked,

    /// Submission arrived after the queue was closed and was dropped.
    ///
    /// Sets:
    /// - `unit`
    /// - `count`: number of units in the rejected submission
    SubmitRejected,

    // === Shutdown events ===
    /// `stop` was called.
    ///
    /// Sets:
    /// - `reason`: `drain` or `discard`
    /// - `count`: units accepted but not finished at that moment
    StopRequested,

    /// Worker finished within the grace period.
    StoppedWithinGrace,

    /// Drain did not finish within the grace period; the rest was discarded.
    ///
    /// Sets:
    /// - `count`: units not finished when the grace period ran out, the
    ///   interrupted in-flight unit included; all of them were discarded
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Entry id, if applicable.
    pub entry: Option<u64>,
    /// Unit of the entry, if applicable.
    pub unit: Option<TimingUnit>,
    /// Sink command level (for sink failures).
    pub level: Option<Level>,
    /// Listener name (for listener events).
    pub listener: Option<Arc<str>>,
    /// Human-readable reason (errors, stop modes, etc.).
    pub reason: Option<Arc<str>>,
    /// Number of units the event is about; its meaning depends on the kind
    /// (queued at start, dropped, rejected, discarded). See [`EventKind`].
    pub count: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            entry: None,
            unit: None,
            level: None,
            listener: None,
            reason: None,
            count: None,
        }
    }

    /// Attaches an entry id.
    #[inline]
    pub fn with_entry(mut self, id: u64) -> Self {
        self.entry = Some(id);
        self
    }

    /// Attaches a unit.
    #[inline]
    pub fn with_unit(mut self, unit: TimingUnit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Attaches a sink command level.
    #[inline]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Attaches a listener name.
    #[inline]
    pub fn with_listener(mut self, name: impl Into<Arc<str>>) -> Self {
        self.listener = Some(name.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a unit count.
    #[inline]
    pub fn with_count(mut self, n: u64) -> Self {
        self.count = Some(n);
        self
    }

    /// True for events reporting a failure of some kind.
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            EventKind::WorkerLost
                | EventKind::SinkFailed
                | EventKind::ListenerPanicked
                | EventKind::SubmitRejected
                | EventKind::GraceExceeded
        )
    }
}
