//! # TraceSink: recording sink
//!
//! [`TraceSink`] stores every command it receives together with the instant it
//! arrived. It is meant for tests and demos, where the recorded trace is
//! compared against the expected timing pattern.
//!
//! Timestamps come from [`tokio::time::Instant`], so traces recorded under a
//! paused test clock are exact.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::SinkError;
use crate::sink::{Level, Sink};

/// One recorded command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    /// When the command reached the sink.
    pub at: Instant,
    /// Requested level.
    pub level: Level,
}

/// Sink that records commands instead of driving hardware.
#[derive(Debug, Default)]
pub struct TraceSink {
    records: Mutex<Vec<TraceRecord>>,
}

impl TraceSink {
    /// Construct an empty [`TraceSink`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all records so far, in arrival order.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.lock().clone()
    }

    /// Levels only, in arrival order.
    pub fn levels(&self) -> Vec<Level> {
        self.lock().iter().map(|r| r.level).collect()
    }

    /// Records as `(offset from origin, level)` pairs.
    pub fn offsets_from(&self, origin: Instant) -> Vec<(Duration, Level)> {
        self.lock()
            .iter()
            .map(|r| (r.at.saturating_duration_since(origin), r.level))
            .collect()
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    // A poisoned trace is still a valid trace.
    fn lock(&self) -> MutexGuard<'_, Vec<TraceRecord>> {
        self.records.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Sink for TraceSink {
    fn set(&self, level: Level) -> Result<(), SinkError> {
        self.lock().push(TraceRecord {
            at: Instant::now(),
            level,
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "trace"
    }
}
