//! Error types used by the scheduler and by signal sinks.
//!
//! This module defines two enums:
//!
//! - [`SchedulerError`]: lifecycle errors returned by [`Scheduler::start`](crate::Scheduler::start)
//!   and [`Scheduler::stop`](crate::Scheduler::stop).
//! - [`SinkError`]: failures reported by a [`Sink`](crate::Sink) implementation.
//!
//! Submitting units never fails from the caller's point of view; failures during
//! playback are only visible through logs and [`Event`](crate::Event)s.

use std::time::Duration;
use thiserror::Error;

use crate::core::SchedulerState;
use crate::sink::Level;

/// # Errors produced by the scheduler lifecycle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// `start` was called on a scheduler whose worker already ran.
    #[error("scheduler already started (state: {state:?})")]
    AlreadyStarted {
        /// State observed when the call was rejected.
        state: SchedulerState,
    },

    /// `stop` was called on a scheduler that is not running.
    #[error("scheduler is not running (state: {state:?})")]
    NotRunning {
        /// State observed when the call was rejected.
        state: SchedulerState,
    },

    /// The worker died unexpectedly; nothing will be played anymore.
    #[error("playback worker lost: {reason}")]
    WorkerLost {
        /// Panic message or join error.
        reason: String,
    },

    /// Draining the queue took longer than the configured grace period;
    /// the remaining entries were discarded.
    #[error("drain exceeded grace {grace:?}; {pending} unit(s) discarded")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Units not finished when the grace period ran out, including the
        /// interrupted in-flight one.
        pending: u64,
    },
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use morsekey::SchedulerError;
    /// use std::time::Duration;
    ///
    /// let err = SchedulerError::GraceExceeded { grace: Duration::from_secs(1), pending: 3 };
    /// assert_eq!(err.as_label(), "scheduler_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::AlreadyStarted { .. } => "scheduler_already_started",
            SchedulerError::NotRunning { .. } => "scheduler_not_running",
            SchedulerError::WorkerLost { .. } => "scheduler_worker_lost",
            SchedulerError::GraceExceeded { .. } => "scheduler_grace_exceeded",
        }
    }
}

/// # Errors reported by a signal sink.
#[non_exhaustive]
#[derive(Error, Debug, Clone)]
pub enum SinkError {
    /// The device refused the command.
    #[error("sink rejected {level} command: {reason}")]
    Rejected {
        /// Level that was requested.
        level: Level,
        /// Device-specific explanation.
        reason: String,
    },

    /// The device is gone (unplugged, closed, ...).
    #[error("sink unavailable: {reason}")]
    Unavailable {
        /// Device-specific explanation.
        reason: String,
    },
}

impl SinkError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SinkError::Rejected { .. } => "sink_rejected",
            SinkError::Unavailable { .. } => "sink_unavailable",
        }
    }
}
