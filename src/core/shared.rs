//! # State shared between the scheduler handle and its worker.
//!
//! ## Rules
//! - `pending` counts accepted units not yet finished (played, skipped or dropped)
//! - `pending` is raised **before** a batch is sent and lowered by the worker
//! - reaching zero wakes every [`Scheduler::wait_idle`](crate::Scheduler::wait_idle) caller
//! - state transitions are compare-and-swap; `Failed` is terminal

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;

/// Lifecycle state of a [`Scheduler`](crate::Scheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    /// Built; submissions are buffered until `start`.
    Created = 0,
    /// Worker is playing.
    Running = 1,
    /// `stop` in progress.
    Stopping = 2,
    /// Worker exited after `stop`.
    Stopped = 3,
    /// Worker died unexpectedly.
    Failed = 4,
}

impl SchedulerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SchedulerState::Created,
            1 => SchedulerState::Running,
            2 => SchedulerState::Stopping,
            3 => SchedulerState::Stopped,
            _ => SchedulerState::Failed,
        }
    }
}

pub(crate) struct Shared {
    state: AtomicU8,
    pending: AtomicU64,
    idle: Notify,
    lost: Mutex<Option<String>>,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(SchedulerState::Created as u8),
            pending: AtomicU64::new(0),
            idle: Notify::new(),
            lost: Mutex::new(None),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Moves `from → to`; on mismatch returns the state actually observed.
    pub(crate) fn transition(
        &self,
        from: SchedulerState,
        to: SchedulerState,
    ) -> Result<(), SchedulerState> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(SchedulerState::from_u8)
    }

    /// Marks the end of a stop unless the worker already failed.
    pub(crate) fn mark_stopped(&self) {
        let _ = self.transition(SchedulerState::Stopping, SchedulerState::Stopped);
    }

    /// Records the worker's death. Pending units will never play, so idle
    /// waiters are released.
    pub(crate) fn mark_lost(&self, reason: String) {
        *self.lost.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason);
        self.state
            .store(SchedulerState::Failed as u8, Ordering::Release);
        self.pending.store(0, Ordering::Release);
        self.idle.notify_waiters();
    }

    pub(crate) fn lost_reason(&self) -> Option<String> {
        self.lost
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[inline]
    pub(crate) fn pending(&self) -> u64 {
        self.pending.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn add_pending(&self, n: u64) {
        self.pending.fetch_add(n, Ordering::AcqRel);
    }

    /// Lowers the pending count by `n` (saturating) and wakes idle waiters at zero.
    pub(crate) fn finish(&self, n: u64) {
        if n == 0 {
            return;
        }
        let prev = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |p| {
                Some(p.saturating_sub(n))
            })
            .unwrap_or(0);
        if prev <= n {
            self.idle.notify_waiters();
        }
    }

    /// Resolves once `pending` reaches zero.
    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}
