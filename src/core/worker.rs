//! # Worker: the single playback loop.
//!
//! Drains the queue strictly in submission order and plays one entry at a time.
//!
//! ## Architecture
//! ```text
//! Scheduler::submit* ──► [unbounded FIFO] ──► Worker::run()
//!
//! loop {
//!   ├─► wait for next batch          (sole idle suspension point)
//!   │     ├─ discard token  → drop everything queued, exit Discarded
//!   │     ├─ drain token    → close queue, keep draining
//!   │     └─ queue empty+closed → exit Drained / Closed
//!   └─► for entry in batch:
//!         ├─► play(entry)            (holds are the other suspension point)
//!         ├─► listener? → Notifier::notify (fire-and-forget)
//!         └─► pending -= 1
//! }
//! ```
//!
//! ## Rules
//! - Exactly one entry is in flight at any time.
//! - A listener is dispatched only after its entry fully played (or was skipped).
//! - Entries dropped by a discard never notify their listeners.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::notifier::Notifier;
use crate::core::player::{play, Outcome};
use crate::core::shared::Shared;
use crate::events::Bus;
use crate::sink::Sink;
use crate::units::{Entry, Timing};

/// Queue message: one submission call's entries, played contiguously.
pub(crate) type Batch = Vec<Entry>;

/// Why the worker loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    /// Drain requested; everything accepted was played.
    Drained,
    /// Discard requested; `dropped` units never played.
    Discarded { dropped: u64 },
    /// Every queue sender went away (scheduler dropped).
    Closed,
}

impl WorkerExit {
    pub(crate) fn as_label(&self) -> &'static str {
        match self {
            WorkerExit::Drained => "drained",
            WorkerExit::Discarded { .. } => "discarded",
            WorkerExit::Closed => "closed",
        }
    }

    pub(crate) fn dropped(&self) -> u64 {
        match self {
            WorkerExit::Discarded { dropped } => *dropped,
            _ => 0,
        }
    }
}

/// Owns the receiving end of the queue and everything playback needs.
pub(crate) struct Worker {
    pub(crate) rx: mpsc::UnboundedReceiver<Batch>,
    pub(crate) sink: Arc<dyn Sink>,
    pub(crate) timing: Timing,
    pub(crate) notifier: Notifier,
    pub(crate) bus: Bus,
    pub(crate) shared: Arc<Shared>,
}

impl Worker {
    /// Runs until drained, discarded or the queue closes.
    ///
    /// - `drain`: stop accepting, play what is queued, then exit
    /// - `discard`: interrupt the current hold and drop what is queued
    pub(crate) async fn run(
        mut self,
        drain: CancellationToken,
        discard: CancellationToken,
    ) -> WorkerExit {
        let mut closing = false;

        loop {
            let batch = tokio::select! {
                biased;
                _ = discard.cancelled() => return self.discard_queued(0),
                _ = drain.cancelled(), if !closing => {
                    self.rx.close();
                    closing = true;
                    continue;
                }
                msg = self.rx.recv() => match msg {
                    Some(batch) => batch,
                    None => break,
                },
            };

            let mut entries = batch.into_iter();
            while let Some(entry) = entries.next() {
                if discard.is_cancelled() {
                    return self.discard_queued(1 + entries.len() as u64);
                }
                let outcome = play(
                    &entry,
                    self.sink.as_ref(),
                    &self.timing,
                    &self.bus,
                    &discard,
                )
                .await;

                match outcome {
                    Outcome::Interrupted => {
                        return self.discard_queued(1 + entries.len() as u64);
                    }
                    Outcome::Completed | Outcome::Skipped => {
                        if let Some(listener) = entry.listener {
                            self.notifier.notify(entry.id, listener);
                        }
                        self.shared.finish(1);
                    }
                }
            }
        }

        if closing {
            WorkerExit::Drained
        } else {
            WorkerExit::Closed
        }
    }

    /// Closes the queue and drops every remaining batch.
    fn discard_queued(&mut self, already_dropped: u64) -> WorkerExit {
        self.rx.close();
        let mut dropped = already_dropped;
        while let Ok(batch) = self.rx.try_recv() {
            dropped += batch.len() as u64;
        }
        self.shared.finish(dropped);
        WorkerExit::Discarded { dropped }
    }
}
