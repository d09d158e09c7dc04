//! # Subscriber fan-out
//!
//! The scheduler's fan-out task reads every [`Event`] off the bus and hands it
//! to [`SubscriberSet::emit`]. Each subscriber owns a lane: a bounded queue
//! sized by [`Subscribe::queue_capacity`] and a task that feeds it to
//! `on_event` one event at a time.
//!
//! ```text
//!  Bus ─► fan-out task ─► emit(&Event) ─┬─► lane "log"     ─► on_event()
//!                                       └─► lane "display" ─► on_event()
//! ```
//!
//! A subscriber sees events in publish order (`UnitStarted` before
//! `UnitCompleted` for the same entry), but two subscribers are not in step
//! with each other. A subscriber that falls behind loses events once its
//! lane is full; the loss is logged and counted in [`SubscriberSet::dropped`].
//! It never delays playback or the other lanes. A panic in `on_event` is
//! logged and the lane keeps going with the next event.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::Event;

use super::Subscribe;

struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
    task: JoinHandle<()>,
    dropped: AtomicU64,
}

impl Lane {
    fn open(sub: Arc<dyn Subscribe>) -> Self {
        let name = sub.name();
        let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));

        let task = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                let handled = std::panic::AssertUnwindSafe(sub.on_event(&ev))
                    .catch_unwind()
                    .await;
                if let Err(panic_err) = handled {
                    log::warn!(
                        "subscriber '{}' panicked on {:?}: {}",
                        sub.name(),
                        ev.kind,
                        crate::core::panic_message(&*panic_err)
                    );
                }
            }
        });

        Self {
            name,
            tx,
            task,
            dropped: AtomicU64::new(0),
        }
    }

    fn offer(&self, ev: &Arc<Event>) {
        let why = match self.tx.try_send(Arc::clone(ev)) {
            Ok(()) => return,
            Err(mpsc::error::TrySendError::Full(_)) => "lane full",
            Err(mpsc::error::TrySendError::Closed(_)) => "lane closed",
        };
        let n = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        log::warn!(
            "subscriber '{}' missed {:?} ({why}, {n} dropped so far)",
            self.name,
            ev.kind
        );
    }
}

/// Event fan-out to a fixed group of subscribers, one lane each.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
}

impl SubscriberSet {
    /// Opens one lane per subscriber.
    ///
    /// Spawns tasks, so it must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        Self {
            lanes: subs.into_iter().map(Lane::open).collect(),
        }
    }

    /// Queues `event` on every lane and returns without waiting for delivery.
    pub fn emit(&self, event: &Event) {
        if self.lanes.is_empty() {
            return;
        }
        let ev = Arc::new(event.clone());
        for lane in &self.lanes {
            lane.offer(&ev);
        }
    }

    /// Events lost so far across all lanes because a subscriber fell behind.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.lanes
            .iter()
            .map(|l| l.dropped.load(Ordering::Relaxed))
            .sum()
    }

    /// Closes every lane and waits until each subscriber has handled what was
    /// already queued for it.
    pub async fn shutdown(self) {
        let mut tasks = Vec::with_capacity(self.lanes.len());
        for lane in self.lanes {
            drop(lane.tx);
            tasks.push(lane.task);
        }
        for task in tasks {
            let _ = task.await;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}
