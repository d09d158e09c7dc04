//! # Listener notifier: fire-and-forget completion dispatch.
//!
//! [`Notifier::notify`] spawns one short-lived task per notification and returns
//! immediately; the worker never awaits listeners.
//!
//! ```text
//! worker ── notify(entry, listener) ──► tokio::spawn ─┬─► [acquire slot]   (optional semaphore)
//!   │                                                 ├─► listener.on_complete()
//!   ▼                                                 └─► panic? → log + ListenerPanicked
//! next entry
//! ```
//!
//! ## Rules
//! - The concurrency slot is acquired **inside** the spawned task.
//! - Panics are caught per notification and never reach the worker.
//! - No ordering between notifications.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;

use crate::core::panic_message;
use crate::events::{Bus, Event, EventKind};
use crate::listeners::ListenerRef;

/// Spawns listener notifications with optional concurrency cap.
#[derive(Clone)]
pub(crate) struct Notifier {
    bus: Bus,
    slots: Option<Arc<Semaphore>>,
}

impl Notifier {
    pub(crate) fn new(bus: Bus, limit: Option<usize>) -> Self {
        Self {
            bus,
            slots: limit.map(Semaphore::new).map(Arc::new),
        }
    }

    /// Dispatches `listener` for `entry` without waiting for it.
    pub(crate) fn notify(&self, entry: u64, listener: ListenerRef) {
        let bus = self.bus.clone();
        let slots = self.slots.clone();

        tokio::spawn(async move {
            let _permit = match slots {
                Some(sem) => match sem.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_closed) => return,
                },
                None => None,
            };

            let fut = listener.on_complete();
            if let Err(panic_err) = AssertUnwindSafe(fut).catch_unwind().await {
                let info = panic_message(&*panic_err);
                log::warn!(
                    "listener '{}' for entry {} panicked: {}",
                    listener.name(),
                    entry,
                    info
                );
                bus.publish(
                    Event::new(EventKind::ListenerPanicked)
                        .with_entry(entry)
                        .with_listener(listener.name())
                        .with_reason(info),
                );
            }
        });
    }
}
