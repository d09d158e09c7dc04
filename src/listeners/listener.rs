//! # Completion listener contract
//!
//! A [`Listener`] is told that the unit it was attached to has finished
//! playing. Each notification runs in its own task, spawned by the worker and
//! never awaited by it: a listener can be slow, hang forever, or panic without
//! delaying the next unit.
//!
//! That task shares the runtime with the playback worker. A body that blocks
//! its thread belongs in a [`BlockingListenerFn`](crate::BlockingListenerFn),
//! which moves it to the blocking thread pool.
//!
//! ## Contract
//! - `on_complete` is called **at most once** per submission it was attached to.
//! - Notifications are not ordered relative to each other nor to later playback.
//! - Panics are caught, logged, and published as `ListenerPanicked`.
//! - `on_complete` must not block the thread; use `BlockingListenerFn` for that.

use std::sync::Arc;

use async_trait::async_trait;

/// Receiver of completion notifications.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Called after the unit finished playing (or was skipped as empty).
    async fn on_complete(&self);

    /// Human-readable name (for logs/events).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a listener.
pub type ListenerRef = Arc<dyn Listener>;
