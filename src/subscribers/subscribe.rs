//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for observing the scheduler: logging,
//! metrics, UI feedback of what is currently being keyed. Each subscriber is
//! driven by a dedicated worker loop fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they do **not** block playback nor other subscribers.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If a queue overflows, events for that
//!   subscriber are **dropped** (warn).
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use morsekey::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct KeyedCounter(AtomicU64);
//!
//! #[async_trait::async_trait]
//! impl Subscribe for KeyedCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::UnitCompleted && ev.unit.is_some_and(|u| u.is_keyed()) {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "keyed-counter" }
//! }
//! ```

use crate::events::Event;
use async_trait::async_trait;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, events for this subscriber are **dropped** (warn).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
