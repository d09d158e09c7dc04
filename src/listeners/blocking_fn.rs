//! # Blocking listener (`BlockingListenerFn`)
//!
//! Listeners built with [`ListenerFn`](crate::ListenerFn) run on the async
//! runtime that also drives playback, so their bodies must not block the
//! thread. Anything that does (file or serial I/O, `std::thread::sleep`,
//! synchronous FFI) goes through [`BlockingListenerFn`] instead: the closure
//! runs on tokio's blocking thread pool and the playback worker keeps its
//! timing even on a `current_thread` runtime.
//!
//! A panic in the closure is re-raised in the notification task, so it is
//! reported as `ListenerPanicked` like any other listener panic.
//!
//! ## Example
//! ```rust
//! use morsekey::{BlockingListenerFn, ListenerRef};
//!
//! let l: ListenerRef = BlockingListenerFn::arc("log-to-file", || {
//!     // synchronous work; may block this thread
//!     std::thread::sleep(std::time::Duration::from_millis(5));
//! });
//! assert_eq!(l.name(), "log-to-file");
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;

use crate::listeners::Listener;

/// Listener whose synchronous body runs on the blocking thread pool.
pub struct BlockingListenerFn<F> {
    name: Cow<'static, str>,
    f: Arc<F>,
}

impl<F> BlockingListenerFn<F> {
    /// Creates a new blocking listener.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    /// Creates the listener and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F> Listener for BlockingListenerFn<F>
where
    F: Fn() + Send + Sync + 'static,
{
    async fn on_complete(&self) {
        let f = Arc::clone(&self.f);
        if let Err(err) = tokio::task::spawn_blocking(move || f()).await {
            if err.is_panic() {
                std::panic::resume_unwind(err.into_panic());
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
