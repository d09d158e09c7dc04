//! # Function-backed listener (`ListenerFn`)
//!
//! [`ListenerFn`] wraps a closure `F: Fn() -> Fut`, producing a fresh future per
//! notification. Shared state goes through an explicit `Arc<...>` captured by
//! the closure.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use morsekey::{ListenerFn, ListenerRef};
//!
//! let done = Arc::new(AtomicU32::new(0));
//! let seen = Arc::clone(&done);
//! let l: ListenerRef = ListenerFn::arc("count", move || {
//!     let seen = Arc::clone(&seen);
//!     async move {
//!         seen.fetch_add(1, Ordering::SeqCst);
//!     }
//! });
//!
//! assert_eq!(l.name(), "count");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::listeners::Listener;

/// Function-backed listener implementation.
pub struct ListenerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ListenerFn<F> {
    /// Creates a new function-backed listener.
    ///
    /// Prefer [`ListenerFn::arc`] when you immediately need a [`ListenerRef`](crate::ListenerRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the listener and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Listener for ListenerFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_complete(&self) {
        (self.f)().await
    }

    fn name(&self) -> &str {
        &self.name
    }
}
