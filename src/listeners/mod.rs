//! # Completion listeners.
//!
//! - [`Listener`] trait for async "unit finished" notifications
//! - [`ListenerFn`] closure-backed implementation (async body)
//! - [`BlockingListenerFn`] closure-backed implementation run on the blocking pool
//! - [`ListenerRef`] shared handle (`Arc<dyn Listener>`)

#[allow(clippy::module_inception)]
mod listener;
mod blocking_fn;
mod listener_fn;

pub use blocking_fn::BlockingListenerFn;
pub use listener::{Listener, ListenerRef};
pub use listener_fn::ListenerFn;
