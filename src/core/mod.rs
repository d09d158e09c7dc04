//! Scheduler core: queue, worker and lifecycle.
//!
//! The public API from this module is [`Scheduler`] (built through
//! [`SchedulerBuilder`]), its [`Config`], and the lifecycle types
//! [`SchedulerState`] and [`StopMode`].
//!
//! Internal modules:
//! - [`worker`]: the single playback loop draining the queue in order;
//! - [`player`]: plays one entry (sink commands + holds) and publishes events;
//! - [`notifier`]: fire-and-forget listener dispatch;
//! - [`shared`]: pending counter, idle wakeups and lifecycle state.

mod builder;
mod config;
mod notifier;
mod player;
mod scheduler;
mod shared;
mod worker;

#[cfg(test)]
mod tests;

pub use builder::SchedulerBuilder;
pub use config::Config;
pub use scheduler::{Scheduler, StopMode};
pub use shared::SchedulerState;

use std::any::Any;

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
