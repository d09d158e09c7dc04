use std::sync::Arc;

use crate::{
    core::{Config, Scheduler},
    sink::Sink,
    subscribers::Subscribe,
};

/// Builder for constructing a [`Scheduler`] with optional subscribers.
pub struct SchedulerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SchedulerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (playback progress, failures,
    /// shutdown) through dedicated workers with bounded queues, starting
    /// with [`Scheduler::start`].
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the scheduler bound to `sink`.
    ///
    /// Nothing is spawned yet; units submitted before [`Scheduler::start`]
    /// are buffered.
    pub fn build(self, sink: Arc<dyn Sink>) -> Arc<Scheduler> {
        Arc::new(Scheduler::new_internal(self.cfg, sink, self.subscribers))
    }
}
