//! # Scheduler: ordered, non-blocking playback of timing units.
//!
//! The [`Scheduler`] owns the unit queue, the event bus and the playback worker.
//! Producers on any thread or task submit units; one worker plays them in
//! submission order against the [`Sink`].
//!
//! ## Key responsibilities
//! - accept units from any caller without waiting for playback
//! - keep a strict FIFO across all submissions that have returned
//! - run exactly one worker, bound to the scheduler's lifetime
//! - **fan-out** events to subscribers via [`SubscriberSet`]
//! - stop gracefully (drain within [`Config::grace`]) or immediately (discard)
//!
//! ## High-level architecture
//! ```text
//! Producers (any context):
//!   submit / submit_with / submit_all / submit_all_with / submit_sequence / submit_stream
//!        │
//!        ▼   (mutex: assign entry ids + send, never waits on playback)
//!   [unbounded FIFO of batches] ──► Worker::run() ──► play(entry) ──► Sink::set(On/Off)
//!                                          │                 └──► holds (sleep_until)
//!                                          └──► Notifier::notify(listener)   (spawned, not awaited)
//!
//! Event flow:
//!   Scheduler / Worker / Notifier ── publish(Event) ──► Bus ──► fan-out task ──► SubscriberSet::emit
//!
//! Lifecycle:
//!   Created ──start()──► Running ──stop(mode)──► Stopping ──► Stopped
//!                          │                        │
//!                          └──── worker panic ──────┴──► Failed   (WorkerLost, no restart)
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use morsekey::{Config, Scheduler, StopMode, TimingUnit, TraceSink};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sink = Arc::new(TraceSink::new());
//!     let sched = Scheduler::new(Config::with_dot(Duration::from_millis(5)), sink.clone());
//!     sched.start()?;
//!
//!     // "S": three dots, then a character pause
//!     sched.submit_all([TimingUnit::Dot, TimingUnit::Dot, TimingUnit::Dot]);
//!     sched.submit(TimingUnit::CharBoundaryPause);
//!
//!     sched.stop(StopMode::Drain).await?;
//!     assert_eq!(sink.len(), 6);
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::{FutureExt, Stream, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::notifier::Notifier;
use crate::core::shared::{SchedulerState, Shared};
use crate::core::worker::{Batch, Worker};
use crate::core::{panic_message, Config, SchedulerBuilder};
use crate::error::SchedulerError;
use crate::events::{Bus, Event, EventKind};
use crate::listeners::ListenerRef;
use crate::sink::Sink;
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::units::{Entry, Timing, TimingUnit};

/// How [`Scheduler::stop`] treats units that are still queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopMode {
    /// Refuse new units, play everything already accepted (bounded by `grace`).
    #[default]
    Drain,
    /// Cut the current unit short (signal forced Off) and drop the queue.
    Discard,
}

impl StopMode {
    /// Returns a short stable label for logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            StopMode::Drain => "drain",
            StopMode::Discard => "discard",
        }
    }
}

/// Sending side of the queue plus the entry id counter, guarded together so
/// that ids follow queue order.
struct Inbox {
    tx: mpsc::UnboundedSender<Batch>,
    next_id: u64,
}

/// Resources consumed by `start`.
struct Pending {
    rx: mpsc::UnboundedReceiver<Batch>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

/// Handles owned while running.
struct Running {
    worker: JoinHandle<()>,
    fanout: Option<JoinHandle<()>>,
}

/// Ordered asynchronous player of [`TimingUnit`]s.
///
/// All `submit*` methods take `&self`, return immediately and never fail from
/// the caller's point of view. Share the scheduler through the returned `Arc`.
pub struct Scheduler {
    cfg: Config,
    sink: Arc<dyn Sink>,
    bus: Bus,
    shared: Arc<Shared>,
    inbox: Mutex<Inbox>,
    startup: Mutex<Option<Pending>>,
    running: Mutex<Option<Running>>,
    drain: CancellationToken,
    discard: CancellationToken,
    fanout_done: CancellationToken,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Scheduler {
    /// Returns a builder for a scheduler with subscribers.
    pub fn builder(cfg: Config) -> SchedulerBuilder {
        SchedulerBuilder::new(cfg)
    }

    /// Creates a scheduler bound to `sink`, without subscribers.
    pub fn new(cfg: Config, sink: Arc<dyn Sink>) -> Arc<Self> {
        SchedulerBuilder::new(cfg).build(sink)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        sink: Arc<dyn Sink>,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let bus = Bus::new(cfg.bus_capacity_clamped());

        Self {
            cfg,
            sink,
            bus,
            shared: Arc::new(Shared::new()),
            inbox: Mutex::new(Inbox { tx, next_id: 0 }),
            startup: Mutex::new(Some(Pending { rx, subscribers })),
            running: Mutex::new(None),
            drain: CancellationToken::new(),
            discard: CancellationToken::new(),
            fanout_done: CancellationToken::new(),
        }
    }

    // ---------------------------
    // Lifecycle
    // ---------------------------

    /// Spawns the playback worker (and subscriber fan-out) on the current tokio runtime.
    ///
    /// Units submitted before this call start playing right away, in order.
    ///
    /// # Errors
    /// [`SchedulerError::AlreadyStarted`] if the worker was started before.
    ///
    /// # Panics
    /// Panics if called outside of a tokio runtime.
    pub fn start(&self) -> Result<(), SchedulerError> {
        self.shared
            .transition(SchedulerState::Created, SchedulerState::Running)
            .map_err(|state| SchedulerError::AlreadyStarted { state })?;

        let Some(Pending { rx, subscribers }) = lock(&self.startup).take() else {
            return Err(SchedulerError::AlreadyStarted {
                state: self.state(),
            });
        };

        let fanout = self.spawn_fanout(subscribers);

        self.bus.publish(
            Event::new(EventKind::WorkerStarted).with_count(self.shared.pending()),
        );

        let worker = Worker {
            rx,
            sink: Arc::clone(&self.sink),
            timing: self.cfg.timing,
            notifier: Notifier::new(self.bus.clone(), self.cfg.listener_limit()),
            bus: self.bus.clone(),
            shared: Arc::clone(&self.shared),
        };
        let worker = self.spawn_worker(worker);

        *lock(&self.running) = Some(Running { worker, fanout });
        Ok(())
    }

    /// Runs the worker under `catch_unwind`; a panic is fatal and reported loudly.
    fn spawn_worker(&self, worker: Worker) -> JoinHandle<()> {
        let drain = self.drain.clone();
        let discard = self.discard.clone();
        let bus = self.bus.clone();
        let shared = Arc::clone(&self.shared);

        tokio::spawn(async move {
            let run = std::panic::AssertUnwindSafe(worker.run(drain, discard))
                .catch_unwind()
                .await;

            match run {
                Ok(exit) => {
                    log::debug!(
                        "playback worker exited: {} ({} unit(s) dropped)",
                        exit.as_label(),
                        exit.dropped()
                    );
                    bus.publish(
                        Event::new(EventKind::WorkerStopped)
                            .with_reason(exit.as_label())
                            .with_count(exit.dropped()),
                    );
                }
                Err(panic_err) => {
                    let reason = panic_message(&*panic_err);
                    log::error!(
                        "playback worker lost: {reason}; submitted units will never play"
                    );
                    bus.publish(Event::new(EventKind::WorkerLost).with_reason(reason.as_str()));
                    shared.mark_lost(reason);
                }
            }
        })
    }

    /// Forwards bus events to the subscriber set until `fanout_done` fires,
    /// then flushes what is already buffered and shuts the set down.
    fn spawn_fanout(&self, subscribers: Vec<Arc<dyn Subscribe>>) -> Option<JoinHandle<()>> {
        if subscribers.is_empty() {
            return None;
        }
        let set = SubscriberSet::new(subscribers);
        let mut rx = self.bus.subscribe();
        let done = self.fanout_done.clone();

        Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            log::warn!("event fan-out lagged; {n} event(s) skipped");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = done.cancelled() => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => set.emit(&ev),
                                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
            set.shutdown().await;
        }))
    }

    /// Stops the worker.
    ///
    /// - [`StopMode::Drain`]: new submissions are refused, queued units keep
    ///   playing for at most [`Config::grace`]; past that the rest is discarded.
    /// - [`StopMode::Discard`]: the current hold is interrupted (signal forced
    ///   Off if it was On) and queued units are dropped without notifying
    ///   their listeners.
    ///
    /// Returns once the worker has exited and subscribers have processed every
    /// event published so far. Listener notifications already dispatched are
    /// not awaited.
    ///
    /// # Errors
    /// - [`SchedulerError::NotRunning`] if not started or already stopped
    /// - [`SchedulerError::WorkerLost`] if the worker died before or during the stop
    /// - [`SchedulerError::GraceExceeded`] if a drain ran out of time
    pub async fn stop(&self, mode: StopMode) -> Result<(), SchedulerError> {
        self.shared
            .transition(SchedulerState::Running, SchedulerState::Stopping)
            .map_err(|state| match state {
                SchedulerState::Failed => SchedulerError::WorkerLost {
                    reason: self.shared.lost_reason().unwrap_or_default(),
                },
                state => SchedulerError::NotRunning { state },
            })?;

        self.bus.publish(
            Event::new(EventKind::StopRequested)
                .with_reason(mode.as_label())
                .with_count(self.shared.pending()),
        );
        match mode {
            StopMode::Drain => self.drain.cancel(),
            StopMode::Discard => self.discard.cancel(),
        }

        let running = lock(&self.running).take();
        let mut result = Ok(());
        let mut fanout = None;

        if let Some(Running { mut worker, fanout: f }) = running {
            fanout = f;
            if time::timeout(self.cfg.grace, &mut worker).await.is_err() {
                let pending = self.shared.pending();
                self.discard.cancel();
                let _ = worker.await;
                result = Err(SchedulerError::GraceExceeded {
                    grace: self.cfg.grace,
                    pending,
                });
            }
        }

        if let Some(reason) = self.shared.lost_reason() {
            result = Err(SchedulerError::WorkerLost { reason });
        }

        match &result {
            Ok(()) => self.bus.publish(Event::new(EventKind::StoppedWithinGrace)),
            Err(SchedulerError::GraceExceeded { pending, .. }) => {
                log::warn!(
                    "drain exceeded grace {:?}; {} unit(s) discarded",
                    self.cfg.grace,
                    pending
                );
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_count(*pending));
            }
            Err(_) => {}
        }
        self.shared.mark_stopped();

        self.fanout_done.cancel();
        if let Some(handle) = fanout {
            let _ = handle.await;
        }
        result
    }

    // ---------------------------
    // Enqueue surface
    // ---------------------------

    /// Enqueues one unit.
    pub fn submit(&self, unit: impl Into<TimingUnit>) {
        self.enqueue(vec![(unit.into(), None)]);
    }

    /// Enqueues one unit; `listener` fires after it has played.
    pub fn submit_with(&self, unit: impl Into<TimingUnit>, listener: ListenerRef) {
        self.enqueue(vec![(unit.into(), Some(listener))]);
    }

    /// Enqueues all units, in order, as one contiguous batch.
    pub fn submit_all<I>(&self, units: I)
    where
        I: IntoIterator,
        I::Item: Into<TimingUnit>,
    {
        self.enqueue(units.into_iter().map(|u| (u.into(), None)).collect());
    }

    /// Enqueues all units as one contiguous batch; `listener` is attached to
    /// the **last** unit only. An empty batch never notifies.
    pub fn submit_all_with<I>(&self, units: I, listener: ListenerRef)
    where
        I: IntoIterator,
        I::Item: Into<TimingUnit>,
    {
        let mut items: Vec<(TimingUnit, Option<ListenerRef>)> =
            units.into_iter().map(|u| (u.into(), None)).collect();
        let Some(last) = items.last_mut() else {
            return;
        };
        last.1 = Some(listener);
        self.enqueue(items);
    }

    /// Consumes a lazy sequence, enqueuing each unit as it is produced.
    ///
    /// With a listener, one unit of lookahead is held back so that the
    /// listener can be bound to the final unit once the sequence is exhausted.
    /// An empty sequence never notifies.
    pub fn submit_sequence<I>(&self, units: I, listener: Option<ListenerRef>)
    where
        I: IntoIterator,
        I::Item: Into<TimingUnit>,
    {
        let mut units = units.into_iter().map(Into::<TimingUnit>::into);
        match listener {
            None => {
                for unit in units {
                    self.enqueue(vec![(unit, None)]);
                }
            }
            Some(listener) => {
                let Some(mut held) = units.next() else {
                    return;
                };
                for next in units {
                    self.enqueue(vec![(held, None)]);
                    held = next;
                }
                self.enqueue(vec![(held, Some(listener))]);
            }
        }
    }

    /// Async counterpart of [`submit_sequence`](Self::submit_sequence) for a
    /// [`Stream`] of units. Resolves once the stream is exhausted; playback
    /// is not awaited.
    pub async fn submit_stream<S>(&self, units: S, listener: Option<ListenerRef>)
    where
        S: Stream,
        S::Item: Into<TimingUnit>,
    {
        let units = units.map(Into::<TimingUnit>::into);
        futures::pin_mut!(units);
        match listener {
            None => {
                while let Some(unit) = units.next().await {
                    self.enqueue(vec![(unit, None)]);
                }
            }
            Some(listener) => {
                let Some(mut held) = units.next().await else {
                    return;
                };
                while let Some(next) = units.next().await {
                    self.enqueue(vec![(held, None)]);
                    held = next;
                }
                self.enqueue(vec![(held, Some(listener))]);
            }
        }
    }

    /// Appends one batch to the queue.
    ///
    /// Never blocks on playback. If the queue is closed (stopped, or worker
    /// lost) the batch is dropped with a warning and a `SubmitRejected` event.
    fn enqueue(&self, items: Vec<(TimingUnit, Option<ListenerRef>)>) {
        if items.is_empty() {
            return;
        }
        let n = items.len() as u64;

        let rejected = {
            let mut inbox = lock(&self.inbox);
            let first = inbox.next_id;
            inbox.next_id += n;

            let batch: Batch = items
                .into_iter()
                .zip(first..)
                .map(|((unit, listener), id)| Entry::new(id, unit, listener))
                .collect();

            self.shared.add_pending(n);
            inbox.tx.send(batch).err().map(|e| e.0)
        };

        if let Some(batch) = rejected {
            self.shared.finish(n);
            log::warn!(
                "scheduler queue closed ({:?}); dropped {} submitted unit(s)",
                self.state(),
                n
            );
            let mut ev = Event::new(EventKind::SubmitRejected).with_count(n);
            if let Some(first) = batch.first() {
                ev = ev.with_entry(first.id).with_unit(first.unit);
            }
            self.bus.publish(ev);
        }
    }

    // ---------------------------
    // Introspection
    // ---------------------------

    /// Units accepted but not yet played, skipped or dropped.
    pub fn pending(&self) -> u64 {
        self.shared.pending()
    }

    /// Resolves once every accepted unit has finished playing.
    ///
    /// Also resolves when the worker is lost. Before `start`, waits for the
    /// worker to be started and catch up.
    pub async fn wait_idle(&self) {
        self.shared.wait_idle().await
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.shared.state()
    }

    /// Configuration this scheduler was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Timing in use.
    pub fn timing(&self) -> Timing {
        self.cfg.timing
    }

    /// New receiver observing subsequent events directly from the bus.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }
}
