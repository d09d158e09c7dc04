//! # morsekey
//!
//! **Morsekey** is a small asynchronous scheduler that plays Morse timing units
//! (dot, dash, character pause, word pause) against an on/off signal sink.
//!
//! Producers on any task or thread submit units and return immediately; one
//! playback worker per scheduler turns them into `On`/`Off` commands and
//! wall-clock holds, in strict submission order, and tells optional
//! completion listeners when their unit is done.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  producer #1 │   │  producer #2 │   │  producer #3 │
//!     │ submit(Dot)  │   │ submit_all() │   │submit_stream │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scheduler                                                        │
//! │  - unbounded FIFO of batches (ids assigned in queue order)        │
//! │  - Shared (pending counter, idle wakeups, lifecycle state)        │
//! │  - Bus (broadcast events)                                         │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬────────────────────────────────────────────────────┬───────┘
//!        ▼                                                    │
//!     ┌──────────────────────────────┐                        │
//!     │  Worker (single, sequential) │── Notifier ──► listener tasks
//!     │  play(entry) ──► Sink        │                        │
//!     └┬─────────────────────────────┘                        │
//!      │ Publishes: UnitStarted, UnitCompleted, SinkFailed... │
//!      ▼                                                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                     Bus (broadcast channel)                       │
//! │                  (capacity: Config::bus_capacity)                 │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                          fan-out task ──► SubscriberSet
//!                                  ┌─────────┼─────────┐
//!                                  ▼         ▼         ▼
//!                               sub1.on   sub2.on   subN.on
//!                               _event()  _event()  _event()
//! ```
//!
//! ### Unit timing
//! ```text
//! dot = Timing::dot()          (PARIS: 1.2 s / wpm)
//!
//! Dot                ▇▇▇▁            on 1, off 1
//! Dash               ▇▇▇▇▇▇▇▇▇▁      on 3, off 1
//! CharBoundaryPause  ▁▁▁             off 3
//! WordBoundaryPause  ▁▁▁▁▁           off 5
//! Empty                              nothing, no delay
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Scheduling**    | Submit units, start/stop playback, wait until idle.          | [`Scheduler`], [`StopMode`]                |
//! | **Units**         | Symbolic alphabet and its exact durations.                   | [`TimingUnit`], [`Timing`], [`Step`]       |
//! | **Output**        | On/off signal contract; closures are sinks too.              | [`Sink`], [`Level`], [`TraceSink`]         |
//! | **Listeners**     | Completion notifications, isolated from playback.            | [`Listener`], [`ListenerFn`], [`BlockingListenerFn`] |
//! | **Subscriber API**| Hook into playback events (logging, metrics, custom).        | [`Subscribe`], [`Event`], [`EventKind`]    |
//! | **Errors**        | Typed errors for lifecycle and sink failures.                | [`SchedulerError`], [`SinkError`]          |
//! | **Configuration** | Centralize runtime settings.                                 | [`Config`]                                 |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use morsekey::{Config, Level, ListenerFn, Scheduler, SinkError, StopMode, TimingUnit};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::with_dot(Duration::from_millis(5));
//!
//!     // Any `Fn(Level) -> Result<(), SinkError>` is a sink.
//!     let sink = Arc::new(|level: Level| -> Result<(), SinkError> {
//!         println!("key {level}");
//!         Ok(())
//!     });
//!
//!     let sched = Scheduler::builder(cfg).build(sink);
//!     sched.start()?;
//!
//!     // "K" (-.-), then tell us when it is on air
//!     let done = ListenerFn::arc("k-done", || async { println!("K sent") });
//!     sched.submit_all_with(
//!         [TimingUnit::Dash, TimingUnit::Dot, TimingUnit::Dash],
//!         done,
//!     );
//!
//!     sched.wait_idle().await;
//!     sched.stop(StopMode::Drain).await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod listeners;
mod sink;
mod subscribers;
mod units;

// ---- Public re-exports ----

pub use core::{Config, Scheduler, SchedulerBuilder, SchedulerState, StopMode};
pub use error::{SchedulerError, SinkError};
pub use events::{Bus, Event, EventKind};
pub use listeners::{BlockingListenerFn, Listener, ListenerFn, ListenerRef};
pub use sink::{Level, Sink, TraceRecord, TraceSink};
pub use subscribers::{Subscribe, SubscriberSet};
pub use units::{
    Step, Timing, TimingUnit, CHAR_GAP_DOTS, DASH_DOTS, SYMBOL_GAP_DOTS, WORD_GAP_DOTS,
};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
