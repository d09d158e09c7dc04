//! # Play a single entry against the sink.
//!
//! Translates one [`Entry`] into sink commands and holds, publishing lifecycle
//! events to the [`Bus`]. This is the only place that talks to the [`Sink`].
//!
//! ## Event flow
//! ```text
//! Empty unit:
//!   → UnitSkipped                       (no commands, no delay)
//!
//! Keyed / pause unit:
//!   UnitStarted → [Key / Hold steps] → UnitCompleted
//!                    │
//!                    ├─ sink error    → SinkFailed, continue with next step
//!                    └─ discard token → force Off if keyed, UnitInterrupted
//! ```
//!
//! ## Rules
//! - Holds are measured against a running deadline anchored at the unit's
//!   start, so step durations do not accumulate scheduling drift.
//! - A sink error never aborts the unit; an On/Off pair may end up
//!   unbalanced if the Off command itself fails.
//! - Cancellation is only observed during holds.

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};
use crate::sink::{Level, Sink};
use crate::units::{Entry, Step, Timing};

/// How playback of one entry ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// All steps executed.
    Completed,
    /// Empty unit; nothing executed.
    Skipped,
    /// Cut short by the discard token.
    Interrupted,
}

/// Plays `entry` to completion or until `cancel` fires.
pub(crate) async fn play(
    entry: &Entry,
    sink: &dyn Sink,
    timing: &Timing,
    bus: &Bus,
    cancel: &CancellationToken,
) -> Outcome {
    if entry.unit.is_empty() {
        publish(bus, EventKind::UnitSkipped, entry);
        return Outcome::Skipped;
    }
    publish(bus, EventKind::UnitStarted, entry);

    let mut deadline = Instant::now();
    let mut keyed = false;

    for step in timing.steps(entry.unit) {
        match step {
            Step::Key(level) => {
                send(sink, level, entry, bus);
                keyed = level.is_on();
            }
            Step::Hold(d) => {
                deadline += d;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        if keyed {
                            send(sink, Level::Off, entry, bus);
                        }
                        publish(bus, EventKind::UnitInterrupted, entry);
                        return Outcome::Interrupted;
                    }
                    _ = time::sleep_until(deadline) => {}
                }
            }
        }
    }

    publish(bus, EventKind::UnitCompleted, entry);
    Outcome::Completed
}

/// Sends one command; failures are logged and published, never propagated.
fn send(sink: &dyn Sink, level: Level, entry: &Entry, bus: &Bus) {
    if let Err(err) = sink.set(level) {
        log::warn!(
            "sink '{}' failed to switch {} during entry {} ({}): {}",
            sink.name(),
            level,
            entry.id,
            entry.unit.as_label(),
            err
        );
        bus.publish(
            Event::new(EventKind::SinkFailed)
                .with_entry(entry.id)
                .with_unit(entry.unit)
                .with_level(level)
                .with_reason(err.to_string()),
        );
    }
}

fn publish(bus: &Bus, kind: EventKind, entry: &Entry) {
    bus.publish(
        Event::new(kind)
            .with_entry(entry.id)
            .with_unit(entry.unit),
    );
}
