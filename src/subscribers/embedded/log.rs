//! # LogWriter: renders events through the `log` facade
//!
//! A minimal subscriber that writes incoming [`Event`]s as log records.
//! Failures go out at `warn`/`error`, playback progress at `debug`, the rest at `info`.
//!
//! ## Example output
//! ```text
//! [worker-started] pending=3
//! [unit-started] entry=0 unit=dot
//! [unit-completed] entry=0 unit=dot
//! [sink-failed] entry=1 unit=dash level=off err="relay stuck"
//! [stop-requested] mode=drain pending=0
//! [stopped-within-grace]
//! [worker-stopped] reason=drained dropped=0
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn unit_label(e: &Event) -> &'static str {
    e.unit.map(|u| u.as_label()).unwrap_or("-")
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::WorkerStarted => {
                log::info!("[worker-started] pending={}", e.count.unwrap_or(0));
            }
            EventKind::WorkerStopped => {
                log::info!(
                    "[worker-stopped] reason={} dropped={}",
                    reason,
                    e.count.unwrap_or(0)
                );
            }
            EventKind::WorkerLost => {
                log::error!("[worker-lost] err={reason:?}");
            }
            EventKind::UnitStarted => {
                log::debug!("[unit-started] entry={:?} unit={}", e.entry, unit_label(e));
            }
            EventKind::UnitCompleted => {
                log::debug!("[unit-completed] entry={:?} unit={}", e.entry, unit_label(e));
            }
            EventKind::UnitSkipped => {
                log::debug!("[unit-skipped] entry={:?}", e.entry);
            }
            EventKind::UnitInterrupted => {
                log::info!("[unit-interrupted] entry={:?} unit={}", e.entry, unit_label(e));
            }
            EventKind::SinkFailed => {
                log::warn!(
                    "[sink-failed] entry={:?} unit={} level={:?} err={reason:?}",
                    e.entry,
                    unit_label(e),
                    e.level
                );
            }
            EventKind::ListenerPanicked => {
                log::warn!(
                    "[listener-panicked] entry={:?} listener={} info={reason:?}",
                    e.entry,
                    e.listener.as_deref().unwrap_or("unknown")
                );
            }
            EventKind::SubmitRejected => {
                log::warn!("[submit-rejected] units={}", e.count.unwrap_or(0));
            }
            EventKind::StopRequested => {
                log::info!(
                    "[stop-requested] mode={} pending={}",
                    reason,
                    e.count.unwrap_or(0)
                );
            }
            EventKind::StoppedWithinGrace => {
                log::info!("[stopped-within-grace]");
            }
            EventKind::GraceExceeded => {
                log::warn!("[grace-exceeded] discarded={}", e.count.unwrap_or(0));
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
