//! Queue entries: one unit plus an optional completion listener.

use std::fmt;

use crate::listeners::ListenerRef;
use crate::units::TimingUnit;

/// A unit as stored in the scheduler's queue.
///
/// Created at enqueue time and never modified; the worker takes ownership
/// when it dequeues the entry.
pub(crate) struct Entry {
    /// Per-scheduler sequence number assigned at enqueue time.
    pub(crate) id: u64,
    /// Unit to play.
    pub(crate) unit: TimingUnit,
    /// Listener notified once the unit has been played (or skipped).
    pub(crate) listener: Option<ListenerRef>,
}

impl Entry {
    pub(crate) fn new(id: u64, unit: TimingUnit, listener: Option<ListenerRef>) -> Self {
        Self { id, unit, listener }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("id", &self.id)
            .field("unit", &self.unit)
            .field("listener", &self.listener.as_ref().map(|l| l.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listeners::ListenerFn;

    #[test]
    fn test_debug_shows_listener_name() {
        let bare = Entry::new(3, TimingUnit::Dot, None);
        assert_eq!(
            format!("{bare:?}"),
            "Entry { id: 3, unit: Dot, listener: None }"
        );

        let done: ListenerRef = ListenerFn::arc("done", || async {});
        let bound = Entry::new(4, TimingUnit::Dash, Some(done));
        assert!(format!("{bound:?}").contains("listener: Some(\"done\")"));
    }
}
