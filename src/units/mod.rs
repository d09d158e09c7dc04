//! # Timing units and their translation to signal steps.
//!
//! - [`TimingUnit`] the symbolic alphabet (dot, dash, char pause, word pause, empty)
//! - [`Timing`] base dot duration and the fixed 1:3:1:3:5 ratios
//! - [`Step`] one concrete sink command or hold
//! - `Entry` a unit paired with its optional listener, as queued (crate-internal)

mod entry;
mod timing;
mod unit;

pub(crate) use entry::Entry;
pub use timing::{Step, Timing, CHAR_GAP_DOTS, DASH_DOTS, SYMBOL_GAP_DOTS, WORD_GAP_DOTS};
pub use unit::TimingUnit;
