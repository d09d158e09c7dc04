//! # Signal sink contract
//!
//! A [`Sink`] is the output device the scheduler drives: something that can
//! assert or deassert one signal line (a key relay, a GPIO pin, a sidetone
//! oscillator gate, ...). Acquiring and calibrating the device happens outside
//! this crate; the scheduler receives a ready sink at construction time.
//!
//! ## Contract
//! - `set` is **synchronous** and expected to return quickly compared to one dot.
//! - `set` is only ever called from the scheduler's worker, one call at a time.
//! - A returned [`SinkError`] is logged and published; playback continues with
//!   the next step of the unit.
//!
//! Any `Fn(Level) -> Result<(), SinkError>` closure is a sink:
//! ```rust
//! use morsekey::{Level, Sink, SinkError};
//!
//! let sink = |level: Level| -> Result<(), SinkError> {
//!     let _ = level; // drive the hardware here
//!     Ok(())
//! };
//! assert!(sink.set(Level::On).is_ok());
//! ```

use std::fmt;

use crate::error::SinkError;

/// Output state of the signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Signal asserted (key down).
    On,
    /// Signal deasserted (key up).
    Off,
}

impl Level {
    /// True for [`Level::On`] (key down).
    #[inline]
    pub fn is_on(self) -> bool {
        matches!(self, Level::On)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::On => f.write_str("on"),
            Level::Off => f.write_str("off"),
        }
    }
}

/// Receiver of on/off commands.
pub trait Sink: Send + Sync + 'static {
    /// Drives the signal line to `level`.
    fn set(&self, level: Level) -> Result<(), SinkError>;

    /// Human-readable name (for logs/events).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Sink for F
where
    F: Fn(Level) -> Result<(), SinkError> + Send + Sync + 'static,
{
    fn set(&self, level: Level) -> Result<(), SinkError> {
        (self)(level)
    }

    fn name(&self) -> &str {
        "closure"
    }
}
