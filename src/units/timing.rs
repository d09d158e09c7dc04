//! # Timing: base unit and the unit → step translation table
//!
//! All durations derive from one base value, the length of a dot. The ratios
//! are fixed and exact:
//!
//! ```text
//! dot hold      : 1 dot
//! dash hold     : 3 dots
//! symbol gap    : 1 dot    (after every keyed element)
//! char pause    : 3 dots
//! word pause    : 5 dots
//! ```
//!
//! [`Timing::steps`] expands a unit into the concrete [`Step`]s the worker
//! executes against the sink:
//!
//! ```text
//! Dot                → Key(On)  Hold(dot)      Key(Off)  Hold(gap)
//! Dash               → Key(On)  Hold(3·dot)    Key(Off)  Hold(gap)
//! CharBoundaryPause  → Hold(3·dot)
//! WordBoundaryPause  → Hold(5·dot)
//! Empty              → (nothing)
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use morsekey::{Level, Step, Timing, TimingUnit};
//!
//! let timing = Timing::new(Duration::from_millis(50));
//! let steps: Vec<Step> = timing.steps(TimingUnit::Dash).collect();
//! assert_eq!(steps, vec![
//!     Step::Key(Level::On),
//!     Step::Hold(Duration::from_millis(150)),
//!     Step::Key(Level::Off),
//!     Step::Hold(Duration::from_millis(50)),
//! ]);
//! assert_eq!(timing.duration_of(TimingUnit::Dash), Duration::from_millis(200));
//! ```

use std::time::Duration;

use crate::sink::Level;
use crate::units::TimingUnit;

/// Dash hold, in dots.
pub const DASH_DOTS: u32 = 3;
/// Gap after every keyed element, in dots.
pub const SYMBOL_GAP_DOTS: u32 = 1;
/// Pause between characters, in dots.
pub const CHAR_GAP_DOTS: u32 = 3;
/// Pause between words, in dots.
pub const WORD_GAP_DOTS: u32 = 5;

/// One concrete action of a unit's playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Send a command to the sink.
    Key(Level),
    /// Wait (wall clock) before the next step.
    Hold(Duration),
}

/// Step shape with the hold expressed in dots.
#[derive(Clone, Copy)]
enum Shape {
    Key(Level),
    Hold(u32),
}

const DOT: &[Shape] = &[
    Shape::Key(Level::On),
    Shape::Hold(1),
    Shape::Key(Level::Off),
    Shape::Hold(SYMBOL_GAP_DOTS),
];
const DASH: &[Shape] = &[
    Shape::Key(Level::On),
    Shape::Hold(DASH_DOTS),
    Shape::Key(Level::Off),
    Shape::Hold(SYMBOL_GAP_DOTS),
];
const CHAR_PAUSE: &[Shape] = &[Shape::Hold(CHAR_GAP_DOTS)];
const WORD_PAUSE: &[Shape] = &[Shape::Hold(WORD_GAP_DOTS)];
const EMPTY: &[Shape] = &[];

fn table(unit: TimingUnit) -> &'static [Shape] {
    match unit {
        TimingUnit::Dot => DOT,
        TimingUnit::Dash => DASH,
        TimingUnit::CharBoundaryPause => CHAR_PAUSE,
        TimingUnit::WordBoundaryPause => WORD_PAUSE,
        TimingUnit::Empty => EMPTY,
    }
}

/// Immutable timing configuration: the dot length and everything derived from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    dot: Duration,
}

impl Timing {
    /// Default dot length.
    pub const DEFAULT_DOT: Duration = Duration::from_millis(100);

    /// Longest accepted dot. Longer values are clamped so that every derived
    /// duration, and a deadline built from it, stays representable.
    pub const MAX_DOT: Duration = Duration::from_secs(3600);

    /// Creates a timing with the given dot length (clamped to [`Timing::MAX_DOT`]).
    pub const fn new(dot: Duration) -> Self {
        if dot.as_secs() >= Self::MAX_DOT.as_secs() {
            Self { dot: Self::MAX_DOT }
        } else {
            Self { dot }
        }
    }

    /// Creates a timing from a words-per-minute speed (PARIS standard:
    /// `dot = 1.2 s / wpm`). `wpm` is clamped to at least 1.
    pub fn from_wpm(wpm: u32) -> Self {
        let wpm = wpm.max(1);
        Self::new(Duration::from_micros(1_200_000 / u64::from(wpm)))
    }

    /// Dot hold.
    #[inline]
    pub fn dot(&self) -> Duration {
        self.dot
    }

    /// Dash hold (3 dots).
    #[inline]
    pub fn dash(&self) -> Duration {
        self.dot * DASH_DOTS
    }

    /// Gap after each keyed element (1 dot).
    #[inline]
    pub fn symbol_gap(&self) -> Duration {
        self.dot * SYMBOL_GAP_DOTS
    }

    /// Pause between characters (3 dots).
    #[inline]
    pub fn char_gap(&self) -> Duration {
        self.dot * CHAR_GAP_DOTS
    }

    /// Pause between words (5 dots).
    #[inline]
    pub fn word_gap(&self) -> Duration {
        self.dot * WORD_GAP_DOTS
    }

    /// Expands `unit` into the steps the worker executes.
    pub fn steps(&self, unit: TimingUnit) -> impl Iterator<Item = Step> + '_ {
        table(unit).iter().map(move |shape| match *shape {
            Shape::Key(level) => Step::Key(level),
            Shape::Hold(dots) => Step::Hold(self.dot * dots),
        })
    }

    /// Nominal playback length of `unit` (sum of its holds).
    pub fn duration_of(&self, unit: TimingUnit) -> Duration {
        self.steps(unit)
            .map(|step| match step {
                Step::Hold(d) => d,
                Step::Key(_) => Duration::ZERO,
            })
            .sum()
    }
}

impl Default for Timing {
    /// Returns a timing with a 100 ms dot (12 wpm).
    fn default() -> Self {
        Self::new(Self::DEFAULT_DOT)
    }
}
