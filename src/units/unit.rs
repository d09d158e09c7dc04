//! # Timing units
//!
//! [`TimingUnit`] is the symbolic alphabet the scheduler plays: the two keyed
//! elements of Morse code plus the two kinds of silence between them.
//!
//! The [`TimingUnit::Empty`] variant stands for an absent unit. It is accepted
//! everywhere a unit is accepted and plays as nothing: no signal commands, no
//! delay. `Option<TimingUnit>` converts into it, so callers holding optional
//! units can submit them without unwrapping.
//!
//! ```rust
//! use morsekey::TimingUnit;
//!
//! assert_eq!(TimingUnit::from(None), TimingUnit::Empty);
//! assert_eq!(TimingUnit::from(Some(TimingUnit::Dash)), TimingUnit::Dash);
//! assert!(TimingUnit::Dot.is_keyed());
//! assert!(!TimingUnit::WordBoundaryPause.is_keyed());
//! ```

use std::fmt;

/// One symbolic timing token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimingUnit {
    /// Short keyed element.
    Dot,
    /// Long keyed element (three dots).
    Dash,
    /// Silence separating two characters.
    CharBoundaryPause,
    /// Silence separating two words.
    WordBoundaryPause,
    /// Absent unit; played as a no-op.
    #[default]
    Empty,
}

impl TimingUnit {
    /// True for units that drive the signal On at some point.
    #[inline]
    pub fn is_keyed(self) -> bool {
        matches!(self, TimingUnit::Dot | TimingUnit::Dash)
    }

    /// True for the no-op unit.
    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, TimingUnit::Empty)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            TimingUnit::Dot => "dot",
            TimingUnit::Dash => "dash",
            TimingUnit::CharBoundaryPause => "char_pause",
            TimingUnit::WordBoundaryPause => "word_pause",
            TimingUnit::Empty => "empty",
        }
    }
}

impl From<Option<TimingUnit>> for TimingUnit {
    fn from(unit: Option<TimingUnit>) -> Self {
        unit.unwrap_or(TimingUnit::Empty)
    }
}

impl fmt::Display for TimingUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let glyph = match self {
            TimingUnit::Dot => ".",
            TimingUnit::Dash => "-",
            TimingUnit::CharBoundaryPause => " ",
            TimingUnit::WordBoundaryPause => " / ",
            TimingUnit::Empty => "",
        };
        f.write_str(glyph)
    }
}
