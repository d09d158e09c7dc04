//! Signal sinks: the output side of the scheduler.
//!
//! ## Contents
//! - [`Sink`] the on/off command contract (closures implement it too)
//! - [`Level`] the two signal states
//! - [`TraceSink`] a recording sink for tests and demos

#[allow(clippy::module_inception)]
mod sink;
mod trace;

pub use sink::{Level, Sink};
pub use trace::{TraceRecord, TraceSink};
