//! # Built-in subscribers
//!
//! - [`LogWriter`]: writes events as `log` records (demo/debug).

mod log;

pub use self::log::LogWriter;
