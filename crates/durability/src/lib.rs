//! Append-only log persistence for terndb.
//!
//! The log is a line-oriented text file: a fixed header line, then one
//! record per mutation in mutation order. A record is a decimal length
//! (negative for tombstones), a TAB, and the raw key bytes, so the
//! file is human-readable for ASCII keys while still carrying
//! arbitrary binary keys exactly.
//!
//! Three pieces live here:
//!
//! - [`record`]: the byte-exact record encoding and the replayable
//!   [`record::LogOp`] read back from disk.
//! - [`writer`]: [`writer::LogWriter`], the synchronous appender;
//!   every append is flushed before the call returns.
//! - [`recovery`]: [`recovery::open`], which validates the header,
//!   scans and returns the replayable operations, repairs a torn tail
//!   in place, and restores an interrupted rotation from the `.tmp`
//!   file next to the log.
//!
//! One log file belongs to exactly one handle; opening the same file
//! from two handles is undefined behaviour and is not detected.

pub mod record;
pub mod recovery;
pub mod writer;

pub use record::LogOp;
pub use recovery::{open, Recovered};
pub use writer::LogWriter;
