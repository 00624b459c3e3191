//! The terndb engine: wires the in-memory tree to the append-only log.
//!
//! [`Tst`] is the public handle. It owns one [`tern_storage::Tree`]
//! and, for persistent instances, one log writer; every mutation that
//! changes the set appends a record and flushes before returning, so a
//! `true` from `put` or `remove` means the change is on disk. Opening
//! replays the log through the same tree paths with no writer
//! attached, then attaches the writer, so replay can never double the
//! log.
//!
//! The handle is single-threaded by design: no internal tasks, no I/O
//! pump, no suspension points. Two handles over the same log file are
//! undefined behaviour and are not detected.

mod database;
mod options;

pub use database::Tst;
pub use options::Options;
