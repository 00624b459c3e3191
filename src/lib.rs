//! # terndb
//!
//! An embeddable, in-process ordered key-set store: a ternary search
//! tree whose nodes live in one contiguous 32-bit-indexed arena, with
//! optional crash-safe persistence through a human-readable
//! append-only log.
//!
//! terndb stores key *existence* only: it is a persistent ordered set
//! of opaque byte strings (1 to 512 bytes each), not a key-value map.
//! It supports membership tests, ordered enumeration, wildcard pattern
//! search with segment projection, and a shuffle rebuild that restores
//! balance after skewed insertion orders.
//!
//! # Quick start
//!
//! ```
//! use terndb::Tst;
//!
//! let mut set = Tst::new();
//! assert!(set.put(b"/users/walter/"));
//! assert!(set.put(b"/users/jesse/"));
//! assert!(set.contains(b"/users/jesse/"));
//!
//! // Wildcard search with segment projection: emit the second
//! // '/'-delimited segment of every match, in order.
//! let mut names = Vec::new();
//! set.search_segment(b"/users/*/", 2, |name| names.push(name.to_vec()));
//! assert_eq!(names, vec![b"jesse".to_vec(), b"walter".to_vec()]);
//! ```
//!
//! # Persistence
//!
//! ```no_run
//! fn main() -> terndb::Result<()> {
//!     let mut set = terndb::Tst::open("./keys.tst")?;
//!     // A `true` return means the change is flushed to the log.
//!     set.put(b"durable");
//!     Ok(())
//! }
//! ```
//!
//! Opening replays the log, repairing a tail torn by a crash
//! mid-append; damage beyond that surfaces as [`OpenError::Corrupt`].
//! Every other method is total: mutations report "changed or not",
//! lookups report membership, and invalid input reads as "no change".
//!
//! # Architecture
//!
//! [`Tst`] is the only entry point. The internal crates (storage,
//! durability, engine) are implementation detail; only the surface
//! re-exported here is stable. The handle is single-threaded: all
//! operations run on the caller's thread and return when complete.

pub use tern_core::{OpenError, Result, DEFAULT_SEPARATOR, MAX_KEY_LEN, WILDCARD};
pub use tern_engine::{Options, Tst};
