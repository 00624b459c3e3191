//! Shared types for the terndb workspace.
//!
//! This crate holds what every other member crate needs: the open-time
//! error type, the key size limits, and the byte constants used by the
//! search surface. It has no I/O and no tree logic of its own.

pub mod error;
pub mod limits;

pub use error::{OpenError, Result};
pub use limits::{key_within_limits, MAX_KEY_LEN};

/// Wildcard byte in search patterns: matches any run of zero or more
/// key bytes at its position.
pub const WILDCARD: u8 = b'*';

/// Default segment separator for projected search results.
pub const DEFAULT_SEPARATOR: u8 = b'/';
