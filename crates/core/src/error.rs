//! Error types for terndb.
//!
//! Opening a log file is the only fallible operation in the public API.
//! Every other method is total over its inputs: mutations report
//! "changed or not" as a bool, lookups report membership, and invalid
//! input (empty or oversize keys) simply reads as "no change". We use
//! `thiserror` for the `Display` and `Error` implementations.

use std::io;
use thiserror::Error;

/// Result type alias for open-time operations.
pub type Result<T> = std::result::Result<T, OpenError>;

/// Why a log file could not be opened.
#[derive(Debug, Error)]
pub enum OpenError {
    /// The host file layer refused: permissions, missing directory, etc.
    #[error("cannot open log: {0}")]
    CannotOpen(#[from] io::Error),

    /// The first line of the file is not the expected header.
    #[error("not a terndb log: bad header")]
    NotADatabase,

    /// Structural damage beyond a repairable trailing truncation.
    ///
    /// `line` is the line number where scanning stopped; `snippet` is
    /// up to 40 bytes of the last successfully replayed key, escaped
    /// for display.
    #[error("log corrupt at line {line} near \"{snippet}\"")]
    Corrupt {
        /// Line number where the damage was found.
        line: usize,
        /// Escaped prefix of the last key that replayed cleanly.
        snippet: String,
    },
}

impl OpenError {
    /// Build a `Corrupt` error from the raw bytes of the last key that
    /// replayed successfully before the damage.
    pub fn corrupt(line: usize, last_key: &[u8]) -> Self {
        let end = last_key.len().min(40);
        OpenError::Corrupt {
            line,
            snippet: last_key[..end].escape_ascii().to_string(),
        }
    }

    /// True for structural damage (as opposed to a refused open or a
    /// header mismatch).
    pub fn is_corrupt(&self) -> bool {
        matches!(self, OpenError::Corrupt { .. })
    }
}
