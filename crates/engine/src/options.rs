//! Open-time options.

use tern_core::DEFAULT_SEPARATOR;

/// Configuration for a [`crate::Tst`] handle.
///
/// The defaults are right for production use: `/` as the segment
/// separator and a sync to disk on every logged mutation. Turning
/// `fsync` off keeps the write-and-flush ordering but skips the sync,
/// trading the durability point for speed. Useful for tests and bulk
/// loads.
#[derive(Debug, Clone)]
pub struct Options {
    /// Segment separator byte for projected search results.
    pub separator: u8,
    /// Sync the log file after every appended record.
    pub fsync: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            separator: DEFAULT_SEPARATOR,
            fsync: true,
        }
    }
}

impl Options {
    /// Options with the production defaults.
    pub fn new() -> Options {
        Options::default()
    }

    /// Set the segment separator byte.
    pub fn with_separator(mut self, separator: u8) -> Options {
        self.separator = separator;
        self
    }

    /// Enable or disable per-record sync.
    pub fn with_fsync(mut self, fsync: bool) -> Options {
        self.fsync = fsync;
        self
    }
}
