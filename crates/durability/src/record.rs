//! Byte-exact log record encoding.

/// Header line of every log file, terminator included.
pub const HEADER: &[u8] = b"TSTDB\n";

/// Header magic without the line terminator.
pub const MAGIC: &[u8] = b"TSTDB";

/// One replayable mutation read back from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOp {
    /// The key was inserted (positive-length record).
    Insert(Vec<u8>),
    /// The key was tombstoned (negative-length record).
    Remove(Vec<u8>),
}

impl LogOp {
    /// The key this operation applies to.
    pub fn key(&self) -> &[u8] {
        match self {
            LogOp::Insert(key) | LogOp::Remove(key) => key,
        }
    }

    /// True for tombstone records.
    pub fn is_tombstone(&self) -> bool {
        matches!(self, LogOp::Remove(_))
    }
}

/// Encode one record exactly as it appears on disk:
/// `<len>\t<key>\n`, with `len` negated for tombstones.
pub fn encode_record(key: &[u8], tombstone: bool) -> Vec<u8> {
    let mut out = Vec::with_capacity(key.len() + 8);
    if tombstone {
        out.push(b'-');
    }
    out.extend_from_slice(key.len().to_string().as_bytes());
    out.push(b'\t');
    out.extend_from_slice(key);
    out.push(b'\n');
    out
}
