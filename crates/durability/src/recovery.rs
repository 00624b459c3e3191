//! Open-time recovery: header validation, replay scan, tail repair.
//!
//! Opening an existing log reads it once, front to back. Complete
//! records become [`LogOp`]s for the engine to replay; the scan then
//! decides what to do with whatever is left at the tail:
//!
//! - nothing left → clean end (a missing final newline is added);
//! - a record torn by a crash mid-append → the tail is blanked with
//!   spaces and a closing newline, in place, and the open succeeds;
//! - anything else → the file is structurally damaged and the open
//!   fails with a line number and a snippet of the last good key.
//!
//! Blanked filler is skipped wherever it appears between records, so a
//! repaired file stays readable on every later open. Replay returns
//! operations instead of applying them so the engine can feed its tree
//! before any writer exists; nothing is ever logged during replay.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tern_core::{OpenError, MAX_KEY_LEN};

use crate::record::{LogOp, MAGIC};
use crate::writer::{tmp_path, LogWriter};

/// Outcome of a successful open.
#[derive(Debug)]
pub struct Recovered {
    /// Writer attached to the validated file, positioned at the end.
    pub writer: LogWriter,
    /// Complete records found in the file, in mutation order.
    pub ops: Vec<LogOp>,
}

/// Open `path`, creating a fresh log if absent, otherwise validating
/// and scanning it. A `.tmp` spill from an interrupted rotation is
/// restored first when the primary file is missing or header-invalid.
pub fn open(path: &Path, fsync: bool) -> Result<Recovered, OpenError> {
    restore_interrupted_rotation(path)?;
    let file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let writer = LogWriter::create(path, fsync)?;
            return Ok(Recovered {
                writer,
                ops: Vec::new(),
            });
        }
        Err(e) => return Err(OpenError::CannotOpen(e)),
    };
    replay(file, path, fsync)
}

/// Handle a `<path>.tmp` left by a rotation that died between renaming
/// the old log away and deleting the spill. The spill wins only when
/// the primary cannot win: missing or header-invalid. A stale spill
/// next to a valid primary is left alone: if the crash hit mid
/// re-insertion the spill may be the only complete copy, and the next
/// rotation's rename replaces it anyway.
fn restore_interrupted_rotation(path: &Path) -> Result<(), OpenError> {
    let spill = tmp_path(path);
    if !spill.exists() {
        return Ok(());
    }
    if has_valid_header(path) {
        tracing::warn!(
            target: "terndb::recovery",
            spill = %spill.display(),
            "stale rotation spill next to a valid log; leaving it in place"
        );
        return Ok(());
    }
    if has_valid_header(&spill) {
        std::fs::rename(&spill, path).map_err(OpenError::CannotOpen)?;
        tracing::warn!(
            target: "terndb::recovery",
            path = %path.display(),
            "restored log from interrupted rotation spill"
        );
    }
    Ok(())
}

/// True iff the file starts with the header magic (a terminating
/// newline may be absent in a header-only file).
fn has_valid_header(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut head = Vec::with_capacity(MAGIC.len() + 1);
    if file
        .take(MAGIC.len() as u64 + 1)
        .read_to_end(&mut head)
        .is_err()
    {
        return false;
    }
    head.len() >= MAGIC.len()
        && &head[..MAGIC.len()] == MAGIC
        && (head.len() == MAGIC.len() || head[MAGIC.len()] == b'\n')
}

/// Why a record failed to parse.
enum RecordError {
    /// The record ran past the end of the buffer: a torn append.
    Truncated,
    /// The bytes cannot be a record at all.
    Malformed,
}

fn replay(mut file: File, path: &Path, fsync: bool) -> Result<Recovered, OpenError> {
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(OpenError::CannotOpen)?;

    if buf.len() < MAGIC.len() || &buf[..MAGIC.len()] != MAGIC {
        return Err(OpenError::NotADatabase);
    }
    let mut offset = MAGIC.len();
    if offset < buf.len() {
        if buf[offset] != b'\n' {
            return Err(OpenError::NotADatabase);
        }
        offset += 1;
    }

    let end = buf.len();
    let mut ops: Vec<LogOp> = Vec::new();
    let mut repaired = false;

    loop {
        // Skip record terminators and the space filler left by earlier
        // tail repairs. Key bytes are length-covered, so whitespace
        // here is never part of a key.
        while offset < end && (buf[offset] == b' ' || buf[offset] == b'\n') {
            offset += 1;
        }
        if offset == end {
            break;
        }
        let pos = offset;

        match parse_record(&buf[offset..]) {
            Ok((op, consumed)) => {
                offset += consumed;
                ops.push(op);
            }
            Err(RecordError::Truncated) if end - pos < MAX_KEY_LEN => {
                repair_tail(&mut file, pos as u64, end as u64)?;
                repaired = true;
                break;
            }
            Err(_) => {
                return Err(corrupt_at(&buf, pos, &ops));
            }
        }
    }

    if !repaired && buf.last() != Some(&b'\n') {
        // Clean end but the final terminator never made it to disk.
        file.seek(SeekFrom::End(0)).map_err(OpenError::CannotOpen)?;
        file.write_all(b"\n").map_err(OpenError::CannotOpen)?;
        file.sync_data().map_err(OpenError::CannotOpen)?;
        tracing::warn!(
            target: "terndb::recovery",
            path = %path.display(),
            "appended missing trailing newline"
        );
    }

    tracing::info!(
        target: "terndb::recovery",
        path = %path.display(),
        records = ops.len(),
        repaired,
        "log replayed"
    );

    let writer =
        LogWriter::resume(file, path.to_path_buf(), fsync).map_err(OpenError::CannotOpen)?;
    Ok(Recovered { writer, ops })
}

/// Parse one `<len>\t<key>` record from the front of `buf`. Returns
/// the operation and the bytes consumed (the trailing newline is left
/// for the caller's filler skip).
fn parse_record(buf: &[u8]) -> Result<(LogOp, usize), RecordError> {
    let mut cur = 0;
    let tombstone = buf[cur] == b'-';
    if tombstone {
        cur += 1;
    }

    let digits_start = cur;
    let mut len: u64 = 0;
    while cur < buf.len() && buf[cur].is_ascii_digit() {
        len = len * 10 + u64::from(buf[cur] - b'0');
        if len > u64::from(u32::MAX) {
            return Err(RecordError::Malformed);
        }
        cur += 1;
    }
    if cur == digits_start {
        // No digits. Mid-buffer this is garbage; at the very end it is
        // a lone '-' from a torn append.
        return if cur == buf.len() {
            Err(RecordError::Truncated)
        } else {
            Err(RecordError::Malformed)
        };
    }
    if cur == buf.len() {
        return Err(RecordError::Truncated);
    }
    if buf[cur] != b'\t' {
        return Err(RecordError::Malformed);
    }
    cur += 1;

    let key_end = cur + len as usize;
    if key_end > buf.len() {
        return Err(RecordError::Truncated);
    }
    let key = buf[cur..key_end].to_vec();
    let op = if tombstone {
        LogOp::Remove(key)
    } else {
        LogOp::Insert(key)
    };
    Ok((op, key_end))
}

/// Blank the torn tail `[pos, end)` with spaces and a closing newline,
/// in place, so later opens read straight past it.
fn repair_tail(file: &mut File, pos: u64, end: u64) -> Result<(), OpenError> {
    let mut fill = vec![b' '; (end - pos) as usize];
    *fill.last_mut().expect("torn tail is never empty") = b'\n';
    file.seek(SeekFrom::Start(pos))
        .map_err(OpenError::CannotOpen)?;
    file.write_all(&fill).map_err(OpenError::CannotOpen)?;
    file.sync_data().map_err(OpenError::CannotOpen)?;
    tracing::warn!(
        target: "terndb::recovery",
        offset = pos,
        blanked = fill.len(),
        "repaired torn log tail"
    );
    Ok(())
}

fn corrupt_at(buf: &[u8], pos: usize, ops: &[LogOp]) -> OpenError {
    let line = buf[..pos].iter().filter(|&&b| b == b'\n').count() + 1;
    let last_key = ops.last().map(LogOp::key).unwrap_or(b"");
    OpenError::corrupt(line, last_key)
}
