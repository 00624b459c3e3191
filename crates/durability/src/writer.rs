//! Synchronous append-only log writer.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::record::{encode_record, HEADER};

/// Path of the rotation spill file for `path`: `<path>.tmp`.
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Owns the open log file and appends one record per mutation.
///
/// Appends are durable when the call returns: each record is written
/// and (unless `fsync` was disabled at open) synced before `append`
/// comes back. There is no buffering layer to lose data in.
#[derive(Debug)]
pub struct LogWriter {
    file: File,
    path: PathBuf,
    fsync: bool,
}

impl LogWriter {
    /// Create a fresh log at `path` containing only the header,
    /// replacing any existing file.
    pub fn create(path: &Path, fsync: bool) -> io::Result<LogWriter> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(HEADER)?;
        file.sync_data()?;
        tracing::info!(
            target: "terndb::wal",
            path = %path.display(),
            "created fresh log"
        );
        Ok(LogWriter {
            file,
            path: path.to_path_buf(),
            fsync,
        })
    }

    /// Wrap a file handle recovery has already validated, positioned
    /// for appending at the end.
    pub(crate) fn resume(mut file: File, path: PathBuf, fsync: bool) -> io::Result<LogWriter> {
        file.seek(SeekFrom::End(0))?;
        Ok(LogWriter { file, path, fsync })
    }

    /// Wrap an arbitrary open handle as a writer, appending at its
    /// end. This is a failure-injection seam for tests (hand it a
    /// read-only handle and the next `append` fails); [`crate::open`]
    /// is the normal way to obtain a resumed writer.
    pub fn from_file(file: File, path: PathBuf, fsync: bool) -> io::Result<LogWriter> {
        LogWriter::resume(file, path, fsync)
    }

    /// Append one record and flush. When this returns `Ok`, the record
    /// is on disk.
    pub fn append(&mut self, key: &[u8], tombstone: bool) -> io::Result<()> {
        self.file.write_all(&encode_record(key, tombstone))?;
        if self.fsync {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rotation step one: close the log and rename it to `<path>.tmp`,
    /// returning the spill path. The caller re-creates a fresh log,
    /// re-inserts, and deletes the spill.
    pub fn rotate_out(self) -> io::Result<PathBuf> {
        let spill = tmp_path(&self.path);
        let path = self.path.clone();
        drop(self.file);
        std::fs::rename(&path, &spill)?;
        Ok(spill)
    }

    /// Close the log and delete the backing file (used by `clear`).
    pub fn delete(self) -> io::Result<()> {
        let path = self.path.clone();
        drop(self.file);
        std::fs::remove_file(&path)
    }
}
