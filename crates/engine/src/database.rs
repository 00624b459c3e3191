//! The `Tst` handle.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use tern_core::Result;
use tern_durability::{recovery, LogOp, LogWriter};
use tern_storage::{Direction, Tree};

use crate::options::Options;

/// An embeddable ordered key-set store.
///
/// Keys are opaque byte strings of 1 to 512 bytes; only their
/// existence is stored. An in-memory handle ([`Tst::new`]) keeps the
/// set in the node arena alone; a persistent handle ([`Tst::open`])
/// additionally appends one flushed record per change to an
/// append-only log, so a `true` from [`Tst::put`] or [`Tst::remove`]
/// means the change is durable.
///
/// Mutations and enumerations run on the caller's thread and return
/// when complete. Opening the same log file through two handles is
/// undefined behaviour.
#[derive(Debug)]
pub struct Tst {
    tree: Tree,
    log: Option<LogWriter>,
    path: Option<PathBuf>,
    options: Options,
    poisoned: bool,
}

impl Tst {
    /// An empty in-memory store.
    pub fn new() -> Tst {
        Tst::in_memory(Options::default())
    }

    /// An in-memory store with non-default options.
    pub fn in_memory(options: Options) -> Tst {
        Tst {
            tree: Tree::new(),
            log: None,
            path: None,
            options,
            poisoned: false,
        }
    }

    /// Open a persistent store backed by the log at `path`, creating
    /// it if absent, replaying and repairing it if present.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Tst> {
        Tst::open_with(path, Options::default())
    }

    /// Like [`Tst::open`], with explicit [`Options`].
    pub fn open_with<P: AsRef<Path>>(path: P, options: Options) -> Result<Tst> {
        let path = path.as_ref();
        let recovered = recovery::open(path, options.fsync)?;

        // Replay runs against a tree with no writer attached, so it
        // cannot re-log what it reads.
        let mut tree = Tree::new();
        for op in &recovered.ops {
            match op {
                LogOp::Insert(key) => tree.insert(key),
                LogOp::Remove(key) => tree.remove(key),
            };
        }
        tracing::info!(
            target: "terndb::open",
            path = %path.display(),
            records = recovered.ops.len(),
            keys = tree.key_count(),
            "opened key-set store"
        );

        Ok(Tst {
            tree,
            log: Some(recovered.writer),
            path: Some(path.to_path_buf()),
            options,
            poisoned: false,
        })
    }

    /// Flush and release the handle. Appends are flushed as they are
    /// written, so this is equivalent to dropping the handle; it
    /// exists to make the end of a session explicit.
    pub fn close(self) {}

    // === Reads ===

    /// True iff `key` is live in the set.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.tree.contains(key)
    }

    /// Number of live keys.
    pub fn key_count(&self) -> u32 {
        self.tree.key_count()
    }

    /// Number of allocated node records, nil sentinel included.
    pub fn node_count(&self) -> u32 {
        self.tree.node_count()
    }

    /// Balance estimate in `[0, 1]`; see [`Tree::state`].
    pub fn state(&self) -> f64 {
        self.tree.state()
    }

    /// Emit every key in ascending byte-lexicographic order.
    pub fn keys(&self, mut sink: impl FnMut(&[u8])) {
        self.tree.for_each(Direction::Ascending, &mut sink);
    }

    /// Emit every key in descending byte-lexicographic order.
    pub fn keys_desc(&self, mut sink: impl FnMut(&[u8])) {
        self.tree.for_each(Direction::Descending, &mut sink);
    }

    /// Emit every key matching `pattern`; `*` matches any run of zero
    /// or more bytes. Patterns with several `*`s may emit a key once
    /// per matching alignment.
    pub fn search(&self, pattern: &[u8], mut sink: impl FnMut(&[u8])) {
        self.tree.search(pattern, &mut sink);
    }

    /// Like [`Tst::search`], but emit only the `segment`-th
    /// separator-delimited run of each match (1-based); matches
    /// without that segment are skipped.
    pub fn search_segment(&self, pattern: &[u8], segment: usize, mut sink: impl FnMut(&[u8])) {
        self.tree
            .search_segment(pattern, segment, self.options.separator, &mut sink);
    }

    /// Emit a diagnostic node listing, one line per sink call.
    pub fn dump(&self, mut sink: impl FnMut(&str)) {
        self.tree.dump(&mut sink);
    }

    /// Current segment separator byte.
    pub fn separator(&self) -> u8 {
        self.options.separator
    }

    /// Replace the segment separator byte.
    pub fn set_separator(&mut self, separator: u8) {
        self.options.separator = separator;
    }

    /// Log path of a persistent handle.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True once a log write has failed after open. A poisoned handle
    /// refuses every further mutation; reads keep working.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    // === Mutations ===

    /// Insert `key`. Returns true iff the set changed and, for a
    /// persistent handle, iff the record is on disk. Empty or oversize
    /// keys change nothing.
    pub fn put(&mut self, key: &[u8]) -> bool {
        self.mutate(key, false)
    }

    /// Tombstone `key`. Returns true iff the set changed, with the
    /// same durability meaning as [`Tst::put`].
    pub fn remove(&mut self, key: &[u8]) -> bool {
        self.mutate(key, true)
    }

    fn mutate(&mut self, key: &[u8], tombstone: bool) -> bool {
        if self.poisoned {
            return false;
        }
        let changed = if tombstone {
            self.tree.remove(key)
        } else {
            self.tree.insert(key)
        };
        if !changed {
            return false;
        }
        if let Some(writer) = self.log.as_mut() {
            if let Err(e) = writer.append(key, tombstone) {
                // Undo the in-memory change so a `false` return leaves
                // memory and disk agreeing.
                if tombstone {
                    self.tree.insert(key);
                } else {
                    self.tree.remove(key);
                }
                self.poison("log append failed", &e);
                return false;
            }
        }
        true
    }

    /// Tombstone every key matching `pattern` and return how many were
    /// removed. Matches are collected first and removed after the
    /// traversal, each through the normal logged path.
    pub fn delete_matching(&mut self, pattern: &[u8]) -> u32 {
        if self.poisoned {
            return 0;
        }
        let mut matches = Vec::new();
        self.tree
            .search(pattern, &mut |key: &[u8]| matches.push(key.to_vec()));
        let mut removed = 0;
        for key in &matches {
            if self.remove(key) {
                removed += 1;
            }
        }
        removed
    }

    /// Drop every key. A persistent handle deletes its log and starts
    /// a fresh one containing only the header.
    pub fn clear(&mut self) {
        if self.poisoned {
            return;
        }
        self.tree.clear();
        if let Some(writer) = self.log.take() {
            let path = writer.path().to_path_buf();
            if let Err(e) = writer.delete() {
                self.poison("log delete failed", &e);
                return;
            }
            match LogWriter::create(&path, self.options.fsync) {
                Ok(fresh) => self.log = Some(fresh),
                Err(e) => self.poison("log re-create failed", &e),
            }
        }
    }

    /// Shuffle-rebuild with entropy from `rand::thread_rng()`.
    pub fn optimize(&mut self) {
        self.optimize_with(&mut rand::thread_rng());
    }

    /// Shuffle-rebuild: re-insert all live keys in random order, which
    /// evens out the low/high chains and reclaims tombstoned paths.
    /// The key set, and the node count it implies, are preserved. A
    /// persistent handle rotates its log around the rebuild: the old
    /// log is spilled to `<path>.tmp`, a fresh log is rewritten from
    /// the shuffled keys, and the spill is deleted on success. A
    /// crash anywhere in between is recovered from the spill on the
    /// next open.
    pub fn optimize_with<R: Rng>(&mut self, rng: &mut R) {
        if self.poisoned {
            return;
        }
        let Some(writer) = self.log.take() else {
            self.tree.rebuild(rng);
            return;
        };

        let mut keys = self.tree.collect_keys();
        keys.shuffle(rng);

        let path = writer.path().to_path_buf();
        let spill = match writer.rotate_out() {
            Ok(spill) => spill,
            Err(e) => {
                self.poison("log rotation failed", &e);
                return;
            }
        };
        let mut fresh = match LogWriter::create(&path, self.options.fsync) {
            Ok(fresh) => fresh,
            Err(e) => {
                self.poison("log re-create failed", &e);
                return;
            }
        };

        self.tree.clear();
        let mut failed: Option<std::io::Error> = None;
        for key in &keys {
            self.tree.insert(key);
            if failed.is_none() {
                if let Err(e) = fresh.append(key, false) {
                    failed = Some(e);
                }
            }
        }
        if let Some(e) = failed {
            // The spill keeps the complete pre-rotation history for
            // the next open.
            self.poison("log rewrite failed", &e);
            return;
        }

        if let Err(e) = std::fs::remove_file(&spill) {
            tracing::warn!(
                target: "terndb::wal",
                spill = %spill.display(),
                error = %e,
                "could not delete rotation spill"
            );
        }
        tracing::info!(
            target: "terndb::wal",
            path = %path.display(),
            keys = keys.len(),
            "log rotated around rebuild"
        );
        self.log = Some(fresh);
    }

    fn poison(&mut self, what: &str, err: &std::io::Error) {
        tracing::error!(
            target: "terndb::wal",
            error = %err,
            "{what}; handle poisoned, further mutations refused"
        );
        self.poisoned = true;
        self.log = None;
    }
}

impl Default for Tst {
    fn default() -> Tst {
        Tst::new()
    }
}
