//! # Engine - UndertowKV Storage Engine
//!
//! The central orchestrator that ties together the [`record`], [`wal`], and
//! [`index`] crates into a complete Bitcask-model key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                   ENGINE                      │
//! │                                               │
//! │ write.rs → active segment append (fsync)      │
//! │              |                                │
//! │              v                                │
//! │           index insert/delete                 │
//! │              |                                │
//! │              |  (tail > max_file_size?)       │
//! │              |            yes                 │
//! │              v                                │
//! │           rotate() → seal + new segment       │
//! │                                               │
//! │ read.rs → index lookup → segment read_at      │
//! │            → decode → value                   │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module        | Purpose                                                |
//! |---------------|--------------------------------------------------------|
//! | [`lib.rs`]    | `Engine` struct, constructor, accessors, `Debug`       |
//! | [`config`]    | `Config`: directory, rotation threshold, index kind    |
//! | [`recovery`]  | segment enumeration + ascending replay into the index  |
//! | [`write`]     | `put()`, `delete()`, size-triggered rotation           |
//! | [`read`]      | `get()`, `scan()`                                      |
//!
//! ## Crash Safety
//!
//! Every record is appended and fsynced **before** the index entry is
//! installed, so readers never observe a position that is not durable. The
//! log is never rewritten in place; recovery replays each segment in
//! file-id order and a torn trailing record fails its CRC check.
//!
//! ## Concurrency
//!
//! One writer, many readers. The index carries its own reader-writer lock;
//! the engine holds a second one over the segment set (active id + active
//! handle + sealed map). Segment lookup takes the read lock, rotation takes
//! the write lock.

mod config;
mod read;
mod recovery;
mod write;

use anyhow::{anyhow, Context, Result};
pub use config::Config;
use index::{new_index, Index};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use wal::Wal;

/// The segment set guarded by the engine's reader-writer lock: exactly one
/// active segment (the highest id) plus every sealed segment, kept open for
/// reads.
pub(crate) struct Segments {
    /// Id of the active segment.
    pub(crate) active_id: u64,
    /// The segment currently receiving appends.
    pub(crate) active: Wal,
    /// Sealed segments by id. Grows with the log; compaction is out of
    /// scope, so entries are only removed at shutdown.
    pub(crate) sealed: HashMap<u64, Wal>,
}

/// The central storage engine orchestrating the segmented log and the
/// in-memory index.
///
/// # Write Path
///
/// 1. Append the record to the active segment (fsynced before return).
/// 2. Install the returned position in the index (or delete, for
///    tombstones).
/// 3. If the active tail exceeds `max_file_size`, seal it and open the
///    next segment.
///
/// # Read Path
///
/// 1. Look the key up in the index.
/// 2. Resolve the owning segment by file id (active or sealed).
/// 3. Read the recorded byte range and decode; tombstones and corrupt
///    records read as "not found".
///
/// # Recovery
///
/// On [`Engine::open`] every `data_NNNNNNNNN.wal` under `<dir>/data_wal/`
/// is replayed in ascending id order to rebuild the index; the highest id
/// becomes the active segment.
pub struct Engine {
    pub(crate) config: Config,
    pub(crate) index: Box<dyn Index>,
    pub(crate) segments: RwLock<Segments>,
}

impl Engine {
    /// Opens a store rooted at `config.dir_path`, creating the directory
    /// tree if needed and performing full recovery.
    ///
    /// # Errors
    ///
    /// Returns an error when the directories cannot be created, the
    /// configured index kind is unknown, a segment file name cannot be
    /// parsed, or replay hits I/O or corruption.
    pub fn open(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.dir_path).with_context(|| {
            format!(
                "failed to create data directory {}",
                config.dir_path.display()
            )
        })?;
        let wal_dir = recovery::wal_dir(&config.dir_path);
        std::fs::create_dir_all(&wal_dir)
            .with_context(|| format!("failed to create WAL directory {}", wal_dir.display()))?;

        let index = new_index(&config.index_type)
            .ok_or_else(|| anyhow!("unknown index type {:?}", config.index_type))?;

        let segments = recovery::load_segments(&wal_dir, index.as_ref())?;

        Ok(Self {
            config,
            index,
            segments: RwLock::new(segments),
        })
    }

    /// Syncs the active segment and closes every file handle.
    ///
    /// Sealed segments were fsynced when they were rotated out, and every
    /// append fsyncs, so no data flush is pending beyond this point.
    pub fn close(self) -> Result<()> {
        let segments = self
            .segments
            .into_inner()
            .map_err(|_| anyhow!("segment lock poisoned"))?;

        for (_, sealed) in segments.sealed {
            sealed.close().context("failed to close sealed segment")?;
        }
        segments
            .active
            .close()
            .context("failed to close active segment")?;
        Ok(())
    }

    /// Number of live keys in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when no keys are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Id of the segment currently receiving appends.
    #[must_use]
    pub fn active_file_id(&self) -> u64 {
        self.segments
            .read()
            .expect("segment lock poisoned")
            .active_id
    }

    /// Number of sealed segments held open for reads.
    #[must_use]
    pub fn sealed_segment_count(&self) -> usize {
        self.segments
            .read()
            .expect("segment lock poisoned")
            .sealed
            .len()
    }

    pub(crate) fn read_segments(&self) -> Result<RwLockReadGuard<'_, Segments>> {
        self.segments
            .read()
            .map_err(|_| anyhow!("segment lock poisoned"))
    }

    pub(crate) fn write_segments(&self) -> Result<RwLockWriteGuard<'_, Segments>> {
        self.segments
            .write()
            .map_err(|_| anyhow!("segment lock poisoned"))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (active_id, active_tail, sealed) = match self.segments.read() {
            Ok(s) => (s.active_id, s.active.offset(), s.sealed.len()),
            Err(_) => (0, 0, 0),
        };
        f.debug_struct("Engine")
            .field("dir_path", &self.config.dir_path)
            .field("max_file_size", &self.config.max_file_size)
            .field("index_type", &self.config.index_type)
            .field("keys", &self.index.len())
            .field("active_file_id", &active_id)
            .field("active_tail", &active_tail)
            .field("sealed_segments", &sealed)
            .finish()
    }
}

#[cfg(test)]
mod tests;
