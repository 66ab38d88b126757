//! # WAL — Segmented Write-Ahead Log
//!
//! Provides crash-safe durability for the UndertowKV storage engine.
//!
//! Every mutation (`PUT` or `DEL`) is serialized into a binary record and
//! appended to the active segment **before** the corresponding index update.
//! On restart each segment is replayed in file-id order to reconstruct the
//! in-memory index, guaranteeing that no acknowledged write is lost.
//!
//! Two layers live here:
//!
//! - [`LogFile`] — a typed wrapper over one append-only segment file:
//!   absolute-offset reads, sequential appends, fsync, and a cached tail
//!   offset that is the single source of truth for where the next append
//!   lands.
//! - [`Wal`] — one segment plus the log protocol: append-returning-
//!   [`Position`] (to feed the index) and replay scanning (to rebuild it).
//!
//! Records use the codec from the [`record`] crate:
//!
//! ```text
//! [type: u8][key_len: u32 BE][value_len: u32 BE][key][value][crc32: u32 BE]
//! ```
//!
//! ## Durability
//!
//! Every append is followed by `sync_all()` (fsync) before the returned
//! [`Position`] reaches the caller. An in-progress append that crashes
//! leaves at most a torn trailing record, which replay's CRC check detects.
//!
//! ## Example
//!
//! ```rust,no_run
//! use record::RecordType;
//! use wal::Wal;
//!
//! let wal = Wal::open("data_wal/data_000000000.wal", 0).unwrap();
//! let pos = wal.append(b"hello", b"world", RecordType::Normal).unwrap();
//! wal.replay(|rec, p| println!("{:?} at {}", rec.record_type, p)).unwrap();
//! # let _ = pos;
//! ```

use byteorder::{BigEndian, ByteOrder};
use record::{Position, Record, RecordType, CRC_LEN, HEADER_LEN};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

/// Errors that can occur during segment and log operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A positional read started exactly at the segment tail: the clean
    /// end-of-segment sentinel, distinguishable from a torn record.
    #[error("end of segment")]
    Eof,

    /// A record failed CRC validation, or a read ended mid-record.
    #[error("corrupt record")]
    Corrupt,
}

/// One append-only segment file.
///
/// Opens (or creates) the file for read+write and caches the tail offset,
/// initialized to the file's current size. Appends land at the cached tail
/// and advance it; positional reads never cross it.
///
/// The handle is shared between the single appender and concurrent readers,
/// so the raw `File` sits behind a `Mutex` (each access re-seeks) and the
/// tail is atomic. Readers only ever target offsets below the tail because
/// the index only stores positions returned by completed, fsynced appends.
pub struct LogFile {
    file_id: u64,
    file: Mutex<File>,
    /// Cached tail: the offset where the next append lands.
    offset: AtomicU64,
}

impl LogFile {
    /// Opens or creates the segment at `path`, creating parent directories
    /// as needed. The cached tail starts at the file's on-disk size.
    pub fn open<P: AsRef<Path>>(path: P, file_id: u64) -> Result<Self, WalError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            file_id,
            file: Mutex::new(file),
            offset: AtomicU64::new(size),
        })
    }

    fn lock_file(&self) -> Result<MutexGuard<'_, File>, WalError> {
        self.file
            .lock()
            .map_err(|_| {
                WalError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    "segment file lock poisoned",
                ))
            })
    }

    /// Reads exactly `length` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// - [`WalError::Eof`] when `offset` is at or past the tail — the clean
    ///   record-boundary case.
    /// - [`WalError::Corrupt`] when the range starts below the tail but
    ///   would cross it — a short read mid-record.
    pub fn read_at(&self, offset: u64, length: u64) -> Result<Vec<u8>, WalError> {
        let tail = self.offset.load(Ordering::Acquire);
        if offset >= tail {
            return Err(WalError::Eof);
        }
        if offset + length > tail {
            return Err(WalError::Corrupt);
        }

        let mut file = self.lock_file()?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; length as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Appends `data` at the cached tail, returning the number of bytes
    /// written. The tail advances only after the write succeeds.
    pub fn append(&self, data: &[u8]) -> Result<u64, WalError> {
        let start = self.offset.load(Ordering::Acquire);

        let mut file = self.lock_file()?;
        file.seek(SeekFrom::Start(start))?;
        file.write_all(data)?;
        drop(file);

        let written = data.len() as u64;
        self.offset.store(start + written, Ordering::Release);
        Ok(written)
    }

    /// Forces written data to disk via `sync_all()` (fsync).
    pub fn sync(&self) -> Result<(), WalError> {
        let file = self.lock_file()?;
        file.sync_all()?;
        Ok(())
    }

    /// Id of this segment.
    pub fn file_id(&self) -> u64 {
        self.file_id
    }

    /// Current cached tail offset.
    pub fn offset(&self) -> u64 {
        self.offset.load(Ordering::Acquire)
    }

    /// Overwrites the cached tail. Replay uses this to trim the tail to the
    /// byte directly past the last verified record.
    pub fn set_offset(&self, offset: u64) {
        self.offset.store(offset, Ordering::Release);
    }
}

/// One segment with the write-ahead-log protocol on top.
pub struct Wal {
    file: LogFile,
}

impl Wal {
    /// Opens or creates the segment at `path` with the given file id.
    pub fn open<P: AsRef<Path>>(path: P, file_id: u64) -> Result<Self, WalError> {
        Ok(Self {
            file: LogFile::open(path, file_id)?,
        })
    }

    /// Encodes a record, appends it at the tail, fsyncs, and returns the
    /// [`Position`] of the written bytes.
    ///
    /// Durability is established per append: the position is handed out only
    /// after `fsync` returns, so the index never references bytes that could
    /// vanish in a crash.
    pub fn append(
        &self,
        key: &[u8],
        value: &[u8],
        record_type: RecordType,
    ) -> Result<Position, WalError> {
        let record = Record::new(record_type, key.to_vec(), value.to_vec());
        let data = record.encode();

        let start = self.file.offset();
        let written = self.file.append(&data)?;
        self.file.sync()?;

        Ok(Position {
            file_id: self.file.file_id(),
            offset: start,
            length: written,
        })
    }

    /// Replays every record in the segment from offset 0, calling `apply`
    /// with each decoded record and its position.
    ///
    /// # Termination
    ///
    /// - **Clean end** (the fixed-header read lands exactly on the tail) ->
    ///   returns `Ok(())` after trimming the cached tail to the byte past
    ///   the last verified record.
    /// - **Torn record** (header or body crosses the tail) ->
    ///   [`WalError::Corrupt`].
    /// - **CRC mismatch** -> [`WalError::Corrupt`].
    /// - **I/O error** -> [`WalError::Io`].
    ///
    /// The caller decides what each record means: the engine inserts
    /// `Normal` positions into its index, deletes on `Tombstone`, and
    /// ignores the reserved types.
    pub fn replay<F>(&self, mut apply: F) -> Result<(), WalError>
    where
        F: FnMut(Record, Position),
    {
        let mut offset = 0u64;

        loop {
            let header = match self.file.read_at(offset, HEADER_LEN as u64) {
                Ok(h) => h,
                Err(WalError::Eof) => break,
                Err(e) => return Err(e),
            };

            let key_len = BigEndian::read_u32(&header[1..5]) as u64;
            let value_len = BigEndian::read_u32(&header[5..9]) as u64;
            let remainder_len = key_len + value_len + CRC_LEN as u64;

            let remainder = match self.file.read_at(offset + HEADER_LEN as u64, remainder_len) {
                Ok(r) => r,
                // A record body that stops short of its declared length is
                // a torn tail, not a clean boundary.
                Err(WalError::Eof) | Err(WalError::Corrupt) => return Err(WalError::Corrupt),
                Err(e) => return Err(e),
            };

            let mut data = header;
            data.extend_from_slice(&remainder);
            let record = Record::decode(&data).map_err(|_| WalError::Corrupt)?;

            let length = HEADER_LEN as u64 + remainder_len;
            let position = Position {
                file_id: self.file.file_id(),
                offset,
                length,
            };
            apply(record, position);
            offset += length;
        }

        self.file.set_offset(offset);
        Ok(())
    }

    /// Reads the raw byte range of a previously returned position.
    pub fn read_at(&self, offset: u64, length: u64) -> Result<Vec<u8>, WalError> {
        self.file.read_at(offset, length)
    }

    /// Fsyncs the underlying segment.
    pub fn sync(&self) -> Result<(), WalError> {
        self.file.sync()
    }

    /// Syncs and closes the segment. Dropping a `Wal` also closes the file;
    /// `close` exists for callers that want the final fsync to be explicit.
    pub fn close(self) -> Result<(), WalError> {
        self.file.sync()
    }

    /// Id of the wrapped segment.
    pub fn file_id(&self) -> u64 {
        self.file.file_id()
    }

    /// Current tail offset of the wrapped segment.
    pub fn offset(&self) -> u64 {
        self.file.offset()
    }
}
