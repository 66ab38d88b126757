//! # Index — In-Memory Ordered Key Directory
//!
//! Maps every live key to the [`Position`] of its newest record on disk. The
//! index is rebuilt from log replay on startup and held only in memory; a
//! tombstone removes the key here but the tombstone record itself stays in
//! the log.
//!
//! ## Concurrency
//!
//! Locking is a property of the implementation, not the [`Index`] trait.
//! [`BTreeIndex`] wraps its map in a `RwLock`: `get`, `len`, and cursor
//! construction take the read lock; `put` and `delete` take the write lock.
//! The cursor materializes a snapshot under the read lock and thereafter
//! holds no lock at all, so readers and the single writer never interfere
//! through an open cursor.
//!
//! ## Example
//!
//! ```rust
//! use index::{new_index, Position};
//!
//! let idx = new_index("btree").unwrap();
//! idx.put(b"a", Position { file_id: 0, offset: 0, length: 16 }).unwrap();
//! assert_eq!(idx.get(b"a").unwrap().offset, 0);
//! ```

pub use record::Position;
use std::collections::BTreeMap;
use std::sync::RwLock;
use thiserror::Error;

/// Errors surfaced by index operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    /// Keys must be non-empty byte strings.
    #[error("key is empty")]
    EmptyKey,

    /// The key has no entry in the index.
    #[error("key not found")]
    NotFound,
}

/// The ordered key→position directory.
///
/// Keys are compared lexicographically by raw bytes. Exactly one entry is
/// held per key: `put` replaces, `delete` removes. Any structure with
/// ordered point and range operations satisfies the contract; the b-tree
/// realization below is the default and currently the only one.
pub trait Index: Send + Sync {
    /// Looks up the position for `key`.
    fn get(&self, key: &[u8]) -> Result<Position, IndexError>;

    /// Inserts or replaces the entry for `key`.
    fn put(&self, key: &[u8], pos: Position) -> Result<(), IndexError>;

    /// Removes the entry for `key`.
    fn delete(&self, key: &[u8]) -> Result<(), IndexError>;

    /// Number of live keys.
    fn len(&self) -> usize;

    /// True when no keys are live.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produces an ordered cursor over a snapshot of the current entries.
    fn iter(&self) -> Cursor;
}

/// Creates an index of the named kind. `"btree"` is the one recognized
/// value; anything else is `None` and should surface as a configuration
/// error in the caller.
pub fn new_index(kind: &str) -> Option<Box<dyn Index>> {
    match kind {
        "btree" => Some(Box::new(BTreeIndex::new())),
        _ => None,
    }
}

/// Default index realization: a `BTreeMap` behind a reader-writer lock.
#[derive(Debug, Default)]
pub struct BTreeIndex {
    items: RwLock<BTreeMap<Vec<u8>, Position>>,
}

impl BTreeIndex {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Index for BTreeIndex {
    fn get(&self, key: &[u8]) -> Result<Position, IndexError> {
        if key.is_empty() {
            return Err(IndexError::EmptyKey);
        }
        let items = self.items.read().expect("index lock poisoned");
        items.get(key).copied().ok_or(IndexError::NotFound)
    }

    fn put(&self, key: &[u8], pos: Position) -> Result<(), IndexError> {
        if key.is_empty() {
            return Err(IndexError::EmptyKey);
        }
        let mut items = self.items.write().expect("index lock poisoned");
        items.insert(key.to_vec(), pos);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), IndexError> {
        if key.is_empty() {
            return Err(IndexError::EmptyKey);
        }
        let mut items = self.items.write().expect("index lock poisoned");
        match items.remove(key) {
            Some(_) => Ok(()),
            None => Err(IndexError::NotFound),
        }
    }

    fn len(&self) -> usize {
        self.items.read().expect("index lock poisoned").len()
    }

    fn iter(&self) -> Cursor {
        let items = self.items.read().expect("index lock poisoned");
        let entries: Vec<(Vec<u8>, Position)> =
            items.iter().map(|(k, p)| (k.clone(), *p)).collect();
        Cursor::new(entries)
    }
}

/// Ordered cursor over a point-in-time snapshot of index entries.
///
/// The snapshot is taken when the cursor is created; later writes to the
/// index are not visible through it. The cursor starts positioned at the
/// first (smallest) key, or invalid when the index was empty.
#[derive(Debug)]
pub struct Cursor {
    entries: Vec<(Vec<u8>, Position)>,
    current: Option<usize>,
}

impl Cursor {
    fn new(entries: Vec<(Vec<u8>, Position)>) -> Self {
        let current = if entries.is_empty() { None } else { Some(0) };
        Self { entries, current }
    }

    /// Positions the cursor at the first entry with key ≥ `key`, or invalid
    /// when no such entry exists.
    pub fn seek(&mut self, key: &[u8]) {
        self.current = self
            .entries
            .iter()
            .position(|(k, _)| k.as_slice() >= key);
    }

    /// Advances to the next entry. Past the last entry the cursor becomes
    /// invalid and stays so.
    pub fn next(&mut self) {
        self.current = match self.current {
            Some(i) if i + 1 < self.entries.len() => Some(i + 1),
            _ => None,
        };
    }

    /// Steps back to the previous entry. Before the first entry the cursor
    /// becomes invalid and stays so.
    pub fn prev(&mut self) {
        self.current = match self.current {
            Some(i) if i > 0 => Some(i - 1),
            _ => None,
        };
    }

    /// True while the cursor points at an entry.
    pub fn valid(&self) -> bool {
        self.current.is_some()
    }

    /// Key of the current entry, or `None` when invalid.
    pub fn key(&self) -> Option<&[u8]> {
        self.current.map(|i| self.entries[i].0.as_slice())
    }

    /// Position of the current entry, or `None` when invalid.
    pub fn value(&self) -> Option<Position> {
        self.current.map(|i| self.entries[i].1)
    }

    /// Releases the snapshot.
    pub fn close(&mut self) {
        self.entries = Vec::new();
        self.current = None;
    }
}
