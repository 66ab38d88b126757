//! Engine configuration.

use std::path::PathBuf;

/// Tunable parameters for an UndertowKV store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root data directory. Segment files live under `dir_path/data_wal/`.
    pub dir_path: PathBuf,

    /// Rotation threshold in bytes: the active segment is sealed as soon as
    /// its tail exceeds this size. Records are never split at the boundary,
    /// so a segment may overshoot by up to one record.
    pub max_file_size: u64,

    /// Upper bound on key length in bytes.
    pub max_key_len: usize,

    /// Upper bound on value length in bytes.
    pub max_value_len: usize,

    /// Advisory durability flag. Appends are currently fsynced
    /// unconditionally; a future batched mode may honor `false`.
    pub sync_write: bool,

    /// Index realization. `"btree"` is the one recognized kind.
    pub index_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dir_path: PathBuf::from("./data"),
            max_file_size: 1024 * 1024 * 1024, // 1 GiB
            max_key_len: 1024,
            max_value_len: 1024 * 1024, // 1 MiB
            sync_write: true,
            index_type: "btree".to_string(),
        }
    }
}

impl Config {
    /// Creates a config rooted at `dir_path` with default limits.
    pub fn new(dir_path: impl Into<PathBuf>) -> Self {
        Self {
            dir_path: dir_path.into(),
            ..Default::default()
        }
    }

    /// Sets the segment rotation threshold in bytes.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Sets the maximum key length in bytes.
    pub fn with_max_key_len(mut self, bytes: usize) -> Self {
        self.max_key_len = bytes;
        self
    }

    /// Sets the maximum value length in bytes.
    pub fn with_max_value_len(mut self, bytes: usize) -> Self {
        self.max_value_len = bytes;
        self
    }

    /// Sets the advisory sync flag.
    pub fn with_sync_write(mut self, sync: bool) -> Self {
        self.sync_write = sync;
        self
    }

    /// Selects the index realization.
    pub fn with_index_type(mut self, kind: impl Into<String>) -> Self {
        self.index_type = kind.into();
        self
    }
}
