/// Write path: `put()`, `delete()`, and size-triggered rotation.
///
/// All mutations flow through this module. Each write is appended to the
/// active segment (fsynced) before the index is touched, then the active
/// tail is checked against the rotation threshold.
use anyhow::{Context, Result};
use record::RecordType;
use wal::Wal;

use crate::{recovery, Engine};

impl Engine {
    /// Inserts or updates a key-value pair.
    ///
    /// The record is appended to the active segment first; its returned
    /// position then replaces any existing index entry for the key.
    ///
    /// # Errors
    ///
    /// Rejects empty keys and keys/values over the configured length caps;
    /// propagates append and rotation I/O failures.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        anyhow::ensure!(!key.is_empty(), "key must not be empty");
        anyhow::ensure!(
            key.len() <= self.config.max_key_len,
            "key too large: {} bytes (max {})",
            key.len(),
            self.config.max_key_len
        );
        anyhow::ensure!(
            value.len() <= self.config.max_value_len,
            "value too large: {} bytes (max {})",
            value.len(),
            self.config.max_value_len
        );

        let pos = {
            let segments = self.read_segments()?;
            segments
                .active
                .append(key, value, RecordType::Normal)
                .context("failed to append record to wal")?
        };

        self.index
            .put(key, pos)
            .context("failed to put key to index")?;

        self.rotate_if_needed()
    }

    /// Deletes a key by writing a tombstone.
    ///
    /// The tombstone is durable before the index entry is removed, so the
    /// deletion survives a crash even if it races shutdown. Deleting a key
    /// that does not exist returns the index's not-found error; the
    /// tombstone stays in the log and is harmless on replay.
    ///
    /// # Errors
    ///
    /// Rejects empty and oversized keys; surfaces not-found; propagates
    /// append and rotation I/O failures.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        anyhow::ensure!(!key.is_empty(), "key must not be empty");
        anyhow::ensure!(
            key.len() <= self.config.max_key_len,
            "key too large: {} bytes (max {})",
            key.len(),
            self.config.max_key_len
        );

        {
            let segments = self.read_segments()?;
            segments
                .active
                .append(key, b"", RecordType::Tombstone)
                .context("failed to append tombstone to wal")?;
        }

        self.index
            .delete(key)
            .context("failed to delete key from index")?;

        self.rotate_if_needed()
    }

    /// Seals the active segment and opens the next one when the tail has
    /// passed `max_file_size`.
    ///
    /// The check takes the read lock, the swap takes the write lock. The
    /// record that pushed the tail over the threshold stays in the
    /// now-sealed segment; nothing is re-indexed. A failure here leaves the
    /// already committed write intact, and the next mutation retries.
    pub(crate) fn rotate_if_needed(&self) -> Result<()> {
        {
            let segments = self.read_segments()?;
            if segments.active.offset() <= self.config.max_file_size {
                return Ok(());
            }
        }

        let mut segments = self.write_segments()?;
        segments
            .active
            .sync()
            .context("failed to sync active segment before sealing")?;

        let old_id = segments.active_id;
        let new_id = old_id + 1;
        let path = recovery::wal_dir(&self.config.dir_path).join(recovery::segment_file_name(new_id));
        let fresh = Wal::open(&path, new_id)
            .with_context(|| format!("failed to create segment file {}", path.display()))?;

        let old = std::mem::replace(&mut segments.active, fresh);
        segments.sealed.insert(old_id, old);
        segments.active_id = new_id;

        Ok(())
    }
}
