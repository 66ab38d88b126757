/// Read path: `get()` and `scan()`.
///
/// A point lookup resolves the index position to its owning segment and
/// decodes the recorded byte range. A scan is an ordered snapshot cursor
/// over the index; values are fetched lazily by the caller via `get`.
use anyhow::{anyhow, Result};
use index::Cursor;
use record::{Record, RecordType};

use crate::Engine;

impl Engine {
    /// Looks up a key, returning `Some(value)` if found and live.
    ///
    /// A key that is absent from the index, points at a tombstone, or whose
    /// bytes fail to read or decode is reported as `None` — at this
    /// boundary a corrupted live record is indistinguishable from a missing
    /// one.
    ///
    /// # Errors
    ///
    /// The single error case is index/log divergence: an index position
    /// naming a segment id that is neither active nor sealed.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let pos = match self.index.get(key) {
            Ok(pos) => pos,
            Err(_) => return Ok(None),
        };

        let segments = self.read_segments()?;
        let segment = if pos.file_id == segments.active_id {
            &segments.active
        } else {
            segments.sealed.get(&pos.file_id).ok_or_else(|| {
                anyhow!(
                    "index references unknown segment {} ({})",
                    pos.file_id,
                    pos
                )
            })?
        };

        let Ok(bytes) = segment.read_at(pos.offset, pos.length) else {
            return Ok(None);
        };

        match Record::decode(&bytes) {
            Ok(rec) if rec.record_type == RecordType::Tombstone => Ok(None),
            Ok(rec) => Ok(Some(rec.value)),
            Err(_) => Ok(None),
        }
    }

    /// Returns an ordered cursor over a snapshot of all live keys.
    ///
    /// The snapshot is taken at call time; later writes are not visible
    /// through the cursor.
    pub fn scan(&self) -> Cursor {
        self.index.iter()
    }
}
