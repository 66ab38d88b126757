/// Cold-start recovery: enumerate segment files, replay them in ascending
/// id order into the index, and hand back the assembled segment set.
///
/// Segment files are named `data_NNNNNNNNN.wal` (nine-digit zero-padded
/// decimal id). The highest id becomes the active segment; every lower id
/// is retained open in the sealed map for reads. A directory with no
/// matching files starts fresh with segment 0 and an empty index.
use anyhow::{bail, Context, Result};
use index::{Index, IndexError};
use record::RecordType;
use std::path::{Path, PathBuf};
use wal::Wal;

use crate::Segments;

/// Directory under the store root that holds the segment files.
pub(crate) fn wal_dir(dir_path: &Path) -> PathBuf {
    dir_path.join("data_wal")
}

/// File name for a segment id: `data_000000042.wal`.
pub(crate) fn segment_file_name(file_id: u64) -> String {
    format!("data_{:09}.wal", file_id)
}

/// Parses a segment file name back to its id. Non-segment files yield
/// `None` and are skipped during enumeration.
pub(crate) fn parse_segment_file_name(name: &str) -> Option<u64> {
    name.strip_prefix("data_")?
        .strip_suffix(".wal")?
        .parse::<u64>()
        .ok()
}

/// Replays one segment into the index.
///
/// `Normal` records insert their position, `Tombstone` records delete the
/// key, reserved and unknown types are ignored. A tombstone for a key that
/// is not present is itself ignored: the marker is already durable and
/// deletion is idempotent on replay.
fn replay_into_index(segment: &Wal, index: &dyn Index) -> Result<()> {
    let mut apply_err: Option<IndexError> = None;

    segment.replay(|rec, pos| match rec.record_type {
        RecordType::Normal => {
            if let Err(e) = index.put(&rec.key, pos) {
                apply_err.get_or_insert(e);
            }
        }
        RecordType::Tombstone => match index.delete(&rec.key) {
            Ok(()) | Err(IndexError::NotFound) => {}
            Err(e) => {
                apply_err.get_or_insert(e);
            }
        },
        _ => {}
    })?;

    match apply_err {
        Some(e) => Err(e).context("failed to apply replayed record to index"),
        None => Ok(()),
    }
}

/// Scans `wal_dir` for segment files and replays them all.
///
/// # Errors
///
/// Fails on unreadable directories, on replay I/O or corruption, and on a
/// file whose `data_*.wal` name does not parse as an id — a sign the
/// directory holds foreign files under our naming scheme.
pub(crate) fn load_segments(wal_dir: &Path, index: &dyn Index) -> Result<Segments> {
    let mut file_ids = Vec::new();

    let entries = std::fs::read_dir(wal_dir)
        .with_context(|| format!("failed to read WAL directory {}", wal_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with("data_") || !name.ends_with(".wal") {
            continue;
        }
        match parse_segment_file_name(name) {
            Some(id) => file_ids.push(id),
            None => bail!("invalid wal file name {}", name),
        }
    }

    if file_ids.is_empty() {
        let path = wal_dir.join(segment_file_name(0));
        let active = Wal::open(&path, 0)
            .with_context(|| format!("failed to create segment file {}", path.display()))?;
        return Ok(Segments {
            active_id: 0,
            active,
            sealed: Default::default(),
        });
    }

    file_ids.sort_unstable();

    let open_and_replay = |file_id: u64| -> Result<Wal> {
        let path = wal_dir.join(segment_file_name(file_id));
        let segment = Wal::open(&path, file_id)
            .with_context(|| format!("failed to open segment file {}", path.display()))?;
        replay_into_index(&segment, index)
            .with_context(|| format!("failed to replay segment file {}", path.display()))?;
        Ok(segment)
    };

    let last = file_ids[file_ids.len() - 1];
    let mut sealed = std::collections::HashMap::new();
    for &file_id in &file_ids[..file_ids.len() - 1] {
        sealed.insert(file_id, open_and_replay(file_id)?);
    }
    let active = open_and_replay(last)?;

    Ok(Segments {
        active_id: last,
        active,
        sealed,
    })
}
