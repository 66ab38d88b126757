use crate::Config;
use std::fs;
use std::path::Path;

const LETTERS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `key-000000042` style keys, fixed width so byte order matches numeric
/// order.
pub fn generate_key(index: usize) -> Vec<u8> {
    format!("key-{:09}", index).into_bytes()
}

/// Deterministic filler value so reopened stores can be checked without
/// carrying state between test runs.
pub fn generate_value(index: usize, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| LETTERS[(index + i) % LETTERS.len()])
        .collect()
}

/// A config rooted at `dir` with a small rotation threshold suitable for
/// exercising multiple segments quickly.
pub fn small_segment_config(dir: &Path, max_file_size: u64) -> Config {
    Config::new(dir).with_max_file_size(max_file_size)
}

pub fn count_segment_files(wal_dir: &Path) -> usize {
    fs::read_dir(wal_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|name| name.starts_with("data_") && name.ends_with(".wal"))
                .unwrap_or(false)
        })
        .count()
}
