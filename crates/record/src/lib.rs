//! # Record — On-Disk Record Codec
//!
//! Encodes and decodes a single log record to/from its binary wire form.
//! Every record written to a segment file uses this layout, and every byte
//! range referenced by the in-memory index decodes through [`Record::decode`].
//!
//! ## Binary Record Format
//!
//! ```text
//! [type: u8][key_len: u32 BE][value_len: u32 BE][key][value][crc32: u32 BE]
//! ```
//!
//! The trailing CRC-32/IEEE is computed over **all preceding bytes** of the
//! record. Integers are big-endian.
//!
//! ## Record Types
//!
//! Only [`RecordType::Normal`] and [`RecordType::Tombstone`] are produced by
//! the engine. The checkpoint and transaction codes are reserved in the wire
//! format: they (and any unknown tag) round-trip through encode/decode
//! unchanged, but carry no semantics yet.
//!
//! ## Example
//!
//! ```rust
//! use record::{Record, RecordType};
//!
//! let rec = Record::new(RecordType::Normal, b"hello".to_vec(), b"world".to_vec());
//! let bytes = rec.encode();
//! let back = Record::decode(&bytes).unwrap();
//! assert_eq!(rec, back);
//! ```

use byteorder::{BigEndian, ByteOrder};
use crc32fast::Hasher as Crc32;
use std::fmt;
use thiserror::Error;

/// Fixed header size: type (1) + key_len (4) + value_len (4).
pub const HEADER_LEN: usize = 9;

/// Size of the trailing CRC-32 field.
pub const CRC_LEN: usize = 4;

/// The type tag carried in the first byte of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// A live key-value insertion.
    Normal,
    /// A delete marker. The key is removed from the index; the record stays
    /// in the log and suppresses older values on replay.
    Tombstone,
    /// Reserved: checkpoint marker.
    Checkpoint,
    /// Reserved: transaction begin.
    TxnBegin,
    /// Reserved: transaction commit.
    TxnCommit,
    /// Reserved: transaction rollback.
    TxnRollback,
    /// Any tag outside the assigned range. Preserved verbatim so that
    /// records written by a newer format revision survive a round trip.
    Unknown(u8),
}

impl RecordType {
    /// Returns the wire tag for this type.
    pub fn as_u8(self) -> u8 {
        match self {
            RecordType::Normal => 0,
            RecordType::Tombstone => 1,
            RecordType::Checkpoint => 2,
            RecordType::TxnBegin => 3,
            RecordType::TxnCommit => 4,
            RecordType::TxnRollback => 5,
            RecordType::Unknown(tag) => tag,
        }
    }

    /// Maps a wire tag back to a type. Unassigned tags become
    /// [`RecordType::Unknown`] rather than an error.
    pub fn from_u8(tag: u8) -> Self {
        match tag {
            0 => RecordType::Normal,
            1 => RecordType::Tombstone,
            2 => RecordType::Checkpoint,
            3 => RecordType::TxnBegin,
            4 => RecordType::TxnCommit,
            5 => RecordType::TxnRollback,
            other => RecordType::Unknown(other),
        }
    }
}

/// Errors produced by the codec.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The buffer is too short for its declared lengths, or the trailing
    /// CRC-32 does not match the record contents.
    #[error("corrupt record")]
    Corrupt,
}

/// One decoded log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The wire type tag.
    pub record_type: RecordType,
    /// Raw key bytes.
    pub key: Vec<u8>,
    /// Raw value bytes. Empty for tombstones.
    pub value: Vec<u8>,
}

impl Record {
    /// Constructs a record from its parts.
    pub fn new(record_type: RecordType, key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            record_type,
            key,
            value,
        }
    }

    /// Total encoded size of this record in bytes.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.key.len() + self.value.len() + CRC_LEN
    }

    /// Serializes the record into its wire form.
    ///
    /// Layout: `[type][key_len][value_len][key][value][crc32]`, with the CRC
    /// computed over everything before the trailer.
    pub fn encode(&self) -> Vec<u8> {
        let total = self.encoded_len();
        let mut buf = vec![0u8; total];

        buf[0] = self.record_type.as_u8();
        BigEndian::write_u32(&mut buf[1..5], self.key.len() as u32);
        BigEndian::write_u32(&mut buf[5..9], self.value.len() as u32);
        buf[HEADER_LEN..HEADER_LEN + self.key.len()].copy_from_slice(&self.key);
        buf[HEADER_LEN + self.key.len()..total - CRC_LEN].copy_from_slice(&self.value);

        let mut hasher = Crc32::new();
        hasher.update(&buf[..total - CRC_LEN]);
        BigEndian::write_u32(&mut buf[total - CRC_LEN..], hasher.finalize());

        buf
    }

    /// Decodes one complete record from `buf`.
    ///
    /// The buffer must contain exactly the record's bytes (leading bytes are
    /// parsed, trailing extra bytes beyond the declared lengths are ignored).
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Corrupt`] if the buffer is shorter than the
    /// fixed header, shorter than its declared key/value lengths, or fails
    /// CRC verification.
    pub fn decode(buf: &[u8]) -> Result<Record, RecordError> {
        if buf.len() < HEADER_LEN {
            return Err(RecordError::Corrupt);
        }

        let record_type = RecordType::from_u8(buf[0]);
        let key_len = BigEndian::read_u32(&buf[1..5]) as usize;
        let value_len = BigEndian::read_u32(&buf[5..9]) as usize;

        let total = HEADER_LEN + key_len + value_len + CRC_LEN;
        if buf.len() < total {
            return Err(RecordError::Corrupt);
        }

        let mut hasher = Crc32::new();
        hasher.update(&buf[..total - CRC_LEN]);
        let expect = hasher.finalize();
        let crc = BigEndian::read_u32(&buf[total - CRC_LEN..total]);
        if crc != expect {
            return Err(RecordError::Corrupt);
        }

        Ok(Record {
            record_type,
            key: buf[HEADER_LEN..HEADER_LEN + key_len].to_vec(),
            value: buf[HEADER_LEN + key_len..total - CRC_LEN].to_vec(),
        })
    }
}

/// Locates one encoded record: the byte range `[offset, offset + length)`
/// inside the segment file `file_id`. Positions are plain values; the index
/// stores them by value and they never change after an append completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Id of the segment file holding the record.
    pub file_id: u64,
    /// Byte offset of the record's first byte within the segment.
    pub offset: u64,
    /// Total encoded length of the record.
    pub length: u64,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file_id={}, offset={}, length={}",
            self.file_id, self.offset, self.length
        )
    }
}

#[cfg(test)]
mod tests;
