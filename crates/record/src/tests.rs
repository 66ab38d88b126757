use super::*;

// -------------------- Round trips --------------------

#[test]
fn normal_record_roundtrip() {
    let rec = Record::new(RecordType::Normal, b"key".to_vec(), b"value".to_vec());
    let bytes = rec.encode();
    assert_eq!(bytes.len(), rec.encoded_len());

    let back = Record::decode(&bytes).unwrap();
    assert_eq!(back, rec);
}

#[test]
fn tombstone_roundtrip_empty_value() {
    let rec = Record::new(RecordType::Tombstone, b"gone".to_vec(), Vec::new());
    let back = Record::decode(&rec.encode()).unwrap();
    assert_eq!(back.record_type, RecordType::Tombstone);
    assert_eq!(back.key, b"gone");
    assert!(back.value.is_empty());
}

#[test]
fn binary_key_and_value() {
    let key = vec![0x00u8, 0xFF, 0x80];
    let val = vec![0xDEu8, 0xAD, 0xBE, 0xEF];
    let rec = Record::new(RecordType::Normal, key.clone(), val.clone());

    let back = Record::decode(&rec.encode()).unwrap();
    assert_eq!(back.key, key);
    assert_eq!(back.value, val);
}

#[test]
fn reserved_types_roundtrip() {
    for rt in [
        RecordType::Checkpoint,
        RecordType::TxnBegin,
        RecordType::TxnCommit,
        RecordType::TxnRollback,
    ] {
        let rec = Record::new(rt, b"k".to_vec(), b"v".to_vec());
        let back = Record::decode(&rec.encode()).unwrap();
        assert_eq!(back.record_type, rt);
    }
}

#[test]
fn unknown_type_tag_preserved() {
    let rec = Record::new(RecordType::Unknown(0x7F), b"k".to_vec(), b"v".to_vec());
    let bytes = rec.encode();
    assert_eq!(bytes[0], 0x7F);

    let back = Record::decode(&bytes).unwrap();
    assert_eq!(back.record_type, RecordType::Unknown(0x7F));
    assert_eq!(back.encode(), bytes);
}

// -------------------- Layout --------------------

#[test]
fn encoded_layout_matches_format() {
    let rec = Record::new(RecordType::Tombstone, b"ab".to_vec(), b"xyz".to_vec());
    let bytes = rec.encode();

    assert_eq!(bytes.len(), HEADER_LEN + 2 + 3 + CRC_LEN);
    assert_eq!(bytes[0], 1); // tombstone tag
    assert_eq!(&bytes[1..5], &2u32.to_be_bytes()); // key_len
    assert_eq!(&bytes[5..9], &3u32.to_be_bytes()); // value_len
    assert_eq!(&bytes[9..11], b"ab");
    assert_eq!(&bytes[11..14], b"xyz");
}

#[test]
fn empty_key_and_value_still_roundtrip() {
    // The codec itself has no opinion on empty keys; that rule lives in the
    // index and engine layers.
    let rec = Record::new(RecordType::Normal, Vec::new(), Vec::new());
    let back = Record::decode(&rec.encode()).unwrap();
    assert_eq!(back, rec);
}

// -------------------- Corruption detection --------------------

#[test]
fn single_bit_flip_anywhere_is_detected() {
    let rec = Record::new(RecordType::Normal, b"key".to_vec(), b"value".to_vec());
    let bytes = rec.encode();

    for i in 0..bytes.len() {
        for bit in 0..8 {
            let mut bad = bytes.clone();
            bad[i] ^= 1 << bit;
            // A flip in the length fields may make the buffer "too short";
            // a flip anywhere else fails the CRC. Both are Corrupt.
            assert!(
                Record::decode(&bad).is_err(),
                "flip at byte {} bit {} went undetected",
                i,
                bit
            );
        }
    }
}

#[test]
fn buffer_shorter_than_header_is_corrupt() {
    assert!(Record::decode(&[]).is_err());
    assert!(Record::decode(&[0u8; 8]).is_err());
}

#[test]
fn buffer_shorter_than_declared_lengths_is_corrupt() {
    let rec = Record::new(RecordType::Normal, b"key".to_vec(), b"value".to_vec());
    let bytes = rec.encode();
    let truncated = &bytes[..bytes.len() - 1];
    assert!(Record::decode(truncated).is_err());
}

#[test]
fn wrong_crc_is_corrupt() {
    let rec = Record::new(RecordType::Normal, b"k".to_vec(), b"v".to_vec());
    let mut bytes = rec.encode();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    assert!(matches!(Record::decode(&bytes), Err(RecordError::Corrupt)));
}

// -------------------- Position --------------------

#[test]
fn position_is_a_plain_value() {
    let pos = Position {
        file_id: 3,
        offset: 128,
        length: 42,
    };
    let copy = pos;
    assert_eq!(copy, pos);
    assert_eq!(pos.to_string(), "file_id=3, offset=128, length=42");
}
