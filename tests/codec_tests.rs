//! Codec Tests
//!
//! Tests for the comparator-driven name codecs: long, UUID, and text.

use rowgate::error::GatewayError;
use rowgate::marshal::{generate_uuids, LongCodec, NameCodec, TextCodec, UuidCodec};

// =============================================================================
// Long Codec Tests
// =============================================================================

#[test]
fn test_long_encodes_big_endian() {
    let encoded = LongCodec.to_store("1").unwrap();
    assert_eq!(encoded, vec![0, 0, 0, 0, 0, 0, 0, 1]);

    let encoded = LongCodec.to_store("256").unwrap();
    assert_eq!(encoded, vec![0, 0, 0, 0, 0, 0, 1, 0]);
}

#[test]
fn test_long_max_value() {
    let encoded = LongCodec.to_store("9223372036854775807").unwrap();
    assert_eq!(encoded, vec![0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(LongCodec.to_wire(&encoded).unwrap(), "9223372036854775807");
}

#[test]
fn test_long_round_trip() {
    for value in ["0", "1", "42", "1000000", "1311285837190", "9223372036854775807"] {
        let encoded = LongCodec.to_store(value).unwrap();
        assert_eq!(encoded.len(), 8);
        assert_eq!(LongCodec.to_wire(&encoded).unwrap(), value);
    }
}

#[test]
fn test_long_overflow_rejected() {
    // One past i64::MAX.
    match LongCodec.to_store("9223372036854775808") {
        Err(GatewayError::ValueOutOfRange(_)) => {}
        other => panic!("Expected ValueOutOfRange, got {:?}", other),
    }
}

#[test]
fn test_long_negative_rejected() {
    match LongCodec.to_store("-1") {
        Err(GatewayError::ValueOutOfRange(_)) => {}
        other => panic!("Expected ValueOutOfRange, got {:?}", other),
    }
}

#[test]
fn test_long_non_numeric_rejected() {
    match LongCodec.to_store("banana") {
        Err(GatewayError::MalformedEntity(_)) => {}
        other => panic!("Expected MalformedEntity, got {:?}", other),
    }
}

#[test]
fn test_long_to_wire_rejects_wrong_width() {
    match LongCodec.to_wire(&[0, 0, 1]) {
        Err(GatewayError::MalformedEntity(_)) => {}
        other => panic!("Expected MalformedEntity, got {:?}", other),
    }
}

// =============================================================================
// UUID Codec Tests
// =============================================================================

#[test]
fn test_uuid_round_trip() {
    let text = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";
    let encoded = UuidCodec.to_store(text).unwrap();
    assert_eq!(encoded.len(), 16);
    assert_eq!(UuidCodec.to_wire(&encoded).unwrap(), text);
}

#[test]
fn test_uuid_accepts_raw_bytes() {
    // A UUID whose 16 raw bytes happen to be ASCII text.
    let text = "30313233-3435-3637-3839-616263646566";
    let bytes = UuidCodec.to_store(text).unwrap();
    assert_eq!(bytes, b"0123456789abcdef".to_vec());

    // Those 16 bytes fed back in as a name take the raw-bytes path.
    assert_eq!(UuidCodec.to_store("0123456789abcdef").unwrap(), bytes);
    assert_eq!(UuidCodec.to_wire(&bytes).unwrap(), text);
}

#[test]
fn test_uuid_garbage_rejected() {
    match UuidCodec.to_store("not-a-uuid") {
        Err(GatewayError::MalformedEntity(_)) => {}
        other => panic!("Expected MalformedEntity, got {:?}", other),
    }
}

#[test]
fn test_uuid_to_wire_hyphenated() {
    let bytes: Vec<u8> = vec![
        0x6b, 0xa7, 0xb8, 0x10, 0x9d, 0xad, 0x11, 0xd1, 0x80, 0xb4, 0x00, 0xc0, 0x4f, 0xd4,
        0x30, 0xc8,
    ];
    assert_eq!(
        UuidCodec.to_wire(&bytes).unwrap(),
        "6ba7b810-9dad-11d1-80b4-00c04fd430c8"
    );
}

// =============================================================================
// Text Codec Tests
// =============================================================================

#[test]
fn test_text_passthrough() {
    let encoded = TextCodec.to_store("first").unwrap();
    assert_eq!(encoded, b"first".to_vec());
    assert_eq!(TextCodec.to_wire(&encoded).unwrap(), "first");
}

#[test]
fn test_text_lossy_toward_wire() {
    // Invalid UTF-8 never blocks a response.
    let wire = TextCodec.to_wire(&[0xFF, 0xFE, b'x']).unwrap();
    assert!(wire.ends_with('x'));
}

// =============================================================================
// UUID Generation Tests
// =============================================================================

#[test]
fn test_generate_uuids_distinct_and_canonical() {
    let uuids = generate_uuids(3);
    assert_eq!(uuids.len(), 3);
    for u in &uuids {
        assert_eq!(u.len(), 36);
        assert_eq!(u.matches('-').count(), 4);
        // Version nibble: time-based.
        assert_eq!(&u[14..15], "1");
    }
    assert_ne!(uuids[0], uuids[1]);
    assert_ne!(uuids[1], uuids[2]);
    assert_ne!(uuids[0], uuids[2]);
}

#[test]
fn test_generate_uuids_zero() {
    assert!(generate_uuids(0).is_empty());
}
