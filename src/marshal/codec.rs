//! Name codecs
//!
//! A name travels the wire as text and reaches the store as opaque bytes.
//! Which codec applies is decided by the column family's comparator
//! metadata, once per nesting level; the traversal in `transform` never
//! re-derives it.

use uuid::Uuid;

use crate::error::{GatewayError, Result};
use crate::schema::{ColumnFamilyDef, ComparatorKind};

/// Bidirectional codec for a single name.
pub trait NameCodec: Sync {
    /// Wire-side text to the store's native byte representation.
    fn to_store(&self, name: &str) -> Result<Vec<u8>>;

    /// Store bytes back to wire-side text.
    fn to_wire(&self, raw: &[u8]) -> Result<String>;
}

// =============================================================================
// Integer Codec
// =============================================================================

/// 8-byte big-endian two's-complement integer names.
///
/// The store compares these as Java longs, so the encoding is big-endian
/// regardless of host byte order. Inputs above `i64::MAX` and negative
/// inputs are rejected with `ValueOutOfRange`.
pub struct LongCodec;

impl NameCodec for LongCodec {
    fn to_store(&self, name: &str) -> Result<Vec<u8>> {
        let trimmed = name.trim();
        if trimmed.starts_with('-') {
            return Err(GatewayError::ValueOutOfRange(format!(
                "negative long value: {}",
                trimmed
            )));
        }
        let num: u128 = trimmed.parse().map_err(|_| {
            GatewayError::MalformedEntity(format!("not a long value: {:?}", name))
        })?;
        if num > i64::MAX as u128 {
            return Err(GatewayError::ValueOutOfRange(format!(
                "max long value exceeded: {}",
                trimmed
            )));
        }
        Ok((num as i64).to_be_bytes().to_vec())
    }

    fn to_wire(&self, raw: &[u8]) -> Result<String> {
        let bytes: [u8; 8] = raw.try_into().map_err(|_| {
            GatewayError::MalformedEntity(format!(
                "long name must be 8 bytes, got {}",
                raw.len()
            ))
        })?;
        Ok(i64::from_be_bytes(bytes).to_string())
    }
}

// =============================================================================
// UUID Codec
// =============================================================================

/// Time-ordered UUID names: canonical hyphenated text on the wire, the
/// 16 raw bytes toward the store. Accepts either form as input.
pub struct UuidCodec;

impl NameCodec for UuidCodec {
    fn to_store(&self, name: &str) -> Result<Vec<u8>> {
        if let Ok(uuid) = Uuid::parse_str(name) {
            return Ok(uuid.as_bytes().to_vec());
        }
        if name.len() == 16 {
            return Ok(name.as_bytes().to_vec());
        }
        Err(GatewayError::MalformedEntity(format!(
            "not a UUID: {:?}",
            name
        )))
    }

    fn to_wire(&self, raw: &[u8]) -> Result<String> {
        if raw.len() == 16 {
            let uuid = Uuid::from_slice(raw)
                .map_err(|e| GatewayError::MalformedEntity(e.to_string()))?;
            return Ok(uuid.hyphenated().to_string());
        }
        let text = std::str::from_utf8(raw)
            .map_err(|_| GatewayError::MalformedEntity("not a UUID".to_string()))?;
        let uuid = Uuid::parse_str(text)
            .map_err(|_| GatewayError::MalformedEntity(format!("not a UUID: {:?}", text)))?;
        Ok(uuid.hyphenated().to_string())
    }
}

// =============================================================================
// Text Codec
// =============================================================================

/// Passthrough for comparators with no declared typing: names travel as
/// UTF-8 text in both directions.
pub struct TextCodec;

impl NameCodec for TextCodec {
    fn to_store(&self, name: &str) -> Result<Vec<u8>> {
        Ok(name.as_bytes().to_vec())
    }

    fn to_wire(&self, raw: &[u8]) -> Result<String> {
        Ok(String::from_utf8_lossy(raw).into_owned())
    }
}

// =============================================================================
// Codec Selection
// =============================================================================

static LONG: LongCodec = LongCodec;
static UUID_CODEC: UuidCodec = UuidCodec;
static TEXT: TextCodec = TextCodec;

pub fn codec_for(kind: ComparatorKind) -> &'static dyn NameCodec {
    match kind {
        ComparatorKind::Long => &LONG,
        ComparatorKind::Uuid => &UUID_CODEC,
        ComparatorKind::Text => &TEXT,
    }
}

/// The two codecs a column family can require, selected once and threaded
/// through the traversal. The subcolumn codec defaults to passthrough when
/// the family declares no subcolumn comparator.
#[derive(Clone, Copy)]
pub struct CfCodecs {
    pub primary: &'static dyn NameCodec,
    pub sub: &'static dyn NameCodec,
}

impl CfCodecs {
    pub fn for_family(def: &ColumnFamilyDef) -> Self {
        Self {
            primary: codec_for(def.comparator()),
            sub: codec_for(def.subcomparator().unwrap_or(ComparatorKind::Text)),
        }
    }

    /// Codec for a column name at the given nesting level.
    pub fn at(&self, nested: bool) -> &'static dyn NameCodec {
        if nested {
            self.sub
        } else {
            self.primary
        }
    }
}

// =============================================================================
// UUID Generation
// =============================================================================

/// Produce `count` fresh, time-ordered UUIDs in canonical hyphenated form.
pub fn generate_uuids(count: usize) -> Vec<String> {
    let node_id = node_id();
    (0..count)
        .map(|_| Uuid::now_v1(&node_id).hyphenated().to_string())
        .collect()
}

fn node_id() -> [u8; 6] {
    let pid = std::process::id().to_be_bytes();
    [b'r', b'g', pid[0], pid[1], pid[2], pid[3]]
}
