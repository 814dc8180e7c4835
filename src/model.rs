//! Request/response data model
//!
//! Entities addressing rows, columns and slices. All of them are generic
//! over the name representation: `String` on the wire (JSON) side, raw
//! `Vec<u8>` toward the store. The marshalling engine maps one tree to the
//! other (see `crate::marshal`); row keys and values are carried through
//! untouched.
//!
//! Wire-side parsing is tolerant of JSON numbers where names, values,
//! counts or timestamps are expected, because the companion client
//! stringifies numbers inconsistently.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;

use crate::error::{GatewayError, Result};

// =============================================================================
// Wire/Store Aliases
// =============================================================================

pub type WireColumnPath = ColumnPath<String>;
pub type WireColumnParent = ColumnParent<String>;
pub type WireSliceRange = SliceRange<String>;
pub type WireSlicePredicate = SlicePredicate<String>;
pub type WireColumn = Column<String>;
pub type WireSuperColumn = SuperColumn<String>;
pub type WireColumnOrSuperColumn = ColumnOrSuperColumn<String>;
pub type WireDeletion = Deletion<String>;
pub type WireMutation = Mutation<String>;
pub type WireKeySlice = KeySlice<String>;

pub type StoreColumnPath = ColumnPath<Vec<u8>>;
pub type StoreColumnParent = ColumnParent<Vec<u8>>;
pub type StoreSliceRange = SliceRange<Vec<u8>>;
pub type StoreSlicePredicate = SlicePredicate<Vec<u8>>;
pub type StoreColumn = Column<Vec<u8>>;
pub type StoreSuperColumn = SuperColumn<Vec<u8>>;
pub type StoreColumnOrSuperColumn = ColumnOrSuperColumn<Vec<u8>>;
pub type StoreDeletion = Deletion<Vec<u8>>;
pub type StoreMutation = Mutation<Vec<u8>>;
pub type StoreKeySlice = KeySlice<Vec<u8>>;

// =============================================================================
// Entities
// =============================================================================

/// Addresses a row, a super column, or a single (sub)column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnPath<N> {
    pub column_family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub super_column: Option<N>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<N>,
}

/// Addresses the scope a slice is taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnParent<N> {
    pub column_family: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub super_column: Option<N>,
}

/// Byte-range scan over column names. Empty boundaries mean "unbounded"
/// and are never type-transformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliceRange<N> {
    pub start: N,
    pub finish: N,
    pub reversed: bool,
    pub count: i32,
}

/// Exactly one selection mode; the "neither populated" case is rejected
/// at parse time. Serializes to `{"column_names": [...]}` or
/// `{"slice_range": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SlicePredicate<N> {
    #[serde(rename = "column_names")]
    Names(Vec<N>),
    #[serde(rename = "slice_range")]
    Range(SliceRange<N>),
}

/// Row-range scan. Keys and tokens are opaque to the marshalling engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,
}

/// A single column. The value is always opaque bytes; only the name is
/// subject to comparator-driven transforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column<N> {
    pub name: N,
    pub value: N,
    pub timestamp: i64,
}

/// A two-level row: a named container of columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuperColumn<N> {
    pub name: N,
    pub columns: Vec<Column<N>>,
}

/// Exactly one alternative. On the wire side this serializes untagged, so
/// a result collapses into the inner column or super-column object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ColumnOrSuperColumn<N> {
    Column(Column<N>),
    Super(SuperColumn<N>),
}

/// Removes a super column, a predicate's worth of (sub)columns, or a whole
/// row, at a given timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion<N> {
    pub timestamp: Option<i64>,
    pub super_column: Option<N>,
    pub predicate: Option<SlicePredicate<N>>,
}

/// Exactly one alternative: a write or a deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<N> {
    Write(ColumnOrSuperColumn<N>),
    Delete(Deletion<N>),
}

/// One row of a range-slice result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySlice<N> {
    pub key: String,
    pub columns: Vec<ColumnOrSuperColumn<N>>,
}

// =============================================================================
// Timestamps
// =============================================================================

/// Current wall-clock time in microseconds since the epoch.
pub fn now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}

/// Resolve a timestamp parameter: either an explicit integer or the
/// sentinel `"auto"`, which resolves to the supplied "now".
pub fn resolve_timestamp(raw: &str, now: i64) -> Result<i64> {
    if raw == "auto" {
        Ok(now)
    } else {
        raw.trim()
            .parse::<i64>()
            .map_err(|_| GatewayError::MalformedEntity(format!("bad timestamp: {:?}", raw)))
    }
}

fn timestamp_from_value(v: &Value, now: i64) -> Result<i64> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| GatewayError::MalformedEntity(format!("bad timestamp: {}", n))),
        Value::String(s) => resolve_timestamp(s, now),
        other => Err(GatewayError::MalformedEntity(format!(
            "bad timestamp: {}",
            other
        ))),
    }
}

// =============================================================================
// Wire-side JSON Parsing
// =============================================================================

fn parse_value(json: &str) -> Result<Value> {
    serde_json::from_str(json).map_err(|e| GatewayError::MalformedEntity(e.to_string()))
}

/// A name-like JSON value: a string, or a number (stringified).
fn name_string(v: &Value) -> Result<String> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(GatewayError::MalformedEntity(format!(
            "expected a name, got {}",
            other
        ))),
    }
}

fn opt_name(obj: &Value, field: &str) -> Result<Option<String>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => name_string(v).map(Some),
    }
}

fn req_name(obj: &Value, field: &'static str) -> Result<String> {
    opt_name(obj, field)?.ok_or(GatewayError::MissingParameter(field))
}

fn opt_count(obj: &Value, field: &str) -> Result<Option<i32>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|c| i32::try_from(c).ok())
            .map(Some)
            .ok_or_else(|| GatewayError::MalformedEntity(format!("bad {}: {}", field, n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| GatewayError::MalformedEntity(format!("bad {}: {:?}", field, s))),
        Some(other) => Err(GatewayError::MalformedEntity(format!(
            "bad {}: {}",
            field, other
        ))),
    }
}

impl WireColumnPath {
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(&parse_value(json)?)
    }

    pub fn from_value(v: &Value) -> Result<Self> {
        Ok(Self {
            column_family: req_name(v, "column_family")?,
            super_column: opt_name(v, "super_column")?,
            column: opt_name(v, "column")?,
        })
    }
}

impl WireColumnParent {
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(&parse_value(json)?)
    }

    pub fn from_value(v: &Value) -> Result<Self> {
        Ok(Self {
            column_family: req_name(v, "column_family")?,
            super_column: opt_name(v, "super_column")?,
        })
    }
}

impl WireSliceRange {
    pub fn from_value(v: &Value) -> Result<Self> {
        Ok(Self {
            start: opt_name(v, "start")?.unwrap_or_default(),
            finish: opt_name(v, "finish")?.unwrap_or_default(),
            reversed: v.get("reversed").and_then(Value::as_bool).unwrap_or(false),
            count: opt_count(v, "count")?.unwrap_or(100),
        })
    }
}

impl WireSlicePredicate {
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(&parse_value(json)?)
    }

    pub fn from_value(v: &Value) -> Result<Self> {
        if let Some(names) = v.get("column_names") {
            let names = names.as_array().ok_or_else(|| {
                GatewayError::MalformedEntity("column_names must be an array".to_string())
            })?;
            Ok(SlicePredicate::Names(
                names.iter().map(name_string).collect::<Result<_>>()?,
            ))
        } else if let Some(range) = v.get("slice_range") {
            Ok(SlicePredicate::Range(WireSliceRange::from_value(range)?))
        } else {
            Err(GatewayError::MalformedEntity(
                "slice predicate needs either column_names or slice_range".to_string(),
            ))
        }
    }
}

impl KeyRange {
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(&parse_value(json)?)
    }

    pub fn from_value(v: &Value) -> Result<Self> {
        Ok(Self {
            start_key: opt_name(v, "start_key")?,
            end_key: opt_name(v, "end_key")?,
            start_token: opt_name(v, "start_token")?,
            end_token: opt_name(v, "end_token")?,
            count: opt_count(v, "count")?,
        })
    }
}

impl WireColumn {
    /// Parse `{name, value, timestamp}`; `"auto"` timestamps resolve to the
    /// supplied now.
    pub fn from_value(v: &Value, now: i64) -> Result<Self> {
        let timestamp = match v.get("timestamp") {
            None | Some(Value::Null) => now,
            Some(ts) => timestamp_from_value(ts, now)?,
        };
        Ok(Self {
            name: req_name(v, "name")?,
            value: req_name(v, "value")?,
            timestamp,
        })
    }
}

impl WireMutation {
    pub fn from_value(v: &Value, now: i64) -> Result<Self> {
        if v.get("name").is_some() {
            if v.get("value").is_some() {
                let column = WireColumn::from_value(v, now)?;
                Ok(Mutation::Write(ColumnOrSuperColumn::Column(column)))
            } else if let Some(cols) = v.get("columns") {
                let cols = cols.as_array().ok_or_else(|| {
                    GatewayError::MalformedEntity("columns must be an array".to_string())
                })?;
                let columns = cols
                    .iter()
                    .map(|c| WireColumn::from_value(c, now))
                    .collect::<Result<_>>()?;
                Ok(Mutation::Write(ColumnOrSuperColumn::Super(SuperColumn {
                    name: req_name(v, "name")?,
                    columns,
                })))
            } else {
                Err(GatewayError::MalformedEntity(
                    "mutation has a 'name' field but no 'value' or 'columns' field".to_string(),
                ))
            }
        } else if v.get("timestamp").is_some() || v.get("predicate").is_some() {
            let timestamp = match v.get("timestamp") {
                None | Some(Value::Null) => None,
                Some(ts) => Some(timestamp_from_value(ts, now)?),
            };
            let predicate = match v.get("predicate") {
                None | Some(Value::Null) => None,
                Some(p) => Some(WireSlicePredicate::from_value(p)?),
            };
            Ok(Mutation::Delete(Deletion {
                timestamp,
                super_column: opt_name(v, "super_column")?,
                predicate,
            }))
        } else {
            Err(GatewayError::MalformedEntity(
                "mutation has no 'name', 'timestamp', or 'predicate' field".to_string(),
            ))
        }
    }
}
