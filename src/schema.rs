//! Schema cache
//!
//! A read-only snapshot of the backend's schema metadata, loaded once at
//! startup and shared by every handler through an `Arc`. Nothing writes to
//! it afterward, so no synchronization is needed; observing a backend
//! schema change requires a process restart.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::backend::Connector;
use crate::error::{GatewayError, Result};

/// How names at one nesting level are ordered/typed.
///
/// Classified from the backend's comparator metadata string: anything
/// mentioning `Long` gets the 8-byte integer codec, anything mentioning
/// `UUID` gets the UUID codec, everything else passes through as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparatorKind {
    Long,
    Uuid,
    Text,
}

impl ComparatorKind {
    pub fn classify(attr: &str) -> Self {
        if attr.contains("Long") {
            ComparatorKind::Long
        } else if attr.contains("UUID") {
            ComparatorKind::Uuid
        } else {
            ComparatorKind::Text
        }
    }
}

/// Metadata for one column family, kept as the raw attribute map returned
/// by the backend (`CompareWith`, `CompareSubcolumnsWith`, `Type`, ...).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ColumnFamilyDef {
    attrs: BTreeMap<String, String>,
}

impl ColumnFamilyDef {
    pub fn new(attrs: BTreeMap<String, String>) -> Self {
        Self { attrs }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Comparator for top-level column and super-column names.
    pub fn comparator(&self) -> ComparatorKind {
        self.attr("CompareWith")
            .map(ComparatorKind::classify)
            .unwrap_or(ComparatorKind::Text)
    }

    /// Comparator for columns nested inside a super column, when declared.
    pub fn subcomparator(&self) -> Option<ComparatorKind> {
        self.attr("CompareSubcolumnsWith")
            .map(ComparatorKind::classify)
    }
}

/// One keyspace's column families.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct KeyspaceSchema {
    families: BTreeMap<String, ColumnFamilyDef>,
}

impl KeyspaceSchema {
    pub fn new(families: BTreeMap<String, ColumnFamilyDef>) -> Self {
        Self { families }
    }

    pub fn column_family(&self, name: &str) -> Option<&ColumnFamilyDef> {
        self.families.get(name)
    }
}

/// Process-wide keyspace → column family → comparator metadata.
#[derive(Debug, Default)]
pub struct SchemaCache {
    keyspaces: BTreeMap<String, KeyspaceSchema>,
}

impl SchemaCache {
    /// Build a cache from already-described keyspaces (used by tests).
    pub fn from_parts(keyspaces: BTreeMap<String, KeyspaceSchema>) -> Self {
        Self { keyspaces }
    }

    /// Populate the cache: list keyspaces, then describe each one. Every
    /// call runs on a fresh backend connection. Any failure here is fatal
    /// to startup - the listener must not accept before the schema is known.
    pub fn load(connector: &dyn Connector) -> Result<Self> {
        let names = connector.connect()?.describe_keyspaces()?;

        let mut keyspaces = BTreeMap::new();
        for name in names {
            let described = connector.connect()?.describe_keyspace(&name)?;
            let families = described
                .into_iter()
                .map(|(cf, attrs)| (cf, ColumnFamilyDef::new(attrs)))
                .collect();
            tracing::debug!("loaded schema for keyspace {}", name);
            keyspaces.insert(name, KeyspaceSchema::new(families));
        }

        Ok(Self { keyspaces })
    }

    pub fn keyspace(&self, name: &str) -> Result<&KeyspaceSchema> {
        self.keyspaces
            .get(name)
            .ok_or_else(|| GatewayError::UnknownResource(format!("invalid keyspace: {}", name)))
    }

    pub fn column_family(&self, keyspace: &str, cf: &str) -> Result<&ColumnFamilyDef> {
        self.keyspace(keyspace)?.column_family(cf).ok_or_else(|| {
            GatewayError::UnknownResource(format!("invalid column family: {}.{}", keyspace, cf))
        })
    }
}
