//! Shared test fixtures
//!
//! An in-memory fake backend implementing `StoreRpc`, with enough storage
//! behavior for end-to-end scenarios and counters for asserting that
//! validation happens before any backend call.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rowgate::backend::{
    Connector, ConsistencyLevel, KeyspaceDescription, MutationMap, StoreRpc,
};
use rowgate::error::{GatewayError, Result};
use rowgate::model::{
    Column, ColumnOrSuperColumn, KeyRange, KeySlice, Mutation, StoreColumnOrSuperColumn,
    StoreColumnParent, StoreColumnPath, StoreKeySlice, StoreSlicePredicate, SuperColumn,
};

type ColumnsByName = BTreeMap<Vec<u8>, (Vec<u8>, i64)>;

#[derive(Default)]
struct Row {
    columns: ColumnsByName,
    supers: BTreeMap<Vec<u8>, ColumnsByName>,
}

/// State shared by every connection the fake connector hands out.
pub struct FakeState {
    keyspaces: BTreeMap<String, KeyspaceDescription>,
    // (keyspace, column_family, row key) -> row
    rows: Mutex<BTreeMap<(String, String, String), Row>>,
    /// Data-path RPC calls (describes excluded).
    pub data_calls: AtomicUsize,
    /// Mutation maps seen by batch_mutate, for timestamp assertions.
    pub recorded_mutations: Mutex<Vec<MutationMap>>,
}

impl FakeState {
    pub fn data_call_count(&self) -> usize {
        self.data_calls.load(Ordering::SeqCst)
    }
}

fn cf(attrs: &[(&str, &str)]) -> BTreeMap<String, String> {
    attrs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Connector over shared in-memory state; every `connect` yields a fresh
/// handle onto the same store.
#[derive(Clone)]
pub struct FakeConnector {
    pub state: Arc<FakeState>,
}

impl FakeConnector {
    /// One keyspace with text, long, UUID, and super column families.
    pub fn with_standard_schema() -> Self {
        let mut keyspaces = BTreeMap::new();
        let mut families = BTreeMap::new();
        families.insert(
            "Standard1".to_string(),
            cf(&[
                ("Type", "Standard"),
                ("CompareWith", "org.apache.cassandra.db.marshal.BytesType"),
            ]),
        );
        families.insert(
            "StandardLong".to_string(),
            cf(&[
                ("Type", "Standard"),
                ("CompareWith", "org.apache.cassandra.db.marshal.LongType"),
            ]),
        );
        families.insert(
            "StandardUuid".to_string(),
            cf(&[
                ("Type", "Standard"),
                ("CompareWith", "org.apache.cassandra.db.marshal.TimeUUIDType"),
            ]),
        );
        families.insert(
            "SuperUuidLong".to_string(),
            cf(&[
                ("Type", "Super"),
                ("CompareWith", "org.apache.cassandra.db.marshal.TimeUUIDType"),
                (
                    "CompareSubcolumnsWith",
                    "org.apache.cassandra.db.marshal.LongType",
                ),
            ]),
        );
        keyspaces.insert("Keyspace1".to_string(), families);

        Self {
            state: Arc::new(FakeState {
                keyspaces,
                rows: Mutex::new(BTreeMap::new()),
                data_calls: AtomicUsize::new(0),
                recorded_mutations: Mutex::new(Vec::new()),
            }),
        }
    }
}

impl Connector for FakeConnector {
    fn connect(&self) -> Result<Box<dyn StoreRpc>> {
        Ok(Box::new(FakeClient {
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeClient {
    state: Arc<FakeState>,
}

impl FakeClient {
    fn tick(&self) {
        self.state.data_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn row_key(keyspace: &str, cf: &str, key: &str) -> (String, String, String) {
        (keyspace.to_string(), cf.to_string(), key.to_string())
    }

    fn not_found() -> GatewayError {
        GatewayError::Backend("get failed: not found".to_string())
    }
}

fn columns_to_coscs(columns: &ColumnsByName) -> Vec<StoreColumnOrSuperColumn> {
    columns
        .iter()
        .map(|(name, (value, ts))| {
            ColumnOrSuperColumn::Column(Column {
                name: name.clone(),
                value: value.clone(),
                timestamp: *ts,
            })
        })
        .collect()
}

impl StoreRpc for FakeClient {
    fn get(
        &mut self,
        keyspace: &str,
        key: &str,
        path: &StoreColumnPath,
        _cl: ConsistencyLevel,
    ) -> Result<StoreColumnOrSuperColumn> {
        self.tick();
        let rows = self.state.rows.lock().unwrap();
        let row = rows
            .get(&Self::row_key(keyspace, &path.column_family, key))
            .ok_or_else(Self::not_found)?;

        match (&path.super_column, &path.column) {
            (None, Some(column)) => {
                let (value, ts) = row.columns.get(column).ok_or_else(Self::not_found)?;
                Ok(ColumnOrSuperColumn::Column(Column {
                    name: column.clone(),
                    value: value.clone(),
                    timestamp: *ts,
                }))
            }
            (Some(sc), Some(column)) => {
                let sub = row.supers.get(sc).ok_or_else(Self::not_found)?;
                let (value, ts) = sub.get(column).ok_or_else(Self::not_found)?;
                Ok(ColumnOrSuperColumn::Column(Column {
                    name: column.clone(),
                    value: value.clone(),
                    timestamp: *ts,
                }))
            }
            (Some(sc), None) => {
                let sub = row.supers.get(sc).ok_or_else(Self::not_found)?;
                Ok(ColumnOrSuperColumn::Super(SuperColumn {
                    name: sc.clone(),
                    columns: sub
                        .iter()
                        .map(|(name, (value, ts))| Column {
                            name: name.clone(),
                            value: value.clone(),
                            timestamp: *ts,
                        })
                        .collect(),
                }))
            }
            (None, None) => Err(Self::not_found()),
        }
    }

    fn get_slice(
        &mut self,
        keyspace: &str,
        key: &str,
        parent: &StoreColumnParent,
        _predicate: &StoreSlicePredicate,
        _cl: ConsistencyLevel,
    ) -> Result<Vec<StoreColumnOrSuperColumn>> {
        self.tick();
        let rows = self.state.rows.lock().unwrap();
        let Some(row) = rows.get(&Self::row_key(keyspace, &parent.column_family, key)) else {
            return Ok(Vec::new());
        };
        match &parent.super_column {
            Some(sc) => Ok(row
                .supers
                .get(sc)
                .map(columns_to_coscs)
                .unwrap_or_default()),
            None => Ok(columns_to_coscs(&row.columns)),
        }
    }

    fn multiget_slice(
        &mut self,
        keyspace: &str,
        keys: &[String],
        parent: &StoreColumnParent,
        predicate: &StoreSlicePredicate,
        cl: ConsistencyLevel,
    ) -> Result<BTreeMap<String, Vec<StoreColumnOrSuperColumn>>> {
        let mut out = BTreeMap::new();
        for key in keys {
            out.insert(key.clone(), self.get_slice(keyspace, key, parent, predicate, cl)?);
        }
        Ok(out)
    }

    fn get_count(
        &mut self,
        keyspace: &str,
        key: &str,
        parent: &StoreColumnParent,
        cl: ConsistencyLevel,
    ) -> Result<i32> {
        let predicate = StoreSlicePredicate::Names(Vec::new());
        Ok(self.get_slice(keyspace, key, parent, &predicate, cl)?.len() as i32)
    }

    fn get_range_slices(
        &mut self,
        keyspace: &str,
        parent: &StoreColumnParent,
        _predicate: &StoreSlicePredicate,
        _range: &KeyRange,
        _cl: ConsistencyLevel,
    ) -> Result<Vec<StoreKeySlice>> {
        self.tick();
        let rows = self.state.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|((ks, cf, _), _)| ks == keyspace && cf == &parent.column_family)
            .map(|((_, _, key), row)| KeySlice {
                key: key.clone(),
                columns: columns_to_coscs(&row.columns),
            })
            .collect())
    }

    fn insert(
        &mut self,
        keyspace: &str,
        key: &str,
        path: &StoreColumnPath,
        value: &[u8],
        timestamp: i64,
        _cl: ConsistencyLevel,
    ) -> Result<()> {
        self.tick();
        let column = path
            .column
            .clone()
            .ok_or_else(|| GatewayError::Backend("insert needs a column".to_string()))?;
        let mut rows = self.state.rows.lock().unwrap();
        let row = rows
            .entry(Self::row_key(keyspace, &path.column_family, key))
            .or_default();
        match &path.super_column {
            Some(sc) => {
                row.supers
                    .entry(sc.clone())
                    .or_default()
                    .insert(column, (value.to_vec(), timestamp));
            }
            None => {
                row.columns.insert(column, (value.to_vec(), timestamp));
            }
        }
        Ok(())
    }

    fn batch_mutate(
        &mut self,
        keyspace: &str,
        mutations: &MutationMap,
        _cl: ConsistencyLevel,
    ) -> Result<()> {
        self.tick();
        self.state
            .recorded_mutations
            .lock()
            .unwrap()
            .push(mutations.clone());

        let mut rows = self.state.rows.lock().unwrap();
        for (key, families) in mutations {
            for (cf, muts) in families {
                let row = rows
                    .entry(Self::row_key(keyspace, cf, key))
                    .or_default();
                for mutation in muts {
                    match mutation {
                        Mutation::Write(ColumnOrSuperColumn::Column(c)) => {
                            row.columns
                                .insert(c.name.clone(), (c.value.clone(), c.timestamp));
                        }
                        Mutation::Write(ColumnOrSuperColumn::Super(sc)) => {
                            let sub = row.supers.entry(sc.name.clone()).or_default();
                            for c in &sc.columns {
                                sub.insert(c.name.clone(), (c.value.clone(), c.timestamp));
                            }
                        }
                        Mutation::Delete(del) => {
                            if let Some(sc) = &del.super_column {
                                row.supers.remove(sc);
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn remove(
        &mut self,
        keyspace: &str,
        key: &str,
        path: &StoreColumnPath,
        _timestamp: i64,
        _cl: ConsistencyLevel,
    ) -> Result<()> {
        self.tick();
        let mut rows = self.state.rows.lock().unwrap();
        let map_key = Self::row_key(keyspace, &path.column_family, key);
        match (&path.super_column, &path.column) {
            (None, None) => {
                rows.remove(&map_key);
            }
            (None, Some(column)) => {
                if let Some(row) = rows.get_mut(&map_key) {
                    row.columns.remove(column);
                }
            }
            (Some(sc), None) => {
                if let Some(row) = rows.get_mut(&map_key) {
                    row.supers.remove(sc);
                }
            }
            (Some(sc), Some(column)) => {
                if let Some(row) = rows.get_mut(&map_key) {
                    if let Some(sub) = row.supers.get_mut(sc) {
                        sub.remove(column);
                    }
                }
            }
        }
        Ok(())
    }

    fn describe_keyspaces(&mut self) -> Result<Vec<String>> {
        Ok(self.state.keyspaces.keys().cloned().collect())
    }

    fn describe_keyspace(&mut self, keyspace: &str) -> Result<KeyspaceDescription> {
        self.state
            .keyspaces
            .get(keyspace)
            .cloned()
            .ok_or_else(|| {
                GatewayError::Backend(format!("describe_keyspace failed for {}", keyspace))
            })
    }
}
