//! Command Handlers
//!
//! One handler per verb. Every handler follows the same shape: validate
//! required parameters, resolve keyspace and column family against the
//! schema cache (before any backend work), parse structured JSON
//! parameters, marshal toward the store, make exactly one backend call on
//! a fresh connection, marshal the result toward the wire. The connection
//! is dropped on every exit path, success or failure.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::backend::{Connector, ConsistencyLevel, MutationMap};
use crate::error::{GatewayError, Result};
use crate::marshal::{
    column_parent_to_store, column_path_to_store, cosc_list_to_wire, cosc_to_wire, generate_uuids,
    key_slices_to_wire, mutation_to_store, predicate_to_store, CfCodecs,
};
use crate::model::{
    now_micros, resolve_timestamp, KeyRange, WireColumnParent, WireColumnPath, WireMutation,
    WireSlicePredicate,
};
use crate::protocol::{Params, Request};
use crate::schema::SchemaCache;

/// Executes parsed requests. The schema cache is the only shared state and
/// is immutable; a `Gateway` is freely shared across worker threads.
pub struct Gateway {
    schema: Arc<SchemaCache>,
    connector: Arc<dyn Connector>,
}

impl Gateway {
    pub fn new(schema: Arc<SchemaCache>, connector: Arc<dyn Connector>) -> Self {
        Self { schema, connector }
    }

    /// Dispatch a request to its verb handler. `None` means a successful
    /// call with no return value.
    pub fn execute(&self, request: &Request) -> Result<Option<Value>> {
        let params = &request.params;
        match request.verb.as_str() {
            "get" => self.get(params),
            "get_slice" => self.get_slice(params),
            "multiget_slice" => self.multiget_slice(params),
            "get_count" => self.get_count(params),
            "get_range_slices" => self.get_range_slices(params),
            "insert" => self.insert(params),
            "batch_mutate" => self.batch_mutate(params),
            "remove" => self.remove(params),
            "get_uuids" => self.get_uuids(params),
            "describe_keyspace" => self.describe_keyspace(params),
            other => Err(GatewayError::Protocol(format!(
                "unknown command: {}",
                other
            ))),
        }
    }

    fn codecs_for(&self, keyspace: &str, column_family: &str) -> Result<CfCodecs> {
        let def = self.schema.column_family(keyspace, column_family)?;
        Ok(CfCodecs::for_family(def))
    }

    // -------------------------------------------------------------------------
    // Read Verbs
    // -------------------------------------------------------------------------

    fn get(&self, params: &Params) -> Result<Option<Value>> {
        let keyspace = params.required("keyspace")?;
        let key = params.required("key")?;
        self.schema.keyspace(keyspace)?;
        let path = WireColumnPath::from_json(params.required("column_path")?)?;
        let cl = ConsistencyLevel::from_param(params.get("consistency_level"))?;
        let codecs = self.codecs_for(keyspace, &path.column_family)?;

        let nested = path.super_column.is_some();
        let path = column_path_to_store(path, &codecs)?;

        let mut client = self.connector.connect()?;
        let cosc = client.get(keyspace, key, &path, cl)?;
        drop(client);

        let wire = cosc_to_wire(cosc, &codecs, nested)?;
        Ok(Some(serde_json::to_value(wire)?))
    }

    fn get_slice(&self, params: &Params) -> Result<Option<Value>> {
        let keyspace = params.required("keyspace")?;
        let key = params.required("key")?;
        self.schema.keyspace(keyspace)?;
        let parent = WireColumnParent::from_json(params.required("column_parent")?)?;
        let predicate = WireSlicePredicate::from_json(params.required("predicate")?)?;
        let cl = ConsistencyLevel::from_param(params.get("consistency_level"))?;
        let codecs = self.codecs_for(keyspace, &parent.column_family)?;

        let nested = parent.super_column.is_some();
        let parent = column_parent_to_store(parent, &codecs)?;
        let predicate = predicate_to_store(predicate, codecs.at(nested))?;

        let mut client = self.connector.connect()?;
        let results = client.get_slice(keyspace, key, &parent, &predicate, cl)?;
        drop(client);

        let wire = cosc_list_to_wire(results, &codecs, nested)?;
        Ok(Some(serde_json::to_value(wire)?))
    }

    fn multiget_slice(&self, params: &Params) -> Result<Option<Value>> {
        let keyspace = params.required("keyspace")?;
        let keys = parse_string_list(params.required("keys")?)?;
        self.schema.keyspace(keyspace)?;
        let parent = WireColumnParent::from_json(params.required("column_parent")?)?;
        let predicate = WireSlicePredicate::from_json(params.required("predicate")?)?;
        let cl = ConsistencyLevel::from_param(params.get("consistency_level"))?;
        let codecs = self.codecs_for(keyspace, &parent.column_family)?;

        let nested = parent.super_column.is_some();
        let parent = column_parent_to_store(parent, &codecs)?;
        let predicate = predicate_to_store(predicate, codecs.at(nested))?;

        let mut client = self.connector.connect()?;
        let rows = client.multiget_slice(keyspace, &keys, &parent, &predicate, cl)?;
        drop(client);

        // Any single row failing to marshal aborts the whole response.
        let mut out = serde_json::Map::new();
        for (key, coscs) in rows {
            let wire = cosc_list_to_wire(coscs, &codecs, nested)?;
            out.insert(key, serde_json::to_value(wire)?);
        }
        Ok(Some(Value::Object(out)))
    }

    fn get_count(&self, params: &Params) -> Result<Option<Value>> {
        let keyspace = params.required("keyspace")?;
        let key = params.required("key")?;
        self.schema.keyspace(keyspace)?;
        let parent = WireColumnParent::from_json(params.required("column_parent")?)?;
        let cl = ConsistencyLevel::from_param(params.get("consistency_level"))?;
        let codecs = self.codecs_for(keyspace, &parent.column_family)?;

        let parent = column_parent_to_store(parent, &codecs)?;

        let mut client = self.connector.connect()?;
        let count = client.get_count(keyspace, key, &parent, cl)?;
        drop(client);

        Ok(Some(json!(count)))
    }

    fn get_range_slices(&self, params: &Params) -> Result<Option<Value>> {
        let keyspace = params.required("keyspace")?;
        self.schema.keyspace(keyspace)?;
        let parent = WireColumnParent::from_json(params.required("column_parent")?)?;
        let predicate = WireSlicePredicate::from_json(params.required("predicate")?)?;
        let range = KeyRange::from_json(params.required("range")?)?;
        let cl = ConsistencyLevel::from_param(params.get("consistency_level"))?;
        let codecs = self.codecs_for(keyspace, &parent.column_family)?;

        let nested = parent.super_column.is_some();
        let parent = column_parent_to_store(parent, &codecs)?;
        let predicate = predicate_to_store(predicate, codecs.at(nested))?;

        let mut client = self.connector.connect()?;
        let slices = client.get_range_slices(keyspace, &parent, &predicate, &range, cl)?;
        drop(client);

        let wire = key_slices_to_wire(slices, &codecs, nested)?;
        Ok(Some(serde_json::to_value(wire)?))
    }

    // -------------------------------------------------------------------------
    // Write Verbs
    // -------------------------------------------------------------------------

    fn insert(&self, params: &Params) -> Result<Option<Value>> {
        let keyspace = params.required("keyspace")?;
        let key = params.required("key")?;
        self.schema.keyspace(keyspace)?;
        let path = WireColumnPath::from_json(params.required("column_path")?)?;
        let timestamp = resolve_timestamp(params.required("timestamp")?, now_micros())?;
        let value = params.required("value")?;
        let cl = ConsistencyLevel::from_param(params.get("consistency_level"))?;
        let codecs = self.codecs_for(keyspace, &path.column_family)?;

        let path = column_path_to_store(path, &codecs)?;

        let mut client = self.connector.connect()?;
        client.insert(keyspace, key, &path, value.as_bytes(), timestamp, cl)?;
        drop(client);

        // The resolved timestamp goes back to the caller so the exact write
        // can be targeted later (e.g. for removal).
        Ok(Some(json!(timestamp)))
    }

    fn batch_mutate(&self, params: &Params) -> Result<Option<Value>> {
        let keyspace = params.required("keyspace")?;
        self.schema.keyspace(keyspace)?;
        let raw: Value = serde_json::from_str(params.required("mutation_map")?)?;
        let cl = ConsistencyLevel::from_param(params.get("consistency_level"))?;

        // One "now", captured once and shared by every mutation whose
        // timestamp is "auto".
        let now = now_micros();

        let rows = raw.as_object().ok_or_else(|| {
            GatewayError::MalformedEntity("mutation_map must be an object".to_string())
        })?;

        let mut mutations: MutationMap = BTreeMap::new();
        for (key, families) in rows {
            let families = families.as_object().ok_or_else(|| {
                GatewayError::MalformedEntity(format!(
                    "mutation_map entry for key {:?} must be an object",
                    key
                ))
            })?;
            let mut per_family = BTreeMap::new();
            for (cf, muts) in families {
                let codecs = self.codecs_for(keyspace, cf)?;
                let muts = muts.as_array().ok_or_else(|| {
                    GatewayError::MalformedEntity(format!(
                        "mutations for {:?}.{:?} must be an array",
                        key, cf
                    ))
                })?;
                let store_muts = muts
                    .iter()
                    .map(|m| {
                        let mutation = WireMutation::from_value(m, now)?;
                        mutation_to_store(mutation, &codecs)
                    })
                    .collect::<Result<Vec<_>>>()?;
                per_family.insert(cf.clone(), store_muts);
            }
            mutations.insert(key.clone(), per_family);
        }

        let mut client = self.connector.connect()?;
        client.batch_mutate(keyspace, &mutations, cl)?;
        drop(client);

        Ok(Some(json!(now)))
    }

    fn remove(&self, params: &Params) -> Result<Option<Value>> {
        let keyspace = params.required("keyspace")?;
        let key = params.required("key")?;
        self.schema.keyspace(keyspace)?;
        let path = WireColumnPath::from_json(params.required("column_path")?)?;
        let timestamp = resolve_timestamp(params.required("timestamp")?, now_micros())?;
        let cl = ConsistencyLevel::from_param(params.get("consistency_level"))?;
        let codecs = self.codecs_for(keyspace, &path.column_family)?;

        let path = column_path_to_store(path, &codecs)?;

        let mut client = self.connector.connect()?;
        client.remove(keyspace, key, &path, timestamp, cl)?;
        drop(client);

        Ok(None)
    }

    // -------------------------------------------------------------------------
    // Local Verbs (no backend call)
    // -------------------------------------------------------------------------

    fn get_uuids(&self, params: &Params) -> Result<Option<Value>> {
        let count = match params.get("count") {
            None => 1,
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                GatewayError::MalformedEntity(format!("bad count: {:?}", raw))
            })?,
        };
        Ok(Some(json!(generate_uuids(count))))
    }

    fn describe_keyspace(&self, params: &Params) -> Result<Option<Value>> {
        let keyspace = params.required("keyspace")?;
        let schema = self.schema.keyspace(keyspace)?;
        Ok(Some(serde_json::to_value(schema)?))
    }
}

/// A JSON array of row keys; numbers are accepted and stringified.
fn parse_string_list(json: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(json)?;
    let items = value.as_array().ok_or_else(|| {
        GatewayError::MalformedEntity("expected a JSON array of keys".to_string())
    })?;
    items
        .iter()
        .map(|v| match v {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(GatewayError::MalformedEntity(format!(
                "bad key: {}",
                other
            ))),
        })
        .collect()
}
