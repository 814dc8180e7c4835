//! Gateway client library
//!
//! A thin client for the gateway's wire protocol: one TCP connection per
//! request, structured parameters serialized to JSON inside the query
//! string, `consistency_level` defaulting to ONE. A connection that closes
//! without a status line surfaces as a transport-class error
//! (`Io`/`Protocol`); an application-level `500` surfaces as `Remote` with
//! the server's message.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};

use serde_json::Value;

use crate::backend::ConsistencyLevel;
use crate::error::{GatewayError, Result};
use crate::model::{KeyRange, WireColumnParent, WireColumnPath, WireSlicePredicate};
use crate::protocol::{encode_query, parse_response};

pub struct GatewayClient {
    addr: String,
}

impl GatewayClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    fn call(&self, verb: &str, pairs: Vec<(&str, String)>) -> Result<Option<Value>> {
        let mut stream = TcpStream::connect(&self.addr)?;
        let query = encode_query(pairs);
        let line = if query.is_empty() {
            format!("{}\n", verb)
        } else {
            format!("{}?{}\n", verb, query)
        };
        stream.write_all(line.as_bytes())?;
        stream.shutdown(Shutdown::Write)?;

        let mut raw = String::new();
        stream.read_to_string(&mut raw)?;
        parse_response(&raw)
    }

    // -------------------------------------------------------------------------
    // Read Verbs
    // -------------------------------------------------------------------------

    pub fn get(
        &self,
        keyspace: &str,
        key: &str,
        path: &WireColumnPath,
        cl: ConsistencyLevel,
    ) -> Result<Option<Value>> {
        self.call(
            "get",
            vec![
                ("keyspace", keyspace.to_string()),
                ("key", key.to_string()),
                ("column_path", serde_json::to_string(path)?),
                ("consistency_level", cl.as_i32().to_string()),
            ],
        )
    }

    pub fn get_slice(
        &self,
        keyspace: &str,
        key: &str,
        parent: &WireColumnParent,
        predicate: &WireSlicePredicate,
        cl: ConsistencyLevel,
    ) -> Result<Option<Value>> {
        self.call(
            "get_slice",
            vec![
                ("keyspace", keyspace.to_string()),
                ("key", key.to_string()),
                ("column_parent", serde_json::to_string(parent)?),
                ("predicate", serde_json::to_string(predicate)?),
                ("consistency_level", cl.as_i32().to_string()),
            ],
        )
    }

    pub fn multiget_slice(
        &self,
        keyspace: &str,
        keys: &[&str],
        parent: &WireColumnParent,
        predicate: &WireSlicePredicate,
        cl: ConsistencyLevel,
    ) -> Result<Option<Value>> {
        self.call(
            "multiget_slice",
            vec![
                ("keyspace", keyspace.to_string()),
                ("keys", serde_json::to_string(keys)?),
                ("column_parent", serde_json::to_string(parent)?),
                ("predicate", serde_json::to_string(predicate)?),
                ("consistency_level", cl.as_i32().to_string()),
            ],
        )
    }

    pub fn get_count(
        &self,
        keyspace: &str,
        key: &str,
        parent: &WireColumnParent,
        cl: ConsistencyLevel,
    ) -> Result<i64> {
        let result = self.call(
            "get_count",
            vec![
                ("keyspace", keyspace.to_string()),
                ("key", key.to_string()),
                ("column_parent", serde_json::to_string(parent)?),
                ("consistency_level", cl.as_i32().to_string()),
            ],
        )?;
        result
            .as_ref()
            .and_then(Value::as_i64)
            .ok_or_else(|| GatewayError::Protocol("get_count returned no number".to_string()))
    }

    pub fn get_range_slices(
        &self,
        keyspace: &str,
        parent: &WireColumnParent,
        predicate: &WireSlicePredicate,
        range: &KeyRange,
        cl: ConsistencyLevel,
    ) -> Result<Option<Value>> {
        self.call(
            "get_range_slices",
            vec![
                ("keyspace", keyspace.to_string()),
                ("column_parent", serde_json::to_string(parent)?),
                ("predicate", serde_json::to_string(predicate)?),
                ("range", serde_json::to_string(range)?),
                ("consistency_level", cl.as_i32().to_string()),
            ],
        )
    }

    // -------------------------------------------------------------------------
    // Write Verbs
    // -------------------------------------------------------------------------

    /// Returns the timestamp the write was applied with. `timestamp` is a
    /// decimal integer or `"auto"`.
    pub fn insert(
        &self,
        keyspace: &str,
        key: &str,
        path: &WireColumnPath,
        value: &str,
        timestamp: &str,
        cl: ConsistencyLevel,
    ) -> Result<i64> {
        let result = self.call(
            "insert",
            vec![
                ("keyspace", keyspace.to_string()),
                ("key", key.to_string()),
                ("column_path", serde_json::to_string(path)?),
                ("value", value.to_string()),
                ("timestamp", timestamp.to_string()),
                ("consistency_level", cl.as_i32().to_string()),
            ],
        )?;
        result
            .as_ref()
            .and_then(Value::as_i64)
            .ok_or_else(|| GatewayError::Protocol("insert returned no timestamp".to_string()))
    }

    /// Returns the shared "now" every `"auto"` mutation in the batch was
    /// written with.
    pub fn batch_mutate(
        &self,
        keyspace: &str,
        mutation_map: &Value,
        cl: ConsistencyLevel,
    ) -> Result<i64> {
        let result = self.call(
            "batch_mutate",
            vec![
                ("keyspace", keyspace.to_string()),
                ("mutation_map", mutation_map.to_string()),
                ("consistency_level", cl.as_i32().to_string()),
            ],
        )?;
        result
            .as_ref()
            .and_then(Value::as_i64)
            .ok_or_else(|| GatewayError::Protocol("batch_mutate returned no timestamp".to_string()))
    }

    pub fn remove(
        &self,
        keyspace: &str,
        key: &str,
        path: &WireColumnPath,
        timestamp: &str,
        cl: ConsistencyLevel,
    ) -> Result<()> {
        self.call(
            "remove",
            vec![
                ("keyspace", keyspace.to_string()),
                ("key", key.to_string()),
                ("column_path", serde_json::to_string(path)?),
                ("timestamp", timestamp.to_string()),
                ("consistency_level", cl.as_i32().to_string()),
            ],
        )?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Local Verbs
    // -------------------------------------------------------------------------

    pub fn get_uuids(&self, count: usize) -> Result<Vec<String>> {
        let result = self
            .call("get_uuids", vec![("count", count.to_string())])?
            .ok_or_else(|| GatewayError::Protocol("get_uuids returned no body".to_string()))?;
        let uuids = result
            .as_array()
            .ok_or_else(|| GatewayError::Protocol("get_uuids did not return an array".to_string()))?;
        uuids
            .iter()
            .map(|u| {
                u.as_str().map(str::to_string).ok_or_else(|| {
                    GatewayError::Protocol("get_uuids returned a non-string".to_string())
                })
            })
            .collect()
    }

    pub fn describe_keyspace(&self, keyspace: &str) -> Result<Value> {
        self.call(
            "describe_keyspace",
            vec![("keyspace", keyspace.to_string())],
        )?
        .ok_or_else(|| GatewayError::Protocol("describe_keyspace returned no body".to_string()))
    }
}
