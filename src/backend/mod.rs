//! Backend Store Boundary
//!
//! The gateway consumes the column store exclusively through the typed
//! `StoreRpc` interface. A `Connector` yields a fresh connection per
//! request; the connection closes when the client is dropped, on every
//! exit path. No pooling, no reuse, no retries.

mod thrift;

pub use thrift::{ThriftClient, ThriftConnector};

use std::collections::BTreeMap;

use crate::error::{GatewayError, Result};
use crate::model::{
    KeyRange, StoreColumnOrSuperColumn, StoreColumnParent, StoreColumnPath, StoreKeySlice,
    StoreMutation, StoreSlicePredicate,
};

/// Caller-specified durability/replication requirement for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ConsistencyLevel {
    Zero = 0,
    One = 1,
    Quorum = 2,
    DcQuorum = 3,
    DcQuorumSync = 4,
}

impl Default for ConsistencyLevel {
    fn default() -> Self {
        ConsistencyLevel::One
    }
}

impl ConsistencyLevel {
    /// Parse the wire parameter; omitted defaults to ONE.
    pub fn from_param(param: Option<&str>) -> Result<Self> {
        let Some(raw) = param else {
            return Ok(ConsistencyLevel::One);
        };
        match raw.trim() {
            "0" => Ok(ConsistencyLevel::Zero),
            "1" => Ok(ConsistencyLevel::One),
            "2" => Ok(ConsistencyLevel::Quorum),
            "3" => Ok(ConsistencyLevel::DcQuorum),
            "4" => Ok(ConsistencyLevel::DcQuorumSync),
            other => Err(GatewayError::MalformedEntity(format!(
                "bad consistency level: {:?}",
                other
            ))),
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Mutations grouped by row key, then by column family.
pub type MutationMap = BTreeMap<String, BTreeMap<String, Vec<StoreMutation>>>;

/// Raw schema description: column family → attribute map.
pub type KeyspaceDescription = BTreeMap<String, BTreeMap<String, String>>;

/// One open backend connection, typed per RPC verb. Every method issues
/// exactly one call.
pub trait StoreRpc {
    fn get(
        &mut self,
        keyspace: &str,
        key: &str,
        path: &StoreColumnPath,
        cl: ConsistencyLevel,
    ) -> Result<StoreColumnOrSuperColumn>;

    fn get_slice(
        &mut self,
        keyspace: &str,
        key: &str,
        parent: &StoreColumnParent,
        predicate: &StoreSlicePredicate,
        cl: ConsistencyLevel,
    ) -> Result<Vec<StoreColumnOrSuperColumn>>;

    fn multiget_slice(
        &mut self,
        keyspace: &str,
        keys: &[String],
        parent: &StoreColumnParent,
        predicate: &StoreSlicePredicate,
        cl: ConsistencyLevel,
    ) -> Result<BTreeMap<String, Vec<StoreColumnOrSuperColumn>>>;

    fn get_count(
        &mut self,
        keyspace: &str,
        key: &str,
        parent: &StoreColumnParent,
        cl: ConsistencyLevel,
    ) -> Result<i32>;

    fn get_range_slices(
        &mut self,
        keyspace: &str,
        parent: &StoreColumnParent,
        predicate: &StoreSlicePredicate,
        range: &KeyRange,
        cl: ConsistencyLevel,
    ) -> Result<Vec<StoreKeySlice>>;

    fn insert(
        &mut self,
        keyspace: &str,
        key: &str,
        path: &StoreColumnPath,
        value: &[u8],
        timestamp: i64,
        cl: ConsistencyLevel,
    ) -> Result<()>;

    fn batch_mutate(
        &mut self,
        keyspace: &str,
        mutations: &MutationMap,
        cl: ConsistencyLevel,
    ) -> Result<()>;

    fn remove(
        &mut self,
        keyspace: &str,
        key: &str,
        path: &StoreColumnPath,
        timestamp: i64,
        cl: ConsistencyLevel,
    ) -> Result<()>;

    fn describe_keyspaces(&mut self) -> Result<Vec<String>>;

    fn describe_keyspace(&mut self, keyspace: &str) -> Result<KeyspaceDescription>;
}

/// Opens a dedicated backend connection. Dropping the returned client
/// closes it.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn StoreRpc>>;
}
