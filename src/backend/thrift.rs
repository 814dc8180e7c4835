//! Thrift binary-protocol store client
//!
//! Hand-rolled strict binary protocol over a buffered (unframed) TCP
//! transport, speaking the store's 0.6-era RPC surface. All integers are
//! big-endian on the wire. Unknown fields in replies are skipped, declared
//! exceptions surface as `GatewayError::Backend` with the store's
//! diagnostic detail.

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{GatewayError, Result};
use crate::model::{
    Column, ColumnOrSuperColumn, KeyRange, KeySlice, Mutation, SlicePredicate, StoreColumn,
    StoreColumnOrSuperColumn, StoreColumnParent, StoreColumnPath, StoreDeletion, StoreKeySlice,
    StoreMutation, StoreSlicePredicate, StoreSliceRange, StoreSuperColumn, SuperColumn,
};

use super::{Connector, ConsistencyLevel, KeyspaceDescription, MutationMap, StoreRpc};

// Thrift wire type tags
const T_STOP: u8 = 0;
const T_BOOL: u8 = 2;
const T_BYTE: u8 = 3;
const T_DOUBLE: u8 = 4;
const T_I16: u8 = 6;
const T_I32: u8 = 8;
const T_I64: u8 = 10;
const T_STRING: u8 = 11;
const T_STRUCT: u8 = 12;
const T_MAP: u8 = 13;
const T_SET: u8 = 14;
const T_LIST: u8 = 15;

// Message types
const M_CALL: u8 = 1;
const M_REPLY: u8 = 2;
const M_EXCEPTION: u8 = 3;

const VERSION_1: u32 = 0x8001_0000;

/// Upper bound on any single length prefix read off the wire.
const MAX_WIRE_LEN: i32 = 64 * 1024 * 1024;

/// Connector for the Thrift store client; one fresh connection per call.
pub struct ThriftConnector {
    addr: String,
    timeout: Option<Duration>,
}

impl ThriftConnector {
    pub fn new(addr: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }
}

impl Connector for ThriftConnector {
    fn connect(&self) -> Result<Box<dyn StoreRpc>> {
        Ok(Box::new(ThriftClient::connect(&self.addr, self.timeout)?))
    }
}

/// One open Thrift connection. Dropping it closes the socket.
pub struct ThriftClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    seq: i32,
}

impl ThriftClient {
    pub fn connect(addr: &str, timeout: Option<Duration>) -> Result<Self> {
        let resolved = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| GatewayError::Backend(format!("could not resolve {}", addr)))?;

        let stream = match timeout {
            Some(t) => TcpStream::connect_timeout(&resolved, t)?,
            None => TcpStream::connect(resolved)?,
        };
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            seq: 0,
        })
    }

    // -------------------------------------------------------------------------
    // Low-level Writing
    // -------------------------------------------------------------------------

    fn w_u8(&mut self, v: u8) -> Result<()> {
        self.writer.write_all(&[v])?;
        Ok(())
    }

    fn w_i16(&mut self, v: i16) -> Result<()> {
        self.writer.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn w_i32(&mut self, v: i32) -> Result<()> {
        self.writer.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn w_i64(&mut self, v: i64) -> Result<()> {
        self.writer.write_all(&v.to_be_bytes())?;
        Ok(())
    }

    fn w_bool(&mut self, v: bool) -> Result<()> {
        self.w_u8(v as u8)
    }

    fn w_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.w_i32(v.len() as i32)?;
        self.writer.write_all(v)?;
        Ok(())
    }

    fn w_field(&mut self, ftype: u8, id: i16) -> Result<()> {
        self.w_u8(ftype)?;
        self.w_i16(id)
    }

    fn w_stop(&mut self) -> Result<()> {
        self.w_u8(T_STOP)
    }

    fn w_list(&mut self, elem_type: u8, len: usize) -> Result<()> {
        self.w_u8(elem_type)?;
        self.w_i32(len as i32)
    }

    fn w_map(&mut self, key_type: u8, val_type: u8, len: usize) -> Result<()> {
        self.w_u8(key_type)?;
        self.w_u8(val_type)?;
        self.w_i32(len as i32)
    }

    fn begin_call(&mut self, method: &str) -> Result<()> {
        self.seq += 1;
        self.w_i32((VERSION_1 | M_CALL as u32) as i32)?;
        self.w_bytes(method.as_bytes())?;
        self.w_i32(self.seq)
    }

    /// Terminate the args struct and flush the call onto the wire.
    fn end_call(&mut self) -> Result<()> {
        self.w_stop()?;
        self.writer.flush()?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Low-level Reading
    // -------------------------------------------------------------------------

    fn r_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn r_i16(&mut self) -> Result<i16> {
        let mut buf = [0u8; 2];
        self.reader.read_exact(&mut buf)?;
        Ok(i16::from_be_bytes(buf))
    }

    fn r_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.reader.read_exact(&mut buf)?;
        Ok(i32::from_be_bytes(buf))
    }

    fn r_i64(&mut self) -> Result<i64> {
        let mut buf = [0u8; 8];
        self.reader.read_exact(&mut buf)?;
        Ok(i64::from_be_bytes(buf))
    }

    fn r_len(&mut self) -> Result<usize> {
        let len = self.r_i32()?;
        if !(0..=MAX_WIRE_LEN).contains(&len) {
            return Err(GatewayError::Backend(format!(
                "unreasonable length on wire: {}",
                len
            )));
        }
        Ok(len as usize)
    }

    fn r_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.r_len()?;
        let mut buf = vec![0u8; len];
        self.reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn r_string(&mut self) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.r_bytes()?).into_owned())
    }

    /// `None` marks the enclosing struct's stop byte.
    fn read_field(&mut self) -> Result<Option<(u8, i16)>> {
        let ftype = self.r_u8()?;
        if ftype == T_STOP {
            return Ok(None);
        }
        let id = self.r_i16()?;
        Ok(Some((ftype, id)))
    }

    fn skip(&mut self, ftype: u8) -> Result<()> {
        match ftype {
            T_BOOL | T_BYTE => {
                self.r_u8()?;
            }
            T_I16 => {
                self.r_i16()?;
            }
            T_I32 => {
                self.r_i32()?;
            }
            T_I64 | T_DOUBLE => {
                self.r_i64()?;
            }
            T_STRING => {
                self.r_bytes()?;
            }
            T_STRUCT => {
                while let Some((t, _)) = self.read_field()? {
                    self.skip(t)?;
                }
            }
            T_MAP => {
                let kt = self.r_u8()?;
                let vt = self.r_u8()?;
                let len = self.r_len()?;
                for _ in 0..len {
                    self.skip(kt)?;
                    self.skip(vt)?;
                }
            }
            T_SET | T_LIST => {
                let et = self.r_u8()?;
                let len = self.r_len()?;
                for _ in 0..len {
                    self.skip(et)?;
                }
            }
            other => {
                return Err(GatewayError::Backend(format!(
                    "cannot skip unknown wire type {}",
                    other
                )))
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Message Handling
    // -------------------------------------------------------------------------

    fn read_reply(&mut self, method: &str) -> Result<()> {
        let header = self.r_i32()? as u32;
        if header & 0xffff_0000 != VERSION_1 {
            return Err(GatewayError::Backend(format!(
                "bad protocol version in reply: 0x{:08x}",
                header
            )));
        }
        let mtype = (header & 0xff) as u8;
        let _name = self.r_bytes()?;
        let _seq = self.r_i32()?;

        match mtype {
            M_REPLY => Ok(()),
            M_EXCEPTION => {
                // TApplicationException: 1 message, 2 type
                let mut message = String::new();
                while let Some((ftype, fid)) = self.read_field()? {
                    if ftype == T_STRING && fid == 1 {
                        message = self.r_string()?;
                    } else {
                        self.skip(ftype)?;
                    }
                }
                Err(GatewayError::Backend(format!(
                    "{} rejected: {}",
                    method, message
                )))
            }
            other => Err(GatewayError::Backend(format!(
                "unexpected message type {} in reply to {}",
                other, method
            ))),
        }
    }

    /// Declared exceptions carry their detail in field 1 when they have one
    /// (InvalidRequestException.why); the rest are empty markers.
    fn read_exception_why(&mut self) -> Result<String> {
        let mut why = String::new();
        while let Some((ftype, fid)) = self.read_field()? {
            if ftype == T_STRING && fid == 1 {
                why = self.r_string()?;
            } else {
                self.skip(ftype)?;
            }
        }
        Ok(why)
    }

    fn exception_err(method: &str, label: &str, why: String) -> GatewayError {
        if why.is_empty() {
            GatewayError::Backend(format!("{} failed: {}", method, label))
        } else {
            GatewayError::Backend(format!("{} failed: {} ({})", method, label, why))
        }
    }

    fn label_for(labels: &[(i16, &'static str)], fid: i16) -> &'static str {
        labels
            .iter()
            .find(|(id, _)| *id == fid)
            .map(|(_, l)| *l)
            .unwrap_or("backend exception")
    }

    fn read_success<T>(
        &mut self,
        method: &str,
        labels: &[(i16, &'static str)],
        read: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.read_reply(method)?;
        let mut read = Some(read);
        let mut success = None;
        while let Some((ftype, fid)) = self.read_field()? {
            if fid == 0 {
                match read.take() {
                    Some(f) => success = Some(f(self)?),
                    None => self.skip(ftype)?,
                }
            } else if ftype == T_STRUCT {
                let why = self.read_exception_why()?;
                return Err(Self::exception_err(method, Self::label_for(labels, fid), why));
            } else {
                self.skip(ftype)?;
            }
        }
        success.ok_or_else(|| GatewayError::Backend(format!("{}: reply carried no result", method)))
    }

    fn read_void(&mut self, method: &str, labels: &[(i16, &'static str)]) -> Result<()> {
        self.read_reply(method)?;
        while let Some((ftype, fid)) = self.read_field()? {
            if ftype == T_STRUCT && fid != 0 {
                let why = self.read_exception_why()?;
                return Err(Self::exception_err(method, Self::label_for(labels, fid), why));
            }
            self.skip(ftype)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Struct Writers
    // -------------------------------------------------------------------------

    fn w_column_path(&mut self, path: &StoreColumnPath) -> Result<()> {
        self.w_field(T_STRING, 3)?;
        self.w_bytes(path.column_family.as_bytes())?;
        if let Some(sc) = &path.super_column {
            self.w_field(T_STRING, 4)?;
            self.w_bytes(sc)?;
        }
        if let Some(c) = &path.column {
            self.w_field(T_STRING, 5)?;
            self.w_bytes(c)?;
        }
        self.w_stop()
    }

    fn w_column_parent(&mut self, parent: &StoreColumnParent) -> Result<()> {
        self.w_field(T_STRING, 3)?;
        self.w_bytes(parent.column_family.as_bytes())?;
        if let Some(sc) = &parent.super_column {
            self.w_field(T_STRING, 4)?;
            self.w_bytes(sc)?;
        }
        self.w_stop()
    }

    fn w_slice_range(&mut self, range: &StoreSliceRange) -> Result<()> {
        self.w_field(T_STRING, 1)?;
        self.w_bytes(&range.start)?;
        self.w_field(T_STRING, 2)?;
        self.w_bytes(&range.finish)?;
        self.w_field(T_BOOL, 3)?;
        self.w_bool(range.reversed)?;
        self.w_field(T_I32, 4)?;
        self.w_i32(range.count)?;
        self.w_stop()
    }

    fn w_predicate(&mut self, predicate: &StoreSlicePredicate) -> Result<()> {
        match predicate {
            SlicePredicate::Names(names) => {
                self.w_field(T_LIST, 1)?;
                self.w_list(T_STRING, names.len())?;
                for name in names {
                    self.w_bytes(name)?;
                }
            }
            SlicePredicate::Range(range) => {
                self.w_field(T_STRUCT, 2)?;
                self.w_slice_range(range)?;
            }
        }
        self.w_stop()
    }

    fn w_key_range(&mut self, range: &KeyRange) -> Result<()> {
        if let Some(k) = &range.start_key {
            self.w_field(T_STRING, 1)?;
            self.w_bytes(k.as_bytes())?;
        }
        if let Some(k) = &range.end_key {
            self.w_field(T_STRING, 2)?;
            self.w_bytes(k.as_bytes())?;
        }
        if let Some(t) = &range.start_token {
            self.w_field(T_STRING, 3)?;
            self.w_bytes(t.as_bytes())?;
        }
        if let Some(t) = &range.end_token {
            self.w_field(T_STRING, 4)?;
            self.w_bytes(t.as_bytes())?;
        }
        self.w_field(T_I32, 5)?;
        self.w_i32(range.count.unwrap_or(100))?;
        self.w_stop()
    }

    fn w_column(&mut self, column: &StoreColumn) -> Result<()> {
        self.w_field(T_STRING, 1)?;
        self.w_bytes(&column.name)?;
        self.w_field(T_STRING, 2)?;
        self.w_bytes(&column.value)?;
        self.w_field(T_I64, 3)?;
        self.w_i64(column.timestamp)?;
        self.w_stop()
    }

    fn w_super_column(&mut self, sc: &StoreSuperColumn) -> Result<()> {
        self.w_field(T_STRING, 1)?;
        self.w_bytes(&sc.name)?;
        self.w_field(T_LIST, 2)?;
        self.w_list(T_STRUCT, sc.columns.len())?;
        for column in &sc.columns {
            self.w_column(column)?;
        }
        self.w_stop()
    }

    fn w_cosc(&mut self, cosc: &StoreColumnOrSuperColumn) -> Result<()> {
        match cosc {
            ColumnOrSuperColumn::Column(c) => {
                self.w_field(T_STRUCT, 1)?;
                self.w_column(c)?;
            }
            ColumnOrSuperColumn::Super(sc) => {
                self.w_field(T_STRUCT, 2)?;
                self.w_super_column(sc)?;
            }
        }
        self.w_stop()
    }

    fn w_deletion(&mut self, deletion: &StoreDeletion) -> Result<()> {
        if let Some(ts) = deletion.timestamp {
            self.w_field(T_I64, 1)?;
            self.w_i64(ts)?;
        }
        if let Some(sc) = &deletion.super_column {
            self.w_field(T_STRING, 2)?;
            self.w_bytes(sc)?;
        }
        if let Some(p) = &deletion.predicate {
            self.w_field(T_STRUCT, 3)?;
            self.w_predicate(p)?;
        }
        self.w_stop()
    }

    fn w_mutation(&mut self, mutation: &StoreMutation) -> Result<()> {
        match mutation {
            Mutation::Write(cosc) => {
                self.w_field(T_STRUCT, 1)?;
                self.w_cosc(cosc)?;
            }
            Mutation::Delete(del) => {
                self.w_field(T_STRUCT, 2)?;
                self.w_deletion(del)?;
            }
        }
        self.w_stop()
    }

    // -------------------------------------------------------------------------
    // Struct Readers
    // -------------------------------------------------------------------------

    fn read_column(&mut self) -> Result<StoreColumn> {
        let mut name = Vec::new();
        let mut value = Vec::new();
        let mut timestamp = 0i64;
        while let Some((ftype, fid)) = self.read_field()? {
            match (ftype, fid) {
                (T_STRING, 1) => name = self.r_bytes()?,
                (T_STRING, 2) => value = self.r_bytes()?,
                (T_I64, 3) => timestamp = self.r_i64()?,
                _ => self.skip(ftype)?,
            }
        }
        Ok(Column {
            name,
            value,
            timestamp,
        })
    }

    fn read_super_column(&mut self) -> Result<StoreSuperColumn> {
        let mut name = Vec::new();
        let mut columns = Vec::new();
        while let Some((ftype, fid)) = self.read_field()? {
            match (ftype, fid) {
                (T_STRING, 1) => name = self.r_bytes()?,
                (T_LIST, 2) => {
                    let _etype = self.r_u8()?;
                    let len = self.r_len()?;
                    columns.reserve(len);
                    for _ in 0..len {
                        columns.push(self.read_column()?);
                    }
                }
                _ => self.skip(ftype)?,
            }
        }
        Ok(SuperColumn { name, columns })
    }

    fn read_cosc(&mut self) -> Result<StoreColumnOrSuperColumn> {
        let mut column = None;
        let mut super_column = None;
        while let Some((ftype, fid)) = self.read_field()? {
            match (ftype, fid) {
                (T_STRUCT, 1) => column = Some(self.read_column()?),
                (T_STRUCT, 2) => super_column = Some(self.read_super_column()?),
                _ => self.skip(ftype)?,
            }
        }
        match (column, super_column) {
            (Some(c), _) => Ok(ColumnOrSuperColumn::Column(c)),
            (None, Some(sc)) => Ok(ColumnOrSuperColumn::Super(sc)),
            (None, None) => Err(GatewayError::Backend(
                "column_or_supercolumn with neither alternative set".to_string(),
            )),
        }
    }

    fn read_cosc_list(&mut self) -> Result<Vec<StoreColumnOrSuperColumn>> {
        let _etype = self.r_u8()?;
        let len = self.r_len()?;
        let mut list = Vec::with_capacity(len);
        for _ in 0..len {
            list.push(self.read_cosc()?);
        }
        Ok(list)
    }

    fn read_key_slice(&mut self) -> Result<StoreKeySlice> {
        let mut key = String::new();
        let mut columns = Vec::new();
        while let Some((ftype, fid)) = self.read_field()? {
            match (ftype, fid) {
                (T_STRING, 1) => key = self.r_string()?,
                (T_LIST, 2) => columns = self.read_cosc_list()?,
                _ => self.skip(ftype)?,
            }
        }
        Ok(KeySlice { key, columns })
    }
}

// Exception field labels per method family
const GET_EXC: &[(i16, &'static str)] = &[
    (1, "invalid request"),
    (2, "not found"),
    (3, "unavailable"),
    (4, "timed out"),
];
const READ_EXC: &[(i16, &'static str)] = &[
    (1, "invalid request"),
    (2, "unavailable"),
    (3, "timed out"),
];
const WRITE_EXC: &[(i16, &'static str)] = &[
    (1, "invalid request"),
    (2, "unavailable"),
    (3, "timed out"),
];
const DESCRIBE_EXC: &[(i16, &'static str)] = &[(1, "invalid request")];

impl StoreRpc for ThriftClient {
    fn get(
        &mut self,
        keyspace: &str,
        key: &str,
        path: &StoreColumnPath,
        cl: ConsistencyLevel,
    ) -> Result<StoreColumnOrSuperColumn> {
        self.begin_call("get")?;
        self.w_field(T_STRING, 1)?;
        self.w_bytes(keyspace.as_bytes())?;
        self.w_field(T_STRING, 2)?;
        self.w_bytes(key.as_bytes())?;
        self.w_field(T_STRUCT, 3)?;
        self.w_column_path(path)?;
        self.w_field(T_I32, 4)?;
        self.w_i32(cl.as_i32())?;
        self.end_call()?;

        self.read_success("get", GET_EXC, |c| c.read_cosc())
    }

    fn get_slice(
        &mut self,
        keyspace: &str,
        key: &str,
        parent: &StoreColumnParent,
        predicate: &StoreSlicePredicate,
        cl: ConsistencyLevel,
    ) -> Result<Vec<StoreColumnOrSuperColumn>> {
        self.begin_call("get_slice")?;
        self.w_field(T_STRING, 1)?;
        self.w_bytes(keyspace.as_bytes())?;
        self.w_field(T_STRING, 2)?;
        self.w_bytes(key.as_bytes())?;
        self.w_field(T_STRUCT, 3)?;
        self.w_column_parent(parent)?;
        self.w_field(T_STRUCT, 4)?;
        self.w_predicate(predicate)?;
        self.w_field(T_I32, 5)?;
        self.w_i32(cl.as_i32())?;
        self.end_call()?;

        self.read_success("get_slice", READ_EXC, |c| c.read_cosc_list())
    }

    fn multiget_slice(
        &mut self,
        keyspace: &str,
        keys: &[String],
        parent: &StoreColumnParent,
        predicate: &StoreSlicePredicate,
        cl: ConsistencyLevel,
    ) -> Result<BTreeMap<String, Vec<StoreColumnOrSuperColumn>>> {
        self.begin_call("multiget_slice")?;
        self.w_field(T_STRING, 1)?;
        self.w_bytes(keyspace.as_bytes())?;
        self.w_field(T_LIST, 2)?;
        self.w_list(T_STRING, keys.len())?;
        for key in keys {
            self.w_bytes(key.as_bytes())?;
        }
        self.w_field(T_STRUCT, 3)?;
        self.w_column_parent(parent)?;
        self.w_field(T_STRUCT, 4)?;
        self.w_predicate(predicate)?;
        self.w_field(T_I32, 5)?;
        self.w_i32(cl.as_i32())?;
        self.end_call()?;

        self.read_success("multiget_slice", READ_EXC, |c| {
            let _ktype = c.r_u8()?;
            let _vtype = c.r_u8()?;
            let len = c.r_len()?;
            let mut rows = BTreeMap::new();
            for _ in 0..len {
                let key = c.r_string()?;
                rows.insert(key, c.read_cosc_list()?);
            }
            Ok(rows)
        })
    }

    fn get_count(
        &mut self,
        keyspace: &str,
        key: &str,
        parent: &StoreColumnParent,
        cl: ConsistencyLevel,
    ) -> Result<i32> {
        self.begin_call("get_count")?;
        self.w_field(T_STRING, 1)?;
        self.w_bytes(keyspace.as_bytes())?;
        self.w_field(T_STRING, 2)?;
        self.w_bytes(key.as_bytes())?;
        self.w_field(T_STRUCT, 3)?;
        self.w_column_parent(parent)?;
        self.w_field(T_I32, 4)?;
        self.w_i32(cl.as_i32())?;
        self.end_call()?;

        self.read_success("get_count", READ_EXC, |c| c.r_i32())
    }

    fn get_range_slices(
        &mut self,
        keyspace: &str,
        parent: &StoreColumnParent,
        predicate: &StoreSlicePredicate,
        range: &KeyRange,
        cl: ConsistencyLevel,
    ) -> Result<Vec<StoreKeySlice>> {
        self.begin_call("get_range_slices")?;
        self.w_field(T_STRING, 1)?;
        self.w_bytes(keyspace.as_bytes())?;
        self.w_field(T_STRUCT, 2)?;
        self.w_column_parent(parent)?;
        self.w_field(T_STRUCT, 3)?;
        self.w_predicate(predicate)?;
        self.w_field(T_STRUCT, 4)?;
        self.w_key_range(range)?;
        self.w_field(T_I32, 5)?;
        self.w_i32(cl.as_i32())?;
        self.end_call()?;

        self.read_success("get_range_slices", READ_EXC, |c| {
            let _etype = c.r_u8()?;
            let len = c.r_len()?;
            let mut slices = Vec::with_capacity(len);
            for _ in 0..len {
                slices.push(c.read_key_slice()?);
            }
            Ok(slices)
        })
    }

    fn insert(
        &mut self,
        keyspace: &str,
        key: &str,
        path: &StoreColumnPath,
        value: &[u8],
        timestamp: i64,
        cl: ConsistencyLevel,
    ) -> Result<()> {
        self.begin_call("insert")?;
        self.w_field(T_STRING, 1)?;
        self.w_bytes(keyspace.as_bytes())?;
        self.w_field(T_STRING, 2)?;
        self.w_bytes(key.as_bytes())?;
        self.w_field(T_STRUCT, 3)?;
        self.w_column_path(path)?;
        self.w_field(T_STRING, 4)?;
        self.w_bytes(value)?;
        self.w_field(T_I64, 5)?;
        self.w_i64(timestamp)?;
        self.w_field(T_I32, 6)?;
        self.w_i32(cl.as_i32())?;
        self.end_call()?;

        self.read_void("insert", WRITE_EXC)
    }

    fn batch_mutate(
        &mut self,
        keyspace: &str,
        mutations: &MutationMap,
        cl: ConsistencyLevel,
    ) -> Result<()> {
        self.begin_call("batch_mutate")?;
        self.w_field(T_STRING, 1)?;
        self.w_bytes(keyspace.as_bytes())?;
        self.w_field(T_MAP, 2)?;
        self.w_map(T_STRING, T_MAP, mutations.len())?;
        for (key, families) in mutations {
            self.w_bytes(key.as_bytes())?;
            self.w_map(T_STRING, T_LIST, families.len())?;
            for (cf, muts) in families {
                self.w_bytes(cf.as_bytes())?;
                self.w_list(T_STRUCT, muts.len())?;
                for mutation in muts {
                    self.w_mutation(mutation)?;
                }
            }
        }
        self.w_field(T_I32, 3)?;
        self.w_i32(cl.as_i32())?;
        self.end_call()?;

        self.read_void("batch_mutate", WRITE_EXC)
    }

    fn remove(
        &mut self,
        keyspace: &str,
        key: &str,
        path: &StoreColumnPath,
        timestamp: i64,
        cl: ConsistencyLevel,
    ) -> Result<()> {
        self.begin_call("remove")?;
        self.w_field(T_STRING, 1)?;
        self.w_bytes(keyspace.as_bytes())?;
        self.w_field(T_STRING, 2)?;
        self.w_bytes(key.as_bytes())?;
        self.w_field(T_STRUCT, 3)?;
        self.w_column_path(path)?;
        self.w_field(T_I64, 4)?;
        self.w_i64(timestamp)?;
        self.w_field(T_I32, 5)?;
        self.w_i32(cl.as_i32())?;
        self.end_call()?;

        self.read_void("remove", WRITE_EXC)
    }

    fn describe_keyspaces(&mut self) -> Result<Vec<String>> {
        self.begin_call("describe_keyspaces")?;
        self.end_call()?;

        self.read_success("describe_keyspaces", DESCRIBE_EXC, |c| {
            let _etype = c.r_u8()?;
            let len = c.r_len()?;
            let mut names = Vec::with_capacity(len);
            for _ in 0..len {
                names.push(c.r_string()?);
            }
            Ok(names)
        })
    }

    fn describe_keyspace(&mut self, keyspace: &str) -> Result<KeyspaceDescription> {
        self.begin_call("describe_keyspace")?;
        self.w_field(T_STRING, 1)?;
        self.w_bytes(keyspace.as_bytes())?;
        self.end_call()?;

        self.read_success("describe_keyspace", DESCRIBE_EXC, |c| {
            let _ktype = c.r_u8()?;
            let _vtype = c.r_u8()?;
            let len = c.r_len()?;
            let mut families = BTreeMap::new();
            for _ in 0..len {
                let cf = c.r_string()?;
                let _ikt = c.r_u8()?;
                let _ivt = c.r_u8()?;
                let ilen = c.r_len()?;
                let mut attrs = BTreeMap::new();
                for _ in 0..ilen {
                    let k = c.r_string()?;
                    let v = c.r_string()?;
                    attrs.insert(k, v);
                }
                families.insert(cf, attrs);
            }
            Ok(families)
        })
    }
}
