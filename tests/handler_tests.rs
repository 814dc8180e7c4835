//! Handler Tests
//!
//! Tests for the verb handlers against an in-memory fake backend. The fake
//! counts data-path RPC calls so validation ordering can be asserted.

mod common;

use std::sync::Arc;

use serde_json::json;

use common::FakeConnector;
use rowgate::backend::Connector;
use rowgate::error::GatewayError;
use rowgate::handlers::Gateway;
use rowgate::model::{Mutation, ColumnOrSuperColumn};
use rowgate::protocol::{encode_query, parse_request, Request};
use rowgate::schema::SchemaCache;

fn gateway() -> (Gateway, FakeConnector) {
    let connector = FakeConnector::with_standard_schema();
    let schema = SchemaCache::load(&connector).unwrap();
    let gateway = Gateway::new(
        Arc::new(schema),
        Arc::new(connector.clone()) as Arc<dyn Connector>,
    );
    (gateway, connector)
}

fn request(verb: &str, pairs: Vec<(&str, String)>) -> Request {
    let line = format!("{}?{}", verb, encode_query(pairs));
    parse_request(&line).unwrap()
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_missing_parameter_names_the_field() {
    let (gateway, connector) = gateway();
    let req = request("get", vec![("keyspace", "Keyspace1".to_string())]);
    match gateway.execute(&req) {
        Err(GatewayError::MissingParameter("key")) => {}
        other => panic!("Expected MissingParameter, got {:?}", other),
    }
    assert_eq!(connector.state.data_call_count(), 0);
}

#[test]
fn test_unknown_keyspace_fails_before_backend() {
    let (gateway, connector) = gateway();
    let req = request(
        "get",
        vec![
            ("keyspace", "Nope".to_string()),
            ("key", "row1".to_string()),
            (
                "column_path",
                json!({"column_family": "Standard1", "column": "c1"}).to_string(),
            ),
        ],
    );
    match gateway.execute(&req) {
        Err(GatewayError::UnknownResource(msg)) => {
            assert_eq!(msg, "invalid keyspace: Nope");
        }
        other => panic!("Expected UnknownResource, got {:?}", other),
    }
    assert_eq!(connector.state.data_call_count(), 0);
}

#[test]
fn test_unknown_column_family_fails_before_backend() {
    let (gateway, connector) = gateway();
    let req = request(
        "get",
        vec![
            ("keyspace", "Keyspace1".to_string()),
            ("key", "row1".to_string()),
            (
                "column_path",
                json!({"column_family": "Missing", "column": "c1"}).to_string(),
            ),
        ],
    );
    match gateway.execute(&req) {
        Err(GatewayError::UnknownResource(msg)) => {
            assert_eq!(msg, "invalid column family: Keyspace1.Missing");
        }
        other => panic!("Expected UnknownResource, got {:?}", other),
    }
    assert_eq!(connector.state.data_call_count(), 0);
}

#[test]
fn test_bad_long_name_fails_before_backend() {
    let (gateway, connector) = gateway();
    let req = request(
        "insert",
        vec![
            ("keyspace", "Keyspace1".to_string()),
            ("key", "row1".to_string()),
            (
                "column_path",
                json!({"column_family": "StandardLong", "column": "banana"}).to_string(),
            ),
            ("value", "v".to_string()),
            ("timestamp", "auto".to_string()),
        ],
    );
    match gateway.execute(&req) {
        Err(GatewayError::MalformedEntity(_)) => {}
        other => panic!("Expected MalformedEntity, got {:?}", other),
    }
    assert_eq!(connector.state.data_call_count(), 0);
}

#[test]
fn test_unknown_verb_rejected() {
    let (gateway, _) = gateway();
    let req = request("truncate", vec![]);
    match gateway.execute(&req) {
        Err(GatewayError::Protocol(msg)) => assert_eq!(msg, "unknown command: truncate"),
        other => panic!("Expected a protocol error, got {:?}", other),
    }
}

// =============================================================================
// Read/Write Round Trip Tests
// =============================================================================

#[test]
fn test_insert_then_get() {
    let (gateway, _) = gateway();
    let path = json!({"column_family": "Standard1", "column": "c1"}).to_string();

    let req = request(
        "insert",
        vec![
            ("keyspace", "Keyspace1".to_string()),
            ("key", "row1".to_string()),
            ("column_path", path.clone()),
            ("value", "v1".to_string()),
            ("timestamp", "auto".to_string()),
        ],
    );
    let timestamp = gateway
        .execute(&req)
        .unwrap()
        .and_then(|v| v.as_i64())
        .unwrap();
    assert!(timestamp > 0);

    let req = request(
        "get",
        vec![
            ("keyspace", "Keyspace1".to_string()),
            ("key", "row1".to_string()),
            ("column_path", path),
        ],
    );
    let result = gateway.execute(&req).unwrap().unwrap();
    assert_eq!(
        result,
        json!({"name": "c1", "value": "v1", "timestamp": timestamp})
    );
}

#[test]
fn test_long_names_marshalled_both_ways() {
    let (gateway, connector) = gateway();
    let path = json!({"column_family": "StandardLong", "column": "1311285837190"}).to_string();

    let req = request(
        "insert",
        vec![
            ("keyspace", "Keyspace1".to_string()),
            ("key", "row1".to_string()),
            ("column_path", path.clone()),
            ("value", "v1".to_string()),
            ("timestamp", "7".to_string()),
        ],
    );
    assert_eq!(gateway.execute(&req).unwrap(), Some(json!(7)));

    let req = request(
        "get",
        vec![
            ("keyspace", "Keyspace1".to_string()),
            ("key", "row1".to_string()),
            ("column_path", path),
        ],
    );
    let result = gateway.execute(&req).unwrap().unwrap();
    assert_eq!(result["name"], json!("1311285837190"));
    assert_eq!(connector.state.data_call_count(), 2);
}

#[test]
fn test_get_slice_returns_columns() {
    let (gateway, _) = gateway();
    for (name, value) in [("a", "1"), ("b", "2")] {
        let req = request(
            "insert",
            vec![
                ("keyspace", "Keyspace1".to_string()),
                ("key", "row1".to_string()),
                (
                    "column_path",
                    json!({"column_family": "Standard1", "column": name}).to_string(),
                ),
                ("value", value.to_string()),
                ("timestamp", "1".to_string()),
            ],
        );
        gateway.execute(&req).unwrap();
    }

    let req = request(
        "get_slice",
        vec![
            ("keyspace", "Keyspace1".to_string()),
            ("key", "row1".to_string()),
            (
                "column_parent",
                json!({"column_family": "Standard1"}).to_string(),
            ),
            (
                "predicate",
                json!({"slice_range": {"start": "", "finish": ""}}).to_string(),
            ),
        ],
    );
    let result = gateway.execute(&req).unwrap().unwrap();
    assert_eq!(
        result,
        json!([
            {"name": "a", "value": "1", "timestamp": 1},
            {"name": "b", "value": "2", "timestamp": 1},
        ])
    );
}

#[test]
fn test_get_count_counts_columns() {
    let (gateway, _) = gateway();
    for name in ["a", "b", "c"] {
        let req = request(
            "insert",
            vec![
                ("keyspace", "Keyspace1".to_string()),
                ("key", "row1".to_string()),
                (
                    "column_path",
                    json!({"column_family": "Standard1", "column": name}).to_string(),
                ),
                ("value", "v".to_string()),
                ("timestamp", "1".to_string()),
            ],
        );
        gateway.execute(&req).unwrap();
    }

    let req = request(
        "get_count",
        vec![
            ("keyspace", "Keyspace1".to_string()),
            ("key", "row1".to_string()),
            (
                "column_parent",
                json!({"column_family": "Standard1"}).to_string(),
            ),
        ],
    );
    assert_eq!(gateway.execute(&req).unwrap(), Some(json!(3)));
}

#[test]
fn test_remove_returns_no_body() {
    let (gateway, _) = gateway();
    let path = json!({"column_family": "Standard1", "column": "c1"}).to_string();

    let req = request(
        "insert",
        vec![
            ("keyspace", "Keyspace1".to_string()),
            ("key", "row1".to_string()),
            ("column_path", path.clone()),
            ("value", "v1".to_string()),
            ("timestamp", "1".to_string()),
        ],
    );
    gateway.execute(&req).unwrap();

    let req = request(
        "remove",
        vec![
            ("keyspace", "Keyspace1".to_string()),
            ("key", "row1".to_string()),
            ("column_path", path.clone()),
            ("timestamp", "2".to_string()),
        ],
    );
    assert_eq!(gateway.execute(&req).unwrap(), None);

    let req = request(
        "get",
        vec![
            ("keyspace", "Keyspace1".to_string()),
            ("key", "row1".to_string()),
            ("column_path", path),
        ],
    );
    match gateway.execute(&req) {
        Err(GatewayError::Backend(_)) => {}
        other => panic!("Expected a backend error, got {:?}", other),
    }
}

// =============================================================================
// Batch Mutate Tests
// =============================================================================

#[test]
fn test_batch_mutate_shares_one_auto_timestamp() {
    let (gateway, connector) = gateway();
    let map = json!({
        "row1": {
            "Standard1": [
                {"name": "a", "value": "1", "timestamp": "auto"},
                {"name": "b", "value": "2", "timestamp": "auto"},
            ],
        },
        "row2": {
            "Standard1": [
                {"name": "c", "value": "3", "timestamp": "auto"},
            ],
        },
    });
    let req = request(
        "batch_mutate",
        vec![
            ("keyspace", "Keyspace1".to_string()),
            ("mutation_map", map.to_string()),
        ],
    );
    let returned = gateway
        .execute(&req)
        .unwrap()
        .and_then(|v| v.as_i64())
        .unwrap();

    let recorded = connector.state.recorded_mutations.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    let mut seen = 0;
    for families in recorded[0].values() {
        for mutations in families.values() {
            for mutation in mutations {
                match mutation {
                    Mutation::Write(ColumnOrSuperColumn::Column(c)) => {
                        assert_eq!(c.timestamp, returned);
                        seen += 1;
                    }
                    other => panic!("Expected a column write, got {:?}", other),
                }
            }
        }
    }
    assert_eq!(seen, 3);
}

#[test]
fn test_batch_mutate_marshals_per_family() {
    let (gateway, connector) = gateway();
    let map = json!({
        "row1": {
            "StandardLong": [{"name": "5", "value": "v", "timestamp": 1}],
            "Standard1": [{"name": "5", "value": "v", "timestamp": 1}],
        },
    });
    let req = request(
        "batch_mutate",
        vec![
            ("keyspace", "Keyspace1".to_string()),
            ("mutation_map", map.to_string()),
        ],
    );
    gateway.execute(&req).unwrap();

    let recorded = connector.state.recorded_mutations.lock().unwrap();
    let families = &recorded[0]["row1"];
    match &families["StandardLong"][0] {
        Mutation::Write(ColumnOrSuperColumn::Column(c)) => {
            assert_eq!(c.name, vec![0, 0, 0, 0, 0, 0, 0, 5]);
        }
        other => panic!("Expected a column write, got {:?}", other),
    }
    match &families["Standard1"][0] {
        Mutation::Write(ColumnOrSuperColumn::Column(c)) => {
            assert_eq!(c.name, b"5".to_vec());
        }
        other => panic!("Expected a column write, got {:?}", other),
    }
}

#[test]
fn test_batch_mutate_rejects_unknown_family() {
    let (gateway, connector) = gateway();
    let map = json!({
        "row1": {"Missing": [{"name": "a", "value": "1", "timestamp": 1}]},
    });
    let req = request(
        "batch_mutate",
        vec![
            ("keyspace", "Keyspace1".to_string()),
            ("mutation_map", map.to_string()),
        ],
    );
    match gateway.execute(&req) {
        Err(GatewayError::UnknownResource(_)) => {}
        other => panic!("Expected UnknownResource, got {:?}", other),
    }
    assert_eq!(connector.state.data_call_count(), 0);
}

// =============================================================================
// Local Verb Tests
// =============================================================================

#[test]
fn test_get_uuids_defaults_to_one() {
    let (gateway, connector) = gateway();
    let req = request("get_uuids", vec![]);
    let result = gateway.execute(&req).unwrap().unwrap();
    assert_eq!(result.as_array().map(Vec::len), Some(1));
    assert_eq!(connector.state.data_call_count(), 0);
}

#[test]
fn test_get_uuids_count() {
    let (gateway, _) = gateway();
    let req = request("get_uuids", vec![("count", "3".to_string())]);
    let result = gateway.execute(&req).unwrap().unwrap();
    let uuids = result.as_array().unwrap();
    assert_eq!(uuids.len(), 3);
    assert_ne!(uuids[0], uuids[1]);
}

#[test]
fn test_describe_keyspace_served_from_cache() {
    let (gateway, connector) = gateway();
    let before = connector.state.data_call_count();
    let req = request(
        "describe_keyspace",
        vec![("keyspace", "Keyspace1".to_string())],
    );
    let result = gateway.execute(&req).unwrap().unwrap();
    assert_eq!(
        result["StandardLong"]["CompareWith"],
        json!("org.apache.cassandra.db.marshal.LongType")
    );
    assert_eq!(connector.state.data_call_count(), before);
}
