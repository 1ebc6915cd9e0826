//! Integration tests for JSON/JSONB column support
//!
//! Covers objects, typed JSON through serde, JSON arrays as PostgreSQL arrays
//! and JSON fields inside composites.

use pgtypecast::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Custom config struct for typed JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    pub enabled: bool,
    pub max_retries: i32,
    pub endpoints: Vec<String>,
}

fn json_schema() -> (Schema, DescriptorId, DescriptorId, DescriptorId) {
    let mut schema = Schema::new();
    let jsonb = schema.add(TypeDescriptor::from_pg_type("jsonb")).unwrap();
    let jsonb_array = schema.add(TypeDescriptor::from_pg_type("jsonb[]")).unwrap();
    let text = schema.add(TypeDescriptor::from_pg_type("text")).unwrap();
    let setting = schema
        .add(
            TypeDescriptor::composite("setting")
                .field("key", text)
                .field("value", jsonb),
        )
        .unwrap();
    (schema, jsonb, jsonb_array, setting)
}

#[test]
fn test_json_object_round_trip() {
    let (schema, jsonb, _, _) = json_schema();
    let codec = Codec::new(&schema);
    let metadata = PostgresValue::Json(json!({
        "version": "1.0",
        "features": ["auth", "logging"],
        "limits": {"requests": 1000, "ratio": 0.5}
    }));

    let encoded = codec.encode(&metadata, jsonb).unwrap().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&encoded).unwrap();
    assert_eq!(parsed["limits"]["requests"], 1000);
    assert_eq!(codec.decode(Some(&encoded), jsonb).unwrap(), metadata);
}

#[test]
fn test_typed_json() {
    let (schema, jsonb, _, _) = json_schema();
    let codec = Codec::new(&schema);
    let config = AppConfig {
        enabled: true,
        max_retries: 3,
        endpoints: vec!["https://a.example".to_string()],
    };

    let encoded = codec.encode_serialized(&config, jsonb).unwrap().unwrap();
    let decoded: AppConfig = codec.decode_into(Some(&encoded), jsonb).unwrap();
    assert_eq!(decoded, config);
}

#[test]
fn test_native_values_serialize_as_json() {
    let (schema, jsonb, _, _) = json_schema();
    let codec = Codec::new(&schema);

    let record = PostgresValue::Record(Record::new().with("a", 1i64).with("b", true));
    assert_eq!(
        codec.encode(&record, jsonb).unwrap().as_deref(),
        Some(r#"{"a":1,"b":true}"#)
    );
    assert_eq!(
        codec.encode(&PostgresValue::Text("plain".to_string()), jsonb).unwrap().as_deref(),
        Some(r#""plain""#)
    );
    assert_eq!(
        codec.encode(&PostgresValue::Integer(4), jsonb).unwrap().as_deref(),
        Some("4")
    );
}

#[test]
fn test_json_array_column() {
    let (schema, _, jsonb_array, _) = json_schema();
    let codec = Codec::new(&schema);

    // Inner JSON arrays are values, not extra dimensions
    let value = PostgresValue::Array(vec![
        PostgresValue::Json(json!([1, 2])),
        PostgresValue::Null,
        PostgresValue::Json(json!({"k": "v, w"})),
    ]);
    let encoded = codec.encode(&value, jsonb_array).unwrap().unwrap();
    assert_eq!(encoded, r#"{"[1,2]",NULL,"{\"k\":\"v, w\"}"}"#);
    assert_eq!(codec.decode(Some(&encoded), jsonb_array).unwrap(), value);
}

#[test]
fn test_json_inside_composite() {
    let (schema, _, _, setting) = json_schema();
    let codec = Codec::new(&schema);
    let value = PostgresValue::Record(
        Record::new()
            .with("key", "retries")
            .with("value", json!({"max": 3})),
    );

    let encoded = codec.encode(&value, setting).unwrap().unwrap();
    assert_eq!(encoded, r#"(retries,"{\"max\":3}")"#);
    assert_eq!(codec.decode(Some(&encoded), setting).unwrap(), value);
}

#[test]
fn test_invalid_json() {
    let (schema, jsonb, _, _) = json_schema();
    let codec = Codec::new(&schema);
    assert!(matches!(
        codec.decode(Some(r#"{"a":"#), jsonb),
        Err(CodecError::Decode { .. })
    ));
}
