//! Serialization utilities
//!
//! This module provides the generic coercion of any serializable Rust value
//! into an ordered composite mapping.

/// Serialization functions for converting Rust data to PostgresValue
use crate::types::{PostgresValue, Record};
use serde::Serialize;

/// Convert serializable data to PostgresValue::Record
pub fn serialize_to_postgres_record<T: Serialize>(
    data: &T,
) -> Result<PostgresValue, serde_json::Error> {
    serialize_to_postgres_payload(data).map(PostgresValue::Record)
}

/// Default implementation using JSON serialization as fallback.
///
/// Structs and maps become named records, sequences and tuples become
/// positional records. Any other value yields a single positional entry.
/// Fails when the value cannot be represented as JSON, e.g. a map with
/// non-string keys.
pub fn serialize_to_postgres_payload<T: Serialize>(data: &T) -> Result<Record, serde_json::Error> {
    let mut payload = Record::new();

    // Serialize to JSON first, then extract fields
    match serde_json::to_value(data)? {
        serde_json::Value::Object(map) => {
            for (key, value) in map {
                payload.insert(key, json_field_to_postgres_value(value));
            }
        }
        serde_json::Value::Array(items) => {
            for (i, value) in items.into_iter().enumerate() {
                payload.insert(i, json_field_to_postgres_value(value));
            }
        }
        serde_json::Value::Null => {}
        other => payload.insert(0usize, json_field_to_postgres_value(other)),
    }

    Ok(payload)
}

fn json_field_to_postgres_value(value: serde_json::Value) -> PostgresValue {
    match value {
        serde_json::Value::String(s) => {
            // Try to parse as RFC3339 timestamp first
            if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&s) {
                PostgresValue::Timestamp(dt.naive_utc())
            } else {
                PostgresValue::Text(s)
            }
        }
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                PostgresValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                PostgresValue::Float(f)
            } else {
                PostgresValue::Json(serde_json::Value::Number(n))
            }
        }
        serde_json::Value::Bool(b) => PostgresValue::Boolean(b),
        serde_json::Value::Null => PostgresValue::Null,
        other => PostgresValue::Json(other),
    }
}
