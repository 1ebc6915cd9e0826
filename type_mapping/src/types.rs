//! Type mapping definitions
//!
//! This module provides the application-side value model that PostgreSQL
//! array, composite and scalar literals are converted to and from.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scalar category of a PostgreSQL column type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Boolean,
    Bit,
    Binary,
    Json,
    Date,
    Time,
    Timestamp,
    Composite,
    /// Any other type, carrying its normalized PostgreSQL name (e.g. `int4`, `text`)
    Other(String),
}

impl TypeKind {
    /// PostgreSQL-facing name of the kind, used in error messages
    pub fn name(&self) -> &str {
        match self {
            TypeKind::Boolean => "boolean",
            TypeKind::Bit => "bit",
            TypeKind::Binary => "bytea",
            TypeKind::Json => "json",
            TypeKind::Date => "date",
            TypeKind::Time => "time",
            TypeKind::Timestamp => "timestamp",
            TypeKind::Composite => "composite",
            TypeKind::Other(name) => name,
        }
    }
}

/// Application-side value read from or written to a PostgreSQL column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PostgresValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Json(serde_json::Value),
    Array(Vec<PostgresValue>),
    Record(Record),
}

/// Key of a composite entry: either a position or a field name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    Index(usize),
    Name(String),
}

impl FieldKey {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            FieldKey::Name(name) => Some(name),
            FieldKey::Index(_) => None,
        }
    }
}

impl From<usize> for FieldKey {
    fn from(val: usize) -> Self {
        FieldKey::Index(val)
    }
}

impl From<&str> for FieldKey {
    fn from(val: &str) -> Self {
        FieldKey::Name(val.to_string())
    }
}

impl From<String> for FieldKey {
    fn from(val: String) -> Self {
        FieldKey::Name(val)
    }
}

/// Insertion-ordered mapping of composite entries
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    entries: Vec<(FieldKey, PostgresValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a positional record (keys `0..n`) from a list of values
    pub fn positional(values: Vec<PostgresValue>) -> Self {
        Self {
            entries: values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (FieldKey::Index(i), v))
                .collect(),
        }
    }

    /// Insert a value, replacing an existing entry with the same key in place
    pub fn insert(&mut self, key: impl Into<FieldKey>, value: impl Into<PostgresValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<FieldKey>, value: impl Into<PostgresValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &FieldKey) -> Option<&PostgresValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up an entry by field name
    pub fn field(&self, name: &str) -> Option<&PostgresValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_name() == Some(name))
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &FieldKey) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &PostgresValue> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &PostgresValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// True when at least one key is a field name rather than a position
    pub fn has_named_keys(&self) -> bool {
        self.entries.iter().any(|(k, _)| matches!(k, FieldKey::Name(_)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Record {
    type Item = (FieldKey, PostgresValue);
    type IntoIter = std::vec::IntoIter<(FieldKey, PostgresValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<FieldKey>> FromIterator<(K, PostgresValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, PostgresValue)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Trait for exporting an application object as an ordered composite mapping
pub trait ToPostgresPayload {
    fn to_postgres_payload(&self) -> Record;
}

impl PostgresValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PostgresValue::Null)
    }

    /// Convert to a JSON value.
    ///
    /// Named records become objects, positional records become arrays, bytes
    /// become arrays of numbers, temporal values and uuids become strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            PostgresValue::Null => Value::Null,
            PostgresValue::Boolean(b) => Value::Bool(*b),
            PostgresValue::Integer(i) => Value::from(*i),
            PostgresValue::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number)
            }
            PostgresValue::Text(s) => Value::String(s.clone()),
            PostgresValue::Bytes(bytes) => {
                Value::Array(bytes.iter().map(|b| Value::from(*b)).collect())
            }
            PostgresValue::Uuid(u) => Value::String(u.hyphenated().to_string()),
            PostgresValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            PostgresValue::Time(t) => Value::String(t.format("%H:%M:%S%.f").to_string()),
            PostgresValue::Timestamp(ts) => {
                Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            PostgresValue::Json(v) => v.clone(),
            PostgresValue::Array(items) => Value::Array(items.iter().map(|v| v.to_json()).collect()),
            PostgresValue::Record(record) => {
                if record.has_named_keys() {
                    let map = record
                        .iter()
                        .map(|(k, v)| {
                            let key = match k {
                                FieldKey::Name(name) => name.clone(),
                                FieldKey::Index(i) => i.to_string(),
                            };
                            (key, v.to_json())
                        })
                        .collect();
                    Value::Object(map)
                } else {
                    Value::Array(record.values().map(|v| v.to_json()).collect())
                }
            }
        }
    }

    /// Convert a JSON value structurally: objects become named records,
    /// arrays become arrays, numbers become integers when integral
    pub fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => PostgresValue::Null,
            Value::Bool(b) => PostgresValue::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => PostgresValue::Integer(i),
                None => n
                    .as_f64()
                    .map_or(PostgresValue::Json(Value::Number(n)), PostgresValue::Float),
            },
            Value::String(s) => PostgresValue::Text(s),
            Value::Array(items) => {
                PostgresValue::Array(items.into_iter().map(PostgresValue::from_json).collect())
            }
            Value::Object(map) => PostgresValue::Record(
                map.into_iter()
                    .map(|(k, v)| (k, PostgresValue::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// Convert basic Rust types to PostgresValue
impl From<String> for PostgresValue {
    fn from(val: String) -> Self {
        PostgresValue::Text(val)
    }
}

impl From<&str> for PostgresValue {
    fn from(val: &str) -> Self {
        PostgresValue::Text(val.to_string())
    }
}

impl From<i32> for PostgresValue {
    fn from(val: i32) -> Self {
        PostgresValue::Integer(val as i64)
    }
}

impl From<i64> for PostgresValue {
    fn from(val: i64) -> Self {
        PostgresValue::Integer(val)
    }
}

impl From<i16> for PostgresValue {
    fn from(val: i16) -> Self {
        PostgresValue::Integer(val as i64)
    }
}

impl From<f64> for PostgresValue {
    fn from(val: f64) -> Self {
        PostgresValue::Float(val)
    }
}

impl From<bool> for PostgresValue {
    fn from(val: bool) -> Self {
        PostgresValue::Boolean(val)
    }
}

impl From<Vec<u8>> for PostgresValue {
    fn from(val: Vec<u8>) -> Self {
        PostgresValue::Bytes(val)
    }
}

impl From<&[u8]> for PostgresValue {
    fn from(val: &[u8]) -> Self {
        PostgresValue::Bytes(val.to_vec())
    }
}

impl From<Uuid> for PostgresValue {
    fn from(val: Uuid) -> Self {
        PostgresValue::Uuid(val)
    }
}

impl From<NaiveDate> for PostgresValue {
    fn from(val: NaiveDate) -> Self {
        PostgresValue::Date(val)
    }
}

impl From<NaiveTime> for PostgresValue {
    fn from(val: NaiveTime) -> Self {
        PostgresValue::Time(val)
    }
}

impl From<NaiveDateTime> for PostgresValue {
    fn from(val: NaiveDateTime) -> Self {
        PostgresValue::Timestamp(val)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for PostgresValue {
    fn from(val: chrono::DateTime<chrono::Utc>) -> Self {
        PostgresValue::Timestamp(val.naive_utc())
    }
}

impl From<serde_json::Value> for PostgresValue {
    fn from(val: serde_json::Value) -> Self {
        PostgresValue::Json(val)
    }
}

impl From<Record> for PostgresValue {
    fn from(val: Record) -> Self {
        PostgresValue::Record(val)
    }
}

impl<T> From<Option<T>> for PostgresValue
where
    T: Into<PostgresValue>,
{
    fn from(val: Option<T>) -> Self {
        match val {
            Some(v) => v.into(),
            None => PostgresValue::Null,
        }
    }
}
