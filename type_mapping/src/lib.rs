//! Unified type mapping between Rust values and PostgreSQL column types
//! This crate provides the value model and type classification shared by the codec

pub mod serialize;
pub mod sql;
pub mod types;

// Re-export commonly used items
pub use serialize::{serialize_to_postgres_payload, serialize_to_postgres_record};
pub use sql::{
    default_delimiter, is_float_type, is_integer_type, is_numeric_type, is_uuid_type,
    parse_pg_array_type, pg_type_to_kind,
};
pub use types::{FieldKey, PostgresValue, Record, ToPostgresPayload, TypeKind};
