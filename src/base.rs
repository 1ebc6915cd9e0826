//! Fallback conversion for types without a special textual form
//!
//! The codec hands integers, floats, text, uuids and decoding of temporal
//! values to a [`BaseCodec`]. The schema layer may inject its own; the
//! [`DefaultBaseCodec`] covers the built-in PostgreSQL types.

use type_mapping::{is_float_type, is_integer_type, is_uuid_type, PostgresValue, TypeKind};
use uuid::Uuid;

use crate::errors::CodecError;
use crate::formatter::{parse_date, parse_time, parse_timestamp};
use crate::scalar;
use crate::schema::TypeDescriptor;

/// Base scalar conversion for kinds the codec does not special-case
pub trait BaseCodec: Send + Sync {
    fn encode(&self, descriptor: &TypeDescriptor, value: &PostgresValue) -> Result<String, CodecError>;

    fn decode(&self, descriptor: &TypeDescriptor, literal: &str) -> Result<PostgresValue, CodecError>;
}

/// Conversion of the built-in PostgreSQL scalar types
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBaseCodec;

impl BaseCodec for DefaultBaseCodec {
    fn encode(&self, descriptor: &TypeDescriptor, value: &PostgresValue) -> Result<String, CodecError> {
        scalar::passthrough_text(value).map_err(|_| {
            CodecError::UnsupportedType(format!(
                "cannot encode {:?} as {}",
                value, descriptor.name
            ))
        })
    }

    fn decode(&self, descriptor: &TypeDescriptor, literal: &str) -> Result<PostgresValue, CodecError> {
        match &descriptor.kind {
            TypeKind::Boolean => scalar::decode_bool(literal, false),
            // Unparseable temporal text such as 'infinity' stays text
            TypeKind::Date => Ok(parse_date(literal)
                .map(PostgresValue::Date)
                .unwrap_or_else(|| PostgresValue::Text(literal.to_string()))),
            TypeKind::Time => Ok(parse_time(literal)
                .map(PostgresValue::Time)
                .unwrap_or_else(|| PostgresValue::Text(literal.to_string()))),
            TypeKind::Timestamp => Ok(parse_timestamp(literal)
                .map(PostgresValue::Timestamp)
                .unwrap_or_else(|| PostgresValue::Text(literal.to_string()))),
            TypeKind::Other(name) if is_integer_type(name) => literal
                .trim()
                .parse::<i64>()
                .map(PostgresValue::Integer)
                .map_err(|e| {
                    CodecError::decode(format!("invalid {} '{}': {}", name, literal, e), 0)
                }),
            TypeKind::Other(name) if is_float_type(name) => literal
                .trim()
                .parse::<f64>()
                .map(PostgresValue::Float)
                .map_err(|e| {
                    CodecError::decode(format!("invalid {} '{}': {}", name, literal, e), 0)
                }),
            TypeKind::Other(name) if is_uuid_type(name) => Uuid::parse_str(literal.trim())
                .map(PostgresValue::Uuid)
                .map_err(|e| CodecError::decode(format!("invalid uuid '{}': {}", literal, e), 0)),
            // numeric stays text to keep its precision
            TypeKind::Other(_) => Ok(PostgresValue::Text(literal.to_string())),
            TypeKind::Bit | TypeKind::Binary | TypeKind::Json | TypeKind::Composite => {
                Err(CodecError::UnsupportedType(format!(
                    "base codec has no conversion for {}",
                    descriptor.kind.name()
                )))
            }
        }
    }
}
