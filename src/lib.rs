//! # pgtypecast
//!
//! Bidirectional conversion between application values and the text literals
//! PostgreSQL uses for scalars, arrays of any dimension and composite (row)
//! types.
//!
//! ## Quick Start
//!
//! ```rust
//! use pgtypecast::prelude::*;
//!
//! # fn main() -> Result<(), CodecError> {
//! let mut schema = Schema::new();
//! let int4 = schema.add(TypeDescriptor::from_pg_type("int4"))?;
//! let text = schema.add(TypeDescriptor::from_pg_type("text"))?;
//! let money = schema.add(
//!     TypeDescriptor::composite("money")
//!         .field("amount", int4)
//!         .field("currency", text),
//! )?;
//! schema.register_column("price", money)?;
//!
//! let codec = Codec::new(&schema);
//! let value = PostgresValue::Record(Record::new().with("amount", 10i64));
//! assert_eq!(codec.encode_column("price", &value)?.as_deref(), Some("(10,)"));
//!
//! let decoded = codec.decode_column("price", Some("(10,USD)"))?;
//! assert_eq!(
//!     decoded,
//!     PostgresValue::Record(Record::new().with("amount", 10i64).with("currency", "USD"))
//! );
//! # Ok(())
//! # }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod base;
pub mod core;
pub mod errors;
pub mod formatter;
pub mod literal;
pub mod materializer;
pub mod prelude;
pub mod scalar;
pub mod schema;

// Re-export the main public types for convenience
pub use core::Codec;
pub use errors::CodecError;
pub use schema::{CompositeTarget, DescriptorId, Schema, TypeDescriptor};

// Re-export centralized config
pub use config::{CodecConfig, ConfigError};

// Re-export the shared value model
pub use type_mapping;
