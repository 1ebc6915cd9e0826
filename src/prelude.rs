//! Convenience re-exports for common pgtypecast usage
//!
//! # Example
//!
//! ```rust
//! use pgtypecast::prelude::*;
//!
//! let schema = Schema::new();
//! let codec = Codec::new(&schema);
//! assert!(codec.schema().list_columns().is_empty());
//! ```

// Core codec components
pub use crate::core::Codec;
pub use crate::errors::CodecError;
pub use crate::schema::{CompositeTarget, DescriptorId, Schema, TypeDescriptor};

// Injectable collaborators
pub use crate::base::{BaseCodec, DefaultBaseCodec};
pub use crate::formatter::{ChronoFormatter, DateTimeFormatter};
pub use crate::materializer::{CompositeMaterializer, DefaultMaterializer, ObjectFactory};

// Re-export centralized config
pub use config::{CodecConfig, ConfigError};

// Value model
pub use type_mapping::{FieldKey, PostgresValue, Record, ToPostgresPayload, TypeKind};
