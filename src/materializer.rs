//! Composite materialization
//!
//! Turns the field mapping decoded from a row literal into the native value
//! the column's [`CompositeTarget`] asks for.

use std::collections::HashMap;
use std::sync::Arc;

use type_mapping::{PostgresValue, Record};

use crate::errors::CodecError;
use crate::schema::CompositeTarget;

/// Factory constructing an instance from decoded composite fields
pub type ObjectFactory = Arc<dyn Fn(Record) -> Result<PostgresValue, CodecError> + Send + Sync>;

/// Produces the final value of a decoded composite
pub trait CompositeMaterializer: Send + Sync {
    fn materialize(&self, target: &CompositeTarget, fields: Record) -> Result<PostgresValue, CodecError>;
}

/// Materializer with a registry of named instance factories
#[derive(Clone, Default)]
pub struct DefaultMaterializer {
    factories: HashMap<String, ObjectFactory>,
}

impl std::fmt::Debug for DefaultMaterializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultMaterializer")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DefaultMaterializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for [`CompositeTarget::Instance`] with this name
    pub fn register_factory<F>(&mut self, type_name: &str, factory: F)
    where
        F: Fn(Record) -> Result<PostgresValue, CodecError> + Send + Sync + 'static,
    {
        self.factories.insert(type_name.to_string(), Arc::new(factory));
    }

    pub fn with_factory<F>(mut self, type_name: &str, factory: F) -> Self
    where
        F: Fn(Record) -> Result<PostgresValue, CodecError> + Send + Sync + 'static,
    {
        self.register_factory(type_name, factory);
        self
    }

    pub fn has_factory(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }
}

impl CompositeMaterializer for DefaultMaterializer {
    fn materialize(&self, target: &CompositeTarget, fields: Record) -> Result<PostgresValue, CodecError> {
        match target {
            CompositeTarget::Record => Ok(PostgresValue::Record(fields)),
            CompositeTarget::Object => Ok(PostgresValue::Json(PostgresValue::Record(fields).to_json())),
            CompositeTarget::Instance(type_name) => {
                let factory = self.factories.get(type_name).ok_or_else(|| {
                    CodecError::UnsupportedType(format!(
                        "no factory registered for composite type '{}'",
                        type_name
                    ))
                })?;
                factory(fields)
            }
        }
    }
}
