//! Column type descriptors
//!
//! Descriptors live in a [`Schema`] arena and reference the types of composite
//! fields by [`DescriptorId`], so a schema that refers to itself can be
//! represented without building an infinite value. Cycles are reported as
//! [`CodecError::UnsupportedType`] when they are looked up.

use std::collections::{HashMap, HashSet};

use type_mapping::{default_delimiter, parse_pg_array_type, pg_type_to_kind, TypeKind};

use crate::errors::CodecError;

/// Index of a descriptor inside a [`Schema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorId(usize);

impl DescriptorId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Native representation a decoded composite is materialized as
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CompositeTarget {
    /// Ordered field-name mapping
    #[default]
    Record,
    /// Untyped object (a JSON object)
    Object,
    /// Instance built by the factory registered under this name
    Instance(String),
}

/// Immutable description of one column type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name: String,
    pub kind: TypeKind,
    pub dimension: usize,
    pub delimiter: char,
    pub fields: Vec<(String, DescriptorId)>,
    pub target: CompositeTarget,
}

impl TypeDescriptor {
    /// Scalar descriptor of the given kind
    pub fn scalar(kind: TypeKind) -> Self {
        Self {
            name: kind.name().to_string(),
            kind,
            dimension: 0,
            delimiter: ',',
            fields: Vec::new(),
            target: CompositeTarget::Record,
        }
    }

    /// Descriptor for a PostgreSQL type name such as `int4`, `text[]` or `box[]`
    pub fn from_pg_type(pg_type: &str) -> Self {
        let (base, dimension) = parse_pg_array_type(pg_type);
        Self {
            name: base.clone(),
            kind: pg_type_to_kind(&base),
            dimension,
            delimiter: default_delimiter(&base),
            fields: Vec::new(),
            target: CompositeTarget::Record,
        }
    }

    /// Composite descriptor without fields; add them with [`TypeDescriptor::field`]
    pub fn composite(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: TypeKind::Composite,
            dimension: 0,
            delimiter: ',',
            fields: Vec::new(),
            target: CompositeTarget::Record,
        }
    }

    pub fn field(mut self, name: &str, id: DescriptorId) -> Self {
        self.fields.push((name.to_string(), id));
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_target(mut self, target: CompositeTarget) -> Self {
        self.target = target;
        self
    }

    pub fn is_array(&self) -> bool {
        self.dimension > 0
    }

    pub fn is_composite(&self) -> bool {
        self.kind == TypeKind::Composite
    }

    /// Declared type of a composite field
    pub fn field_type(&self, name: &str) -> Option<DescriptorId> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, id)| *id)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    fn validate(&self) -> Result<(), CodecError> {
        if self.is_composite() && self.fields.is_empty() {
            return Err(CodecError::InvalidDescriptor(format!(
                "composite type '{}' has no fields",
                self.name
            )));
        }
        if !self.is_composite() && !self.fields.is_empty() {
            return Err(CodecError::InvalidDescriptor(format!(
                "type '{}' declares fields but is not composite",
                self.name
            )));
        }
        if matches!(self.delimiter, '"' | '\\' | '{' | '}') || self.delimiter.is_whitespace() {
            return Err(CodecError::InvalidDescriptor(format!(
                "type '{}' uses invalid array delimiter {:?}",
                self.name, self.delimiter
            )));
        }
        let mut seen = Vec::with_capacity(self.fields.len());
        for (name, _) in &self.fields {
            if seen.contains(&name) {
                return Err(CodecError::InvalidDescriptor(format!(
                    "composite type '{}' declares field '{}' twice",
                    self.name, name
                )));
            }
            seen.push(name);
        }
        Ok(())
    }
}

/// Arena of type descriptors plus the column registry
#[derive(Debug, Default)]
pub struct Schema {
    descriptors: Vec<Option<TypeDescriptor>>,
    columns: HashMap<String, DescriptorId>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor and return its id
    pub fn add(&mut self, descriptor: TypeDescriptor) -> Result<DescriptorId, CodecError> {
        descriptor.validate()?;
        self.descriptors.push(Some(descriptor));
        Ok(DescriptorId(self.descriptors.len() - 1))
    }

    /// Reserve an id to be filled later with [`Schema::define`], so fields can
    /// reference a type before it is described
    pub fn reserve(&mut self) -> DescriptorId {
        self.descriptors.push(None);
        DescriptorId(self.descriptors.len() - 1)
    }

    /// Fill a reserved id
    pub fn define(&mut self, id: DescriptorId, descriptor: TypeDescriptor) -> Result<(), CodecError> {
        descriptor.validate()?;
        match self.descriptors.get_mut(id.0) {
            Some(slot @ None) => {
                *slot = Some(descriptor);
                Ok(())
            }
            Some(Some(existing)) => Err(CodecError::InvalidDescriptor(format!(
                "descriptor #{} is already defined as '{}'",
                id.0, existing.name
            ))),
            None => Err(CodecError::UnsupportedType(format!(
                "unknown descriptor #{}",
                id.0
            ))),
        }
    }

    /// Look up a descriptor
    pub fn get(&self, id: DescriptorId) -> Result<&TypeDescriptor, CodecError> {
        match self.descriptors.get(id.0) {
            Some(Some(descriptor)) => Ok(descriptor),
            Some(None) => Err(CodecError::UnsupportedType(format!(
                "descriptor #{} was reserved but never defined",
                id.0
            ))),
            None => Err(CodecError::UnsupportedType(format!(
                "unknown descriptor #{}",
                id.0
            ))),
        }
    }

    /// Fail if any composite reachable from `id` contains itself
    pub fn check_acyclic(&self, id: DescriptorId) -> Result<(), CodecError> {
        let mut path = Vec::new();
        let mut finished = HashSet::new();
        self.visit(id, &mut path, &mut finished)
    }

    /// Depth-first walk; `finished` holds ids whose whole subtree is cycle-free,
    /// so shared field types are walked once
    fn visit(
        &self,
        id: DescriptorId,
        path: &mut Vec<DescriptorId>,
        finished: &mut HashSet<DescriptorId>,
    ) -> Result<(), CodecError> {
        if finished.contains(&id) {
            return Ok(());
        }
        let descriptor = self.get(id)?;
        if path.contains(&id) {
            return Err(self.cycle_error(id, path));
        }

        path.push(id);
        for (_, field) in &descriptor.fields {
            self.visit(*field, path, finished)?;
        }
        path.pop();
        finished.insert(id);
        Ok(())
    }

    pub(crate) fn cycle_error(&self, id: DescriptorId, path: &[DescriptorId]) -> CodecError {
        let mut names: Vec<&str> = path
            .iter()
            .skip_while(|step| **step != id)
            .filter_map(|step| self.get(*step).ok().map(|d| d.name.as_str()))
            .collect();
        if let Ok(descriptor) = self.get(id) {
            names.push(&descriptor.name);
        }
        CodecError::UnsupportedType(format!("cyclic composite type: {}", names.join(" -> ")))
    }

    /// Register a column under a name
    pub fn register_column(&mut self, name: &str, id: DescriptorId) -> Result<(), CodecError> {
        if self.columns.contains_key(name) {
            return Err(CodecError::ColumnAlreadyRegistered(name.to_string()));
        }
        self.check_acyclic(id)?;

        crate::debug_log!("Registered column '{}' as descriptor #{}", name, id.0);
        self.columns.insert(name.to_string(), id);
        Ok(())
    }

    /// Get the descriptor id of a registered column
    pub fn column(&self, name: &str) -> Result<DescriptorId, CodecError> {
        self.columns
            .get(name)
            .copied()
            .ok_or_else(|| CodecError::ColumnNotFound(name.to_string()))
    }

    /// List all registered column names
    pub fn list_columns(&self) -> Vec<&String> {
        self.columns.keys().collect()
    }

    /// Remove a column registration
    pub fn unregister_column(&mut self, name: &str) -> Result<(), CodecError> {
        self.columns
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CodecError::ColumnNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pg_type() {
        let descriptor = TypeDescriptor::from_pg_type("integer[][]");
        assert_eq!(descriptor.kind, TypeKind::Other("integer".to_string()));
        assert_eq!(descriptor.dimension, 2);
        assert_eq!(descriptor.delimiter, ',');

        let descriptor = TypeDescriptor::from_pg_type("box[]");
        assert_eq!(descriptor.delimiter, ';');
        assert_eq!(descriptor.dimension, 1);

        let descriptor = TypeDescriptor::from_pg_type("jsonb");
        assert_eq!(descriptor.kind, TypeKind::Json);
        assert!(!descriptor.is_array());
    }

    #[test]
    fn test_composite_requires_fields() {
        let mut schema = Schema::new();
        let result = schema.add(TypeDescriptor::composite("money"));
        assert!(matches!(result, Err(CodecError::InvalidDescriptor(_))));
    }

    #[test]
    fn test_scalar_rejects_fields() {
        let mut schema = Schema::new();
        let int = schema.add(TypeDescriptor::from_pg_type("int4")).unwrap();
        let result = schema.add(TypeDescriptor::scalar(TypeKind::Json).field("x", int));
        assert!(matches!(result, Err(CodecError::InvalidDescriptor(_))));
    }

    #[test]
    fn test_invalid_delimiter_and_duplicate_fields() {
        let mut schema = Schema::new();
        let int = schema.add(TypeDescriptor::from_pg_type("int4")).unwrap();

        let result = schema.add(TypeDescriptor::from_pg_type("int4[]").with_delimiter('"'));
        assert!(matches!(result, Err(CodecError::InvalidDescriptor(_))));

        let result = schema.add(
            TypeDescriptor::composite("pair")
                .field("a", int)
                .field("a", int),
        );
        assert!(matches!(result, Err(CodecError::InvalidDescriptor(_))));
    }

    #[test]
    fn test_unknown_and_reserved_ids() {
        let mut schema = Schema::new();
        let reserved = schema.reserve();

        assert!(matches!(schema.get(reserved), Err(CodecError::UnsupportedType(_))));
        assert!(matches!(
            schema.get(DescriptorId(42)),
            Err(CodecError::UnsupportedType(_))
        ));

        schema
            .define(reserved, TypeDescriptor::from_pg_type("text"))
            .unwrap();
        assert_eq!(schema.get(reserved).unwrap().name, "text");

        let again = schema.define(reserved, TypeDescriptor::from_pg_type("text"));
        assert!(matches!(again, Err(CodecError::InvalidDescriptor(_))));
    }

    #[test]
    fn test_cycle_detected() {
        let mut schema = Schema::new();
        let int = schema.add(TypeDescriptor::from_pg_type("int4")).unwrap();
        let node = schema.reserve();
        let children = schema
            .add(TypeDescriptor::composite("node").field("id", int).field("child", node).with_dimension(1))
            .unwrap();
        schema
            .define(
                node,
                TypeDescriptor::composite("node")
                    .field("id", int)
                    .field("children", children),
            )
            .unwrap();

        match schema.check_acyclic(node) {
            Err(CodecError::UnsupportedType(message)) => {
                assert!(message.contains("cyclic"), "Unexpected message: {}", message);
            }
            other => panic!("Expected cycle error, got {:?}", other),
        }

        let result = schema.register_column("tree", node);
        assert!(matches!(result, Err(CodecError::UnsupportedType(_))));
    }

    #[test]
    fn test_shared_field_types_are_walked_once() {
        let mut schema = Schema::new();
        let mut level = schema.add(TypeDescriptor::from_pg_type("int4")).unwrap();
        // Each level references the one below twice: 2^64 paths, 65 descriptors
        for depth in 0..64 {
            level = schema
                .add(
                    TypeDescriptor::composite(&format!("level{}", depth))
                        .field("left", level)
                        .field("right", level),
                )
                .unwrap();
        }

        assert!(schema.check_acyclic(level).is_ok());
        assert!(schema.register_column("deep", level).is_ok());
    }

    #[test]
    fn test_column_registry() {
        let mut schema = Schema::new();
        let int = schema.add(TypeDescriptor::from_pg_type("int4")).unwrap();

        schema.register_column("amount", int).unwrap();
        assert_eq!(schema.column("amount").unwrap(), int);
        assert_eq!(schema.list_columns(), vec![&"amount".to_string()]);

        assert!(matches!(
            schema.register_column("amount", int),
            Err(CodecError::ColumnAlreadyRegistered(_))
        ));

        schema.unregister_column("amount").unwrap();
        assert!(matches!(
            schema.column("amount"),
            Err(CodecError::ColumnNotFound(_))
        ));
    }
}
