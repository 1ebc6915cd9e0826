//! Core typecasting functionality
//!
//! This module contains the [`Codec`], which converts values between their
//! application-side form and PostgreSQL literals for a column described in a
//! [`Schema`]. Arrays recurse per dimension, composites recurse per field, and
//! scalars dispatch on the column's [`TypeKind`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use type_mapping::{
    serialize_to_postgres_record, FieldKey, PostgresValue, Record, ToPostgresPayload, TypeKind,
};

use crate::base::{BaseCodec, DefaultBaseCodec};
use crate::errors::CodecError;
use crate::formatter::{
    ChronoFormatter, DateTimeFormatter, DATETIME_PATTERN, DATE_PATTERN, TIME_PATTERN,
};
use crate::literal::{self, ArrayNode};
use crate::materializer::{CompositeMaterializer, DefaultMaterializer};
use crate::scalar;
use crate::schema::{DescriptorId, Schema, TypeDescriptor};
use config::CodecConfig;

/// Composite ids entered on the way down; guards against cyclic schemas
type Path = Vec<DescriptorId>;

/// Encoder/decoder for the columns of a [`Schema`]
pub struct Codec<'s> {
    schema: &'s Schema,
    config: CodecConfig,
    base: Box<dyn BaseCodec>,
    formatter: Box<dyn DateTimeFormatter>,
    materializer: Box<dyn CompositeMaterializer>,
}

impl std::fmt::Debug for Codec<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("schema", &self.schema)
            .field("config", &self.config)
            .finish()
    }
}

impl<'s> Codec<'s> {
    /// Create a codec with the default collaborators and lenient configuration
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            config: CodecConfig::default(),
            base: Box::new(DefaultBaseCodec),
            formatter: Box::new(ChronoFormatter),
            materializer: Box::new(DefaultMaterializer::new()),
        }
    }

    /// Replace the configuration after validating it
    pub fn with_config(mut self, config: CodecConfig) -> Result<Self, CodecError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn with_base_codec(mut self, base: impl BaseCodec + 'static) -> Self {
        self.base = Box::new(base);
        self
    }

    pub fn with_formatter(mut self, formatter: impl DateTimeFormatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn with_materializer(mut self, materializer: impl CompositeMaterializer + 'static) -> Self {
        self.materializer = Box::new(materializer);
        self
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode a value for the column type `column`.
    ///
    /// Returns `None` for SQL NULL.
    pub fn encode(
        &self,
        value: &PostgresValue,
        column: DescriptorId,
    ) -> Result<Option<String>, CodecError> {
        crate::trace_log!("Encoding {:?} as descriptor #{}", value, column.index());
        self.encode_typed(value, column, &mut Path::new())
    }

    /// Decode a literal returned by PostgreSQL; `None` is SQL NULL
    pub fn decode(
        &self,
        literal: Option<&str>,
        column: DescriptorId,
    ) -> Result<PostgresValue, CodecError> {
        crate::trace_log!("Decoding {:?} as descriptor #{}", literal, column.index());
        self.decode_typed(literal, column, &mut Path::new())
    }

    /// Encode a value for a registered column
    pub fn encode_column(
        &self,
        name: &str,
        value: &PostgresValue,
    ) -> Result<Option<String>, CodecError> {
        self.encode(value, self.schema.column(name)?)
    }

    /// Decode a literal of a registered column
    pub fn decode_column(
        &self,
        name: &str,
        literal: Option<&str>,
    ) -> Result<PostgresValue, CodecError> {
        self.decode(literal, self.schema.column(name)?)
    }

    /// Encode an object through its exported composite mapping
    pub fn encode_object<T: ToPostgresPayload>(
        &self,
        object: &T,
        column: DescriptorId,
    ) -> Result<Option<String>, CodecError> {
        self.encode(&PostgresValue::Record(object.to_postgres_payload()), column)
    }

    /// Encode any serializable value.
    ///
    /// A plain composite column takes the value as a record; other columns
    /// take its structural JSON form.
    pub fn encode_serialized<T: Serialize>(
        &self,
        data: &T,
        column: DescriptorId,
    ) -> Result<Option<String>, CodecError> {
        let descriptor = self.schema.get(column)?;
        let value = if descriptor.is_composite() && !descriptor.is_array() {
            serialize_to_postgres_record(data)
        } else {
            serde_json::to_value(data).map(PostgresValue::from_json)
        }
        .map_err(|e| CodecError::Encode(format!("serialization failed: {}", e)))?;
        self.encode(&value, column)
    }

    /// Decode a literal and construct a typed instance from it
    pub fn decode_into<T: DeserializeOwned>(
        &self,
        literal: Option<&str>,
        column: DescriptorId,
    ) -> Result<T, CodecError> {
        let value = self.decode(literal, column)?;
        serde_json::from_value(value.to_json())
            .map_err(|e| CodecError::Materialize(format!("cannot construct instance: {}", e)))
    }

    fn encode_typed(
        &self,
        value: &PostgresValue,
        id: DescriptorId,
        path: &mut Path,
    ) -> Result<Option<String>, CodecError> {
        if value.is_null() {
            return Ok(None);
        }

        let descriptor = self.schema.get(id)?;
        if !descriptor.is_array() {
            return self.encode_scalar(value, id, descriptor, path).map(Some);
        }

        match value {
            PostgresValue::Array(items) => {
                let node = self.encode_array(items, id, descriptor, descriptor.dimension - 1, path)?;
                Ok(Some(literal::array::render(&node, descriptor.delimiter)))
            }
            // Already an encoded literal
            PostgresValue::Text(literal) => Ok(Some(literal.clone())),
            other => self.encode_scalar(other, id, descriptor, path).map(Some),
        }
    }

    fn encode_array(
        &self,
        items: &[PostgresValue],
        id: DescriptorId,
        descriptor: &TypeDescriptor,
        remaining: usize,
        path: &mut Path,
    ) -> Result<ArrayNode, CodecError> {
        let mut nodes = Vec::with_capacity(items.len());
        for item in items {
            let node = match item {
                PostgresValue::Null => ArrayNode::Null,
                PostgresValue::Array(inner) if remaining > 0 => {
                    self.encode_array(inner, id, descriptor, remaining - 1, path)?
                }
                PostgresValue::Text(literal) if remaining > 0 => ArrayNode::Raw(literal.clone()),
                // Composites and JSON consume sequences themselves; anything
                // else nested deeper than declared stays an array
                PostgresValue::Array(inner)
                    if !matches!(descriptor.kind, TypeKind::Composite | TypeKind::Json) =>
                {
                    self.encode_array(inner, id, descriptor, 0, path)?
                }
                other => ArrayNode::Item(self.encode_scalar(other, id, descriptor, path)?),
            };
            nodes.push(node);
        }
        Ok(ArrayNode::Array(nodes))
    }

    fn encode_scalar(
        &self,
        value: &PostgresValue,
        id: DescriptorId,
        descriptor: &TypeDescriptor,
        path: &mut Path,
    ) -> Result<String, CodecError> {
        match &descriptor.kind {
            TypeKind::Bit => scalar::encode_bit(value),
            TypeKind::Binary => scalar::encode_binary(value),
            TypeKind::Json => scalar::encode_json(value),
            TypeKind::Timestamp => self.format_temporal(value, DATETIME_PATTERN),
            TypeKind::Date => self.format_temporal(value, DATE_PATTERN),
            TypeKind::Time => self.format_temporal(value, TIME_PATTERN),
            TypeKind::Composite => self.encode_composite(value, id, descriptor, path),
            TypeKind::Boolean | TypeKind::Other(_) => self.base.encode(descriptor, value),
        }
    }

    fn format_temporal(&self, value: &PostgresValue, pattern: &str) -> Result<String, CodecError> {
        match (self.formatter.format(value, pattern), value) {
            // Special values such as 'infinity' are sent as written
            (Err(_), PostgresValue::Text(text)) => {
                crate::debug_log!("Passing unformattable temporal text '{}' through", text);
                Ok(text.clone())
            }
            (result, _) => result,
        }
    }

    fn encode_composite(
        &self,
        value: &PostgresValue,
        id: DescriptorId,
        descriptor: &TypeDescriptor,
        path: &mut Path,
    ) -> Result<String, CodecError> {
        let record = match value {
            PostgresValue::Text(literal) if is_row_literal(literal) => return Ok(literal.clone()),
            other => to_composite_record(other),
        };
        let record = reconcile_fields(record, descriptor);

        self.enter(id, path)?;
        let mut fields = Vec::with_capacity(record.len());
        for (key, field_value) in record.iter() {
            let field_type = match key {
                FieldKey::Index(i) => descriptor.fields.get(*i).map(|(_, field)| *field),
                FieldKey::Name(name) => descriptor.field_type(name),
            };
            let encoded = match field_type {
                Some(field) => self.encode_typed(field_value, field, path)?,
                None if field_value.is_null() => None,
                None => Some(scalar::passthrough_text(field_value)?),
            };
            fields.push(encoded);
        }
        path.pop();

        Ok(literal::composite::render(&fields))
    }

    fn decode_typed(
        &self,
        literal: Option<&str>,
        id: DescriptorId,
        path: &mut Path,
    ) -> Result<PostgresValue, CodecError> {
        let Some(text) = literal else {
            return Ok(PostgresValue::Null);
        };

        let descriptor = self.schema.get(id)?;
        if !descriptor.is_array() {
            return self.decode_scalar(text, id, descriptor, path);
        }

        let node = literal::array::parse(text, descriptor.delimiter, self.config.max_nesting_depth)?;
        self.decode_node(node, id, descriptor, path)
    }

    /// Map scalar decoding over every leaf of a parsed array, whatever its depth
    fn decode_node(
        &self,
        node: ArrayNode,
        id: DescriptorId,
        descriptor: &TypeDescriptor,
        path: &mut Path,
    ) -> Result<PostgresValue, CodecError> {
        match node {
            ArrayNode::Null => Ok(PostgresValue::Null),
            ArrayNode::Item(text) | ArrayNode::Raw(text) => {
                self.decode_scalar(&text, id, descriptor, path)
            }
            ArrayNode::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.decode_node(item, id, descriptor, path)?);
                }
                Ok(PostgresValue::Array(values))
            }
        }
    }

    fn decode_scalar(
        &self,
        literal: &str,
        id: DescriptorId,
        descriptor: &TypeDescriptor,
        path: &mut Path,
    ) -> Result<PostgresValue, CodecError> {
        match &descriptor.kind {
            TypeKind::Boolean => scalar::decode_bool(literal, self.config.strict_booleans),
            TypeKind::Bit => scalar::decode_bit(literal),
            TypeKind::Binary => scalar::decode_binary(literal),
            TypeKind::Json => scalar::decode_json(literal),
            TypeKind::Composite => self.decode_composite(literal, id, descriptor, path),
            TypeKind::Date | TypeKind::Time | TypeKind::Timestamp | TypeKind::Other(_) => {
                self.base.decode(descriptor, literal)
            }
        }
    }

    fn decode_composite(
        &self,
        literal: &str,
        id: DescriptorId,
        descriptor: &TypeDescriptor,
        path: &mut Path,
    ) -> Result<PostgresValue, CodecError> {
        let elements = literal::composite::parse(literal)?;
        if elements.len() != descriptor.fields.len() {
            if self.config.strict_composite_arity {
                return Err(CodecError::decode(
                    format!(
                        "composite type '{}' has {} fields but the literal has {}",
                        descriptor.name,
                        descriptor.fields.len(),
                        elements.len()
                    ),
                    0,
                ));
            }
            crate::debug_log!(
                "Composite '{}' literal has {} fields, expected {}; missing fields are NULL",
                descriptor.name,
                elements.len(),
                descriptor.fields.len()
            );
        }

        self.enter(id, path)?;
        let mut record = Record::new();
        for (i, (name, field)) in descriptor.fields.iter().enumerate() {
            let value = match elements.get(i) {
                Some(element) => self.decode_typed(element.as_deref(), *field, path)?,
                None => PostgresValue::Null,
            };
            record.insert(name.as_str(), value);
        }
        path.pop();

        self.materializer.materialize(&descriptor.target, record)
    }

    fn enter(&self, id: DescriptorId, path: &mut Path) -> Result<(), CodecError> {
        if path.contains(&id) {
            return Err(self.schema.cycle_error(id, path));
        }
        path.push(id);
        Ok(())
    }
}

fn is_row_literal(text: &str) -> bool {
    let text = text.trim();
    text.starts_with('(') && text.ends_with(')')
}

/// Generic coercion of a value to a composite mapping
fn to_composite_record(value: &PostgresValue) -> Record {
    match value {
        PostgresValue::Record(record) => record.clone(),
        PostgresValue::Array(items) => Record::positional(items.clone()),
        PostgresValue::Json(json @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
            match PostgresValue::from_json(json.clone()) {
                PostgresValue::Record(record) => record,
                PostgresValue::Array(items) => Record::positional(items),
                other => Record::positional(vec![other]),
            }
        }
        other => Record::positional(vec![other.clone()]),
    }
}

/// Reorder a named mapping to the declared field order, filling absent
/// fields with NULL. Purely positional mappings are kept as they are.
fn reconcile_fields(record: Record, descriptor: &TypeDescriptor) -> Record {
    let declared: Vec<&str> = descriptor.field_names().collect();
    let in_declared_order = record.len() == declared.len()
        && record
            .keys()
            .zip(&declared)
            .all(|(key, name)| key.as_name() == Some(*name));

    if in_declared_order || !record.has_named_keys() {
        return record;
    }

    crate::debug_log!(
        "Reordering composite value to the declared fields of '{}'",
        descriptor.name
    );
    declared
        .iter()
        .map(|name| {
            let value = record.field(name).cloned().unwrap_or(PostgresValue::Null);
            (name.to_string(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CompositeTarget;

    struct Fixture {
        schema: Schema,
        money: DescriptorId,
        money_array: DescriptorId,
        int_array: DescriptorId,
    }

    fn fixture() -> Fixture {
        let mut schema = Schema::new();
        let int = schema.add(TypeDescriptor::from_pg_type("int4")).unwrap();
        let text = schema.add(TypeDescriptor::from_pg_type("text")).unwrap();
        let money = schema
            .add(
                TypeDescriptor::composite("money")
                    .field("amount", int)
                    .field("currency", text),
            )
            .unwrap();
        let money_array = schema
            .add(
                TypeDescriptor::composite("money")
                    .field("amount", int)
                    .field("currency", text)
                    .with_dimension(1),
            )
            .unwrap();
        let int_array = schema.add(TypeDescriptor::from_pg_type("int4[]")).unwrap();
        Fixture {
            schema,
            money,
            money_array,
            int_array,
        }
    }

    #[test]
    fn test_reconcile_keeps_declared_order() {
        let f = fixture();
        let descriptor = f.schema.get(f.money).unwrap();
        let record = Record::new().with("amount", 1i64).with("currency", "EUR");
        assert_eq!(reconcile_fields(record.clone(), descriptor), record);
    }

    #[test]
    fn test_reconcile_reorders_and_fills() {
        let f = fixture();
        let descriptor = f.schema.get(f.money).unwrap();

        let record = Record::new().with("currency", "EUR").with("extra", true);
        let reconciled = reconcile_fields(record, descriptor);
        let keys: Vec<_> = reconciled.keys().cloned().collect();
        assert_eq!(keys, vec![FieldKey::from("amount"), FieldKey::from("currency")]);
        assert_eq!(reconciled.field("amount"), Some(&PostgresValue::Null));
        assert_eq!(reconciled.field("currency"), Some(&PostgresValue::from("EUR")));
    }

    #[test]
    fn test_positional_record_untouched() {
        let f = fixture();
        let descriptor = f.schema.get(f.money).unwrap();
        let record = Record::positional(vec![PostgresValue::Integer(5)]);
        assert_eq!(reconcile_fields(record.clone(), descriptor), record);
    }

    #[test]
    fn test_encode_positional_composite() {
        let f = fixture();
        let codec = Codec::new(&f.schema);
        let value = PostgresValue::Array(vec![PostgresValue::Integer(5), "USD".into()]);
        assert_eq!(codec.encode(&value, f.money).unwrap().as_deref(), Some("(5,USD)"));
    }

    #[test]
    fn test_encode_row_literal_passthrough() {
        let f = fixture();
        let codec = Codec::new(&f.schema);
        let value = PostgresValue::Text("(1,EUR)".to_string());
        assert_eq!(codec.encode(&value, f.money).unwrap().as_deref(), Some("(1,EUR)"));
    }

    #[test]
    fn test_encode_array_literal_passthrough() {
        let f = fixture();
        let codec = Codec::new(&f.schema);
        let value = PostgresValue::Text("{1,2}".to_string());
        assert_eq!(codec.encode(&value, f.int_array).unwrap().as_deref(), Some("{1,2}"));
    }

    #[test]
    fn test_composite_array() {
        let f = fixture();
        let codec = Codec::new(&f.schema);
        let value = PostgresValue::Array(vec![
            PostgresValue::Record(Record::new().with("amount", 10i64).with("currency", "USD")),
            PostgresValue::Null,
            PostgresValue::Record(Record::new().with("amount", 20i64)),
        ]);

        let encoded = codec.encode(&value, f.money_array).unwrap().unwrap();
        assert_eq!(encoded, r#"{"(10,USD)",NULL,"(20,)"}"#);

        let decoded = codec.decode(Some(&encoded), f.money_array).unwrap();
        assert_eq!(
            decoded,
            PostgresValue::Array(vec![
                PostgresValue::Record(Record::new().with("amount", 10i64).with("currency", "USD")),
                PostgresValue::Null,
                PostgresValue::Record(
                    Record::new()
                        .with("amount", 20i64)
                        .with("currency", PostgresValue::Null)
                ),
            ])
        );
    }

    #[test]
    fn test_object_target() {
        let mut schema = Schema::new();
        let int = schema.add(TypeDescriptor::from_pg_type("int4")).unwrap();
        let point = schema
            .add(
                TypeDescriptor::composite("point2")
                    .field("x", int)
                    .field("y", int)
                    .with_target(CompositeTarget::Object),
            )
            .unwrap();

        let codec = Codec::new(&schema);
        assert_eq!(
            codec.decode(Some("(1,2)"), point).unwrap(),
            PostgresValue::Json(serde_json::json!({"x": 1, "y": 2}))
        );
    }

    #[test]
    fn test_with_config_validates() {
        let f = fixture();
        let result = Codec::new(&f.schema).with_config(CodecConfig::new(false, false, 0));
        assert!(matches!(result, Err(CodecError::Config(_))));
    }
}
