//! SQL type name utilities
//!
//! This module classifies PostgreSQL type names as reported by the catalog
//! (`format_type`, `udt_name` or `information_schema` spellings).

use crate::types::TypeKind;

/// Normalize a type name for matching: lowercase, collapsed whitespace,
/// length/precision modifiers removed
fn normalize(pg_type: &str) -> String {
    let lower = pg_type.trim().to_lowercase();
    let without_modifier = match (lower.find('('), lower.rfind(')')) {
        (Some(open), Some(close)) if open < close => {
            format!("{}{}", &lower[..open], &lower[close + 1..])
        }
        _ => lower,
    };
    without_modifier.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Map a PostgreSQL type name to its scalar category.
///
/// Composite types cannot be recognized by name; the schema layer marks them.
pub fn pg_type_to_kind(pg_type: &str) -> TypeKind {
    let normalized = normalize(pg_type);
    match normalized.as_str() {
        "bool" | "boolean" => TypeKind::Boolean,
        "bit" | "varbit" | "bit varying" => TypeKind::Bit,
        "bytea" => TypeKind::Binary,
        "json" | "jsonb" => TypeKind::Json,
        "date" => TypeKind::Date,
        "time" | "timetz" | "time without time zone" | "time with time zone" => TypeKind::Time,
        "timestamp"
        | "timestamptz"
        | "timestamp without time zone"
        | "timestamp with time zone" => TypeKind::Timestamp,
        _ => TypeKind::Other(normalized),
    }
}

/// Split an array type name into its element type and dimension count.
///
/// `integer[][]` is `("integer", 2)`, `text[3]` is `("text", 1)`, and the
/// catalog's underscore form `_int4` is `("int4", 1)`.
pub fn parse_pg_array_type(pg_type: &str) -> (String, usize) {
    let mut base = pg_type.trim();
    let mut dimension = 0;

    while base.ends_with(']') {
        match base.rfind('[') {
            Some(open) if base[open + 1..base.len() - 1].chars().all(|c| c.is_ascii_digit()) => {
                base = base[..open].trim_end();
                dimension += 1;
            }
            _ => break,
        }
    }

    if dimension == 0 {
        if let Some(element) = base.strip_prefix('_') {
            if !element.is_empty() {
                return (element.to_string(), 1);
            }
        }
    }

    (base.to_string(), dimension)
}

/// Element delimiter PostgreSQL uses for arrays of the given type
pub fn default_delimiter(pg_type: &str) -> char {
    match normalize(pg_type).as_str() {
        "box" => ';',
        _ => ',',
    }
}

/// Check if a type name denotes an integer type
pub fn is_integer_type(pg_type: &str) -> bool {
    matches!(
        normalize(pg_type).as_str(),
        "int2"
            | "int4"
            | "int8"
            | "int"
            | "smallint"
            | "integer"
            | "bigint"
            | "smallserial"
            | "serial"
            | "bigserial"
            | "serial2"
            | "serial4"
            | "serial8"
            | "oid"
    )
}

/// Check if a type name denotes a binary floating-point type
pub fn is_float_type(pg_type: &str) -> bool {
    matches!(
        normalize(pg_type).as_str(),
        "float4" | "float8" | "real" | "double precision" | "float"
    )
}

/// Check if a type name denotes an arbitrary-precision numeric type
pub fn is_numeric_type(pg_type: &str) -> bool {
    matches!(normalize(pg_type).as_str(), "numeric" | "decimal" | "money")
}

/// Check if a type name denotes a uuid
pub fn is_uuid_type(pg_type: &str) -> bool {
    normalize(pg_type) == "uuid"
}
