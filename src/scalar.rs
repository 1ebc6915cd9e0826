//! Scalar conversions with non-trivial textual forms
//!
//! Bit strings, `bytea` hex literals, JSON and boolean tokens. Temporal
//! values go through the injected formatter and every other type through the
//! base codec; see [`crate::core::Codec`].

use type_mapping::PostgresValue;

use crate::errors::CodecError;

/// Encode a bit-string column value as its binary digits
pub fn encode_bit(value: &PostgresValue) -> Result<String, CodecError> {
    match value {
        PostgresValue::Integer(i) => Ok(format!("{:b}", i)),
        PostgresValue::Boolean(b) => Ok(if *b { "1" } else { "0" }.to_string()),
        PostgresValue::Text(s) => Ok(s.clone()),
        other => Err(CodecError::UnsupportedType(format!(
            "cannot encode {:?} as bit",
            other
        ))),
    }
}

/// Decode a binary-digit string into an integer
pub fn decode_bit(literal: &str) -> Result<PostgresValue, CodecError> {
    if literal.is_empty() {
        return Ok(PostgresValue::Integer(0));
    }
    if literal.len() > 64 {
        return Err(CodecError::decode(
            format!("bit string of {} digits does not fit in 64 bits", literal.len()),
            0,
        ));
    }

    u64::from_str_radix(literal, 2)
        // 64-digit strings are the two's complement of a negative value
        .map(|bits| PostgresValue::Integer(bits as i64))
        .map_err(|e| CodecError::decode(format!("invalid bit string '{}': {}", literal, e), 0))
}

/// Encode bytes as a `\x` hex literal; any other value is passed through
/// as its plain text form
pub fn encode_binary(value: &PostgresValue) -> Result<String, CodecError> {
    match value {
        PostgresValue::Bytes(bytes) => Ok(format!("\\x{}", hex::encode(bytes))),
        other => passthrough_text(other),
    }
}

/// Decode a `\x` hex literal into bytes; other literals are kept as text
pub fn decode_binary(literal: &str) -> Result<PostgresValue, CodecError> {
    match literal.strip_prefix("\\x") {
        Some(digits) => hex::decode(digits)
            .map(PostgresValue::Bytes)
            .map_err(|e| CodecError::decode(format!("invalid bytea hex: {}", e), 2)),
        None => Ok(PostgresValue::Text(literal.to_string())),
    }
}

/// Serialize any value as JSON text
pub fn encode_json(value: &PostgresValue) -> Result<String, CodecError> {
    serde_json::to_string(&value.to_json())
        .map_err(|e| CodecError::Encode(format!("JSON serialization failed: {}", e)))
}

/// Parse JSON text
pub fn decode_json(literal: &str) -> Result<PostgresValue, CodecError> {
    serde_json::from_str(literal)
        .map(PostgresValue::Json)
        .map_err(|e| CodecError::decode(format!("invalid JSON: {}", e), e.column().saturating_sub(1)))
}

/// Decode a boolean token.
///
/// Unknown tokens fall back to truthiness (`""` and `"0"` are false) unless
/// `strict` is set.
pub fn decode_bool(literal: &str, strict: bool) -> Result<PostgresValue, CodecError> {
    match literal.to_lowercase().as_str() {
        "t" | "true" => Ok(PostgresValue::Boolean(true)),
        "f" | "false" => Ok(PostgresValue::Boolean(false)),
        _ if strict => Err(CodecError::decode(
            format!("invalid boolean literal '{}'", literal),
            0,
        )),
        _ => {
            crate::debug_log!("Boolean literal '{}' decoded by truthiness", literal);
            Ok(PostgresValue::Boolean(!literal.is_empty() && literal != "0"))
        }
    }
}

/// Plain text form of a scalar value
pub fn passthrough_text(value: &PostgresValue) -> Result<String, CodecError> {
    match value {
        PostgresValue::Text(s) => Ok(s.clone()),
        PostgresValue::Boolean(b) => Ok(if *b { "t" } else { "f" }.to_string()),
        PostgresValue::Integer(i) => Ok(i.to_string()),
        PostgresValue::Float(f) => Ok(format_float(*f)),
        PostgresValue::Bytes(bytes) => Ok(format!("\\x{}", hex::encode(bytes))),
        PostgresValue::Uuid(u) => Ok(u.hyphenated().to_string()),
        PostgresValue::Date(d) => Ok(d.format("%Y-%m-%d").to_string()),
        PostgresValue::Time(t) => Ok(t.format("%H:%M:%S%.f").to_string()),
        PostgresValue::Timestamp(ts) => Ok(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        PostgresValue::Json(v) => Ok(v.to_string()),
        PostgresValue::Null | PostgresValue::Array(_) | PostgresValue::Record(_) => {
            Err(CodecError::UnsupportedType(format!(
                "no scalar text form for {:?}",
                value
            )))
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f == f64::INFINITY {
        "Infinity".to_string()
    } else if f == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        f.to_string()
    }
}
