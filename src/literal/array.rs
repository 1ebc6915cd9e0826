//! Array literal grammar
//!
//! Parses and renders `{...}` literals of any depth, e.g. `{{1,2},{NULL,"a b"}}`.

use super::{needs_quotes, quote, Cursor};
use crate::errors::CodecError;

/// Structural form of an array literal
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayNode {
    /// Bare `NULL` element
    Null,
    /// Element text, quoted on render when required
    Item(String),
    /// Already-encoded literal, rendered verbatim
    Raw(String),
    Array(Vec<ArrayNode>),
}

/// Render a node as an array literal using `delimiter` between siblings
pub fn render(node: &ArrayNode, delimiter: char) -> String {
    let mut out = String::new();
    write_node(&mut out, node, delimiter);
    out
}

fn write_node(out: &mut String, node: &ArrayNode, delimiter: char) {
    match node {
        ArrayNode::Null => out.push_str("NULL"),
        ArrayNode::Item(value) => {
            if needs_quotes(value, &[delimiter, '{', '}']) {
                out.push_str(&quote(value));
            } else {
                out.push_str(value);
            }
        }
        ArrayNode::Raw(literal) => out.push_str(literal),
        ArrayNode::Array(items) => {
            out.push('{');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(delimiter);
                }
                write_node(out, item, delimiter);
            }
            out.push('}');
        }
    }
}

/// Parse an array literal into its structure.
///
/// An optional dimension-bounds prefix such as `[0:1]=` is accepted and
/// ignored. Nesting deeper than `max_depth` is rejected.
pub fn parse(input: &str, delimiter: char, max_depth: usize) -> Result<ArrayNode, CodecError> {
    let mut cursor = Cursor::new(input);
    cursor.skip_whitespace();
    skip_bounds(&mut cursor)?;

    let node = parse_array(&mut cursor, delimiter, 1, max_depth)?;
    cursor.expect_end("array literal")?;
    Ok(node)
}

fn skip_bounds(cursor: &mut Cursor<'_>) -> Result<(), CodecError> {
    if cursor.peek() != Some('[') {
        return Ok(());
    }

    while cursor.peek() == Some('[') {
        cursor.bump();
        loop {
            let pos = cursor.position();
            match cursor.bump() {
                Some(']') => break,
                Some(c) if c.is_ascii_digit() || c == ':' || c == '-' => {}
                Some(c) => {
                    return Err(CodecError::decode(
                        format!("unexpected character '{}' in dimension bounds", c),
                        pos,
                    ))
                }
                None => return Err(CodecError::decode("unterminated dimension bounds", pos)),
            }
        }
    }

    cursor.skip_whitespace();
    let pos = cursor.position();
    match cursor.bump() {
        Some('=') => {
            cursor.skip_whitespace();
            Ok(())
        }
        _ => Err(CodecError::decode("expected '=' after dimension bounds", pos)),
    }
}

fn parse_array(
    cursor: &mut Cursor<'_>,
    delimiter: char,
    depth: usize,
    max_depth: usize,
) -> Result<ArrayNode, CodecError> {
    let start = cursor.position();
    if depth > max_depth {
        return Err(CodecError::decode(
            format!("array nesting exceeds {} levels", max_depth),
            start,
        ));
    }
    if cursor.bump() != Some('{') {
        return Err(CodecError::decode("expected '{'", start));
    }

    let mut items = Vec::new();
    cursor.skip_whitespace();
    if cursor.peek() == Some('}') {
        cursor.bump();
        return Ok(ArrayNode::Array(items));
    }

    loop {
        cursor.skip_whitespace();
        let item = match cursor.peek() {
            Some('{') => parse_array(cursor, delimiter, depth + 1, max_depth)?,
            Some('"') => ArrayNode::Item(parse_quoted(cursor)?),
            Some(_) => parse_unquoted(cursor, delimiter)?,
            None => {
                return Err(CodecError::decode(
                    "unterminated array literal",
                    cursor.position(),
                ))
            }
        };
        items.push(item);

        cursor.skip_whitespace();
        let pos = cursor.position();
        match cursor.bump() {
            Some('}') => return Ok(ArrayNode::Array(items)),
            Some(c) if c == delimiter => {}
            Some(c) => {
                return Err(CodecError::decode(
                    format!("unexpected character '{}' in array literal", c),
                    pos,
                ))
            }
            None => return Err(CodecError::decode("unterminated array literal", pos)),
        }
    }
}

fn parse_quoted(cursor: &mut Cursor<'_>) -> Result<String, CodecError> {
    let start = cursor.position();
    cursor.bump();

    let mut value = String::new();
    loop {
        match cursor.bump() {
            Some('\\') => value.push(cursor.escaped()?),
            Some('"') => return Ok(value),
            Some(c) => value.push(c),
            None => return Err(CodecError::decode("unterminated quoted element", start)),
        }
    }
}

fn parse_unquoted(cursor: &mut Cursor<'_>, delimiter: char) -> Result<ArrayNode, CodecError> {
    let start = cursor.position();
    let mut value = String::new();
    // End of the last escaped character; trimming never reaches before it
    let mut escaped_end: Option<usize> = None;

    while let Some(c) = cursor.peek() {
        if c == delimiter || c == '}' {
            break;
        }
        match c {
            '{' | '"' => {
                return Err(CodecError::decode(
                    format!("unexpected character '{}' in unquoted element", c),
                    cursor.position(),
                ))
            }
            '\\' => {
                cursor.bump();
                value.push(cursor.escaped()?);
                escaped_end = Some(value.len());
            }
            _ => {
                cursor.bump();
                value.push(c);
            }
        }
    }

    let trimmed = value.trim_end().len().max(escaped_end.unwrap_or(0));
    value.truncate(trimmed);
    if escaped_end.is_none() {
        if value.is_empty() {
            return Err(CodecError::decode("empty unquoted element", start));
        }
        if value.eq_ignore_ascii_case("NULL") {
            return Ok(ArrayNode::Null);
        }
    }
    Ok(ArrayNode::Item(value))
}
