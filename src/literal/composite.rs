//! Row (composite) literal grammar
//!
//! Fields are always separated by `,`. An unquoted empty field is NULL while a
//! quoted empty field `""` is the empty string.

use super::{needs_quotes, quote, Cursor};
use crate::errors::CodecError;

/// Render encoded field texts as a row literal; `None` is a NULL field
pub fn render(fields: &[Option<String>]) -> String {
    let rendered: Vec<String> = fields
        .iter()
        .map(|field| match field {
            None => String::new(),
            Some(value) if needs_quotes(value, &[',', '(', ')']) => quote(value),
            Some(value) => value.clone(),
        })
        .collect();
    format!("({})", rendered.join(","))
}

/// Split a row literal into its field texts.
///
/// Both `\"` and `""` are accepted as an escaped quote inside a quoted
/// section. Unquoted whitespace is significant and kept.
pub fn parse(input: &str) -> Result<Vec<Option<String>>, CodecError> {
    let mut cursor = Cursor::new(input);
    cursor.skip_whitespace();

    let start = cursor.position();
    if cursor.bump() != Some('(') {
        return Err(CodecError::decode("expected '('", start));
    }

    let mut fields = Vec::new();
    let mut value = String::new();
    let mut present = false;

    loop {
        let pos = cursor.position();
        match cursor.bump() {
            Some('"') => {
                present = true;
                read_quoted(&mut cursor, &mut value, pos)?;
            }
            Some('\\') => {
                present = true;
                value.push(cursor.escaped()?);
            }
            Some(',') => {
                fields.push(take_field(&mut value, &mut present));
            }
            Some(')') => {
                fields.push(take_field(&mut value, &mut present));
                break;
            }
            Some(c) => {
                present = true;
                value.push(c);
            }
            None => return Err(CodecError::decode("unterminated row literal", start)),
        }
    }

    cursor.expect_end("row literal")?;
    Ok(fields)
}

fn take_field(value: &mut String, present: &mut bool) -> Option<String> {
    let field = if *present {
        Some(std::mem::take(value))
    } else {
        None
    };
    *present = false;
    field
}

fn read_quoted(cursor: &mut Cursor<'_>, value: &mut String, start: usize) -> Result<(), CodecError> {
    loop {
        match cursor.bump() {
            Some('"') => {
                if cursor.peek() == Some('"') {
                    cursor.bump();
                    value.push('"');
                } else {
                    return Ok(());
                }
            }
            Some('\\') => value.push(cursor.escaped()?),
            Some(c) => value.push(c),
            None => return Err(CodecError::decode("unterminated quoted field", start)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_render_nulls_and_empty_strings() {
        assert_eq!(render(&[some("10"), None]), "(10,)");
        assert_eq!(render(&[some(""), None]), r#"("",)"#);
        assert_eq!(render(&[None]), "()");
    }

    #[test]
    fn test_render_quotes_nested_literals() {
        assert_eq!(
            render(&[some("{1,2}"), some("(3,\"x y\")")]),
            r#"("{1,2}","(3,\"x y\")")"#
        );
    }

    #[test]
    fn test_parse_basic() {
        assert_eq!(parse(r#"(10,"USD")"#).unwrap(), vec![some("10"), some("USD")]);
        assert_eq!(parse("(10,)").unwrap(), vec![some("10"), None]);
        assert_eq!(parse(r#"(,"")"#).unwrap(), vec![None, some("")]);
        assert_eq!(parse("()").unwrap(), vec![None]);
    }

    #[test]
    fn test_parse_doubled_and_backslash_quotes() {
        assert_eq!(
            parse(r#"("say ""hi""","a\"b")"#).unwrap(),
            vec![some("say \"hi\""), some("a\"b")]
        );
    }

    #[test]
    fn test_parse_keeps_unquoted_whitespace() {
        assert_eq!(parse("( a ,b)").unwrap(), vec![some(" a "), some("b")]);
    }

    #[test]
    fn test_parse_nested_row() {
        let outer = parse(r#"(1,"(2,\"x,y\")")"#).unwrap();
        assert_eq!(outer, vec![some("1"), some(r#"(2,"x,y")"#)]);

        let inner = parse(outer[1].as_deref().unwrap()).unwrap();
        assert_eq!(inner, vec![some("2"), some("x,y")]);
    }

    #[test]
    fn test_parse_malformed() {
        for input in ["(1,2", "1,2)", r#"(1,"abc)"#, "(1,2))", "(a\\"] {
            assert!(
                matches!(parse(input), Err(CodecError::Decode { .. })),
                "Should reject malformed literal: {}",
                input
            );
        }
    }
}
