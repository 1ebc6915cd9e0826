//! PostgreSQL array and row literal grammar
//!
//! Low-level scanning and rendering shared by the codec. Neither grammar knows
//! about column types: array literals are parsed into an [`ArrayNode`] tree and
//! row literals into a flat list of optional field texts.

pub mod array;
pub mod composite;

pub use array::ArrayNode;

use crate::errors::CodecError;

/// Check whether an element must be double-quoted inside a literal.
///
/// Empty strings and the text `NULL` are quoted so they are not read back as
/// NULL; whitespace is quoted because PostgreSQL trims unquoted array elements.
pub(crate) fn needs_quotes(value: &str, specials: &[char]) -> bool {
    value.is_empty()
        || value.eq_ignore_ascii_case("NULL")
        || value
            .chars()
            .any(|c| c == '"' || c == '\\' || c.is_whitespace() || specials.contains(&c))
}

/// Wrap in double quotes, backslash-escaping quotes and backslashes
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Byte-position cursor over a literal
pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub(crate) fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Consume the character following a backslash
    pub(crate) fn escaped(&mut self) -> Result<char, CodecError> {
        let pos = self.pos;
        self.bump()
            .ok_or_else(|| CodecError::decode("dangling backslash at end of input", pos))
    }

    /// Fail unless only whitespace remains
    pub(crate) fn expect_end(&mut self, what: &str) -> Result<(), CodecError> {
        self.skip_whitespace();
        if self.is_eof() {
            Ok(())
        } else {
            Err(CodecError::decode(
                format!("unexpected input after {}", what),
                self.pos,
            ))
        }
    }
}
