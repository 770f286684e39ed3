//! Tokens for the text encoding.
//!
//! A line holds space or tab separated fields: quoted strings (no escapes),
//! integers and floats. Anything after `//` is a comment.

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Str(String),
    Int(i32),
    Float(f32),
}

/// Cuts a line at the first `//`.
pub fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Parses a `Name: count` section line.
pub fn parse_section(text: &str, line: usize) -> Result<(String, usize)> {
    let Some((name, count)) = text.split_once(':') else {
        return Err(Error::malformed(line, format!("expected a section, found {text:?}")));
    };
    let mut fields = Fields::new(count, line);
    let count = fields.int_as::<usize>()?;
    fields.finish()?;
    Ok((name.trim().to_string(), count))
}

/// A cursor over the fields of one line.
pub struct Fields<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> Fields<'a> {
    pub fn new(text: &'a str, line: usize) -> Self {
        Self { rest: text, line }
    }

    fn skip_blanks(&mut self) {
        self.rest = self.rest.trim_start_matches([' ', '\t']);
    }

    fn token(&mut self, expected: &str) -> Result<&'a str> {
        self.skip_blanks();
        if self.rest.is_empty() {
            return Err(Error::malformed(
                self.line,
                format!("expected {expected}, found end of line"),
            ));
        }
        let end = self.rest.find([' ', '\t']).unwrap_or(self.rest.len());
        let (token, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(token)
    }

    pub fn string(&mut self) -> Result<String> {
        self.skip_blanks();
        let Some(quoted) = self.rest.strip_prefix('"') else {
            let found = self.rest.split([' ', '\t']).next().unwrap_or_default();
            return Err(Error::malformed(
                self.line,
                if found.is_empty() {
                    "expected quoted string, found end of line".to_string()
                } else {
                    format!("expected quoted string, found {found:?}")
                },
            ));
        };
        let Some(end) = quoted.find('"') else {
            return Err(Error::malformed(self.line, "unterminated string"));
        };
        self.rest = &quoted[end + 1..];
        Ok(quoted[..end].to_string())
    }

    pub fn int(&mut self) -> Result<i32> {
        let token = self.token("integer")?;
        token
            .parse()
            .map_err(|_| Error::malformed(self.line, format!("expected integer, found {token:?}")))
    }

    /// Reads an integer and narrows it to `T`.
    pub fn int_as<T: TryFrom<i32>>(&mut self) -> Result<T> {
        let value = self.int()?;
        T::try_from(value)
            .map_err(|_| Error::malformed(self.line, format!("integer {value} out of range")))
    }

    pub fn float(&mut self) -> Result<f32> {
        let token = self.token("float")?;
        token
            .parse()
            .map_err(|_| Error::malformed(self.line, format!("expected float, found {token:?}")))
    }

    /// Succeeds when only blanks remain.
    pub fn finish(mut self) -> Result<()> {
        self.skip_blanks();
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(Error::malformed(
                self.line,
                format!("unexpected trailing {:?}", self.rest),
            ))
        }
    }
}

/// Parses a line against a format of `s` (string), `i` (integer) and `f`
/// (float) field types. Blanks in the format are ignored, so `"s i i"` and
/// `"sii"` are the same format. Trailing fields beyond the format are
/// ignored.
pub fn parse_fields(text: &str, format: &str, line: usize) -> Result<Vec<Field>> {
    let mut fields = Fields::new(strip_comment(text), line);
    format
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|kind| match kind {
            's' => fields.string().map(Field::Str),
            'i' => fields.int().map(Field::Int),
            'f' => fields.float().map(Field::Float),
            other => Err(Error::malformed(
                line,
                format!("unknown field type {other:?}"),
            )),
        })
        .collect()
}
