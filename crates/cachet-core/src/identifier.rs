//! Canonical type identifiers
//!
//! A [`TypeIdentifier`] is the string written into every tagged envelope. It
//! is rendered from a [`TypeDescriptor`] and parsed back into one:
//!
//! ```text
//! identifier := path [ '<' identifier ( ',' identifier )* '>' ]
//! path       := segment ( ( '.' | '+' ) segment )*
//! segment    := [A-Za-z_] [A-Za-z0-9_]*
//! ```
//!
//! `zoo.Dog`, `zoo.Kennel+Slot` and `std.Vec<zoo.Crate<zoo.Dog>>` are all
//! valid. Whitespace is never accepted, so every descriptor has exactly one
//! identifier and every identifier exactly one descriptor.

use crate::descriptor::TypeDescriptor;
use crate::errors::{IdentityError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Separator between namespace segments
pub const NAMESPACE_SEPARATOR: char = '.';

/// Separator between an enclosing type and a nested type
pub const NESTED_SEPARATOR: char = '+';

/// Deepest generic nesting accepted by the parser
pub const MAX_NESTING_DEPTH: usize = 32;

/// Canonical string naming a concrete type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeIdentifier(String);

impl TypeIdentifier {
    /// Validate and wrap an identifier string
    pub fn new(identifier: impl Into<String>) -> Result<Self> {
        let identifier = identifier.into();
        parse_identifier(&identifier)?;
        Ok(Self(identifier))
    }

    /// Wrap an identifier that was just rendered from a validated descriptor
    pub(crate) fn from_rendered(identifier: String) -> Self {
        Self(identifier)
    }

    /// The identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the identifier back into the descriptor it names
    pub fn descriptor(&self) -> Result<TypeDescriptor> {
        parse_identifier(&self.0)
    }

    /// Consume the identifier, returning the text
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TypeIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TypeIdentifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for TypeIdentifier {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for TypeIdentifier {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TypeIdentifier> for String {
    fn from(value: TypeIdentifier) -> Self {
        value.0
    }
}

/// Parse an identifier string into the descriptor it names
pub fn parse_identifier(input: &str) -> Result<TypeDescriptor> {
    let mut parser = Parser { input, pos: 0 };
    if input.is_empty() {
        return Err(parser.error("identifier is empty"));
    }
    let descriptor = parser.identifier(0)?;
    if parser.pos != input.len() {
        return Err(parser.error("unexpected character after identifier"));
    }
    Ok(descriptor)
}

/// Check that `name` is a well-formed path.
///
/// On failure returns the byte offset of the first offending character and
/// a description of what was expected there.
pub(crate) fn validate_path(name: &str) -> std::result::Result<(), (usize, &'static str)> {
    let mut parser = Parser {
        input: name,
        pos: 0,
    };
    match parser.path() {
        Ok(()) if parser.pos == name.len() => Ok(()),
        Ok(()) => Err((parser.pos, "character not allowed in a type name")),
        Err(IdentityError::Malformed { position, .. }) => {
            Err((position, "expected a name segment"))
        }
        Err(_) => Err((0, "expected a name segment")),
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn error(&self, message: &str) -> IdentityError {
        IdentityError::malformed(self.input, self.pos, message)
    }

    fn identifier(&mut self, depth: usize) -> Result<TypeDescriptor> {
        if depth > MAX_NESTING_DEPTH {
            return Err(self.error("generic arguments nested too deeply"));
        }

        let start = self.pos;
        self.path()?;
        let name = self.input[start..self.pos].to_owned();

        let mut args = Vec::new();
        if self.peek() == Some(b'<') {
            self.pos += 1;
            loop {
                args.push(self.identifier(depth + 1)?);
                match self.peek() {
                    Some(b',') => self.pos += 1,
                    Some(b'>') => {
                        self.pos += 1;
                        break;
                    }
                    Some(_) => return Err(self.error("expected ',' or '>'")),
                    None => return Err(self.error("unterminated generic argument list")),
                }
            }
        }

        Ok(TypeDescriptor::generic(name, args))
    }

    fn path(&mut self) -> Result<()> {
        loop {
            self.segment()?;
            match self.peek() {
                Some(b'.' | b'+') => self.pos += 1,
                _ => return Ok(()),
            }
        }
    }

    fn segment(&mut self) -> Result<()> {
        match self.peek() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => self.pos += 1,
            _ => return Err(self.error("expected a name segment")),
        }
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(())
    }
}
