//! String escaping for JSON output
//!
//! `serde_json` only escapes what JSON requires. [`EscapePolicy::Strict`]
//! additionally writes HTML-sensitive and non-ASCII characters as `\uXXXX`,
//! which keeps cached payloads safe to embed in markup and logs.
//!
//! Type identifiers use `<`, `>` and `+` as grammar punctuation, so the
//! envelope writer always emits the identifier slot with
//! [`EscapePolicy::Relaxed`]. Only that slot is exempt; the value slot
//! follows the configured policy.

use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use std::fmt;
use std::io;
use std::str::FromStr;

/// How string contents are escaped when writing JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapePolicy {
    /// Escape HTML-sensitive and non-ASCII characters
    #[default]
    Strict,
    /// Escape only what JSON requires
    Relaxed,
}

impl EscapePolicy {
    fn write_fragment<W>(self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if self == Self::Relaxed {
            return writer.write_all(fragment.as_bytes());
        }

        let mut start = 0;
        for (index, ch) in fragment.char_indices() {
            if needs_strict_escape(ch) {
                writer.write_all(fragment[start..index].as_bytes())?;
                write_unicode_escape(writer, ch)?;
                start = index + ch.len_utf8();
            }
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

impl fmt::Display for EscapePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::Relaxed => f.write_str("relaxed"),
        }
    }
}

impl FromStr for EscapePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "relaxed" => Ok(Self::Relaxed),
            other => Err(format!("unknown escape policy {other:?}, expected strict or relaxed")),
        }
    }
}

fn needs_strict_escape(ch: char) -> bool {
    !ch.is_ascii() || matches!(ch, '<' | '>' | '&' | '\'' | '+' | '`')
}

fn write_unicode_escape<W>(writer: &mut W, ch: char) -> io::Result<()>
where
    W: ?Sized + io::Write,
{
    let mut units = [0u16; 2];
    for unit in ch.encode_utf16(&mut units).iter() {
        write!(writer, "\\u{unit:04X}")?;
    }
    Ok(())
}

/// Compact formatter applying one policy to every string
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValueFormatter {
    policy: EscapePolicy,
}

impl ValueFormatter {
    pub(crate) fn new(policy: EscapePolicy) -> Self {
        Self { policy }
    }
}

impl Formatter for ValueFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.policy.write_fragment(writer, fragment)
    }
}

/// Compact formatter for the outer envelope array.
///
/// Strings in the first element of the top-level array are written relaxed;
/// everything else uses the value policy.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EnvelopeFormatter {
    value_policy: EscapePolicy,
    depth: usize,
    in_identifier: bool,
}

impl EnvelopeFormatter {
    pub(crate) fn new(value_policy: EscapePolicy) -> Self {
        Self {
            value_policy,
            depth: 0,
            in_identifier: false,
        }
    }
}

impl Formatter for EnvelopeFormatter {
    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.depth += 1;
        writer.write_all(b"[")
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.depth -= 1;
        writer.write_all(b"]")
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if self.depth == 1 {
            self.in_identifier = first;
        }
        if first {
            Ok(())
        } else {
            writer.write_all(b",")
        }
    }

    fn end_array_value<W>(&mut self, _writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if self.depth == 1 {
            self.in_identifier = false;
        }
        Ok(())
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.depth += 1;
        writer.write_all(b"{")
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.depth -= 1;
        writer.write_all(b"}")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let policy = if self.in_identifier {
            EscapePolicy::Relaxed
        } else {
            self.value_policy
        };
        policy.write_fragment(writer, fragment)
    }
}
