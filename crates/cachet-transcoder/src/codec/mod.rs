//! Structural codecs
//!
//! A structural codec turns a serde data model into bytes and back. The
//! transcoder only talks to codecs through the object-safe
//! [`StructuralCodec`] trait, so the concrete format can be chosen from
//! configuration at runtime.
//!
//! Tagged decoding inspects the first token of the input, which requires a
//! self-describing format. JSON and CBOR both qualify.

mod cbor;
mod escape;
mod json;

pub use cbor::CborCodec;
pub use escape::EscapePolicy;
pub use json::{JsonCodec, JsonOptions};

use crate::error::CodecError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Callback writing a complete envelope into the codec's outer writer
pub type EnvelopeWriter<'a> =
    dyn FnMut(&mut dyn erased_serde::Serializer) -> Result<(), erased_serde::Error> + 'a;

/// Callback reading a value from the codec's reader
pub type ValueReader<'a> =
    dyn FnMut(&mut dyn erased_serde::Deserializer<'_>) -> Result<(), erased_serde::Error> + 'a;

/// Object-safe boundary to a serde format
pub trait StructuralCodec: Send + Sync + fmt::Debug {
    /// Short name of the format
    fn name(&self) -> &'static str;

    /// Encode a bare value
    fn encode_value(&self, value: &dyn erased_serde::Serialize) -> Result<Vec<u8>, CodecError>;

    /// Run `write` against the outer envelope writer and return the bytes
    fn write_envelope(&self, write: &mut EnvelopeWriter<'_>) -> Result<Vec<u8>, CodecError>;

    /// Run `read` against a reader over `bytes`.
    ///
    /// Fails if `read` fails or if input remains after it returns.
    fn read_with(&self, bytes: &[u8], read: &mut ValueReader<'_>) -> Result<(), CodecError>;
}

/// Codec selection for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    /// JSON via `serde_json`
    #[default]
    Json,
    /// CBOR via `serde_cbor`
    Cbor,
}

impl CodecKind {
    /// Instantiate the selected codec
    pub fn build(self, json: &JsonOptions) -> Arc<dyn StructuralCodec> {
        match self {
            Self::Json => Arc::new(JsonCodec::new(json.clone())),
            Self::Cbor => Arc::new(CborCodec::new()),
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Cbor => f.write_str("cbor"),
        }
    }
}

impl FromStr for CodecKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "cbor" => Ok(Self::Cbor),
            other => Err(format!("unknown codec {other:?}, expected json or cbor")),
        }
    }
}
