//! JSON structural codec backed by `serde_json`

use super::escape::{EnvelopeFormatter, EscapePolicy, ValueFormatter};
use super::{EnvelopeWriter, StructuralCodec, ValueReader};
use crate::error::CodecError;
use serde::{Deserialize, Serialize};

/// JSON output options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JsonOptions {
    /// Escaping applied to strings in encoded values
    pub escape: EscapePolicy,
}

/// Compact JSON codec
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    options: JsonOptions,
}

impl JsonCodec {
    /// Create a JSON codec with the given options
    pub fn new(options: JsonOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    pub fn options(&self) -> &JsonOptions {
        &self.options
    }
}

impl StructuralCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode_value(&self, value: &dyn erased_serde::Serialize) -> Result<Vec<u8>, CodecError> {
        let formatter = ValueFormatter::new(self.options.escape);
        let mut serializer = serde_json::Serializer::with_formatter(Vec::new(), formatter);
        erased_serde::serialize(value, &mut serializer).map_err(CodecError::json)?;
        Ok(serializer.into_inner())
    }

    fn write_envelope(&self, write: &mut EnvelopeWriter<'_>) -> Result<Vec<u8>, CodecError> {
        let formatter = EnvelopeFormatter::new(self.options.escape);
        let mut serializer = serde_json::Serializer::with_formatter(Vec::new(), formatter);
        {
            let mut erased = <dyn erased_serde::Serializer>::erase(&mut serializer);
            write(&mut erased).map_err(CodecError::json)?;
        }
        Ok(serializer.into_inner())
    }

    fn read_with(&self, bytes: &[u8], read: &mut ValueReader<'_>) -> Result<(), CodecError> {
        let mut deserializer = serde_json::Deserializer::from_slice(bytes);
        {
            let mut erased = <dyn erased_serde::Deserializer>::erase(&mut deserializer);
            read(&mut erased).map_err(CodecError::json)?;
        }
        deserializer.end().map_err(CodecError::json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_value_applies_policy() {
        let strict = JsonCodec::default();
        assert_eq!(strict.encode_value(&"a&b").unwrap(), br#""a\u0026b""#.to_vec());

        let relaxed = JsonCodec::new(JsonOptions {
            escape: EscapePolicy::Relaxed,
        });
        assert_eq!(relaxed.encode_value(&"a&b").unwrap(), br#""a&b""#.to_vec());
    }

    #[test]
    fn test_read_with_rejects_trailing_input() {
        let codec = JsonCodec::default();
        let err = codec
            .read_with(b"1 2", &mut |deserializer| {
                let _: u32 = erased_serde::deserialize(deserializer)?;
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.codec(), "json");
    }
}
