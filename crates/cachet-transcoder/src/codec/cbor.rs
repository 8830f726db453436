//! CBOR structural codec backed by `serde_cbor`

use super::{EnvelopeWriter, StructuralCodec, ValueReader};
use crate::error::CodecError;

/// CBOR codec using the default (self-describing) field encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl CborCodec {
    /// Create a CBOR codec
    pub fn new() -> Self {
        Self
    }
}

impl StructuralCodec for CborCodec {
    fn name(&self) -> &'static str {
        "cbor"
    }

    fn encode_value(&self, value: &dyn erased_serde::Serialize) -> Result<Vec<u8>, CodecError> {
        serde_cbor::to_vec(&value).map_err(CodecError::cbor)
    }

    fn write_envelope(&self, write: &mut EnvelopeWriter<'_>) -> Result<Vec<u8>, CodecError> {
        let mut buffer = Vec::new();
        {
            let writer = serde_cbor::ser::IoWrite::new(&mut buffer);
            let mut serializer = serde_cbor::Serializer::new(writer);
            let mut erased = <dyn erased_serde::Serializer>::erase(&mut serializer);
            write(&mut erased).map_err(CodecError::cbor)?;
        }
        Ok(buffer)
    }

    fn read_with(&self, bytes: &[u8], read: &mut ValueReader<'_>) -> Result<(), CodecError> {
        let mut deserializer = serde_cbor::Deserializer::from_slice(bytes);
        {
            let mut erased = <dyn erased_serde::Deserializer>::erase(&mut deserializer);
            read(&mut erased).map_err(CodecError::cbor)?;
        }
        deserializer.end().map_err(CodecError::cbor)
    }
}
