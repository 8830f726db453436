//! Envelope transcoder
//!
//! The tagged path writes `[identifier, value]` and reconstructs the recorded
//! type on read. The untagged path hands values straight to the structural
//! codec and relies on the reader to name the type.

use crate::codec::{CborCodec, JsonCodec, JsonOptions, StructuralCodec};
use crate::config::TranscoderConfig;
use crate::envelope::{EnvelopeMode, EnvelopeState, EnvelopeVisitor};
use crate::error::{CodecError, Result, TranscodeError};
use cachet_core::{
    CacheValue, TypeDescriptor, TypeIdentifier, TypeIdentityCodec, TypeName, TypeRegistry,
};
use serde::de::DeserializeOwned;
use serde::{Deserializer as _, Serialize};
use std::sync::Arc;

/// Converts cache values to bytes and back
#[derive(Debug, Clone)]
pub struct EnvelopeTranscoder {
    name: String,
    codec: Arc<dyn StructuralCodec>,
    identity: TypeIdentityCodec,
}

impl EnvelopeTranscoder {
    /// Name given to transcoders that are not named explicitly
    pub const DEFAULT_NAME: &'static str = "default";

    /// Create a transcoder over `codec`, resolving against `registry`
    pub fn new(codec: Arc<dyn StructuralCodec>, registry: Arc<TypeRegistry>) -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            codec,
            identity: TypeIdentityCodec::new(registry),
        }
    }

    /// JSON transcoder with default options over the global registry
    pub fn json() -> Self {
        let codec = Arc::new(JsonCodec::new(JsonOptions::default()));
        Self::new(codec, TypeRegistry::global())
    }

    /// CBOR transcoder over the global registry
    pub fn cbor() -> Self {
        Self::new(Arc::new(CborCodec::new()), TypeRegistry::global())
    }

    /// Build a transcoder from validated configuration
    pub fn from_config(config: &TranscoderConfig, registry: Arc<TypeRegistry>) -> Result<Self> {
        config.validate()?;
        let codec = config.codec.build(&config.json);
        tracing::debug!(
            transcoder = %config.name,
            codec = codec.name(),
            "Built envelope transcoder from configuration"
        );
        Ok(Self::new(codec, registry).with_name(config.name.clone()))
    }

    /// Rename the transcoder
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Name under which the cache selects this transcoder
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The structural codec in use
    pub fn codec(&self) -> &Arc<dyn StructuralCodec> {
        &self.codec
    }

    /// The registry tagged reads resolve against
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        self.identity.registry()
    }

    /// Encode `value` without a type identifier
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        let bytes = self.codec.encode_value(value)?;
        tracing::debug!(transcoder = %self.name, len = bytes.len(), "Encoded untagged cache value");
        Ok(bytes)
    }

    /// Decode untagged bytes as `T`
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        let mut decoded = None;
        self.codec.read_with(bytes, &mut |deserializer| {
            decoded = Some(erased_serde::deserialize::<T>(deserializer)?);
            Ok(())
        })?;
        decoded.ok_or_else(|| self.no_value())
    }

    /// Decode untagged bytes as the registered type named by `descriptor`
    pub fn decode_as(
        &self,
        bytes: &[u8],
        descriptor: &TypeDescriptor,
    ) -> Result<Box<dyn CacheValue>> {
        let registration = self.registry().resolve_descriptor(descriptor)?;
        let mut decoded = None;
        self.codec.read_with(bytes, &mut |deserializer| {
            decoded = Some(registration.decode(deserializer)?);
            Ok(())
        })?;
        tracing::debug!(
            transcoder = %self.name,
            identifier = %registration.identifier(),
            "Decoded untagged cache value by descriptor"
        );
        decoded.ok_or_else(|| self.no_value())
    }

    /// Encode `value` as a `[identifier, value]` envelope.
    ///
    /// The identifier is that of the value's concrete runtime type, so a value
    /// held as `Box<dyn CacheValue>` is tagged with its own type.
    pub fn encode_typed(&self, value: &dyn CacheValue) -> Result<Vec<u8>> {
        let identifier = self.identity.identify_value(value)?;
        let envelope = (identifier.as_str(), value);
        let bytes = self.codec.write_envelope(&mut |serializer| {
            erased_serde::Serialize::erased_serialize(&envelope, serializer)
        })?;
        tracing::debug!(
            transcoder = %self.name,
            codec = self.codec.name(),
            identifier = %identifier,
            len = bytes.len(),
            "Encoded tagged cache value"
        );
        Ok(bytes)
    }

    /// Decode an envelope into a value of the type it records.
    ///
    /// # Errors
    ///
    /// - [`TranscodeError::Format`] if the bytes are not a two-element
    ///   envelope with a string identifier
    /// - [`TranscodeError::Resolution`] if the identifier is malformed or not
    ///   registered
    /// - [`TranscodeError::Codec`] if the value or trailing input is rejected
    pub fn decode_typed(&self, bytes: &[u8]) -> Result<Box<dyn CacheValue>> {
        let envelope = self.read_envelope(bytes, EnvelopeMode::Decode(&self.identity))?;
        match envelope.value {
            Some(value) => {
                tracing::debug!(
                    transcoder = %self.name,
                    identifier = %envelope.identifier,
                    "Decoded tagged cache value"
                );
                Ok(value)
            }
            None => Err(self.no_value()),
        }
    }

    /// Decode an envelope and narrow it to `T`
    pub fn decode_typed_into<T: CacheValue + TypeName>(&self, bytes: &[u8]) -> Result<T> {
        let value = self.decode_typed(bytes)?;
        Ok(*value.downcast::<T>()?)
    }

    /// Identifier recorded in an envelope, without resolving or decoding it
    pub fn peek_identifier(&self, bytes: &[u8]) -> Result<TypeIdentifier> {
        Ok(self.read_envelope(bytes, EnvelopeMode::Peek)?.identifier)
    }

    fn read_envelope(
        &self,
        bytes: &[u8],
        mode: EnvelopeMode<'_>,
    ) -> Result<crate::envelope::Envelope> {
        let mut state = EnvelopeState::default();
        let mut envelope = None;
        let outcome = self.codec.read_with(bytes, &mut |deserializer| {
            let visitor = EnvelopeVisitor::new(mode, &mut state);
            envelope = Some(deserializer.deserialize_any(visitor)?);
            Ok(())
        });

        match outcome {
            Ok(()) => envelope.ok_or_else(|| self.no_value()),
            Err(error) => {
                let error = state.classify(error);
                if let TranscodeError::Resolution(cause) = &error {
                    tracing::warn!(
                        transcoder = %self.name,
                        error = %cause,
                        "Unresolvable type identifier in cached envelope"
                    );
                }
                Err(error)
            }
        }
    }

    fn no_value(&self) -> TranscodeError {
        CodecError::new(self.codec.name(), "reader produced no value").into()
    }
}

impl Default for EnvelopeTranscoder {
    fn default() -> Self {
        Self::json()
    }
}
