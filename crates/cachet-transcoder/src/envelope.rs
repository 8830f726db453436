//! Tagged envelope reader
//!
//! An envelope is a two-element sequence `[identifier, value]`. The reader is
//! a serde visitor driven through `deserialize_any`, so it only works over
//! self-describing formats. Structural failures inside the visitor surface as
//! opaque codec errors; the visitor therefore records what went wrong, and how
//! far it got, in an [`EnvelopeState`] that the transcoder consults to
//! classify the failure afterwards.

use crate::error::{CodecError, TranscodeError};
use cachet_core::{CacheValue, IdentityError, Registration, TypeIdentifier, TypeIdentityCodec};
use serde::de::{self, DeserializeSeed, IgnoredAny, SeqAccess, Visitor};
use std::fmt;

/// Position of the reader within the envelope
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Stage {
    /// Outer sequence not yet opened
    #[default]
    Header,
    Identifier,
    Value,
    Trailer,
    Closed,
}

/// Failure detected by the envelope reader itself
#[derive(Debug, Clone)]
pub(crate) enum EnvelopeFault {
    Format(String),
    Resolution(IdentityError),
}

impl fmt::Display for EnvelopeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(message) => f.write_str(message),
            Self::Resolution(error) => fmt::Display::fmt(error, f),
        }
    }
}

/// Side channel between the visitor and the transcoder
#[derive(Debug, Default)]
pub(crate) struct EnvelopeState {
    stage: Stage,
    fault: Option<EnvelopeFault>,
}

impl EnvelopeState {
    fn fail<E: de::Error>(&mut self, fault: EnvelopeFault) -> E {
        let error = E::custom(&fault);
        self.fault = Some(fault);
        error
    }

    /// Turn a failed read into the matching transcoder error.
    ///
    /// Anything that stops the reader before it enters the outer sequence,
    /// while it reads the identifier slot, or while it looks for a third
    /// element is a framing problem. Failures inside the value or after the
    /// envelope belong to the codec.
    pub(crate) fn classify(self, error: CodecError) -> TranscodeError {
        match self.fault {
            Some(EnvelopeFault::Format(message)) => TranscodeError::format(message),
            Some(EnvelopeFault::Resolution(error)) => TranscodeError::Resolution(error),
            None => match self.stage {
                Stage::Header => TranscodeError::format("tagged envelope expected"),
                Stage::Identifier => {
                    TranscodeError::format("type identifier must be a string")
                }
                Stage::Trailer => TranscodeError::format("envelope has more than two elements"),
                Stage::Value | Stage::Closed => TranscodeError::Codec(error),
            },
        }
    }
}

/// What the reader does with the value slot
#[derive(Debug, Clone, Copy)]
pub(crate) enum EnvelopeMode<'r> {
    /// Resolve the identifier and decode the value into the registered type
    Decode(&'r TypeIdentityCodec),
    /// Validate the identifier and skip the value
    Peek,
}

/// A read envelope; `value` is `None` in peek mode
#[derive(Debug)]
pub(crate) struct Envelope {
    pub(crate) identifier: TypeIdentifier,
    pub(crate) value: Option<Box<dyn CacheValue>>,
}

pub(crate) struct EnvelopeVisitor<'s, 'r> {
    mode: EnvelopeMode<'r>,
    state: &'s mut EnvelopeState,
}

impl<'s, 'r> EnvelopeVisitor<'s, 'r> {
    pub(crate) fn new(mode: EnvelopeMode<'r>, state: &'s mut EnvelopeState) -> Self {
        Self { mode, state }
    }
}

impl<'de> Visitor<'de> for EnvelopeVisitor<'_, '_> {
    type Value = Envelope;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a two-element [type identifier, value] sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let state = self.state;

        state.stage = Stage::Identifier;
        let Some(raw) = seq.next_element::<String>()? else {
            let fault = EnvelopeFault::Format("envelope is empty".to_string());
            return Err(state.fail::<A::Error>(fault));
        };

        state.stage = Stage::Value;
        let missing_value = || EnvelopeFault::Format("envelope has no value".to_string());
        let (identifier, value) = match self.mode {
            EnvelopeMode::Peek => {
                let identifier = match TypeIdentifier::new(raw) {
                    Ok(identifier) => identifier,
                    Err(error) => {
                        return Err(state.fail::<A::Error>(EnvelopeFault::Resolution(error)))
                    }
                };
                if seq.next_element::<IgnoredAny>()?.is_none() {
                    return Err(state.fail::<A::Error>(missing_value()));
                }
                (identifier, None)
            }
            EnvelopeMode::Decode(identity) => {
                let registration = match identity.resolve(&raw) {
                    Ok(registration) => registration,
                    Err(error) => {
                        return Err(state.fail::<A::Error>(EnvelopeFault::Resolution(error)))
                    }
                };
                let Some(value) = seq.next_element_seed(RegisteredSeed(&registration))? else {
                    return Err(state.fail::<A::Error>(missing_value()));
                };
                (registration.identifier().clone(), Some(value))
            }
        };

        state.stage = Stage::Trailer;
        if seq.next_element::<IgnoredAny>()?.is_some() {
            let fault = EnvelopeFault::Format("envelope has more than two elements".to_string());
            return Err(state.fail::<A::Error>(fault));
        }

        state.stage = Stage::Closed;
        Ok(Envelope { identifier, value })
    }
}

/// Decodes one value through a registration's monomorphized decoder
pub(crate) struct RegisteredSeed<'r>(pub(crate) &'r Registration);

impl<'de> DeserializeSeed<'de> for RegisteredSeed<'_> {
    type Value = Box<dyn CacheValue>;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let mut erased = <dyn erased_serde::Deserializer>::erase(deserializer);
        self.0.decode(&mut erased).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use cachet_core::TypeRegistry;
    use serde::Deserializer as _;
    use std::sync::Arc;

    fn read(input: &str, mode: EnvelopeMode<'_>) -> Result<Envelope, TranscodeError> {
        let mut state = EnvelopeState::default();
        let mut deserializer = serde_json::Deserializer::from_str(input);
        let result = (&mut deserializer).deserialize_any(EnvelopeVisitor::new(mode, &mut state));
        result.map_err(|error| state.classify(CodecError::json(error)))
    }

    #[test]
    fn test_decode_mode_reads_registered_value() {
        let identity = TypeIdentityCodec::new(Arc::new(TypeRegistry::with_builtins()));
        let envelope = read(r#"["std.i64",42]"#, EnvelopeMode::Decode(&identity)).unwrap();
        assert_eq!(envelope.identifier.as_str(), "std.i64");
        assert_eq!(envelope.value.unwrap().downcast_ref::<i64>(), Some(&42));
    }

    #[test]
    fn test_peek_mode_skips_value() {
        let envelope = read(r#"["zoo.Dog",{"name":"Rex"}]"#, EnvelopeMode::Peek).unwrap();
        assert_eq!(envelope.identifier.as_str(), "zoo.Dog");
        assert!(envelope.value.is_none());
    }

    #[test]
    fn test_framing_failures_are_format_errors() {
        for input in [
            r#"{"name":"Rex"}"#,
            "42",
            "[]",
            "[7,1]",
            r#"["std.i64"]"#,
            r#"["std.i64",1,2]"#,
            r#"["std.bool",true,x]"#,
        ] {
            let err = read(input, EnvelopeMode::Peek).err().unwrap();
            assert!(err.is_format(), "{input}: {err}");
        }
    }

    #[test]
    fn test_unknown_identifier_is_resolution_error() {
        let identity = TypeIdentityCodec::new(Arc::new(TypeRegistry::new()));
        assert_matches!(
            read(r#"["zoo.Cat",{}]"#, EnvelopeMode::Decode(&identity)),
            Err(TranscodeError::Resolution(IdentityError::NotFound { .. }))
        );
        assert_matches!(
            read(r#"["zoo Cat",{}]"#, EnvelopeMode::Peek),
            Err(TranscodeError::Resolution(IdentityError::Malformed { .. }))
        );
    }

    #[test]
    fn test_value_mismatch_is_codec_error() {
        let identity = TypeIdentityCodec::new(Arc::new(TypeRegistry::with_builtins()));
        let err = read(r#"["std.i64","forty-two"]"#, EnvelopeMode::Decode(&identity))
            .err()
            .unwrap();
        assert!(err.is_codec());
    }
}
