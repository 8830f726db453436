//! Transcoder error types

use cachet_core::IdentityError;
use std::fmt;
use thiserror::Error;

/// Transcoder operation result type
pub type Result<T> = std::result::Result<T, TranscodeError>;

/// Error reported by a structural codec, carried unchanged
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{codec} codec error: {message}")]
pub struct CodecError {
    codec: &'static str,
    message: String,
}

impl CodecError {
    /// Create an error attributed to `codec`
    pub fn new(codec: &'static str, message: impl fmt::Display) -> Self {
        Self {
            codec,
            message: message.to_string(),
        }
    }

    /// Create a JSON codec error
    pub fn json(message: impl fmt::Display) -> Self {
        Self::new("json", message)
    }

    /// Create a CBOR codec error
    pub fn cbor(message: impl fmt::Display) -> Self {
        Self::new("cbor", message)
    }

    /// Name of the codec that failed
    pub fn codec(&self) -> &'static str {
        self.codec
    }

    /// The codec's own error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Unified error type for transcoder operations
#[derive(Error, Debug, Clone)]
pub enum TranscodeError {
    /// Input is not a well-formed tagged envelope
    #[error("Invalid envelope: {message}")]
    Format {
        /// What was wrong with the framing
        message: String,
    },

    /// The envelope names a type that cannot be resolved
    #[error("Unresolvable type identifier: {0}")]
    Resolution(#[source] IdentityError),

    /// The value's type cannot be identified or narrowed
    #[error("Type identity error: {0}")]
    Identity(#[from] IdentityError),

    /// The structural codec rejected the value
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Invalid transcoder configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },
}

impl TranscodeError {
    /// Create a format error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the input bytes were not a tagged envelope
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Whether the envelope named an unknown or malformed type
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution(_))
    }

    /// Whether the structural codec failed
    pub fn is_codec(&self) -> bool {
        matches!(self, Self::Codec(_))
    }
}

impl From<toml::de::Error> for TranscodeError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}
