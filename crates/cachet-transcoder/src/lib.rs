//! # Cachet Transcoder - Self-Describing Cache Values
//!
//! **Purpose**: Convert cache values to bytes for an external cache backend
//! and back into correctly typed values, without the reader naming the type.
//!
//! Tagged values are written as a two-element envelope:
//!
//! ```text
//! ["zoo.Crate<zoo.Dog>", {"label": "k9", "occupant": {"name": "Rex"}}]
//! ```
//!
//! The first element is the canonical identifier of the value's runtime type
//! (see `cachet-core`); the second is the value as encoded by the structural
//! codec. Decoding resolves the identifier against a [`TypeRegistry`] and
//! decodes the value directly into the registered type.
//!
//! ## Core Concepts
//!
//! - **`EnvelopeTranscoder`**: tagged (`encode_typed` / `decode_typed`) and
//!   untagged (`encode` / `decode`) conversion
//! - **`StructuralCodec`**: object-safe seam over a serde format (JSON, CBOR)
//! - **`EscapePolicy`**: JSON string escaping for encoded values
//! - **`TranscoderConfig`**: TOML and environment driven construction
//!
//! ## What's NOT in this crate
//!
//! - Cache storage, keys, TTL and eviction
//! - Compression and encryption of the encoded bytes
//!
//! [`TypeRegistry`]: cachet_core::TypeRegistry

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Structural codecs and JSON escaping
pub mod codec;

/// Transcoder configuration
pub mod config;

mod envelope;

/// Transcoder error types
pub mod error;

/// Tagged and untagged transcoding
pub mod transcoder;

pub use codec::{CborCodec, CodecKind, EscapePolicy, JsonCodec, JsonOptions, StructuralCodec};
pub use config::TranscoderConfig;
pub use error::{CodecError, Result, TranscodeError};
pub use transcoder::EnvelopeTranscoder;

pub use cachet_core::{
    impl_type_name, CacheValue, IdentityError, TypeDescriptor, TypeIdentifier, TypeName,
    TypeRegistry,
};
