//! # Cachet Core - Type Identity
//!
//! **Purpose**: Give every cacheable type a canonical, stable identifier and
//! resolve identifiers read back from storage to the types they name.
//!
//! Values stored through the tagged path of a cache transcoder carry their
//! identifier alongside the encoded value. Readers recover the concrete type
//! from that identifier without knowing it in advance.
//!
//! ## Core Concepts
//!
//! - **`TypeName`**: declared identity of a Rust type (`zoo.Dog`,
//!   `std.Vec<zoo.Dog>`)
//! - **`TypeIdentifier`**: the canonical string rendered from a descriptor
//! - **`CacheValue`**: type-erased, serializable value with a runtime type
//! - **`TypeRegistry`**: append-only set of types a reader will reconstruct
//! - **`TypeIdentityCodec`**: `identify` / `resolve` over a registry
//!
//! ## What's NOT in this crate
//!
//! - Envelope framing and structural codecs (belong in `cachet-transcoder`)
//! - Cache storage, TTL and eviction

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Type descriptors and the `TypeName` capability
pub mod descriptor;

/// Identity error types
pub mod errors;

/// Canonical identifier grammar
pub mod identifier;

/// Identify / resolve codec
pub mod identity;

/// Registry of reconstructible types
pub mod registry;

/// Type-erased cache values
pub mod value;

pub use descriptor::{TypeDescriptor, TypeName};
pub use errors::{IdentityError, Result};
pub use identifier::{parse_identifier, TypeIdentifier};
pub use identity::TypeIdentityCodec;
pub use registry::{DecodeFn, Registration, TypeRegistry};
pub use value::CacheValue;
