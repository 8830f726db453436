//! Registry of types that tagged envelopes may name
//!
//! The registry is the closed, auditable set of types a reader is willing to
//! reconstruct from an identifier. Each [`Registration`] pairs the canonical
//! identifier with a monomorphized decoder, so decoding is always directed by
//! a concrete Rust type chosen at registration time.
//!
//! Registration is append-only. Re-registering a type is a no-op, while
//! registering a second Rust type under an identifier that is already taken
//! is refused.

use crate::descriptor::{TypeDescriptor, TypeName};
use crate::errors::{IdentityError, Result};
use crate::identifier::{parse_identifier, TypeIdentifier};
use crate::value::CacheValue;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Decoder producing a value of the registered type from any deserializer
pub type DecodeFn = for<'de> fn(
    &mut dyn erased_serde::Deserializer<'de>,
) -> std::result::Result<Box<dyn CacheValue>, erased_serde::Error>;

fn decode_erased<T>(
    deserializer: &mut dyn erased_serde::Deserializer<'_>,
) -> std::result::Result<Box<dyn CacheValue>, erased_serde::Error>
where
    T: CacheValue + DeserializeOwned,
{
    let value: T = erased_serde::deserialize(deserializer)?;
    Ok(Box::new(value))
}

/// A type known to the registry
pub struct Registration {
    descriptor: TypeDescriptor,
    identifier: TypeIdentifier,
    rust_type: TypeId,
    rust_name: &'static str,
    decode: DecodeFn,
}

impl Registration {
    fn of<T>() -> Result<Self>
    where
        T: CacheValue + TypeName + DeserializeOwned,
    {
        let descriptor = <T as TypeName>::type_descriptor();
        let identifier = descriptor.identify()?;
        Ok(Self {
            descriptor,
            identifier,
            rust_type: TypeId::of::<T>(),
            rust_name: std::any::type_name::<T>(),
            decode: decode_erased::<T>,
        })
    }

    /// Descriptor of the registered type
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Canonical identifier of the registered type
    pub fn identifier(&self) -> &TypeIdentifier {
        &self.identifier
    }

    /// `TypeId` of the registered Rust type
    pub fn rust_type(&self) -> TypeId {
        self.rust_type
    }

    /// Compiler-provided name of the registered Rust type, for diagnostics only
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }

    /// Decode a value of the registered type
    pub fn decode(
        &self,
        deserializer: &mut dyn erased_serde::Deserializer<'_>,
    ) -> std::result::Result<Box<dyn CacheValue>, erased_serde::Error> {
        (self.decode)(deserializer)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("identifier", &self.identifier)
            .field("rust_name", &self.rust_name)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct RegistryInner {
    /// Map from identifier to registration
    by_identifier: HashMap<TypeIdentifier, Arc<Registration>>,
    /// Map from Rust type to identifier for reverse lookup
    by_type: HashMap<TypeId, TypeIdentifier>,
}

/// Append-only registry of cache value types
#[derive(Default)]
pub struct TypeRegistry {
    inner: RwLock<RegistryInner>,
}

static GLOBAL: Lazy<Arc<TypeRegistry>> = Lazy::new(|| Arc::new(TypeRegistry::with_builtins()));

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the common standard-library instantiations
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// The process-wide registry, created on first use with the builtins
    pub fn global() -> Arc<TypeRegistry> {
        Arc::clone(&GLOBAL)
    }

    fn register_builtins(&self) {
        let results = [
            self.register::<String>(),
            self.register::<bool>(),
            self.register::<i32>(),
            self.register::<i64>(),
            self.register::<u32>(),
            self.register::<u64>(),
            self.register::<f64>(),
            self.register::<Vec<String>>(),
            self.register::<Vec<u8>>(),
            self.register::<Vec<i64>>(),
            self.register::<HashMap<String, String>>(),
        ];
        for result in results {
            if let Err(error) = result {
                tracing::warn!(%error, "Builtin cache type registration failed");
            }
        }
    }

    /// Register `T`, returning its registration.
    ///
    /// Registering the same type twice returns the existing registration.
    /// Fails if `T` cannot be named or its identifier belongs to another type.
    pub fn register<T>(&self) -> Result<Arc<Registration>>
    where
        T: CacheValue + TypeName + DeserializeOwned,
    {
        let registration = Registration::of::<T>()?;
        let mut inner = self.inner.write();

        if let Some(existing) = inner.by_identifier.get(&registration.identifier) {
            if existing.rust_type == registration.rust_type {
                return Ok(Arc::clone(existing));
            }
            tracing::warn!(
                identifier = %registration.identifier,
                existing = existing.rust_name,
                attempted = registration.rust_name,
                "Refusing conflicting cache type registration"
            );
            return Err(IdentityError::conflict(
                registration.identifier.as_str(),
                existing.rust_name,
                registration.rust_name,
            ));
        }

        tracing::debug!(
            identifier = %registration.identifier,
            rust_type = registration.rust_name,
            "Registered cache type"
        );
        let registration = Arc::new(registration);
        inner
            .by_type
            .insert(registration.rust_type, registration.identifier.clone());
        inner
            .by_identifier
            .insert(registration.identifier.clone(), Arc::clone(&registration));
        Ok(registration)
    }

    /// Resolve an identifier read from an envelope.
    ///
    /// The identifier must parse under the identifier grammar and name a
    /// registered type; there is no fallback.
    pub fn resolve(&self, identifier: &str) -> Result<Arc<Registration>> {
        parse_identifier(identifier)?;
        self.inner
            .read()
            .by_identifier
            .get(identifier)
            .cloned()
            .ok_or_else(|| IdentityError::not_found(identifier))
    }

    /// Resolve a descriptor to its registration
    pub fn resolve_descriptor(&self, descriptor: &TypeDescriptor) -> Result<Arc<Registration>> {
        let identifier = descriptor.identify()?;
        self.resolve(identifier.as_str())
    }

    /// Identifier registered for the Rust type `type_id`, if any
    pub fn identifier_of(&self, type_id: TypeId) -> Option<TypeIdentifier> {
        self.inner.read().by_type.get(&type_id).cloned()
    }

    /// Whether an identifier is registered
    pub fn is_registered(&self, identifier: &str) -> bool {
        self.inner.read().by_identifier.contains_key(identifier)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.inner.read().by_identifier.len()
    }

    /// Whether no types are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered identifiers in sorted order
    pub fn identifiers(&self) -> Vec<TypeIdentifier> {
        let mut identifiers: Vec<_> = self.inner.read().by_identifier.keys().cloned().collect();
        identifiers.sort();
        identifiers
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("registered_types", &self.identifiers())
            .finish()
    }
}
