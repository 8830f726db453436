//! Type identity codec
//!
//! Converts types to canonical identifiers and identifiers back to the
//! registered types they name. Identification is a pure function of the
//! declared [`TypeName`]; resolution is a pure function of the identifier and
//! the registry contents.

use crate::descriptor::{TypeDescriptor, TypeName};
use crate::errors::Result;
use crate::identifier::TypeIdentifier;
use crate::registry::{Registration, TypeRegistry};
use crate::value::CacheValue;
use std::sync::Arc;

/// Identify and resolve cache value types against a registry
#[derive(Debug, Clone)]
pub struct TypeIdentityCodec {
    registry: Arc<TypeRegistry>,
}

impl TypeIdentityCodec {
    /// Create a codec resolving against `registry`
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    /// Create a codec resolving against the process-wide registry
    pub fn global() -> Self {
        Self::new(TypeRegistry::global())
    }

    /// The registry used for resolution
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Identifier of the static type `T`
    pub fn identify<T: TypeName>(&self) -> Result<TypeIdentifier> {
        self.identify_descriptor(&T::type_descriptor())
    }

    /// Identifier of the concrete runtime type of `value`
    pub fn identify_value(&self, value: &dyn CacheValue) -> Result<TypeIdentifier> {
        self.identify_descriptor(&value.runtime_type())
    }

    /// Identifier of an explicit descriptor
    pub fn identify_descriptor(&self, descriptor: &TypeDescriptor) -> Result<TypeIdentifier> {
        descriptor.identify()
    }

    /// Resolve an identifier to its registration.
    ///
    /// Fails with `Malformed` if the identifier does not parse and with
    /// `NotFound` if no registered type carries it.
    pub fn resolve(&self, identifier: &str) -> Result<Arc<Registration>> {
        self.registry.resolve(identifier)
    }
}

impl Default for TypeIdentityCodec {
    fn default() -> Self {
        Self::global()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::IdentityError;
    use assert_matches::assert_matches;

    #[test]
    fn test_identify_static_and_dynamic_agree() {
        let codec = TypeIdentityCodec::new(Arc::new(TypeRegistry::new()));
        let value: Box<dyn CacheValue> = Box::new(vec![String::from("x")]);
        assert_eq!(
            codec.identify::<Vec<String>>().unwrap(),
            codec.identify_value(&*value).unwrap()
        );
    }

    #[test]
    fn test_resolve_returns_registered_descriptor() {
        let codec = TypeIdentityCodec::global();
        let identifier = codec.identify::<Vec<i64>>().unwrap();
        let registration = codec.resolve(identifier.as_str()).unwrap();
        assert_eq!(registration.descriptor(), &Vec::<i64>::type_descriptor());
    }

    #[test]
    fn test_resolve_unknown() {
        let codec = TypeIdentityCodec::new(Arc::new(TypeRegistry::new()));
        assert_matches!(codec.resolve("std.String"), Err(IdentityError::NotFound { .. }));
    }
}
