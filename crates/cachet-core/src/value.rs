//! Type-erased cache values
//!
//! [`CacheValue`] is what the tagged path hands out and accepts. The
//! descriptor is obtained through the trait object's vtable, so a `Dog`
//! stored behind `Box<dyn CacheValue>` still reports `zoo.Dog`.

use crate::descriptor::{TypeDescriptor, TypeName};
use crate::errors::{IdentityError, Result};
use serde::Serialize;
use std::any::Any;
use std::fmt::Debug;

/// A value that can be written into a tagged envelope
pub trait CacheValue: erased_serde::Serialize + Debug + Send + Sync + 'static {
    /// Descriptor of the value's concrete runtime type
    fn runtime_type(&self) -> TypeDescriptor;

    /// View as `Any` for narrowing
    fn as_any(&self) -> &dyn Any;

    /// Convert into `Any` for owned narrowing
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T> CacheValue for T
where
    T: TypeName + Serialize + Debug + Send + Sync,
{
    fn runtime_type(&self) -> TypeDescriptor {
        T::type_descriptor()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

erased_serde::serialize_trait_object!(CacheValue);

impl dyn CacheValue {
    /// Whether the runtime type is `T`
    pub fn is<T: CacheValue>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow as `T` if that is the runtime type
    pub fn downcast_ref<T: CacheValue>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Take ownership as `T`.
    ///
    /// Fails with [`IdentityError::TypeMismatch`] naming both types when the
    /// runtime type is not `T`.
    pub fn downcast<T: CacheValue + TypeName>(self: Box<Self>) -> Result<Box<T>> {
        let actual = self.runtime_type();
        self.into_any().downcast::<T>().map_err(|_| {
            IdentityError::type_mismatch(T::type_descriptor().to_string(), actual.to_string())
        })
    }
}
