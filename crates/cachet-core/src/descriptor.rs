//! Type descriptors and the `TypeName` capability
//!
//! Every type that can travel through a tagged envelope declares its name
//! explicitly by implementing [`TypeName`]. Names are never derived from
//! `std::any::type_name`, whose output is not stable across compiler
//! versions, so identifiers written by one build are readable by another.

use crate::errors::{IdentityError, Result};
use crate::identifier::{
    validate_path, TypeIdentifier, MAX_NESTING_DEPTH, NAMESPACE_SEPARATOR, NESTED_SEPARATOR,
};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

/// Structural description of a concrete type: a path plus generic arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeDescriptor {
    name: Cow<'static, str>,
    args: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    /// Describe a non-generic type
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Describe a generic type instantiated with `args`
    pub fn generic(name: impl Into<Cow<'static, str>>, args: Vec<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Full path of the type, without generic arguments
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Generic arguments, empty for non-generic types
    pub fn args(&self) -> &[TypeDescriptor] {
        &self.args
    }

    /// Whether the descriptor carries generic arguments
    pub fn is_generic(&self) -> bool {
        !self.args.is_empty()
    }

    /// Namespace portion of the path (`zoo` for `zoo.Kennel+Slot`)
    pub fn namespace(&self) -> Option<&str> {
        self.name
            .rsplit_once(NAMESPACE_SEPARATOR)
            .map(|(namespace, _)| namespace)
    }

    /// Innermost simple name (`Slot` for `zoo.Kennel+Slot`)
    pub fn simple_name(&self) -> &str {
        let tail = self
            .name
            .rsplit_once(NAMESPACE_SEPARATOR)
            .map_or(&*self.name, |(_, tail)| tail);
        tail.rsplit_once(NESTED_SEPARATOR)
            .map_or(tail, |(_, nested)| nested)
    }

    /// The same type with its generic arguments removed
    pub fn definition(&self) -> TypeDescriptor {
        Self::named(self.name.clone())
    }

    /// Render the canonical identifier.
    ///
    /// Fails when any name in the descriptor, including those of its generic
    /// arguments, falls outside the identifier grammar, or when arguments nest
    /// deeper than [`MAX_NESTING_DEPTH`] and the identifier could not be parsed
    /// back.
    pub fn identify(&self) -> Result<TypeIdentifier> {
        self.validate(0)?;
        let mut out = String::with_capacity(self.name.len());
        self.render(&mut out);
        Ok(TypeIdentifier::from_rendered(out))
    }

    fn validate(&self, depth: usize) -> Result<()> {
        if depth > MAX_NESTING_DEPTH {
            return Err(IdentityError::unnameable(
                self.name.to_string(),
                format!("generic arguments nested deeper than {MAX_NESTING_DEPTH}"),
            ));
        }
        if let Err((position, message)) = validate_path(&self.name) {
            return Err(IdentityError::unnameable(
                self.name.to_string(),
                format!("{message} at byte {position}"),
            ));
        }
        self.args.iter().try_for_each(|arg| arg.validate(depth + 1))
    }

    fn render(&self, out: &mut String) {
        out.push_str(&self.name);
        if let Some((first, rest)) = self.args.split_first() {
            out.push('<');
            first.render(out);
            for arg in rest {
                out.push(',');
                arg.render(out);
            }
            out.push('>');
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.render(&mut out);
        f.write_str(&out)
    }
}

/// Capability: a type with a stable, declared identity.
///
/// Generic types build their descriptor from their arguments' descriptors so
/// that `Crate<Dog>` and `Crate<Cat>` get distinct identifiers.
///
/// ```ignore
/// impl<T: TypeName> TypeName for Crate<T> {
///     fn type_descriptor() -> TypeDescriptor {
///         TypeDescriptor::generic("zoo.Crate", vec![T::type_descriptor()])
///     }
/// }
/// ```
pub trait TypeName: 'static {
    /// Descriptor of this type
    fn type_descriptor() -> TypeDescriptor;
}

/// Implement [`TypeName`] for non-generic types.
///
/// ```ignore
/// cachet_core::impl_type_name!(Dog => "zoo.Dog", Cat => "zoo.Cat");
/// ```
#[macro_export]
macro_rules! impl_type_name {
    ($($ty:ty => $name:expr),+ $(,)?) => {
        $(
            impl $crate::TypeName for $ty {
                fn type_descriptor() -> $crate::TypeDescriptor {
                    $crate::TypeDescriptor::named($name)
                }
            }
        )+
    };
}

impl_type_name!(
    bool => "std.bool",
    char => "std.char",
    i8 => "std.i8",
    i16 => "std.i16",
    i32 => "std.i32",
    i64 => "std.i64",
    i128 => "std.i128",
    u8 => "std.u8",
    u16 => "std.u16",
    u32 => "std.u32",
    u64 => "std.u64",
    u128 => "std.u128",
    f32 => "std.f32",
    f64 => "std.f64",
    String => "std.String",
    () => "std.Unit",
);

impl<T: TypeName> TypeName for Vec<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::generic("std.Vec", vec![T::type_descriptor()])
    }
}

impl<T: TypeName> TypeName for Option<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::generic("std.Option", vec![T::type_descriptor()])
    }
}

impl<T: TypeName> TypeName for HashSet<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::generic("std.HashSet", vec![T::type_descriptor()])
    }
}

impl<T: TypeName> TypeName for BTreeSet<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::generic("std.BTreeSet", vec![T::type_descriptor()])
    }
}

impl<K: TypeName, V: TypeName> TypeName for HashMap<K, V> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::generic(
            "std.HashMap",
            vec![K::type_descriptor(), V::type_descriptor()],
        )
    }
}

impl<K: TypeName, V: TypeName> TypeName for BTreeMap<K, V> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::generic(
            "std.BTreeMap",
            vec![K::type_descriptor(), V::type_descriptor()],
        )
    }
}

impl<A: TypeName, B: TypeName> TypeName for (A, B) {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::generic("std.Tuple", vec![A::type_descriptor(), B::type_descriptor()])
    }
}

impl<A: TypeName, B: TypeName, C: TypeName> TypeName for (A, B, C) {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::generic(
            "std.Tuple",
            vec![A::type_descriptor(), B::type_descriptor(), C::type_descriptor()],
        )
    }
}
