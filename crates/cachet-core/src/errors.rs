//! Error type for type identification and resolution

/// Errors raised while naming, parsing, registering or narrowing cache types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The type has no name expressible in the identifier grammar
    #[error("Type cannot be named: {name:?} ({message})")]
    Unnameable {
        /// The offending name as declared
        name: String,
        /// Why the name was rejected
        message: String,
    },

    /// The identifier string does not match the identifier grammar
    #[error("Malformed type identifier {identifier:?} at byte {position}: {message}")]
    Malformed {
        /// The identifier as received
        identifier: String,
        /// Byte offset of the first offending character
        position: usize,
        /// What the parser expected
        message: String,
    },

    /// No registered type matches the identifier
    #[error("Type not found: {identifier}")]
    NotFound {
        /// The identifier that failed to resolve
        identifier: String,
    },

    /// A different Rust type is already registered under the identifier
    #[error("Type identifier {identifier} already registered for {existing}, refusing {attempted}")]
    Conflict {
        /// The contested identifier
        identifier: String,
        /// Rust type name of the existing registration
        existing: String,
        /// Rust type name of the rejected registration
        attempted: String,
    },

    /// A type-erased value was narrowed to the wrong type
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Identifier of the requested type
        expected: String,
        /// Identifier of the value's runtime type
        actual: String,
    },
}

impl IdentityError {
    /// Create an unnameable type error
    pub fn unnameable(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unnameable {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a malformed identifier error
    pub fn malformed(
        identifier: impl Into<String>,
        position: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Malformed {
            identifier: identifier.into(),
            position,
            message: message.into(),
        }
    }

    /// Create a type not found error
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }

    /// Create a registration conflict error
    pub fn conflict(
        identifier: impl Into<String>,
        existing: impl Into<String>,
        attempted: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            identifier: identifier.into(),
            existing: existing.into(),
            attempted: attempted.into(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Whether the error comes from resolving an identifier read off the wire
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::NotFound { .. })
    }
}

/// Standard Result type for identity operations
pub type Result<T> = std::result::Result<T, IdentityError>;
