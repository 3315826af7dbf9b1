//! Error types shared by the realm and the describe engine.
use std::fmt;
use thiserror::Error;

// ————————————————————————————————————————————————————————————————————————————
// THROWN (exceptions raised inside a realm)
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrownKind {
    Error,
    TypeError,
    RangeError,
    ReferenceError,
}

impl fmt::Display for ThrownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "Error",
            Self::TypeError => "TypeError",
            Self::RangeError => "RangeError",
            Self::ReferenceError => "ReferenceError",
        };
        f.write_str(name)
    }
}

/// An exception raised by realm code: a getter, a native function, an
/// iterator step.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Thrown {
    pub kind: ThrownKind,
    pub message: String,
}

impl Thrown {
    pub fn new(kind: ThrownKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ThrownKind::Error, message)
    }
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ThrownKind::TypeError, message)
    }
    pub fn range_error(message: impl Into<String>) -> Self {
        Self::new(ThrownKind::RangeError, message)
    }
    pub fn is_type_error(&self) -> bool {
        self.kind == ThrownKind::TypeError
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DESCRIBE ERRORS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Error)]
pub enum DescribeError {
    /// A function was required but something else was supplied.
    #[error("{kind} is not a function")]
    NotAFunction { kind: String },

    /// Function source matched neither the conventional nor the arrow shape.
    #[error("unable to parse function source `{text}`")]
    UnparseableFunction { text: String },

    #[error("{kind} is not iterable")]
    NotIterable { kind: String },

    #[error("bucket size must be positive")]
    InvalidBucketSize,

    /// Enumeration failed part way through. Recoverable: the engine drops the
    /// sample and keeps going.
    #[error("iteration failed: {0}")]
    Sampling(Thrown),

    /// A property read failed for a reason other than a reflective restriction.
    #[error("uncaught {0}")]
    Thrown(#[from] Thrown),

    #[error("maximum describe depth of {limit} exceeded")]
    DepthExceeded { limit: usize },
}

pub type Result<T, E = DescribeError> = std::result::Result<T, E>;
