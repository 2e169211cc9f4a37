// src/error.rs
//! Error types for buffer and accessor operations with conversion support

use std::fmt;

/// Errors that can occur while creating buffers or pulling table data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Null pointer, zero count or otherwise malformed argument
    InvalidArgument(String),
    /// The memory context could not satisfy an allocation request
    AllocationFailure(String),
    /// Operation not allowed in the current state (e.g. mutable access to immutable data)
    InvalidState(String),
    /// Row range, column index or feature index outside the container bounds
    OutOfRange {
        /// Offending index
        index: i64,
        /// Exclusive upper bound that was violated
        bound: usize,
    },
    /// The table does not support the requested kind of access
    UnsupportedCapability(String),
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Self::AllocationFailure(msg) => write!(f, "Allocation failure: {}", msg),
            Self::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Self::OutOfRange { index, bound } => {
                write!(f, "Index {} out of range (bound {})", index, bound)
            }
            Self::UnsupportedCapability(msg) => write!(f, "Unsupported capability: {}", msg),
        }
    }
}

impl std::error::Error for BufferError {}

// ============================================================================
// ERROR CONVERSION
// ============================================================================

/// Convert BufferError to std::io::Error
impl From<BufferError> for std::io::Error {
    fn from(err: BufferError) -> Self {
        use std::io::ErrorKind;
        match err {
            BufferError::InvalidArgument(_) | BufferError::OutOfRange { .. } => {
                std::io::Error::new(ErrorKind::InvalidInput, err)
            }
            BufferError::AllocationFailure(_) => std::io::Error::new(ErrorKind::OutOfMemory, err),
            BufferError::UnsupportedCapability(_) => {
                std::io::Error::new(ErrorKind::Unsupported, err)
            }
            BufferError::InvalidState(_) => std::io::Error::other(err),
        }
    }
}

// ============================================================================
// RESULT TYPE ALIASES
// ============================================================================

/// Result type alias for buffer operations
///
/// Note: When using with other Result types (like anyhow::Result),
/// either qualify the type (`blockbuf::Result<T>`) or use the conversion traits.
pub type Result<T> = std::result::Result<T, BufferError>;

// ============================================================================
// EXTENSION TRAIT FOR EASY CONVERSION
// ============================================================================

/// Extension trait for converting Results between different error types
pub trait ResultExt<T> {
    /// Convert to anyhow::Result, through anyhow's conversion for
    /// `std::error::Error` types
    #[cfg(feature = "anyhow")]
    fn into_anyhow(self) -> anyhow::Result<T>;

    /// Convert to io::Result
    fn into_io(self) -> std::io::Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    #[cfg(feature = "anyhow")]
    fn into_anyhow(self) -> anyhow::Result<T> {
        self.map_err(|e| e.into())
    }

    fn into_io(self) -> std::io::Result<T> {
        self.map_err(|e| e.into())
    }
}

// ============================================================================
// HELPER MACROS FOR ERROR HANDLING
// ============================================================================

/// Converts the error of a buffer operation into another error type.
///
/// The second argument names the target error type; without it the error is
/// converted into `std::io::Error`.
///
/// # Example
/// ```
/// use blockbuf::prelude::*;
/// use blockbuf::buffer_op;
///
/// fn allocate() -> std::io::Result<Buffer<f32>> {
///     let ctx = MemoryContext::default();
///     buffer_op!(Buffer::<f32>::zeros(&ctx, 16, AllocKind::Host))
/// }
/// assert_eq!(allocate().unwrap().count(), 16);
/// ```
#[macro_export]
macro_rules! buffer_op {
    ($expr:expr, $target:ty) => {
        $expr.map_err(|e: $crate::BufferError| -> $target { e.into() })
    };
    ($expr:expr) => {
        $expr.map_err(|e: $crate::BufferError| -> std::io::Error { e.into() })
    };
}

/// Try a buffer operation with automatic error conversion
#[macro_export]
macro_rules! buffer_try {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => return Err(e.into()),
        }
    };
}
