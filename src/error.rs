//! Error types for numr-interp

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using numr-interp's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while interpreting operations or managing buffers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Operation identifier has no entry in the dispatch table
    #[error("Unsupported operation: {op}")]
    UnsupportedOp {
        /// Textual identifier of the rejected operation
        op: String,
    },

    /// Shape mismatch in a movement or reduction request
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Shapes cannot be broadcast together
    #[error("Cannot broadcast shape {from:?} to {to:?}")]
    BroadcastError {
        /// Source shape
        from: Vec<usize>,
        /// Requested shape
        to: Vec<usize>,
    },

    /// Strided view addresses elements outside its storage
    #[error("Strided view reads element range [{min}, {max}] outside storage of {len} elements")]
    BoundsViolation {
        /// Lowest element index addressed by the view
        min: isize,
        /// Highest element index addressed by the view
        max: isize,
        /// Number of elements in the underlying storage
        len: usize,
    },

    /// Device cannot provide the requested storage
    #[error("Out of memory: failed to allocate {size} bytes ({allocated} bytes live, limit {limit:?})")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
        /// Bytes already held by the allocator
        allocated: usize,
        /// Configured memory limit, if any
        limit: Option<usize>,
    },

    /// Host transfer size does not match the buffer size
    #[error("Size mismatch: buffer holds {expected} bytes, host side has {got} bytes")]
    SizeMismatch {
        /// Buffer size in bytes
        expected: usize,
        /// Host slice size in bytes
        got: usize,
    },

    /// Buffer handle is stale or belongs to another allocator
    #[error("Invalid buffer handle {handle}")]
    InvalidHandle {
        /// Display form of the handle
        handle: String,
    },

    /// Unsupported dtype for an operation
    #[error("Unsupported dtype {dtype:?} for operation '{op}'")]
    UnsupportedDType {
        /// The unsupported dtype
        dtype: DType,
        /// The operation name
        op: &'static str,
    },

    /// DType mismatch between operands
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Left-hand side dtype
        lhs: DType,
        /// Right-hand side dtype
        rhs: DType,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Priority table assigns the same priority to two distinct dtypes
    #[error("Priority table is not a total order: {lhs:?} and {rhs:?} share priority {priority}")]
    InvalidPriorityTable {
        /// First dtype
        lhs: DType,
        /// Second dtype
        rhs: DType,
        /// The shared priority
        priority: u8,
    },
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create a broadcast error
    pub fn broadcast(from: &[usize], to: &[usize]) -> Self {
        Self::BroadcastError {
            from: from.to_vec(),
            to: to.to_vec(),
        }
    }

    /// Create an unsupported dtype error
    pub fn unsupported_dtype(dtype: DType, op: &'static str) -> Self {
        Self::UnsupportedDType { dtype, op }
    }

    /// Create an unsupported operation error
    pub fn unsupported_op(op: impl ToString) -> Self {
        Self::UnsupportedOp { op: op.to_string() }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Create a size mismatch error
    pub fn size_mismatch(expected: usize, got: usize) -> Self {
        Self::SizeMismatch { expected, got }
    }
}
