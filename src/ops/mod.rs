//! Array operations
//!
//! The primitive calls of the host array library. They are plain functions
//! over [`Tensor`] values: every call returns a new tensor and leaves its
//! operands untouched.
//!
//! ```text
//! ops
//!   ├── elementwise  sqrt, exp, log2, sin, neg, add, sub, mul, div, div_trunc,
//!   │                maximum, less, bitwise_xor, where_
//!   ├── cast         astype (value-converting), bitcast (bit reinterpretation)
//!   ├── reduce       sum, max over axes
//!   ├── shape        pad, as_strided
//!   └── einsum       labelled contraction + string notation
//! ```
//!
//! # Type rules
//!
//! Binary operations on mixed dtypes compute in
//! [`result_type`](crate::dtype::result_type), which can produce a dtype that
//! is neither operand. Callers that need a specific result dtype cast the
//! operands first with [`astype`].
//!
//! # Broadcasting
//!
//! Elementwise binary and ternary operations broadcast their operands with
//! NumPy rules (see [`broadcast_shape`]).

mod cast;
mod dispatch;
mod einsum;
mod elementwise;
mod reduce;
mod shape;

pub use cast::{astype, bitcast};
pub use einsum::{einsum, einsum_labelled, parse_subscripts, Subscripts};
pub use elementwise::{
    add, bitwise_xor, div, div_trunc, exp, less, log2, maximum, mul, neg, sin, sqrt, sub,
    where_, PARALLEL_THRESHOLD,
};
pub use reduce::{max, reduce_output_shape, sum};
pub use shape::{as_strided, pad};

/// Compute the broadcast shape of two shapes
///
/// Shapes are aligned from the right; each pair of dimensions must be equal
/// or contain a 1. Returns `None` if the shapes are incompatible.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let max_ndim = a.len().max(b.len());
    let mut result = Vec::with_capacity(max_ndim);

    // Iterate from right to left
    for i in 0..max_ndim {
        let a_dim = if i < a.len() { a[a.len() - 1 - i] } else { 1 };
        let b_dim = if i < b.len() { b[b.len() - 1 - i] } else { 1 };

        if a_dim == b_dim || b_dim == 1 {
            result.push(a_dim);
        } else if a_dim == 1 {
            result.push(b_dim);
        } else {
            return None;
        }
    }

    result.reverse();
    Some(result)
}
