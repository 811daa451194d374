//! View/layout builder for movement operations

use crate::error::{Error, Result};
use crate::ops;
use crate::tensor::Tensor;

/// Broadcast size-1 axes of `x` to `new_shape` (zero-copy)
///
/// The rank must not change and every axis that changes size must have size 1.
pub fn expand(x: &Tensor, new_shape: &[usize]) -> Result<Tensor> {
    let expandable = x.ndim() == new_shape.len()
        && x
            .shape()
            .iter()
            .zip(new_shape)
            .all(|(&old, &new)| old == new || old == 1);
    if !expandable {
        return Err(Error::shape_mismatch(x.shape(), new_shape));
    }
    x.broadcast_to(new_shape)
}

/// Zero-pad every axis; the result never aliases `x`
pub fn pad(x: &Tensor, padding: &[(usize, usize)]) -> Result<Tensor> {
    ops::pad(x, padding)
}

/// View `x`'s contiguous contents with explicit element strides and offset
///
/// Addressing outside the contents is `Error::BoundsViolation`.
pub fn as_strided(x: &Tensor, shape: &[usize], strides: &[isize], offset: usize) -> Result<Tensor> {
    ops::as_strided(x, shape, strides, offset)
}
