//! Reduction engine: collapse the axes a keepdims target shape marks as 1

use super::op::ReduceOp;
use crate::error::{Error, Result};
use crate::ops;
use crate::tensor::Tensor;

/// Axes where `new_shape` differs from `old_shape`
///
/// The ranks must match and every differing target axis must be 1.
pub fn shape_to_axis(old_shape: &[usize], new_shape: &[usize]) -> Result<Vec<usize>> {
    if old_shape.len() != new_shape.len() {
        return Err(Error::shape_mismatch(old_shape, new_shape));
    }
    let mut axes = Vec::new();
    for (i, (&old, &new)) in old_shape.iter().zip(new_shape).enumerate() {
        if old != new {
            if new != 1 {
                return Err(Error::shape_mismatch(old_shape, new_shape));
            }
            axes.push(i);
        }
    }
    Ok(axes)
}

/// Reduce `x` to `new_shape`, keeping the element type
///
/// Returns `x` unchanged when the shapes already match.
pub fn reduce(kind: ReduceOp, x: &Tensor, new_shape: &[usize]) -> Result<Tensor> {
    let axes = shape_to_axis(x.shape(), new_shape)?;
    if axes.is_empty() {
        return Ok(x.clone());
    }
    match kind {
        ReduceOp::Sum => ops::sum(x, &axes, true),
        ReduceOp::Max => ops::max(x, &axes, true),
    }
}
