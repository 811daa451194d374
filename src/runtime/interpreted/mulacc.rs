//! Multiply-accumulate (contraction) engine
//!
//! `MULACC(a, b)` with target shape `new_shape` means: multiply the two
//! (already expanded) operands elementwise, then sum over every axis that
//! collapses to 1 in `new_shape`. Materializing that product is wasteful when
//! the operands are broadcast views, so the engine instead reads each axis's
//! stride: a zero stride marks a broadcast axis that carries no data. Only the
//! active axes take part in an einsum; the result is reshaped and expanded
//! back to `new_shape`.

use super::promote::{match_types, promote, PriorityTable};
use crate::dtype::Scalar;
use crate::error::{Error, Result};
use crate::ops;
use crate::tensor::Tensor;

/// How an operand's axis takes part in the contraction
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AxisTag {
    /// Non-zero stride, the axis addresses distinct data
    Active,
    /// Zero stride, every position aliases one element
    Broadcast,
}

impl AxisTag {
    /// Whether the axis is active
    #[inline]
    pub fn is_active(self) -> bool {
        self == AxisTag::Active
    }
}

/// Tag every axis of `t` from its stride
pub fn axis_tags(t: &Tensor) -> Vec<AxisTag> {
    t.strides()
        .iter()
        .map(|&s| if s != 0 { AxisTag::Active } else { AxisTag::Broadcast })
        .collect()
}

/// Einsum label of axis `i`
fn label(i: usize) -> Result<char> {
    u8::try_from(i)
        .ok()
        .filter(|&i| i < 26)
        .map(|i| (b'a' + i) as char)
        .ok_or_else(|| {
            Error::invalid_argument("new_shape", format!("rank {} exceeds 26 axes", i + 1))
        })
}

fn labels(tags: &[AxisTag]) -> Result<Vec<char>> {
    tags.iter()
        .enumerate()
        .filter(|(_, t)| t.is_active())
        .map(|(i, _)| label(i))
        .collect()
}

/// Contract `a` and `b` into `new_shape`
///
/// Both operands must have the same shape and the rank of `new_shape`; each
/// target axis is either the operand size or 1. An empty `new_shape` contracts
/// every axis into a scalar. Operands are coerced to their promoted dtype after
/// broadcast axes have been sliced away.
pub fn mulacc<P: PriorityTable + ?Sized>(
    table: &P,
    a: &Tensor,
    b: &Tensor,
    new_shape: &[usize],
) -> Result<Tensor> {
    if a.shape() != b.shape() {
        return Err(Error::shape_mismatch(a.shape(), b.shape()));
    }
    if new_shape.is_empty() && a.ndim() > 0 {
        let ones = vec![1; a.ndim()];
        return mulacc(table, a, b, &ones)?.reshape(&[]);
    }
    if a.ndim() != new_shape.len()
        || a
            .shape()
            .iter()
            .zip(new_shape)
            .any(|(&s, &n)| s != n && n != 1)
    {
        return Err(Error::shape_mismatch(a.shape(), new_shape));
    }
    if a.numel() == 0 {
        return Tensor::zeros(new_shape, promote(table, a.dtype(), b.dtype())?);
    }

    let a_tags = axis_tags(a);
    let b_tags = axis_tags(b);
    let a_labels = labels(&a_tags)?;
    let b_labels = labels(&b_tags)?;

    let active = |i: usize| a_tags[i].is_active() || b_tags[i].is_active();
    let out_labels = (0..new_shape.len())
        .filter(|&i| a.shape()[i] == new_shape[i] && active(i))
        .map(label)
        .collect::<Result<Vec<_>>>()?;

    let a_keep: Vec<bool> = a_tags.iter().map(|t| t.is_active()).collect();
    let b_keep: Vec<bool> = b_tags.iter().map(|t| t.is_active()).collect();
    let (a_active, b_active) =
        match_types(table, &a.select_axes(&a_keep)?, &b.select_axes(&b_keep)?)?;

    let contracted = ops::einsum_labelled(
        &[(&a_active, a_labels.as_slice()), (&b_active, b_labels.as_slice())],
        &out_labels,
    )?;

    // An axis broadcast in both operands has no label, yet collapsing it
    // still adds one copy of every product per position.
    let repeats = (0..new_shape.len())
        .filter(|&i| !active(i) && a.shape()[i] != new_shape[i])
        .fold(1i128, |acc, i| acc.wrapping_mul(a.shape()[i] as i128));
    let contracted = if repeats == 1 {
        contracted
    } else {
        let n = Tensor::scalar(Scalar::Int(repeats), contracted.dtype())?;
        ops::mul(&contracted, &n)?
    };

    let placeholder: Vec<usize> = new_shape
        .iter()
        .enumerate()
        .map(|(i, &s)| if active(i) { s } else { 1 })
        .collect();
    contracted.reshape(&placeholder)?.broadcast_to(new_shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use crate::runtime::interpreted::promote::DTypePriority;

    #[test]
    fn test_axis_tags() {
        let t = Tensor::from_slice(&[1.0f32, 2.0], &[2, 1]).broadcast_to(&[2, 3]).unwrap();
        assert_eq!(axis_tags(&t), vec![AxisTag::Active, AxisTag::Broadcast]);
    }

    #[test]
    fn test_dot() {
        let a = Tensor::from_slice(&[1.0f32, 2.0, 3.0], &[3]);
        let b = Tensor::from_slice(&[4.0f32, 5.0, 6.0], &[3]);
        let r = mulacc(&DTypePriority, &a, &b, &[1]).unwrap();
        assert_eq!(r.shape(), &[1]);
        assert_eq!(r.to_vec::<f32>(), vec![32.0]);
    }

    #[test]
    fn test_empty_target_is_full_contraction() {
        let a = Tensor::from_slice(&[1i64, 2, 3, 4], &[2, 2]);
        let r = mulacc(&DTypePriority, &a, &a, &[]).unwrap();
        assert!(r.is_scalar());
        assert_eq!(r.to_vec::<i64>(), vec![30]);
    }

    #[test]
    fn test_broadcast_in_both_keeps_expanded_axis() {
        // Axis 1 is broadcast in both operands and survives into the output
        let a = Tensor::from_slice(&[1i32, 2], &[2, 1]).broadcast_to(&[2, 3]).unwrap();
        let b = Tensor::from_slice(&[10i32, 20], &[2, 1]).broadcast_to(&[2, 3]).unwrap();
        let r = mulacc(&DTypePriority, &a, &b, &[1, 3]).unwrap();
        assert_eq!(r.shape(), &[1, 3]);
        assert_eq!(r.to_vec::<i32>(), vec![50, 50, 50]);
        assert_eq!(r.strides()[1], 0);
    }

    #[test]
    fn test_collapsed_axis_broadcast_in_both() {
        let a = Tensor::from_slice(&[1i32, 2], &[2, 1]).broadcast_to(&[2, 3]).unwrap();
        let b = Tensor::from_slice(&[10i32, 20], &[2, 1]).broadcast_to(&[2, 3]).unwrap();
        let r = mulacc(&DTypePriority, &a, &b, &[2, 1]).unwrap();
        assert_eq!(r.to_vec::<i32>(), vec![30, 120]);

        // Only broadcast axes: every term repeats 4 * 5 times
        let s = Tensor::from_slice(&[0.5f32], &[1, 1]).broadcast_to(&[4, 5]).unwrap();
        let r = mulacc(&DTypePriority, &s, &s, &[1, 1]).unwrap();
        assert_eq!(r.to_vec::<f32>(), vec![5.0]);
    }

    #[test]
    fn test_zero_length_axis_sums_to_zero() {
        let a = Tensor::from_slice(&[1.0f32], &[1]).broadcast_to(&[0]).unwrap();
        let b = Tensor::from_slice(&[2u8], &[1]).broadcast_to(&[0]).unwrap();
        let r = mulacc(&DTypePriority, &a, &b, &[1]).unwrap();
        assert_eq!(r.dtype(), DType::F32);
        assert_eq!(r.to_vec::<f32>(), vec![0.0]);
    }

    #[test]
    fn test_promotes_operands() {
        let a = Tensor::from_slice(&[1u8, 2], &[2]);
        let b = Tensor::from_slice(&[0.5f32, 0.25], &[2]);
        let r = mulacc(&DTypePriority, &a, &b, &[1]).unwrap();
        assert_eq!(r.dtype(), DType::F32);
        assert_eq!(r.to_vec::<f32>(), vec![1.0]);
    }

    #[test]
    fn test_rejects_bad_target() {
        let a = Tensor::from_slice(&[1.0f32, 2.0], &[2]);
        assert!(matches!(
            mulacc(&DTypePriority, &a, &a, &[3]),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(mulacc(&DTypePriority, &a, &a, &[1, 1]).is_err());
    }
}
