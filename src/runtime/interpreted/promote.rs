//! Type promotion service
//!
//! The interpreter's own promotion rule: of two dtypes, the one with the
//! higher priority wins. Unlike the array library's
//! [`result_type`](crate::dtype::result_type), the result is always one of
//! the two inputs.

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::ops;
use crate::tensor::Tensor;

/// Dtype priority lookup supplied by the evaluator
pub trait PriorityTable {
    /// Promotion priority of `dtype`; higher wins
    fn priority(&self, dtype: DType) -> u8;
}

impl<P: PriorityTable + ?Sized> PriorityTable for &P {
    fn priority(&self, dtype: DType) -> u8 {
        (**self).priority(dtype)
    }
}

/// Default priority order
///
/// `Bool < I8 < U8 < I16 < U16 < I32 < U32 < I64 < U64 < F16 < BF16 < F32 < F64`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DTypePriority;

impl PriorityTable for DTypePriority {
    fn priority(&self, dtype: DType) -> u8 {
        match dtype {
            DType::Bool => 0,
            DType::I8 => 1,
            DType::U8 => 2,
            DType::I16 => 3,
            DType::U16 => 4,
            DType::I32 => 5,
            DType::U32 => 6,
            DType::I64 => 7,
            DType::U64 => 8,
            DType::F16 => 9,
            DType::BF16 => 10,
            DType::F32 => 11,
            DType::F64 => 12,
        }
    }
}

/// Result dtype of combining `a` and `b`: whichever has the higher priority
///
/// Distinct dtypes with equal priority mean the table is not a total order and
/// yield `Error::InvalidPriorityTable`.
pub fn promote<P: PriorityTable + ?Sized>(table: &P, a: DType, b: DType) -> Result<DType> {
    if a == b {
        return Ok(a);
    }
    let (pa, pb) = (table.priority(a), table.priority(b));
    if pa == pb {
        return Err(Error::InvalidPriorityTable {
            lhs: a,
            rhs: b,
            priority: pa,
        });
    }
    Ok(if pa > pb { a } else { b })
}

/// Cast `t` to `dtype`; no-op when it already has that dtype
pub fn coerce(t: &Tensor, dtype: DType) -> Result<Tensor> {
    ops::astype(t, dtype)
}

/// Coerce both operands to their promoted dtype
pub fn match_types<P: PriorityTable + ?Sized>(
    table: &P,
    x: &Tensor,
    y: &Tensor,
) -> Result<(Tensor, Tensor)> {
    let up = promote(table, x.dtype(), y.dtype())?;
    Ok((coerce(x, up)?, coerce(y, up)?))
}
