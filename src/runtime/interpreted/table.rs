//! Operation dispatch table
//!
//! The single place that says what each operation means in terms of the host
//! array library. Matching is exhaustive over [`Op`], so a new operation in the
//! vocabulary does not compile until it is either implemented here or listed
//! as unsupported.

use super::mulacc::mulacc;
use super::op::{BinaryOp, BufferOp, MovementOp, Op, OpArg, TernaryOp, UnaryOp};
use super::promote::{coerce, match_types, promote, PriorityTable};
use super::{reduce, view};
use crate::dtype::{DType, Scalar};
use crate::error::{Error, Result};
use crate::ops;
use crate::tensor::Tensor;
use std::f64::consts::LN_2;

/// Whether the table implements `op`
pub fn is_supported(op: Op) -> bool {
    match op {
        Op::Buffer(BufferOp::Const) => true,
        Op::Buffer(BufferOp::Load | BufferOp::Store) => false,
        Op::Unary(
            UnaryOp::Exp2
            | UnaryOp::Log2
            | UnaryOp::Cast
            | UnaryOp::Sin
            | UnaryOp::Sqrt
            | UnaryOp::Neg,
        ) => true,
        Op::Unary(UnaryOp::Noop | UnaryOp::Recip) => false,
        Op::Binary(
            BinaryOp::Add
            | BinaryOp::Sub
            | BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Max
            | BinaryOp::CmpLt
            | BinaryOp::Xor,
        ) => true,
        Op::Binary(BinaryOp::Mod) => false,
        Op::Ternary(_) | Op::Reduce(_) => true,
        Op::Movement(MovementOp::Expand | MovementOp::Pad | MovementOp::AsStrided) => true,
        Op::Movement(
            MovementOp::Reshape | MovementOp::Permute | MovementOp::Shrink | MovementOp::Stride,
        ) => false,
    }
}

/// Reject unsupported operations and malformed operand counts
pub(crate) fn validate(op: Op, srcs: usize) -> Result<()> {
    if !is_supported(op) {
        return Err(Error::unsupported_op(op));
    }
    if srcs != op.arity() {
        return Err(Error::invalid_argument(
            "srcs",
            format!("{op} takes {} operands, got {srcs}", op.arity()),
        ));
    }
    Ok(())
}

fn wrong_arg(op: Op, arg: &OpArg) -> Error {
    Error::invalid_argument("arg", format!("{op} does not take a {} payload", arg.kind()))
}

fn shape_arg(op: Op, arg: &OpArg) -> Result<&[usize]> {
    match arg {
        OpArg::Shape(shape) => Ok(shape),
        other => Err(wrong_arg(op, other)),
    }
}

/// Base-2 exponent as `exp(x * ln 2)`, computed in a float dtype
fn exp2(x: &Tensor) -> Result<Tensor> {
    let x = if x.dtype().is_float() {
        x.clone()
    } else {
        coerce(x, DType::F32)?
    };
    let ln2 = Tensor::scalar(Scalar::Float(LN_2), x.dtype())?;
    ops::exp(&ops::mul(&x, &ln2)?)
}

/// Execute one operation
///
/// `srcs.len()` must equal [`Op::arity`]; operands are never modified.
pub fn dispatch<P: PriorityTable + ?Sized>(
    table: &P,
    op: Op,
    srcs: &[Tensor],
    arg: &OpArg,
) -> Result<Tensor> {
    validate(op, srcs.len())?;

    match op {
        Op::Buffer(BufferOp::Const) => match arg {
            OpArg::Const { value, dtype } => Tensor::scalar(*value, *dtype),
            other => Err(wrong_arg(op, other)),
        },

        Op::Unary(unary) => {
            let x = &srcs[0];
            match unary {
                UnaryOp::Sqrt => ops::sqrt(x),
                UnaryOp::Exp2 => exp2(x),
                UnaryOp::Log2 => ops::log2(x),
                UnaryOp::Sin => ops::sin(x),
                UnaryOp::Neg => ops::neg(x),
                UnaryOp::Cast => match arg {
                    OpArg::Cast {
                        dtype,
                        bitcast: true,
                    } => ops::bitcast(x, *dtype),
                    OpArg::Cast {
                        dtype,
                        bitcast: false,
                    } => ops::astype(x, *dtype),
                    other => Err(wrong_arg(op, other)),
                },
                UnaryOp::Noop | UnaryOp::Recip => Err(Error::unsupported_op(op)),
            }
        }

        Op::Binary(binary) => {
            let (x, y) = (&srcs[0], &srcs[1]);
            match binary {
                BinaryOp::Add => {
                    let (x, y) = match_types(table, x, y)?;
                    ops::add(&x, &y)
                }
                BinaryOp::Sub => {
                    let (x, y) = match_types(table, x, y)?;
                    ops::sub(&x, &y)
                }
                BinaryOp::Mul => {
                    let (x, y) = match_types(table, x, y)?;
                    ops::mul(&x, &y)
                }
                BinaryOp::Xor => {
                    let (x, y) = match_types(table, x, y)?;
                    ops::bitwise_xor(&x, &y)
                }
                BinaryOp::Div => {
                    let (x, y) = match_types(table, x, y)?;
                    if x.dtype().is_int() {
                        ops::div_trunc(&x, &y)
                    } else {
                        coerce(&ops::div(&x, &y)?, x.dtype())
                    }
                }
                BinaryOp::Max => ops::maximum(x, y),
                BinaryOp::CmpLt => {
                    let up = promote(table, x.dtype(), y.dtype())?;
                    coerce(&ops::less(x, y)?, up)
                }
                BinaryOp::Mod => Err(Error::unsupported_op(op)),
            }
        }

        Op::Ternary(TernaryOp::Where) => ops::where_(&srcs[0], &srcs[1], &srcs[2]),
        Op::Ternary(TernaryOp::MulAcc) => mulacc(table, &srcs[0], &srcs[1], shape_arg(op, arg)?),

        Op::Reduce(kind) => reduce::reduce(kind, &srcs[0], shape_arg(op, arg)?),

        Op::Movement(movement) => {
            let x = &srcs[0];
            match (movement, arg) {
                (MovementOp::Expand, OpArg::Shape(shape)) => view::expand(x, shape),
                (MovementOp::Pad, OpArg::Padding(padding)) => view::pad(x, padding),
                (
                    MovementOp::AsStrided,
                    OpArg::Strided {
                        shape,
                        strides,
                        offset,
                    },
                ) => view::as_strided(x, shape, strides, *offset),
                (MovementOp::Expand | MovementOp::Pad | MovementOp::AsStrided, other) => {
                    Err(wrong_arg(op, other))
                }
                (
                    MovementOp::Reshape
                    | MovementOp::Permute
                    | MovementOp::Shrink
                    | MovementOp::Stride,
                    _,
                ) => Err(Error::unsupported_op(op)),
            }
        }

        Op::Buffer(BufferOp::Load | BufferOp::Store) => Err(Error::unsupported_op(op)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::Bool;
    use crate::runtime::interpreted::promote::DTypePriority;

    fn run(op: impl Into<Op>, srcs: &[Tensor], arg: OpArg) -> Result<Tensor> {
        dispatch(&DTypePriority, op.into(), srcs, &arg)
    }

    #[test]
    fn test_const_is_scalar() {
        let t = run(
            BufferOp::Const,
            &[],
            OpArg::Const {
                value: Scalar::Float(2.5),
                dtype: DType::F16,
            },
        )
        .unwrap();
        assert!(t.is_scalar());
        assert_eq!(t.dtype(), DType::F16);
        assert_eq!(t.to_vec::<half::f16>(), vec![half::f16::from_f32(2.5)]);
    }

    #[test]
    fn test_add_promotes_to_an_input_type() {
        // The library alone would compute I8 + U8 in I16
        let x = Tensor::from_slice(&[-1i8, 100], &[2]);
        let y = Tensor::from_slice(&[1u8, 200], &[2]);
        let r = run(BinaryOp::Add, &[x, y], OpArg::None).unwrap();
        assert_eq!(r.dtype(), DType::U8);
        assert_eq!(r.to_vec::<u8>(), vec![0, 44]);
    }

    #[test]
    fn test_div_recoerces() {
        let x = Tensor::from_slice(&[7i32, -7], &[2]);
        let y = Tensor::from_slice(&[2i32, 2], &[2]);
        let r = run(BinaryOp::Div, &[x, y], OpArg::None).unwrap();
        assert_eq!(r.dtype(), DType::I32);
        assert_eq!(r.to_vec::<i32>(), vec![3, -3]);
    }

    #[test]
    fn test_div_wide_integers_are_exact() {
        let big = u64::MAX - 1;
        let x = Tensor::from_slice(&[big, big], &[2]);
        let y = Tensor::from_slice(&[1u64, 2], &[2]);
        let r = run(BinaryOp::Div, &[x, y], OpArg::None).unwrap();
        assert_eq!(r.dtype(), DType::U64);
        assert_eq!(r.to_vec::<u64>(), vec![big, big / 2]);
    }

    #[test]
    fn test_cmplt_numeric_result() {
        let x = Tensor::from_slice(&[1.0f32, 3.0], &[2]);
        let y = Tensor::from_slice(&[2.0f32, 2.0], &[2]);
        let r = run(BinaryOp::CmpLt, &[x, y], OpArg::None).unwrap();
        assert_eq!(r.dtype(), DType::F32);
        assert_eq!(r.to_vec::<f32>(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_exp2() {
        let x = Tensor::from_slice(&[0.0f64, 3.0, -1.0], &[3]);
        let r = run(UnaryOp::Exp2, &[x], OpArg::None).unwrap().to_vec::<f64>();
        for (got, want) in r.iter().zip([1.0, 8.0, 0.5]) {
            assert!((got - want).abs() < 1e-12);
        }
        let i = Tensor::from_slice(&[2i32], &[1]);
        let r = run(UnaryOp::Exp2, &[i], OpArg::None).unwrap();
        assert_eq!(r.dtype(), DType::F32);
        assert!((r.to_vec::<f32>()[0] - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_cast_modes() {
        let x = Tensor::from_slice(&[1.0f32], &[1]);
        let bits = run(
            UnaryOp::Cast,
            &[x.clone()],
            OpArg::Cast {
                dtype: DType::I32,
                bitcast: true,
            },
        )
        .unwrap();
        assert_eq!(bits.to_vec::<i32>(), vec![0x3f80_0000]);
        let value = run(
            UnaryOp::Cast,
            &[x],
            OpArg::Cast {
                dtype: DType::I32,
                bitcast: false,
            },
        )
        .unwrap();
        assert_eq!(value.to_vec::<i32>(), vec![1]);
    }

    #[test]
    fn test_neg_bool() {
        let x = Tensor::from_slice(&[Bool::TRUE, Bool::FALSE], &[2]);
        let r = run(UnaryOp::Neg, &[x], OpArg::None).unwrap();
        assert_eq!(r.to_vec::<Bool>(), vec![Bool::FALSE, Bool::TRUE]);
    }

    #[test]
    fn test_arity_and_payload_checked() {
        let x = Tensor::from_slice(&[1.0f32], &[1]);
        assert!(matches!(
            run(BinaryOp::Add, &[x.clone()], OpArg::None),
            Err(Error::InvalidArgument { arg: "srcs", .. })
        ));
        assert!(matches!(
            run(MovementOp::Pad, &[x], OpArg::Shape(vec![2])),
            Err(Error::InvalidArgument { arg: "arg", .. })
        ));
    }

    #[test]
    fn test_unsupported_checked_before_operands() {
        for op in Op::all().filter(|&op| !is_supported(op)) {
            assert!(matches!(
                dispatch(&DTypePriority, op, &[], &OpArg::None),
                Err(Error::UnsupportedOp { .. })
            ));
        }
    }
}
