//! Elementwise kernels: unary math, binary arithmetic, comparison, select
//!
//! Every kernel gathers its operands in logical (row-major) order, computes a
//! fresh contiguous result, and never writes through a view. Mixed-dtype
//! binary kernels compute in [`result_type`] of their operands.

use super::{astype, broadcast_shape};
use crate::dtype::{result_type, Bool, DType, Element};
use crate::error::{Error, Result};
use crate::tensor::Tensor;
use crate::{dispatch_dtype, dispatch_float_dtype};

/// Element count above which kernels split work across the rayon pool
pub const PARALLEL_THRESHOLD: usize = 1 << 15;

#[cfg(feature = "rayon")]
fn map_values<T, U, F>(src: Vec<T>, f: F) -> Vec<U>
where
    T: Element,
    U: Element,
    F: Fn(T) -> U + Send + Sync,
{
    use rayon::prelude::*;
    if src.len() >= PARALLEL_THRESHOLD {
        src.par_iter().map(|&x| f(x)).collect()
    } else {
        src.into_iter().map(f).collect()
    }
}

#[cfg(not(feature = "rayon"))]
fn map_values<T, U, F>(src: Vec<T>, f: F) -> Vec<U>
where
    T: Element,
    U: Element,
    F: Fn(T) -> U + Send + Sync,
{
    src.into_iter().map(f).collect()
}

#[cfg(feature = "rayon")]
fn zip_values<T, U, F>(a: Vec<T>, b: Vec<T>, f: F) -> Vec<U>
where
    T: Element,
    U: Element,
    F: Fn(T, T) -> U + Send + Sync,
{
    use rayon::prelude::*;
    if a.len() >= PARALLEL_THRESHOLD {
        a.par_iter().zip(b.par_iter()).map(|(&x, &y)| f(x, y)).collect()
    } else {
        a.into_iter().zip(b).map(|(x, y)| f(x, y)).collect()
    }
}

#[cfg(not(feature = "rayon"))]
fn zip_values<T, U, F>(a: Vec<T>, b: Vec<T>, f: F) -> Vec<U>
where
    T: Element,
    U: Element,
    F: Fn(T, T) -> U + Send + Sync,
{
    a.into_iter().zip(b).map(|(x, y)| f(x, y)).collect()
}

// ============================================================================
// Unary
// ============================================================================

/// Cast non-float input to F32, the dtype float-valued math promotes to
fn float_input(a: &Tensor) -> Result<Tensor> {
    if a.dtype().is_float() {
        Ok(a.clone())
    } else {
        astype(a, DType::F32)
    }
}

fn unary_float(a: &Tensor, op: &'static str, f: fn(f64) -> f64) -> Result<Tensor> {
    let a = float_input(a)?;
    dispatch_float_dtype!(a.dtype(), T => {
        let out = map_values(a.to_vec::<T>(), |x: T| T::from_f64(f(x.to_f64())));
        Tensor::from_vec(out, a.shape())
    }, op)
}

/// Elementwise square root
pub fn sqrt(a: &Tensor) -> Result<Tensor> {
    unary_float(a, "sqrt", f64::sqrt)
}

/// Elementwise natural exponent
pub fn exp(a: &Tensor) -> Result<Tensor> {
    unary_float(a, "exp", f64::exp)
}

/// Elementwise base-2 logarithm
pub fn log2(a: &Tensor) -> Result<Tensor> {
    unary_float(a, "log2", f64::log2)
}

/// Elementwise sine
pub fn sin(a: &Tensor) -> Result<Tensor> {
    unary_float(a, "sin", f64::sin)
}

/// Elementwise negation
///
/// Integers wrap, bools are logically inverted.
pub fn neg(a: &Tensor) -> Result<Tensor> {
    dispatch_dtype!(a.dtype(), T => {
        let out = map_values(a.to_vec::<T>(), |x: T| x.neg_elem());
        Tensor::from_vec(out, a.shape())
    }, "neg")
}

/// Per-element truthiness (`!= 0`) in logical order
pub(crate) fn truth_values(a: &Tensor) -> Vec<bool> {
    dispatch_dtype!(a.dtype(), T => {
        a.to_vec::<T>().into_iter().map(|x: T| x.is_nonzero()).collect()
    }, "truth_values")
}

// ============================================================================
// Binary
// ============================================================================

/// Broadcast two operands together and cast both to `dtype`
fn prepare_binary(a: &Tensor, b: &Tensor, dtype: DType) -> Result<(Tensor, Tensor)> {
    let shape =
        broadcast_shape(a.shape(), b.shape()).ok_or_else(|| Error::broadcast(a.shape(), b.shape()))?;
    let a = astype(&a.broadcast_to(&shape)?, dtype)?;
    let b = astype(&b.broadcast_to(&shape)?, dtype)?;
    Ok((a, b))
}

fn binary_same(a: &Tensor, b: &Tensor, op: &'static str, kernel: BinaryKernel) -> Result<Tensor> {
    let dtype = result_type(a.dtype(), b.dtype());
    let (a, b) = prepare_binary(a, b, dtype)?;
    dispatch_dtype!(dtype, T => {
        let out = zip_values(a.to_vec::<T>(), b.to_vec::<T>(), |x: T, y: T| kernel.apply(x, y));
        Tensor::from_vec(out, a.shape())
    }, op)
}

/// Arithmetic applied by the same-dtype binary kernels
#[derive(Copy, Clone, Debug)]
enum BinaryKernel {
    Add,
    Sub,
    Mul,
    Div,
    Max,
}

impl BinaryKernel {
    #[inline]
    fn apply<T: Element>(self, x: T, y: T) -> T {
        match self {
            Self::Add => x.add_elem(y),
            Self::Sub => x.sub_elem(y),
            Self::Mul => x.mul_elem(y),
            Self::Div => x.div_elem(y),
            Self::Max => x.max_elem(y),
        }
    }
}

/// Elementwise addition (bools: logical or)
pub fn add(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    binary_same(a, b, "add", BinaryKernel::Add)
}

/// Elementwise subtraction (bools: logical xor)
pub fn sub(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    binary_same(a, b, "sub", BinaryKernel::Sub)
}

/// Elementwise multiplication (bools: logical and)
pub fn mul(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    binary_same(a, b, "mul", BinaryKernel::Mul)
}

/// Elementwise maximum; NaN in either operand yields NaN
pub fn maximum(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    binary_same(a, b, "maximum", BinaryKernel::Max)
}

/// Elementwise division computed in the common dtype
///
/// Unlike [`div`], integer operands stay integers: the quotient truncates
/// toward zero and is exact over the whole range. Division by zero saturates
/// to the dtype's extreme of the dividend's sign and `0 / 0` is 0.
pub fn div_trunc(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    binary_same(a, b, "div_trunc", BinaryKernel::Div)
}

/// Elementwise true division
///
/// Float operands keep their common dtype. Integer and bool operands are
/// divided in f64 and the result is `F64`.
pub fn div(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    let common = result_type(a.dtype(), b.dtype());
    let dtype = if common.is_float() { common } else { DType::F64 };
    let (a, b) = prepare_binary(a, b, dtype)?;
    dispatch_float_dtype!(dtype, T => {
        let out = zip_values(a.to_vec::<T>(), b.to_vec::<T>(), |x: T, y: T| {
            T::from_f64(x.to_f64() / y.to_f64())
        });
        Tensor::from_vec(out, a.shape())
    }, "div")
}

/// Elementwise `a < b`, returning `Bool`
pub fn less(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    let dtype = result_type(a.dtype(), b.dtype());
    let (a, b) = prepare_binary(a, b, dtype)?;
    dispatch_dtype!(dtype, T => {
        let out = zip_values(a.to_vec::<T>(), b.to_vec::<T>(), |x: T, y: T| Bool::new(x < y));
        Tensor::from_vec(out, a.shape())
    }, "less")
}

/// Elementwise bitwise xor (integers and bools only)
pub fn bitwise_xor(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    let dtype = result_type(a.dtype(), b.dtype());
    if dtype.is_float() {
        return Err(Error::unsupported_dtype(dtype, "bitwise_xor"));
    }
    let (a, b) = prepare_binary(a, b, dtype)?;
    dispatch_dtype!(dtype, T => {
        let out = zip_values(a.to_vec::<T>(), b.to_vec::<T>(), |x: T, y: T| {
            x.xor_elem(y).unwrap_or_else(T::zero)
        });
        Tensor::from_vec(out, a.shape())
    }, "bitwise_xor")
}

// ============================================================================
// Ternary
// ============================================================================

/// Elementwise select: `cond != 0 ? x : y`
///
/// All three operands broadcast together; the values are selected in
/// [`result_type`] of `x` and `y`.
pub fn where_(cond: &Tensor, x: &Tensor, y: &Tensor) -> Result<Tensor> {
    let dtype = result_type(x.dtype(), y.dtype());
    let shape = broadcast_shape(x.shape(), y.shape())
        .and_then(|s| broadcast_shape(cond.shape(), &s))
        .ok_or_else(|| Error::broadcast(cond.shape(), x.shape()))?;

    let mask = truth_values(&cond.broadcast_to(&shape)?);
    let x = astype(&x.broadcast_to(&shape)?, dtype)?;
    let y = astype(&y.broadcast_to(&shape)?, dtype)?;
    dispatch_dtype!(dtype, T => {
        let out: Vec<T> = mask
            .into_iter()
            .zip(x.to_vec::<T>().into_iter().zip(y.to_vec::<T>()))
            .map(|(m, (a, b))| if m { a } else { b })
            .collect();
        Tensor::from_vec(out, &shape)
    }, "where")
}
