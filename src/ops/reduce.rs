//! Reductions over axes
//!
//! Both reductions preserve the element type. Floating point sums accumulate
//! in f64 and round once; integer sums wrap in the element type.

use crate::dispatch_dtype;
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tensor::{Layout, Tensor};

/// Output shape of a reduction, with reduced axes kept as size 1 or dropped
pub fn reduce_output_shape(shape: &[usize], axes: &[usize], keepdims: bool) -> Vec<usize> {
    shape
        .iter()
        .enumerate()
        .filter_map(|(d, &s)| match (axes.contains(&d), keepdims) {
            (false, _) => Some(s),
            (true, true) => Some(1),
            (true, false) => None,
        })
        .collect()
}

/// Layout over the input shape mapping each input position to its output slot
fn accumulator_layout(shape: &[usize], axes: &[usize]) -> Layout {
    let kept = reduce_output_shape(shape, axes, true);
    let out = Layout::contiguous(&kept);
    let strides = shape
        .iter()
        .enumerate()
        .map(|(d, _)| if axes.contains(&d) { 0 } else { out.strides()[d] })
        .collect();
    Layout::new(shape.iter().copied().collect(), strides, 0)
}

fn validate_axes(a: &Tensor, axes: &[usize]) -> Result<()> {
    if let Some(&bad) = axes.iter().find(|&&ax| ax >= a.ndim()) {
        return Err(Error::invalid_argument(
            "axes",
            format!("axis {bad} out of range for rank {}", a.ndim()),
        ));
    }
    Ok(())
}

/// Sum over `axes`
pub fn sum(a: &Tensor, axes: &[usize], keepdims: bool) -> Result<Tensor> {
    validate_axes(a, axes)?;
    let out_shape = reduce_output_shape(a.shape(), axes, keepdims);
    let slots = accumulator_layout(a.shape(), axes);
    let out_len: usize = out_shape.iter().product();
    let float = a.dtype().is_float();

    dispatch_dtype!(a.dtype(), T => {
        let values = a.to_vec::<T>();
        let out: Vec<T> = if float {
            let mut acc = vec![0.0f64; out_len];
            for (x, slot) in values.into_iter().zip(slots.offsets()) {
                acc[slot] += x.to_f64();
            }
            acc.into_iter().map(T::from_f64).collect()
        } else {
            let mut acc = vec![T::zero(); out_len];
            for (x, slot) in values.into_iter().zip(slots.offsets()) {
                acc[slot] = acc[slot].add_elem(x);
            }
            acc
        };
        Tensor::from_vec(out, &out_shape)
    }, "sum")
}

/// Maximum over `axes`
///
/// NaN propagates. An empty reduced axis yields the dtype's lowest value.
pub fn max(a: &Tensor, axes: &[usize], keepdims: bool) -> Result<Tensor> {
    validate_axes(a, axes)?;
    let out_shape = reduce_output_shape(a.shape(), axes, keepdims);
    let slots = accumulator_layout(a.shape(), axes);
    let out_len: usize = out_shape.iter().product();

    dispatch_dtype!(a.dtype(), T => {
        let mut acc = vec![T::lowest(); out_len];
        for (x, slot) in a.to_vec::<T>().into_iter().zip(slots.offsets()) {
            acc[slot] = acc[slot].max_elem(x);
        }
        Tensor::from_vec(acc, &out_shape)
    }, "max")
}
