//! Shape operations: padding, broadcasting, strided views

use crate::error::{Error, Result};
use crate::tensor::{Layout, Storage, Tensor};

/// Pad each axis with `(before, after)` zeros
///
/// Always materializes a new contiguous tensor, even for zero padding.
pub fn pad(a: &Tensor, padding: &[(usize, usize)]) -> Result<Tensor> {
    if padding.len() != a.ndim() {
        return Err(Error::invalid_argument(
            "padding",
            format!("{} pairs for a rank-{} tensor", padding.len(), a.ndim()),
        ));
    }

    let out_shape: Vec<usize> = a
        .shape()
        .iter()
        .zip(padding)
        .map(|(&s, &(before, after))| s + before + after)
        .collect();
    let out_layout = Layout::contiguous(&out_shape);

    // Where the source lands inside the output
    let origin: usize = padding
        .iter()
        .zip(out_layout.strides())
        .map(|(&(before, _), &stride)| before * stride as usize)
        .sum();
    let interior = Layout::new(
        a.shape().iter().copied().collect(),
        out_layout.strides().iter().copied().collect(),
        origin,
    );

    let numel: usize = out_shape.iter().product();
    let mut storage = Storage::zeroed(numel, a.dtype())?;
    let size = a.dtype().size_in_bytes();
    let src = a.to_bytes();
    let dst = storage.make_mut();
    for (chunk, o) in src.chunks_exact(size).zip(interior.offsets()) {
        dst[o * size..(o + 1) * size].copy_from_slice(chunk);
    }

    Ok(Tensor::from_parts(storage, out_layout))
}

/// View `a` with explicit element strides and offset (zero-copy)
///
/// A source that is not compact is materialized first so the strides address
/// its logical contents.
pub fn as_strided(a: &Tensor, shape: &[usize], strides: &[isize], offset: usize) -> Result<Tensor> {
    a.contiguous().as_strided(shape, strides, offset)
}
