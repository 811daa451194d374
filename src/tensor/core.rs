//! Core Tensor type

use super::{Layout, Storage};
use super::layout::{Shape, Strides};
use crate::dtype::{DType, Element, Scalar};
use crate::error::{Error, Result};
use crate::dispatch_dtype;
use std::fmt;

/// N-dimensional array handle
///
/// `Tensor` consists of:
/// - **Storage**: reference-counted bytes tagged with a dtype
/// - **Layout**: shape, strides, and offset defining the view into storage
///
/// Tensors are values: every operation returns a new tensor. Views such as
/// [`broadcast_to`](Self::broadcast_to) and [`as_strided`](Self::as_strided)
/// share storage with their source; everything else produces fresh
/// contiguous storage.
///
/// # Example
///
/// ```
/// use numr_interp::tensor::Tensor;
///
/// let a = Tensor::from_slice(&[1.0f32, 2.0, 3.0], &[3, 1]);
/// let b = a.broadcast_to(&[3, 4]).unwrap(); // zero-copy
/// assert_eq!(b.shape(), &[3, 4]);
/// assert_eq!(b.strides(), &[1, 0]);
/// ```
#[derive(Clone)]
pub struct Tensor {
    storage: Storage,
    layout: Layout,
}

impl Tensor {
    /// Create a tensor from storage and layout
    pub fn from_parts(storage: Storage, layout: Layout) -> Self {
        Self { storage, layout }
    }

    /// Create a tensor from a slice of data
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of the `shape` dimensions.
    /// For a fallible alternative, use [`Self::try_from_slice`].
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize]) -> Self {
        Self::try_from_slice(data, shape).expect("Tensor::from_slice failed")
    }

    /// Create a tensor from a slice of data (fallible version)
    pub fn try_from_slice<T: Element>(data: &[T], shape: &[usize]) -> Result<Self> {
        Self::from_vec(data.to_vec(), shape)
    }

    /// Create a tensor taking ownership of a vector
    pub fn from_vec<T: Element>(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }

        Ok(Self {
            storage: Storage::from_vec(data),
            layout: Layout::contiguous(shape),
        })
    }

    /// Create a tensor from raw bytes, reinterpreted as `dtype` with `shape`
    pub fn from_bytes(bytes: Vec<u8>, dtype: DType, shape: &[usize]) -> Result<Self> {
        let numel: usize = shape.iter().product();
        let expected = numel * dtype.size_in_bytes();
        if bytes.len() != expected {
            return Err(Error::size_mismatch(expected, bytes.len()));
        }

        Ok(Self {
            storage: Storage::from_bytes(bytes, dtype)?,
            layout: Layout::contiguous(shape),
        })
    }

    /// Create a zero-filled tensor
    pub fn zeros(shape: &[usize], dtype: DType) -> Result<Self> {
        let len: usize = shape.iter().product();
        Ok(Self {
            storage: Storage::zeroed(len, dtype)?,
            layout: Layout::contiguous(shape),
        })
    }

    /// Create a tensor filled with a scalar value
    ///
    /// The scalar is converted to the target dtype with value-converting
    /// cast semantics.
    pub fn full_scalar(shape: &[usize], dtype: DType, value: Scalar) -> Result<Self> {
        let len: usize = shape.iter().product();
        dispatch_dtype!(dtype, T => {
            Self::from_vec(vec![T::from_scalar(value); len], shape)
        }, "full_scalar")
    }

    /// Create a 0-dimensional tensor holding `value`
    pub fn scalar(value: Scalar, dtype: DType) -> Result<Self> {
        Self::full_scalar(&[], dtype, value)
    }

    // ===== Accessors =====

    /// Get the storage
    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Mutable storage access for in-place writers (copy-on-write)
    #[inline]
    pub(crate) fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    /// Get the layout
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Get the strides (in elements)
    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Get the number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Get the total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.layout.elem_count()
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Size of the logical contents in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.numel() * self.dtype().size_in_bytes()
    }

    /// Check if the tensor is contiguous in memory
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Contiguous and covering its whole storage
    #[inline]
    pub fn is_compact(&self) -> bool {
        self.is_contiguous() && self.storage.len() == self.numel()
    }

    /// Check if this is a scalar (0-dimensional tensor)
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.layout.is_scalar()
    }

    // ===== Data Access =====

    /// Copy the logical contents (row-major order) into a vector
    ///
    /// # Panics
    ///
    /// Panics if `T` does not match the tensor's dtype.
    pub fn to_vec<T: Element>(&self) -> Vec<T> {
        assert_eq!(
            T::DTYPE,
            self.dtype(),
            "Tensor::to_vec called with the wrong element type"
        );
        let all = self.storage.to_vec::<T>();
        if self.is_compact() {
            return all;
        }
        self.layout.offsets().map(|o| all[o]).collect()
    }

    /// Copy the logical contents (row-major order) as raw bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.is_compact() {
            return self.storage.as_bytes().to_vec();
        }
        let size = self.dtype().size_in_bytes();
        let src = self.storage.as_bytes();
        let mut out = Vec::with_capacity(self.size_in_bytes());
        for o in self.layout.offsets() {
            out.extend_from_slice(&src[o * size..(o + 1) * size]);
        }
        out
    }

    // ===== View Operations (Zero-Copy) =====

    /// Broadcast to a target shape (zero-copy)
    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        let new_layout = self
            .layout
            .broadcast_to(shape)
            .ok_or_else(|| Error::broadcast(self.shape(), shape))?;

        Ok(Self {
            storage: self.storage.clone(),
            layout: new_layout,
        })
    }

    /// View the underlying storage with an explicit shape, strides, and offset
    ///
    /// Strides and offset are in elements of the tensor's dtype. Every
    /// addressed element must lie inside the storage.
    pub fn as_strided(&self, shape: &[usize], strides: &[isize], offset: usize) -> Result<Self> {
        if shape.len() != strides.len() {
            return Err(Error::invalid_argument(
                "strides",
                format!("{} strides for a rank-{} shape", strides.len(), shape.len()),
            ));
        }

        let layout = Layout::new(
            shape.iter().copied().collect::<Shape>(),
            strides.iter().copied().collect::<Strides>(),
            offset,
        );
        let len = self.storage.len();
        if let Some((min, max)) = layout.extent() {
            if min < 0 || max >= len as isize {
                return Err(Error::BoundsViolation { min, max, len });
            }
        }

        Ok(Self {
            storage: self.storage.clone(),
            layout,
        })
    }

    /// Keep only the flagged axes, pinning the others at index 0 (zero-copy)
    pub fn select_axes(&self, keep: &[bool]) -> Result<Self> {
        let layout = self.layout.select_axes(keep).ok_or_else(|| {
            Error::invalid_argument(
                "keep",
                format!("cannot select axes {keep:?} of shape {:?}", self.shape()),
            )
        })?;

        Ok(Self {
            storage: self.storage.clone(),
            layout,
        })
    }

    /// Reinterpret the bits as another dtype of the same element size (zero-copy)
    pub fn bitcast(&self, dtype: DType) -> Result<Self> {
        Ok(Self {
            storage: self.storage.with_dtype(dtype)?,
            layout: self.layout.clone(),
        })
    }

    /// Reshape to a new shape, copying first if the layout is not contiguous
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if numel != self.numel() {
            return Err(Error::shape_mismatch(self.shape(), shape));
        }

        let source = self.contiguous();
        let layout = source
            .layout
            .reshape(shape)
            .ok_or_else(|| Error::shape_mismatch(source.shape(), shape))?;

        Ok(Self {
            storage: source.storage,
            layout,
        })
    }

    /// Make tensor contiguous (copy if needed)
    ///
    /// Returns a cheap clone if the tensor already owns exactly its elements
    /// in row-major order.
    pub fn contiguous(&self) -> Self {
        if self.is_compact() {
            return self.clone();
        }

        // Byte-level gather keeps this infallible: the storage already exists,
        // the output is never larger than the logical contents.
        let bytes = self.to_bytes();
        Self {
            storage: Storage::from_bytes_unchecked(bytes, self.dtype()),
            layout: Layout::contiguous(self.shape()),
        }
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("dtype", &self.dtype())
            .field("layout", &self.layout)
            .field("storage", &self.storage)
            .finish()
    }
}
