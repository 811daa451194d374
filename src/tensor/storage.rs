//! Storage: host-resident bytes with Arc-based sharing

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use std::sync::Arc;

/// Storage for array data
///
/// Storage wraps a byte buffer with reference counting, enabling zero-copy
/// views (expand, strided views, bit reinterpretation) that share the
/// underlying bytes. Writers go through [`Storage::make_mut`], which copies
/// when the bytes are shared, so existing views never observe a write.
#[derive(Clone)]
pub struct Storage {
    bytes: Arc<Vec<u8>>,
    dtype: DType,
}

impl Storage {
    /// Allocate zero-filled storage for `len` elements of `dtype`
    ///
    /// Returns `Err(OutOfMemory)` if the host cannot reserve the bytes.
    pub fn zeroed(len: usize, dtype: DType) -> Result<Self> {
        let size = len
            .checked_mul(dtype.size_in_bytes())
            .ok_or_else(|| Error::invalid_argument("len", format!("{len} elements overflow")))?;
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(size).map_err(|_| Error::OutOfMemory {
            size,
            allocated: 0,
            limit: None,
        })?;
        bytes.resize(size, 0);
        Ok(Self {
            bytes: Arc::new(bytes),
            dtype,
        })
    }

    /// Create storage from typed data
    pub fn from_vec<T: Element>(data: Vec<T>) -> Self {
        let bytes = bytemuck::cast_slice::<T, u8>(&data).to_vec();
        Self {
            bytes: Arc::new(bytes),
            dtype: T::DTYPE,
        }
    }

    /// Create storage from raw bytes with explicit dtype
    pub fn from_bytes(bytes: Vec<u8>, dtype: DType) -> Result<Self> {
        if bytes.len() % dtype.size_in_bytes() != 0 {
            return Err(Error::invalid_argument(
                "bytes",
                format!(
                    "{} bytes is not a whole number of {} elements",
                    bytes.len(),
                    dtype
                ),
            ));
        }
        Ok(Self {
            bytes: Arc::new(bytes),
            dtype,
        })
    }

    /// Wrap bytes already known to hold whole elements of `dtype`
    pub(crate) fn from_bytes_unchecked(bytes: Vec<u8>, dtype: DType) -> Self {
        debug_assert_eq!(bytes.len() % dtype.size_in_bytes(), 0);
        Self {
            bytes: Arc::new(bytes),
            dtype,
        }
    }

    /// Reinterpret the same bytes as another dtype of equal element size
    pub fn with_dtype(&self, dtype: DType) -> Result<Self> {
        if dtype.size_in_bytes() != self.dtype.size_in_bytes() {
            return Err(Error::invalid_argument(
                "dtype",
                format!(
                    "cannot reinterpret {} ({} bytes) as {} ({} bytes)",
                    self.dtype,
                    self.dtype.size_in_bytes(),
                    dtype,
                    dtype.size_in_bytes()
                ),
            ));
        }
        Ok(Self {
            bytes: Arc::clone(&self.bytes),
            dtype,
        })
    }

    /// Get the number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / self.dtype.size_in_bytes()
    }

    /// Check if storage is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Get size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Raw bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether two storages share the same bytes
    #[inline]
    pub fn shares_bytes_with(&self, other: &Storage) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }

    /// Mutable access to the bytes, copying first if they are shared
    pub(crate) fn make_mut(&mut self) -> &mut Vec<u8> {
        Arc::make_mut(&mut self.bytes)
    }

    /// Copy the whole storage into a typed vector
    pub fn to_vec<T: bytemuck::Pod>(&self) -> Vec<T> {
        // Allocate with T's alignment, then copy bytes in; the byte buffer
        // itself carries no alignment guarantee for wider types.
        let mut result = vec![T::zeroed(); self.bytes.len() / std::mem::size_of::<T>()];
        let dst: &mut [u8] = bytemuck::cast_slice_mut(&mut result);
        dst.copy_from_slice(&self.bytes[..dst.len()]);
        result
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("bytes", &self.bytes.len())
            .field("dtype", &self.dtype)
            .field("refs", &Arc::strong_count(&self.bytes))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_roundtrip() {
        let storage = Storage::from_vec(vec![1.5f64, -2.0, 3.25]);
        assert_eq!(storage.len(), 3);
        assert_eq!(storage.size_in_bytes(), 24);
        assert_eq!(storage.to_vec::<f64>(), vec![1.5, -2.0, 3.25]);
    }

    #[test]
    fn test_make_mut_copies_shared_bytes() {
        let a = Storage::from_vec(vec![1u8, 2, 3]);
        let mut b = a.clone();
        assert!(a.shares_bytes_with(&b));
        b.make_mut()[0] = 9;
        assert!(!a.shares_bytes_with(&b));
        assert_eq!(a.as_bytes(), &[1, 2, 3]);
        assert_eq!(b.as_bytes(), &[9, 2, 3]);
    }

    #[test]
    fn test_with_dtype_requires_equal_size() {
        let s = Storage::from_vec(vec![1.0f32]);
        assert_eq!(s.with_dtype(DType::I32).unwrap().dtype(), DType::I32);
        assert!(s.with_dtype(DType::I64).is_err());
    }

    #[test]
    fn test_from_bytes_rejects_partial_element() {
        assert!(Storage::from_bytes(vec![0u8; 5], DType::F32).is_err());
    }
}
