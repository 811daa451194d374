//! Layout: shape, strides, and offset for array memory layout

use smallvec::SmallVec;
use std::fmt;

/// Stack allocation threshold for dimensions
/// Most arrays have 4 or fewer dimensions, so we stack-allocate up to 4
const STACK_DIMS: usize = 4;

/// Shape type: dimensions of an array
pub type Shape = SmallVec<[usize; STACK_DIMS]>;

/// Strides type: element offsets between consecutive elements along each dimension
/// Signed to support negative strides
/// NOTE: Strides are in ELEMENTS, not bytes
pub type Strides = SmallVec<[isize; STACK_DIMS]>;

/// Layout describes the memory layout of an array
///
/// Address of element at indices [i0, i1, ..., in]:
///   offset + i0 * strides[0] + i1 * strides[1] + ... + in * strides[n]
///
/// A stride of zero marks a broadcast axis: every position along it aliases
/// the same element.
#[derive(Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: Strides,
    offset: usize,
}

impl Layout {
    /// Create a new contiguous (row-major/C-order) layout from a shape
    ///
    /// # Example
    /// ```
    /// use numr_interp::tensor::Layout;
    /// let layout = Layout::contiguous(&[2, 3, 4]);
    /// assert_eq!(layout.shape(), &[2, 3, 4]);
    /// assert_eq!(layout.strides(), &[12, 4, 1]);
    /// ```
    pub fn contiguous(shape: &[usize]) -> Self {
        let shape: Shape = shape.iter().copied().collect();
        let strides = Self::compute_contiguous_strides(&shape);
        Self {
            shape,
            strides,
            offset: 0,
        }
    }

    /// Create a layout with explicit shape, strides, and offset
    pub fn new(shape: Shape, strides: Strides, offset: usize) -> Self {
        debug_assert_eq!(shape.len(), strides.len());
        Self {
            shape,
            strides,
            offset,
        }
    }

    /// Create a scalar (0-dimensional) layout
    pub fn scalar() -> Self {
        Self {
            shape: SmallVec::new(),
            strides: SmallVec::new(),
            offset: 0,
        }
    }

    /// Compute contiguous strides for a given shape (row-major order)
    fn compute_contiguous_strides(shape: &[usize]) -> Strides {
        let mut strides: Strides = SmallVec::with_capacity(shape.len());
        let mut stride = 1isize;

        for &dim in shape.iter().rev() {
            strides.push(stride);
            stride *= dim.max(1) as isize;
        }

        strides.reverse();
        strides
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Get the offset
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements
    #[inline]
    pub fn elem_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Check if the array is a scalar (0 dimensions)
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Check if memory is contiguous (row-major order, zero offset)
    pub fn is_contiguous(&self) -> bool {
        if self.is_scalar() {
            return self.offset == 0;
        }

        let expected = Self::compute_contiguous_strides(&self.shape);
        self.strides == expected && self.offset == 0
    }

    /// Lowest and highest element index addressed by this layout
    ///
    /// Returns `None` for layouts with zero elements. Bounds that do not fit
    /// in `isize` saturate, so they still compare outside any real storage.
    pub fn extent(&self) -> Option<(isize, isize)> {
        if self.shape.contains(&0) {
            return None;
        }

        let offset = isize::try_from(self.offset).unwrap_or(isize::MAX);
        let (mut lo, mut hi) = (offset, offset);
        for (&dim, &stride) in self.shape.iter().zip(self.strides.iter()) {
            let last = isize::try_from(dim - 1).unwrap_or(isize::MAX);
            let span = last.saturating_mul(stride);
            if span < 0 {
                lo = lo.saturating_add(span);
            } else {
                hi = hi.saturating_add(span);
            }
        }
        Some((lo, hi))
    }

    /// Create a reshaped layout (if contiguous)
    ///
    /// Returns None if the layout is not contiguous or element counts differ
    pub fn reshape(&self, new_shape: &[usize]) -> Option<Self> {
        if !self.is_contiguous() {
            return None;
        }

        let new_count: usize = new_shape.iter().product();
        if new_count != self.elem_count() {
            return None;
        }

        Some(Self::contiguous(new_shape))
    }

    /// Create a broadcast layout to a target shape
    ///
    /// Leading axes are added with stride 0; size-1 axes become stride 0.
    /// Returns None if shapes are not broadcastable
    pub fn broadcast_to(&self, target: &[usize]) -> Option<Self> {
        if target.len() < self.ndim() {
            return None;
        }

        let mut new_shape = Shape::new();
        let mut new_strides = Strides::new();

        let pad = target.len() - self.ndim();
        for &t in &target[..pad] {
            new_shape.push(t);
            new_strides.push(0);
        }

        for ((&s, &st), &t) in self
            .shape
            .iter()
            .zip(self.strides.iter())
            .zip(&target[pad..])
        {
            if s == t {
                new_shape.push(t);
                new_strides.push(st);
            } else if s == 1 {
                new_shape.push(t);
                new_strides.push(0);
            } else {
                return None;
            }
        }

        Some(Self::new(new_shape, new_strides, self.offset))
    }

    /// Keep only the axes flagged in `keep`, pinning the others at index 0
    ///
    /// Pinning index 0 leaves the offset unchanged, so this is a pure view.
    pub fn select_axes(&self, keep: &[bool]) -> Option<Self> {
        if keep.len() != self.ndim() {
            return None;
        }

        let mut new_shape = Shape::new();
        let mut new_strides = Strides::new();
        for ((&dim, &stride), &k) in self.shape.iter().zip(self.strides.iter()).zip(keep) {
            if k {
                new_shape.push(dim);
                new_strides.push(stride);
            } else if dim == 0 {
                return None;
            }
        }
        Some(Self::new(new_shape, new_strides, self.offset))
    }

    /// Iterate element offsets in row-major logical order
    pub fn offsets(&self) -> OffsetIter<'_> {
        OffsetIter::new(self)
    }
}

/// Row-major walk over the storage offsets of a layout
///
/// Offsets are updated incrementally, so each step costs O(1) amortized.
pub struct OffsetIter<'a> {
    layout: &'a Layout,
    indices: SmallVec<[usize; STACK_DIMS]>,
    current: isize,
    remaining: usize,
}

impl<'a> OffsetIter<'a> {
    fn new(layout: &'a Layout) -> Self {
        Self {
            layout,
            indices: SmallVec::from_elem(0, layout.ndim()),
            current: layout.offset as isize,
            remaining: layout.elem_count(),
        }
    }
}

impl Iterator for OffsetIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let out = self.current as usize;

        let shape = self.layout.shape();
        let strides = self.layout.strides();
        for dim in (0..shape.len()).rev() {
            self.indices[dim] += 1;
            self.current += strides[dim];
            if self.indices[dim] < shape[dim] {
                break;
            }
            self.indices[dim] = 0;
            self.current -= shape[dim] as isize * strides[dim];
        }

        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for OffsetIter<'_> {}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layout {{ shape: {:?}, strides: {:?}, offset: {} }}",
            self.shape.as_slice(),
            self.strides.as_slice(),
            self.offset
        )
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.shape.as_slice())
    }
}
