//! Element trait for mapping Rust types to DType

use super::{DType, Scalar};
use bytemuck::{Pod, Zeroable};
use half::{bf16, f16};
use std::cmp::Ordering;
use std::fmt;

/// Trait for types that can be elements of an array
///
/// This trait connects Rust's type system to the runtime dtype system.
/// Arithmetic is expressed through methods rather than `std::ops` so each
/// dtype can pin its own overflow behavior:
/// - integers wrap (two's complement)
/// - floats follow IEEE 754
/// - [`Bool`] uses logical or/and/xor
pub trait Element:
    Copy + Send + Sync + Pod + Zeroable + PartialOrd + fmt::Debug + 'static
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert to f64 for generic numeric operations
    fn to_f64(self) -> f64;

    /// Convert from f64 (float to int truncates toward zero and saturates)
    fn from_f64(v: f64) -> Self;

    /// Lossless conversion into a scalar literal
    fn to_scalar(self) -> Scalar;

    /// Value-converting cast from a scalar literal
    fn from_scalar(v: Scalar) -> Self;

    /// Zero value
    fn zero() -> Self;

    /// One value
    fn one() -> Self;

    /// Lowest representable value (identity of `max`)
    fn lowest() -> Self;

    /// Addition
    fn add_elem(self, rhs: Self) -> Self;

    /// Subtraction
    fn sub_elem(self, rhs: Self) -> Self;

    /// Multiplication
    fn mul_elem(self, rhs: Self) -> Self;

    /// Division in this dtype
    ///
    /// Integers truncate toward zero. Division by zero saturates to the
    /// type's extreme of the dividend's sign, `0 / 0` is 0, and `MIN / -1`
    /// saturates to `MAX`.
    fn div_elem(self, rhs: Self) -> Self;

    /// Negation (logical not for bools)
    fn neg_elem(self) -> Self;

    /// Maximum; NaN in either operand yields NaN
    fn max_elem(self, rhs: Self) -> Self;

    /// Bitwise xor, `None` for floating point types
    fn xor_elem(self, rhs: Self) -> Option<Self>;

    /// Truthiness (`!= 0`)
    fn is_nonzero(self) -> bool;
}

/// Boolean element stored as a single byte
///
/// Any non-zero byte reads as `true`, so buffers filled from arbitrary host
/// bytes stay well-defined.
#[derive(Copy, Clone, Default, Pod, Zeroable)]
#[repr(transparent)]
pub struct Bool(u8);

impl Bool {
    /// `true`
    pub const TRUE: Self = Self(1);
    /// `false`
    pub const FALSE: Self = Self(0);

    /// Wrap a Rust bool
    #[inline]
    pub const fn new(value: bool) -> Self {
        Self(value as u8)
    }

    /// Read as a Rust bool
    #[inline]
    pub const fn get(self) -> bool {
        self.0 != 0
    }
}

impl From<bool> for Bool {
    fn from(value: bool) -> Self {
        Self::new(value)
    }
}

impl From<Bool> for bool {
    fn from(value: Bool) -> Self {
        value.get()
    }
}

impl PartialEq for Bool {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl Eq for Bool {}

impl PartialOrd for Bool {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bool {
    fn cmp(&self, other: &Self) -> Ordering {
        self.get().cmp(&other.get())
    }
}

impl fmt::Debug for Bool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl Element for Bool {
    const DTYPE: DType = DType::Bool;

    #[inline]
    fn to_f64(self) -> f64 {
        if self.get() { 1.0 } else { 0.0 }
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        Self::new(v != 0.0)
    }

    #[inline]
    fn to_scalar(self) -> Scalar {
        Scalar::Bool(self.get())
    }

    #[inline]
    fn from_scalar(v: Scalar) -> Self {
        Self::new(v.is_truthy())
    }

    #[inline]
    fn zero() -> Self {
        Self::FALSE
    }

    #[inline]
    fn one() -> Self {
        Self::TRUE
    }

    #[inline]
    fn lowest() -> Self {
        Self::FALSE
    }

    #[inline]
    fn add_elem(self, rhs: Self) -> Self {
        Self::new(self.get() | rhs.get())
    }

    #[inline]
    fn sub_elem(self, rhs: Self) -> Self {
        Self::new(self.get() ^ rhs.get())
    }

    #[inline]
    fn mul_elem(self, rhs: Self) -> Self {
        Self::new(self.get() & rhs.get())
    }

    #[inline]
    fn div_elem(self, rhs: Self) -> Self {
        // x / 0 is inf or NaN, both truthy
        Self::new(self.get() || !rhs.get())
    }

    #[inline]
    fn neg_elem(self) -> Self {
        Self::new(!self.get())
    }

    #[inline]
    fn max_elem(self, rhs: Self) -> Self {
        Self::new(self.get() | rhs.get())
    }

    #[inline]
    fn xor_elem(self, rhs: Self) -> Option<Self> {
        Some(Self::new(self.get() ^ rhs.get()))
    }

    #[inline]
    fn is_nonzero(self) -> bool {
        self.get()
    }
}

macro_rules! impl_int_element {
    ($t:ty, $dtype:ident) => {
        impl Element for $t {
            const DTYPE: DType = DType::$dtype;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn to_scalar(self) -> Scalar {
                Scalar::Int(self as i128)
            }

            #[inline]
            fn from_scalar(v: Scalar) -> Self {
                match v {
                    Scalar::Bool(b) => b as $t,
                    Scalar::Int(i) => i as $t,
                    Scalar::Float(f) => f as $t,
                }
            }

            #[inline]
            fn zero() -> Self {
                0
            }

            #[inline]
            fn one() -> Self {
                1
            }

            #[inline]
            fn lowest() -> Self {
                <$t>::MIN
            }

            #[inline]
            fn add_elem(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }

            #[inline]
            fn sub_elem(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }

            #[inline]
            fn mul_elem(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }

            #[inline]
            fn div_elem(self, rhs: Self) -> Self {
                match self.checked_div(rhs) {
                    Some(q) => q,
                    None if self == 0 => 0,
                    None if rhs == 0 && self < 1 => <$t>::MIN,
                    None => <$t>::MAX,
                }
            }

            #[inline]
            fn neg_elem(self) -> Self {
                self.wrapping_neg()
            }

            #[inline]
            fn max_elem(self, rhs: Self) -> Self {
                Ord::max(self, rhs)
            }

            #[inline]
            fn xor_elem(self, rhs: Self) -> Option<Self> {
                Some(self ^ rhs)
            }

            #[inline]
            fn is_nonzero(self) -> bool {
                self != 0
            }
        }
    };
}

impl_int_element!(i64, I64);
impl_int_element!(i32, I32);
impl_int_element!(i16, I16);
impl_int_element!(i8, I8);
impl_int_element!(u64, U64);
impl_int_element!(u32, U32);
impl_int_element!(u16, U16);
impl_int_element!(u8, U8);

macro_rules! impl_float_element {
    ($t:ty, $dtype:ident) => {
        impl Element for $t {
            const DTYPE: DType = DType::$dtype;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn to_scalar(self) -> Scalar {
                Scalar::Float(self as f64)
            }

            #[inline]
            fn from_scalar(v: Scalar) -> Self {
                match v {
                    Scalar::Int(i) => i as $t,
                    other => other.to_f64() as $t,
                }
            }

            #[inline]
            fn zero() -> Self {
                0.0
            }

            #[inline]
            fn one() -> Self {
                1.0
            }

            #[inline]
            fn lowest() -> Self {
                <$t>::NEG_INFINITY
            }

            #[inline]
            fn add_elem(self, rhs: Self) -> Self {
                self + rhs
            }

            #[inline]
            fn sub_elem(self, rhs: Self) -> Self {
                self - rhs
            }

            #[inline]
            fn mul_elem(self, rhs: Self) -> Self {
                self * rhs
            }

            #[inline]
            fn div_elem(self, rhs: Self) -> Self {
                self / rhs
            }

            #[inline]
            fn neg_elem(self) -> Self {
                -self
            }

            #[inline]
            fn max_elem(self, rhs: Self) -> Self {
                if self.is_nan() || rhs.is_nan() {
                    <$t>::NAN
                } else if self >= rhs {
                    self
                } else {
                    rhs
                }
            }

            #[inline]
            fn xor_elem(self, _rhs: Self) -> Option<Self> {
                None
            }

            #[inline]
            fn is_nonzero(self) -> bool {
                self != 0.0
            }
        }
    };
}

impl_float_element!(f64, F64);
impl_float_element!(f32, F32);

// Half types compute through f32 and round once.
macro_rules! impl_half_element {
    ($t:ty, $dtype:ident) => {
        impl Element for $t {
            const DTYPE: DType = DType::$dtype;

            #[inline]
            fn to_f64(self) -> f64 {
                <$t>::to_f64(self)
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                <$t>::from_f64(v)
            }

            #[inline]
            fn to_scalar(self) -> Scalar {
                Scalar::Float(<$t>::to_f64(self))
            }

            #[inline]
            fn from_scalar(v: Scalar) -> Self {
                <$t>::from_f64(v.to_f64())
            }

            #[inline]
            fn zero() -> Self {
                <$t>::ZERO
            }

            #[inline]
            fn one() -> Self {
                <$t>::ONE
            }

            #[inline]
            fn lowest() -> Self {
                <$t>::NEG_INFINITY
            }

            #[inline]
            fn add_elem(self, rhs: Self) -> Self {
                <$t>::from_f32(self.to_f32() + rhs.to_f32())
            }

            #[inline]
            fn sub_elem(self, rhs: Self) -> Self {
                <$t>::from_f32(self.to_f32() - rhs.to_f32())
            }

            #[inline]
            fn mul_elem(self, rhs: Self) -> Self {
                <$t>::from_f32(self.to_f32() * rhs.to_f32())
            }

            #[inline]
            fn div_elem(self, rhs: Self) -> Self {
                <$t>::from_f32(self.to_f32() / rhs.to_f32())
            }

            #[inline]
            fn neg_elem(self) -> Self {
                -self
            }

            #[inline]
            fn max_elem(self, rhs: Self) -> Self {
                if self.is_nan() || rhs.is_nan() {
                    <$t>::NAN
                } else if self >= rhs {
                    self
                } else {
                    rhs
                }
            }

            #[inline]
            fn xor_elem(self, _rhs: Self) -> Option<Self> {
                None
            }

            #[inline]
            fn is_nonzero(self) -> bool {
                self.to_f32() != 0.0
            }
        }
    };
}

impl_half_element!(f16, F16);
impl_half_element!(bf16, BF16);
