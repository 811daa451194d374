//! Scalar literal carried by buffer-construction requests

use std::fmt;

/// A dtype-independent scalar value
///
/// Integers are held as `i128` so every `i64` and `u64` value round-trips
/// exactly. Conversion into a concrete element type happens through
/// [`Element::from_scalar`](super::Element::from_scalar).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Scalar {
    /// Boolean literal
    Bool(bool),
    /// Integer literal
    Int(i128),
    /// Floating point literal
    Float(f64),
}

impl Scalar {
    /// Numeric value as f64 (bools map to 0/1)
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    /// Truthiness (`!= 0`)
    pub fn is_truthy(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Int(i) => i != 0,
            Self::Float(f) => f != 0.0,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Self::Float(value as f64)
    }
}

macro_rules! impl_scalar_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Scalar {
                fn from(value: $t) -> Self {
                    Self::Int(value as i128)
                }
            }
        )*
    };
}

impl_scalar_from_int!(i8, i16, i32, i64, u8, u16, u32, u64);
