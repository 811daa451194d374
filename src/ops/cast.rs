//! Type conversion: value-converting casts and bit reinterpretation

use crate::dispatch_dtype;
use crate::dtype::{DType, Element};
use crate::error::Result;
use crate::tensor::Tensor;

/// Value-converting cast to `dtype`
///
/// Returns a cheap clone when the dtype already matches. Conversion follows
/// [`Element::from_scalar`]: int to int wraps, float to int truncates toward
/// zero and saturates (NaN becomes 0), anything to bool tests `!= 0`.
pub fn astype(a: &Tensor, dtype: DType) -> Result<Tensor> {
    if a.dtype() == dtype {
        return Ok(a.clone());
    }

    dispatch_dtype!(a.dtype(), S => {
        let src = a.to_vec::<S>();
        dispatch_dtype!(dtype, D => {
            let out: Vec<D> = src.iter().map(|&x| D::from_scalar(x.to_scalar())).collect();
            Tensor::from_vec(out, a.shape())
        }, "astype")
    }, "astype")
}

/// Reinterpret the bits of each element as `dtype` (zero-copy)
///
/// The element byte sizes must match.
pub fn bitcast(a: &Tensor, dtype: DType) -> Result<Tensor> {
    a.bitcast(dtype)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::Bool;
    use half::f16;

    #[test]
    fn test_float_to_int_truncates_and_saturates() {
        let a = Tensor::from_slice(&[-1.7f32, 2.9, 300.0, f32::NAN], &[4]);
        assert_eq!(astype(&a, DType::U8).unwrap().to_vec::<u8>(), vec![0, 2, 255, 0]);
        assert_eq!(astype(&a, DType::I8).unwrap().to_vec::<i8>(), vec![-1, 2, 127, 0]);
    }

    #[test]
    fn test_int_to_int_wraps() {
        let a = Tensor::from_slice(&[256i32, -1], &[2]);
        assert_eq!(astype(&a, DType::U8).unwrap().to_vec::<u8>(), vec![0, 255]);
    }

    #[test]
    fn test_to_bool_and_back() {
        let a = Tensor::from_slice(&[0.0f64, -0.5, 3.0], &[3]);
        let b = astype(&a, DType::Bool).unwrap();
        assert_eq!(b.to_vec::<Bool>(), vec![Bool::FALSE, Bool::TRUE, Bool::TRUE]);
        let f = astype(&b, DType::F16).unwrap();
        assert_eq!(f.to_vec::<f16>(), vec![f16::ZERO, f16::ONE, f16::ONE]);
    }

    #[test]
    fn test_astype_strided_source() {
        let a = Tensor::from_slice(&[1i16, 2, 3, 4], &[2, 2]);
        let t = a.as_strided(&[2, 2], &[1, 2], 0).unwrap();
        let c = astype(&t, DType::I64).unwrap();
        assert_eq!(c.to_vec::<i64>(), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_bitcast_size_check() {
        let a = Tensor::from_slice(&[1u16], &[1]);
        assert!(bitcast(&a, DType::F16).is_ok());
        assert!(bitcast(&a, DType::F32).is_err());
    }
}
