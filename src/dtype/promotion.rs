//! Array-library type promotion for mixed-dtype elementwise operations
//!
//! This is the rule the array kernels apply internally when handed operands of
//! different dtypes. It can return a dtype that is neither input (`I8` with
//! `U8` gives `I16`), which is why the interpreter coerces operands itself
//! before calling most kernels.

use super::DType;

/// Result dtype of a mixed-dtype elementwise kernel
///
/// Follows NumPy-like rules:
/// - Floats always win over integers and bools
/// - Larger types win over smaller types
/// - Mixing signed and unsigned widens to a signed type
pub fn result_type(lhs: DType, rhs: DType) -> DType {
    use DType::*;

    if lhs == rhs {
        return lhs;
    }

    let rank = |dt: DType| -> u8 {
        match dt {
            F64 => 100,
            F32 => 90,
            BF16 => 85,
            F16 => 80,
            I64 => 65,
            U64 => 60,
            I32 => 55,
            U32 => 50,
            I16 => 45,
            U16 => 40,
            I8 => 35,
            U8 => 30,
            Bool => 25,
        }
    };

    // F16 and BF16 have no common 16-bit supertype
    if matches!((lhs, rhs), (F16, BF16) | (BF16, F16)) {
        return F32;
    }

    if lhs.is_signed_int() && rhs.is_unsigned_int() {
        return match (lhs, rhs) {
            (I64, _) => I64,
            (I32, U64) => I64,
            (I32, U32) => I64,
            (I32, _) => I32,
            (I16, U64 | U32 | U16) => I32,
            (I16, _) => I16,
            (I8, U64 | U32 | U16 | U8) => I16,
            _ => I64,
        };
    }
    if rhs.is_signed_int() && lhs.is_unsigned_int() {
        return result_type(rhs, lhs);
    }

    if rank(lhs) >= rank(rhs) { lhs } else { rhs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DType::*;

    #[test]
    fn test_same_type() {
        assert_eq!(result_type(F32, F32), F32);
        assert_eq!(result_type(Bool, Bool), Bool);
    }

    #[test]
    fn test_float_wins() {
        assert_eq!(result_type(I64, F32), F32);
        assert_eq!(result_type(F16, I8), F16);
        assert_eq!(result_type(F16, BF16), F32);
    }

    #[test]
    fn test_signed_unsigned_widens() {
        assert_eq!(result_type(I8, U8), I16);
        assert_eq!(result_type(U16, I16), I32);
        assert_eq!(result_type(I32, U32), I64);
    }

    #[test]
    fn test_bool_loses() {
        assert_eq!(result_type(Bool, U8), U8);
        assert_eq!(result_type(F64, Bool), F64);
    }
}
