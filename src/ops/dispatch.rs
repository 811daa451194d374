//! DType dispatch utilities
//!
//! This module provides the `dispatch_dtype!` macro for runtime type dispatch.
//! Kernels are written once, generic over [`Element`](crate::dtype::Element),
//! and the macro binds `T` to the concrete Rust type matching a runtime
//! [`DType`](crate::dtype::DType).
//!
//! # Usage
//!
//! ```ignore
//! fn my_operation(dtype: DType) -> Result<usize> {
//!     dispatch_dtype!(dtype, T => {
//!         // T is now a concrete type (f32, f64, i32, Bool, etc.)
//!         Ok(std::mem::size_of::<T>())
//!     }, "my_operation")
//! }
//! ```
//!
//! ## Supported Types
//!
//! - `F64` -> `f64`, `F32` -> `f32`
//! - `F16` -> `half::f16`, `BF16` -> `half::bf16`
//! - `I64`/`I32`/`I16`/`I8` -> `i64`/`i32`/`i16`/`i8`
//! - `U64`/`U32`/`U16`/`U8` -> `u64`/`u32`/`u16`/`u8`
//! - `Bool` -> `crate::dtype::Bool`
//!
//! The `$error_op` argument names the operation; the set is closed so it is
//! only kept for call-site readability and symmetry with
//! [`dispatch_float_dtype!`].

/// Macro for runtime dtype dispatch to typed operations.
#[macro_export]
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {{
        let _ = $error_op;
        match $dtype {
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F16 => {
                type $T = half::f16;
                $body
            }
            $crate::dtype::DType::BF16 => {
                type $T = half::bf16;
                $body
            }
            $crate::dtype::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::DType::U64 => {
                type $T = u64;
                $body
            }
            $crate::dtype::DType::U32 => {
                type $T = u32;
                $body
            }
            $crate::dtype::DType::U16 => {
                type $T = u16;
                $body
            }
            $crate::dtype::DType::U8 => {
                type $T = u8;
                $body
            }
            $crate::dtype::DType::Bool => {
                type $T = $crate::dtype::Bool;
                $body
            }
        }
    }};
}

/// Dispatch over floating point dtypes only.
///
/// Non-float dtypes return `Error::UnsupportedDType` with `$error_op`.
#[macro_export]
macro_rules! dispatch_float_dtype {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {{
        match $dtype {
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F16 => {
                type $T = half::f16;
                $body
            }
            $crate::dtype::DType::BF16 => {
                type $T = half::bf16;
                $body
            }
            other => Err($crate::error::Error::unsupported_dtype(other, $error_op)),
        }
    }};
}
