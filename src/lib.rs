//! # numr-interp
//!
//! **An interpreted tensor-operation backend over host arrays.**
//!
//! A tensor-graph evaluator hands this crate one abstract operation at a time
//! (elementwise unary/binary/ternary ops, reductions, movement ops, buffer
//! constants) and gets back an array immediately. Buffers backing those arrays
//! live in an allocator that supports copy-in, copy-out and zero-copy host
//! views.
//!
//! ## Layers
//!
//! - [`tensor`]: the array value (`Storage` + `Layout`), views share storage
//! - [`ops`]: the array library's primitive calls (math, casts, reductions,
//!   padding, strided views, einsum)
//! - [`runtime`]: the device buffer allocator and the interpreted device with
//!   its operation vocabulary, type promotion and dispatch table
//!
//! ## Quick Start
//!
//! ```rust
//! use numr_interp::prelude::*;
//!
//! let mut device = InterpretedDevice::new();
//! let buf = device.allocator_mut().allocate_typed(DType::I32, &[2, 2])?;
//! let bytes: Vec<u8> = [1i32, 5, 3, 2].iter().flat_map(|v| v.to_ne_bytes()).collect();
//! device.allocator_mut().copy_in(buf, &bytes)?;
//!
//! // Row-wise maximum, keepdims
//! let ast = LazyOp::node(ReduceOp::Max, vec![LazyOp::load(0)], OpArg::Shape(vec![2, 1]));
//! let out = device.exec_ast(&ast, &[buf])?;
//! assert_eq!(out.to_vec::<i32>(), vec![5, 3]);
//! # Ok::<(), numr_interp::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): multi-threaded elementwise kernels for large inputs

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod dtype;
pub mod error;
pub mod ops;
pub mod runtime;
pub mod tensor;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Scalar};
    pub use crate::error::{Error, Result};
    pub use crate::runtime::interpreted::{
        BinaryOp, BufferOp, InterpretedDevice, LazyOp, MovementOp, Op, OpArg, ReduceOp,
        TernaryOp, UnaryOp,
    };
    pub use crate::runtime::{Allocator, BufferHandle, DeviceConfig, HostAllocator};
    pub use crate::tensor::{Layout, Tensor};
}
