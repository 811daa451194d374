//! Tensor types
//!
//! This module provides the host array value, [`Tensor`]: reference-counted
//! [`Storage`] viewed through a [`Layout`] of shape, element strides, and
//! offset.

mod core;
mod layout;
mod storage;

pub use core::Tensor;
pub use layout::{Layout, OffsetIter, Shape, Strides};
pub use storage::Storage;
