//! Interpreted device: dispatch table plus allocator behind one façade

use super::op::{Op, OpArg};
use super::promote::{DTypePriority, PriorityTable};
use super::table;
use crate::error::{Error, Result};
use crate::runtime::{Allocator, BufferHandle, DeviceConfig, HostAllocator};
use crate::tensor::Tensor;
use log::{trace, warn};

/// A node of an operation tree handed over by the evaluator
#[derive(Clone, Debug, PartialEq)]
pub enum LazyOp {
    /// Read the buffer at this index of the buffer list
    Load(usize),
    /// Apply an operation to the results of its children
    Node {
        /// Operation to run
        op: Op,
        /// Operand subtrees, evaluated left to right
        srcs: Vec<LazyOp>,
        /// Argument payload
        arg: OpArg,
    },
}

impl LazyOp {
    /// Leaf reading buffer `index`
    pub fn load(index: usize) -> Self {
        LazyOp::Load(index)
    }

    /// Interior node
    pub fn node(op: impl Into<Op>, srcs: Vec<LazyOp>, arg: OpArg) -> Self {
        LazyOp::Node {
            op: op.into(),
            srcs,
            arg,
        }
    }

    /// First unsupported operation in the tree, depth first
    fn find_unsupported(&self) -> Option<Op> {
        match self {
            LazyOp::Load(_) => None,
            LazyOp::Node { op, srcs, .. } => {
                if table::is_supported(*op) {
                    srcs.iter().find_map(LazyOp::find_unsupported)
                } else {
                    Some(*op)
                }
            }
        }
    }
}

/// Executes evaluator operations immediately against host arrays
///
/// Operations run synchronously in the order they are issued. Every result is
/// a fresh array or a view of an operand; operands are never modified.
///
/// # Example
///
/// ```
/// use numr_interp::prelude::*;
///
/// let device = InterpretedDevice::new();
/// let x = Tensor::from_slice(&[1.0f32, 2.0], &[2]);
/// let y = Tensor::from_slice(&[3.0f32, 4.0], &[2]);
/// let sum = device.exec("BinaryOps.ADD".parse()?, &[x, y], &OpArg::None)?;
/// assert_eq!(sum.to_vec::<f32>(), vec![4.0, 6.0]);
/// # Ok::<(), numr_interp::error::Error>(())
/// ```
#[derive(Debug)]
pub struct InterpretedDevice<A = HostAllocator, P = DTypePriority> {
    allocator: A,
    priorities: P,
}

impl InterpretedDevice {
    /// Host device with default configuration and priority table
    pub fn new() -> Self {
        Self::with_config(DeviceConfig::default())
    }

    /// Host device with the given configuration
    pub fn with_config(config: DeviceConfig) -> Self {
        Self::with_parts(HostAllocator::with_config(config), DTypePriority)
    }
}

impl Default for InterpretedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Allocator, P: PriorityTable> InterpretedDevice<A, P> {
    /// Build a device from an allocator and a priority table
    pub fn with_parts(allocator: A, priorities: P) -> Self {
        Self {
            allocator,
            priorities,
        }
    }

    /// The buffer allocator
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Mutable access to the buffer allocator
    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.allocator
    }

    /// The dtype priority table used for promotion
    pub fn priorities(&self) -> &P {
        &self.priorities
    }

    /// Whether `op` can be executed by this device
    pub fn supports(&self, op: Op) -> bool {
        table::is_supported(op)
    }

    /// Execute one operation
    pub fn exec(&self, op: Op, srcs: &[Tensor], arg: &OpArg) -> Result<Tensor> {
        if !table::is_supported(op) {
            warn!("rejecting unsupported operation {op}");
            return Err(Error::unsupported_op(op));
        }

        let out = table::dispatch(&self.priorities, op, srcs, arg)?;
        trace!(
            "{op} {:?} -> {}{:?}",
            srcs.iter()
                .map(|s| format!("{}{:?}", s.dtype(), s.shape()))
                .collect::<Vec<_>>(),
            out.dtype(),
            out.shape()
        );
        Ok(out)
    }

    /// Evaluate an operation tree whose leaves index into `buffers`
    ///
    /// The whole tree is checked for unsupported operations before anything
    /// runs.
    pub fn exec_ast(&self, ast: &LazyOp, buffers: &[BufferHandle]) -> Result<Tensor> {
        if let Some(op) = ast.find_unsupported() {
            warn!("rejecting tree with unsupported operation {op}");
            return Err(Error::unsupported_op(op));
        }
        self.eval(ast, buffers)
    }

    fn eval(&self, ast: &LazyOp, buffers: &[BufferHandle]) -> Result<Tensor> {
        match ast {
            LazyOp::Load(index) => {
                let handle = buffers.get(*index).ok_or_else(|| {
                    Error::invalid_argument(
                        "buffers",
                        format!("load of buffer {index} but {} were given", buffers.len()),
                    )
                })?;
                self.allocator.tensor(*handle)
            }
            LazyOp::Node { op, srcs, arg } => {
                let inputs = srcs
                    .iter()
                    .map(|src| self.eval(src, buffers))
                    .collect::<Result<Vec<_>>>()?;
                self.exec(*op, &inputs, arg)
            }
        }
    }

    /// Evaluate a tree and store the result as a new buffer
    pub fn realize(&mut self, ast: &LazyOp, buffers: &[BufferHandle]) -> Result<BufferHandle> {
        let out = self.exec_ast(ast, buffers)?;
        self.allocator.adopt(out)
    }
}
