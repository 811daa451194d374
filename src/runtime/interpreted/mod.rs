//! Interpreted backend
//!
//! Executes a small, fixed vocabulary of abstract tensor operations one at a
//! time against host arrays.
//!
//! ```text
//! InterpretedDevice
//!   ├── table      Op -> array library calls (exhaustive match)
//!   │     ├── promote   priority-based type promotion
//!   │     ├── mulacc    stride-aware contraction engine
//!   │     ├── reduce    keepdims reductions from a target shape
//!   │     └── view      expand / pad / as_strided
//!   └── Allocator  device buffers (allocate, copy in/out, host views)
//! ```

mod device;
mod mulacc;
mod op;
mod promote;
mod reduce;
mod table;
mod view;

pub use device::{InterpretedDevice, LazyOp};
pub use mulacc::{axis_tags, mulacc, AxisTag};
pub use op::{BinaryOp, BufferOp, MovementOp, Op, OpArg, ReduceOp, TernaryOp, UnaryOp};
pub use promote::{coerce, match_types, promote, DTypePriority, PriorityTable};
pub use reduce::{reduce, shape_to_axis};
pub use table::{dispatch, is_supported};
pub use view::{as_strided, expand, pad};
