//! Runtime: device buffers and the interpreted backend
//!
//! # Architecture
//!
//! ```text
//! InterpretedDevice (façade the evaluator talks to)
//! ├── dispatch table (Op -> array library calls)
//! ├── PriorityTable (dtype promotion lookup)
//! └── Allocator (buffer lifetime, copy in/out, host views)
//! ```

mod allocator;
mod config;
pub mod interpreted;

pub use allocator::{Allocator, BufferHandle, HostAllocator};
pub use config::{DeviceConfig, DEFAULT_DEVICE_NAME};
pub use interpreted::InterpretedDevice;
