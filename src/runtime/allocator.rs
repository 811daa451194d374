//! Device buffer allocator
//!
//! The allocator owns every buffer it creates until [`Allocator::free`]. Callers
//! hold [`BufferHandle`]s, small copyable tokens naming a slot in the
//! allocator's arena. A handle records which allocator issued it and the
//! generation of its slot, so stale handles (used after free) and foreign
//! handles (from another allocator) are rejected instead of aliasing a
//! different buffer.
//!
//! No internal locking: mutation goes through `&mut self`, so the borrow
//! checker serializes writers.

use super::DeviceConfig;
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::tensor::{Layout, Storage, Tensor};
use log::debug;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for allocator ids
static NEXT_ALLOCATOR_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a buffer owned by an allocator
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    owner: u64,
    index: u32,
    generation: u32,
}

impl BufferHandle {
    /// Slot index within the owning allocator
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Id of the allocator that issued this handle
    #[inline]
    pub fn owner(self) -> u64 {
        self.owner
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer({}:{}#{})", self.owner, self.index, self.generation)
    }
}

/// Device buffer allocator
///
/// Buffers are byte storage with a declared dtype and shape; a plain
/// [`allocate`](Self::allocate) declares `U8` with shape `[size_bytes]`.
pub trait Allocator {
    /// Reserve `size_bytes` of zeroed storage
    fn allocate(&mut self, size_bytes: usize) -> Result<BufferHandle>;

    /// Reserve zeroed storage declared as `dtype` with `shape`
    fn allocate_typed(&mut self, dtype: DType, shape: &[usize]) -> Result<BufferHandle>;

    /// Overwrite `dest` with host bytes, reinterpreted by its dtype and shape
    ///
    /// Arrays previously read from the buffer keep their old contents.
    fn copy_in(&mut self, dest: BufferHandle, src: &[u8]) -> Result<()>;

    /// Copy the buffer's bytes (row-major) into `dest`
    fn copy_out(&self, dest: &mut [u8], src: BufferHandle) -> Result<()>;

    /// Read-only view of the buffer's bytes in contiguous row-major order
    ///
    /// Materializes strided contents first.
    fn as_host_view(&mut self, buffer: BufferHandle) -> Result<&[u8]>;

    /// The array currently held by a buffer (shares storage, no copy)
    fn tensor(&self, buffer: BufferHandle) -> Result<Tensor>;

    /// Take ownership of an array as a new buffer
    fn adopt(&mut self, tensor: Tensor) -> Result<BufferHandle>;

    /// Release a buffer; its handle becomes invalid
    fn free(&mut self, buffer: BufferHandle) -> Result<()>;

    /// Total declared bytes of live buffers
    fn allocated_bytes(&self) -> usize;

    /// Number of live buffers
    fn len(&self) -> usize;

    /// Whether no buffers are live
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    buffer: Option<Tensor>,
}

/// Arena allocator over host memory
#[derive(Debug)]
pub struct HostAllocator {
    id: u64,
    config: DeviceConfig,
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    allocated: usize,
    live: usize,
}

impl HostAllocator {
    /// Create an allocator with default configuration
    pub fn new() -> Self {
        Self::with_config(DeviceConfig::default())
    }

    /// Create an allocator with the given configuration
    pub fn with_config(config: DeviceConfig) -> Self {
        let id = NEXT_ALLOCATOR_ID.fetch_add(1, Ordering::Relaxed);
        debug!("{}: allocator {id} created", config.name());
        Self {
            id,
            config,
            slots: Vec::new(),
            free_slots: Vec::new(),
            allocated: 0,
            live: 0,
        }
    }

    /// Configuration this allocator was built with
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Unique id of this allocator
    pub fn id(&self) -> u64 {
        self.id
    }

    fn out_of_memory(&self, size: usize) -> Error {
        Error::OutOfMemory {
            size,
            allocated: self.allocated,
            limit: self.config.memory_limit(),
        }
    }

    fn check_limit(&self, size: usize) -> Result<()> {
        match self.config.memory_limit() {
            Some(limit) if self.allocated.saturating_add(size) > limit => {
                Err(self.out_of_memory(size))
            }
            _ => Ok(()),
        }
    }

    fn insert(&mut self, tensor: Tensor) -> Result<BufferHandle> {
        let size = tensor.size_in_bytes();
        self.check_limit(size)?;

        let index = match self.free_slots.pop() {
            Some(index) => index,
            None => {
                let index = u32::try_from(self.slots.len())
                    .map_err(|_| Error::invalid_argument("buffer", "allocator slot space exhausted"))?;
                self.slots.push(Slot {
                    generation: 0,
                    buffer: None,
                });
                index
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.buffer = Some(tensor);
        self.allocated += size;
        self.live += 1;

        Ok(BufferHandle {
            owner: self.id,
            index,
            generation: slot.generation,
        })
    }

    fn invalid(handle: BufferHandle) -> Error {
        Error::InvalidHandle {
            handle: handle.to_string(),
        }
    }

    fn get(&self, handle: BufferHandle) -> Result<&Tensor> {
        if handle.owner != self.id {
            return Err(Self::invalid(handle));
        }
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.buffer.as_ref())
            .ok_or_else(|| Self::invalid(handle))
    }

    fn get_mut(&mut self, handle: BufferHandle) -> Result<&mut Tensor> {
        if handle.owner != self.id {
            return Err(Self::invalid(handle));
        }
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.buffer.as_mut())
            .ok_or_else(|| Self::invalid(handle))
    }

    fn zeroed(&self, dtype: DType, shape: &[usize]) -> Result<Tensor> {
        let numel: usize = shape.iter().product();
        let size = numel.saturating_mul(dtype.size_in_bytes());
        self.check_limit(size)?;
        let storage = Storage::zeroed(numel, dtype).map_err(|e| match e {
            Error::OutOfMemory { .. } => self.out_of_memory(size),
            other => other,
        })?;
        Ok(Tensor::from_parts(storage, Layout::contiguous(shape)))
    }
}

impl Default for HostAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator for HostAllocator {
    fn allocate(&mut self, size_bytes: usize) -> Result<BufferHandle> {
        self.allocate_typed(DType::U8, &[size_bytes])
    }

    fn allocate_typed(&mut self, dtype: DType, shape: &[usize]) -> Result<BufferHandle> {
        let tensor = self.zeroed(dtype, shape)?;
        let size = tensor.size_in_bytes();
        let handle = self.insert(tensor)?;
        debug!("{}: allocate {handle} {dtype}{shape:?} ({size} bytes)", self.config.name());
        Ok(handle)
    }

    fn copy_in(&mut self, dest: BufferHandle, src: &[u8]) -> Result<()> {
        let tensor = self.get_mut(dest)?;
        if src.len() != tensor.size_in_bytes() {
            return Err(Error::size_mismatch(tensor.size_in_bytes(), src.len()));
        }

        if tensor.is_compact() {
            tensor.storage_mut().make_mut().copy_from_slice(src);
        } else {
            *tensor = Tensor::from_bytes(src.to_vec(), tensor.dtype(), tensor.shape())?;
        }
        Ok(())
    }

    fn copy_out(&self, dest: &mut [u8], src: BufferHandle) -> Result<()> {
        let tensor = self.get(src)?;
        if dest.len() != tensor.size_in_bytes() {
            return Err(Error::size_mismatch(tensor.size_in_bytes(), dest.len()));
        }

        if tensor.is_compact() {
            dest.copy_from_slice(tensor.storage().as_bytes());
        } else {
            dest.copy_from_slice(&tensor.to_bytes());
        }
        Ok(())
    }

    fn as_host_view(&mut self, buffer: BufferHandle) -> Result<&[u8]> {
        let name = self.config.name().to_string();
        let tensor = self.get_mut(buffer)?;
        if !tensor.is_compact() {
            debug!("{name}: materialize {buffer} {}", tensor.layout());
            *tensor = tensor.contiguous();
        }
        Ok(tensor.storage().as_bytes())
    }

    fn tensor(&self, buffer: BufferHandle) -> Result<Tensor> {
        self.get(buffer).cloned()
    }

    fn adopt(&mut self, tensor: Tensor) -> Result<BufferHandle> {
        let dtype = tensor.dtype();
        let shape = tensor.shape().to_vec();
        let handle = self.insert(tensor)?;
        debug!("{}: adopt {handle} {dtype}{shape:?}", self.config.name());
        Ok(handle)
    }

    fn free(&mut self, buffer: BufferHandle) -> Result<()> {
        if buffer.owner != self.id {
            return Err(Self::invalid(buffer));
        }
        let slot = self
            .slots
            .get_mut(buffer.index as usize)
            .filter(|slot| slot.generation == buffer.generation)
            .ok_or_else(|| Self::invalid(buffer))?;
        let tensor = slot.buffer.take().ok_or_else(|| Self::invalid(buffer))?;
        slot.generation = slot.generation.wrapping_add(1);

        self.free_slots.push(buffer.index);
        self.allocated -= tensor.size_in_bytes();
        self.live -= 1;
        debug!("{}: free {buffer}", self.config.name());
        Ok(())
    }

    fn allocated_bytes(&self) -> usize {
        self.allocated
    }

    fn len(&self) -> usize {
        self.live
    }
}
