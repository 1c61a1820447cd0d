use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::DeviceMemoryError;
use crate::exec_queue::ExecQueue;

/// Raw device address. Opaque to everything except the allocator that minted it.
pub type DevicePtr = u64;

/// One device allocation as handed out by a [`DeviceAllocator`].
///
/// The handle carries no liveness of its own; returning it to the allocator
/// that produced it (via [`DeviceAllocator::deallocate`]) ends its life.
#[derive(Debug)]
pub struct DeviceAllocation {
    ptr: DevicePtr,
    len: usize,
}

impl DeviceAllocation {
    pub(crate) fn new(ptr: DevicePtr, len: usize) -> Self {
        Self { ptr, len }
    }

    pub fn ptr(&self) -> DevicePtr {
        self.ptr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Pluggable capability for requesting and releasing device memory.
///
/// Every operation takes the caller's [`ExecQueue`] and must be issued on it,
/// never on a backend-global stream, so independent callers on independent
/// queues never serialize through this layer. Implementations must be safe
/// under concurrent use from multiple threads.
pub trait DeviceAllocator: Send + Sync {
    /// Request `len` bytes of device storage, ordered on `queue`.
    ///
    /// Fails with [`DeviceMemoryError::OutOfMemory`] when the request cannot
    /// be satisfied. No retry is attempted at this layer.
    fn allocate(&self, len: usize, queue: &ExecQueue) -> Result<DeviceAllocation, DeviceMemoryError>;

    /// Release an allocation, ordered on `queue`. Backend failures are logged,
    /// not surfaced; release is fire-and-forget from the caller's view.
    fn deallocate(&self, allocation: DeviceAllocation, queue: &ExecQueue);

    /// Copy `src` from host memory into the front of `dst`, ordered on `queue`.
    fn copy_from_host(
        &self,
        dst: &DeviceAllocation,
        src: &[u8],
        queue: &ExecQueue,
    ) -> Result<(), DeviceMemoryError>;

    /// Copy `dst.len()` bytes from the front of `src` back to host memory,
    /// ordered on `queue`.
    fn copy_to_host(
        &self,
        src: &DeviceAllocation,
        dst: &mut [u8],
        queue: &ExecQueue,
    ) -> Result<(), DeviceMemoryError>;

    /// Set every byte of `dst` to `byte`, ordered on `queue`.
    fn fill(
        &self,
        dst: &DeviceAllocation,
        byte: u8,
        queue: &ExecQueue,
    ) -> Result<(), DeviceMemoryError>;

    /// Block until all work previously issued on `queue` has completed.
    fn synchronize(&self, queue: &ExecQueue) -> Result<(), DeviceMemoryError>;
}

/// Host-memory-backed allocator.
///
/// Serves as the CPU fallback backend and as the hardware-free allocator for
/// tests. Host operations complete at issue time, which trivially satisfies
/// the queue-ordering contract. The allocator keeps an allocation ledger so
/// callers can observe how many requests were issued and how many allocations
/// are still live.
pub struct HostAllocator {
    blocks: Mutex<HashMap<DevicePtr, Box<[u8]>>>,
    total_allocations: AtomicUsize,
    live_allocations: AtomicUsize,
}

impl HostAllocator {
    pub fn new() -> Self {
        Self {
            blocks: Mutex::new(HashMap::new()),
            total_allocations: AtomicUsize::new(0),
            live_allocations: AtomicUsize::new(0),
        }
    }

    /// Total number of `allocate` calls ever issued.
    pub fn allocation_count(&self) -> usize {
        self.total_allocations.load(Ordering::Relaxed)
    }

    /// Number of allocations currently outstanding.
    pub fn live_allocations(&self) -> usize {
        self.live_allocations.load(Ordering::Relaxed)
    }
}

impl Default for HostAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceAllocator for HostAllocator {
    fn allocate(&self, len: usize, queue: &ExecQueue) -> Result<DeviceAllocation, DeviceMemoryError> {
        // A zero-sized block would hand out a dangling address.
        let len = len.max(1);
        let mut block = vec![0u8; len].into_boxed_slice();
        let ptr = block.as_mut_ptr() as DevicePtr;
        self.blocks.lock().insert(ptr, block);
        self.total_allocations.fetch_add(1, Ordering::Relaxed);
        self.live_allocations.fetch_add(1, Ordering::Relaxed);
        debug!("Host allocate: {} bytes at {:#x} on queue {}", len, ptr, queue.id());
        Ok(DeviceAllocation::new(ptr, len))
    }

    fn deallocate(&self, allocation: DeviceAllocation, queue: &ExecQueue) {
        if self.blocks.lock().remove(&allocation.ptr()).is_some() {
            self.live_allocations.fetch_sub(1, Ordering::Relaxed);
            debug!(
                "Host deallocate: {} bytes at {:#x} on queue {}",
                allocation.len(),
                allocation.ptr(),
                queue.id()
            );
        } else {
            warn!("Host deallocate of unknown block at {:#x}", allocation.ptr());
        }
    }

    fn copy_from_host(
        &self,
        dst: &DeviceAllocation,
        src: &[u8],
        _queue: &ExecQueue,
    ) -> Result<(), DeviceMemoryError> {
        let mut blocks = self.blocks.lock();
        let block = blocks.get_mut(&dst.ptr()).ok_or_else(|| {
            DeviceMemoryError::InvalidAccess(format!("copy into unknown block at {:#x}", dst.ptr()))
        })?;
        if src.len() > block.len() {
            return Err(DeviceMemoryError::InvalidAccess(format!(
                "copy of {} bytes into {}-byte allocation",
                src.len(),
                block.len()
            )));
        }
        block[..src.len()].copy_from_slice(src);
        Ok(())
    }

    fn copy_to_host(
        &self,
        src: &DeviceAllocation,
        dst: &mut [u8],
        _queue: &ExecQueue,
    ) -> Result<(), DeviceMemoryError> {
        let blocks = self.blocks.lock();
        let block = blocks.get(&src.ptr()).ok_or_else(|| {
            DeviceMemoryError::InvalidAccess(format!("copy from unknown block at {:#x}", src.ptr()))
        })?;
        if dst.len() > block.len() {
            return Err(DeviceMemoryError::InvalidAccess(format!(
                "copy of {} bytes out of {}-byte allocation",
                dst.len(),
                block.len()
            )));
        }
        dst.copy_from_slice(&block[..dst.len()]);
        Ok(())
    }

    fn fill(
        &self,
        dst: &DeviceAllocation,
        byte: u8,
        _queue: &ExecQueue,
    ) -> Result<(), DeviceMemoryError> {
        let mut blocks = self.blocks.lock();
        let block = blocks.get_mut(&dst.ptr()).ok_or_else(|| {
            DeviceMemoryError::InvalidAccess(format!("fill of unknown block at {:#x}", dst.ptr()))
        })?;
        block.fill(byte);
        Ok(())
    }

    fn synchronize(&self, _queue: &ExecQueue) -> Result<(), DeviceMemoryError> {
        // Host work completes at issue time.
        Ok(())
    }
}
