use std::fmt;
use std::sync::Arc;

use crate::allocator::{DeviceAllocation, DeviceAllocator, DevicePtr};
use crate::error::DeviceMemoryError;
use crate::exec_queue::ExecQueue;

/// Exclusively owned contiguous device allocation.
///
/// A `DeviceBuffer` keeps the allocator that produced it alive and releases
/// its storage on drop, ordered on the queue it was last associated with.
/// Handles may be moved but never shared; exactly one owner exists at a time.
///
/// Logically empty buffers are backed by a one-byte placeholder allocation so
/// a buffer is always addressable, never a dangling handle.
pub struct DeviceBuffer {
    // `None` only transiently inside `drop`.
    allocation: Option<DeviceAllocation>,
    len: usize,
    allocator: Arc<dyn DeviceAllocator>,
    queue: ExecQueue,
}

impl DeviceBuffer {
    /// Allocate `len` bytes of device storage on `queue`.
    ///
    /// The storage is left uninitialized from the caller's perspective.
    pub fn allocate(
        len: usize,
        queue: &ExecQueue,
        allocator: &Arc<dyn DeviceAllocator>,
    ) -> Result<Self, DeviceMemoryError> {
        let allocation = allocator.allocate(len.max(1), queue)?;
        Ok(Self {
            allocation: Some(allocation),
            len,
            allocator: Arc::clone(allocator),
            queue: queue.clone(),
        })
    }

    fn allocation(&self) -> &DeviceAllocation {
        self.allocation.as_ref().expect("allocation present until drop")
    }

    /// Logical byte length of the buffer contents.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes actually reserved on the device (>= `len`, never zero).
    pub fn allocated_bytes(&self) -> usize {
        self.allocation().len()
    }

    pub fn device_ptr(&self) -> DevicePtr {
        self.allocation().ptr()
    }

    /// Queue the buffer's release will be ordered on.
    pub fn queue(&self) -> &ExecQueue {
        &self.queue
    }

    /// Copy `bytes` from host memory into the front of the buffer, issued on
    /// `queue`. The buffer becomes associated with `queue` for its release.
    pub fn write_from_host(
        &mut self,
        bytes: &[u8],
        queue: &ExecQueue,
    ) -> Result<(), DeviceMemoryError> {
        if bytes.len() > self.len {
            return Err(DeviceMemoryError::InvalidAccess(format!(
                "write of {} bytes into {}-byte buffer",
                bytes.len(),
                self.len
            )));
        }
        self.allocator.copy_from_host(self.allocation(), bytes, queue)?;
        self.queue = queue.clone();
        Ok(())
    }

    /// Read the logical contents back to host memory, issued on the buffer's
    /// current queue.
    pub fn read_to_host(&self) -> Result<Vec<u8>, DeviceMemoryError> {
        let mut out = vec![0u8; self.len];
        self.allocator.copy_to_host(self.allocation(), &mut out, &self.queue)?;
        Ok(out)
    }

    /// Set every reserved byte to `byte`, issued on `queue`.
    pub fn fill(&mut self, byte: u8, queue: &ExecQueue) -> Result<(), DeviceMemoryError> {
        self.allocator.fill(self.allocation(), byte, queue)?;
        self.queue = queue.clone();
        Ok(())
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            self.allocator.deallocate(allocation, &self.queue);
        }
    }
}

impl fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("ptr", &self.allocation.as_ref().map(DeviceAllocation::ptr))
            .field("len", &self.len)
            .field("queue", &self.queue)
            .finish()
    }
}
