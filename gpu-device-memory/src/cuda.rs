//! CUDA-backed device allocator built on `cudarc`.
//!
//! Live allocations are tracked in a concurrent map keyed by device pointer;
//! deallocation drops the owning `CudaSlice`, which returns the memory to the
//! driver. Copies and memsets currently run synchronously on the device's
//! default stream.
//
// TODO: route copies through per-queue CUDA streams (memcpy_htod_async) once
// the queue-to-stream mapping is wired through.

use std::sync::Arc;

use cudarc::driver::{CudaDevice, CudaSlice, DevicePtr as _};
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::allocator::{DeviceAllocation, DeviceAllocator, DevicePtr};
use crate::error::DeviceMemoryError;
use crate::exec_queue::ExecQueue;

/// Allocator handing out memory on one CUDA device.
pub struct CudaAllocator {
    device: Arc<CudaDevice>,
    live: DashMap<DevicePtr, CudaSlice<u8>>,
}

impl CudaAllocator {
    /// Open CUDA device `ordinal` and wrap it as an allocator.
    pub fn new(ordinal: usize) -> Result<Self, DeviceMemoryError> {
        let device = CudaDevice::new(ordinal).map_err(|e| {
            DeviceMemoryError::InvalidAccess(format!("CUDA device {ordinal} unavailable: {e}"))
        })?;
        info!("CUDA allocator on device {}", ordinal);
        Ok(Self::from_device(device))
    }

    /// Wrap an already-opened device.
    pub fn from_device(device: Arc<CudaDevice>) -> Self {
        Self {
            device,
            live: DashMap::new(),
        }
    }

    /// Number of allocations currently outstanding.
    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }
}

impl DeviceAllocator for CudaAllocator {
    fn allocate(&self, len: usize, queue: &ExecQueue) -> Result<DeviceAllocation, DeviceMemoryError> {
        let len = len.max(1);
        let slice = self.device.alloc_zeros::<u8>(len).map_err(|e| {
            warn!("CUDA allocation of {} bytes failed: {}", len, e);
            DeviceMemoryError::OutOfMemory { requested: len }
        })?;
        let ptr = *slice.device_ptr() as DevicePtr;
        debug!("CUDA allocate: {} bytes at {:#x} on queue {}", len, ptr, queue.id());
        self.live.insert(ptr, slice);
        Ok(DeviceAllocation::new(ptr, len))
    }

    fn deallocate(&self, allocation: DeviceAllocation, queue: &ExecQueue) {
        if self.live.remove(&allocation.ptr()).is_some() {
            debug!(
                "CUDA deallocate: {} bytes at {:#x} on queue {}",
                allocation.len(),
                allocation.ptr(),
                queue.id()
            );
        } else {
            warn!("CUDA deallocate of unknown allocation at {:#x}", allocation.ptr());
        }
    }

    fn copy_from_host(
        &self,
        dst: &DeviceAllocation,
        src: &[u8],
        _queue: &ExecQueue,
    ) -> Result<(), DeviceMemoryError> {
        if src.len() > dst.len() {
            return Err(DeviceMemoryError::InvalidAccess(format!(
                "copy of {} bytes into {}-byte allocation",
                src.len(),
                dst.len()
            )));
        }
        self.device
            .bind_to_thread()
            .map_err(|e| DeviceMemoryError::InvalidAccess(e.to_string()))?;
        unsafe { cudarc::driver::result::memcpy_htod_sync(dst.ptr(), src) }
            .map_err(|e| DeviceMemoryError::InvalidAccess(format!("host-to-device copy failed: {e}")))
    }

    fn copy_to_host(
        &self,
        src: &DeviceAllocation,
        dst: &mut [u8],
        _queue: &ExecQueue,
    ) -> Result<(), DeviceMemoryError> {
        if dst.len() > src.len() {
            return Err(DeviceMemoryError::InvalidAccess(format!(
                "copy of {} bytes out of {}-byte allocation",
                dst.len(),
                src.len()
            )));
        }
        self.device
            .bind_to_thread()
            .map_err(|e| DeviceMemoryError::InvalidAccess(e.to_string()))?;
        unsafe { cudarc::driver::result::memcpy_dtoh_sync(dst, src.ptr()) }
            .map_err(|e| DeviceMemoryError::InvalidAccess(format!("device-to-host copy failed: {e}")))
    }

    fn fill(
        &self,
        dst: &DeviceAllocation,
        byte: u8,
        _queue: &ExecQueue,
    ) -> Result<(), DeviceMemoryError> {
        self.device
            .bind_to_thread()
            .map_err(|e| DeviceMemoryError::InvalidAccess(e.to_string()))?;
        unsafe { cudarc::driver::result::memset_d8_sync(dst.ptr(), byte, dst.len()) }
            .map_err(|e| DeviceMemoryError::InvalidAccess(format!("device memset failed: {e}")))
    }

    fn synchronize(&self, _queue: &ExecQueue) -> Result<(), DeviceMemoryError> {
        self.device
            .synchronize()
            .map_err(|e| DeviceMemoryError::InvalidAccess(format!("device synchronize failed: {e}")))
    }
}
