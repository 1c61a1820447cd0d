//! Device-memory substrate for the GPU scalar engine.
//!
//! This crate provides the pieces every device-resident value is built on:
//!
//! - [`DeviceAllocator`] — a pluggable, queue-aware capability for requesting
//!   and releasing device memory,
//! - [`ExecQueue`] — a handle naming an ordered asynchronous command stream,
//! - [`DeviceBuffer`] — an exclusively owned contiguous device allocation,
//! - the null-mask utility ([`create_null_mask`] / [`mask_allocation_bytes`]),
//! - process-wide default resources ([`default_queue`] / [`default_allocator`]).
//!
//! # Ordering contract
//!
//! Every device-touching operation is issued on a caller-supplied [`ExecQueue`].
//! Operations on the same queue execute in issue order; operations on distinct
//! queues are unordered relative to each other unless the caller synchronizes.
//! Nothing in this crate inserts a full-device barrier.
//!
//! The [`HostAllocator`] backend keeps everything runnable (and testable)
//! without device hardware; the CUDA backend lives behind the `cuda` feature.

pub mod allocator;
#[cfg(feature = "cuda")]
pub mod cuda;
pub mod defaults;
pub mod device_buffer;
pub mod error;
pub mod exec_queue;
pub mod null_mask;

pub use allocator::{DeviceAllocation, DeviceAllocator, DevicePtr, HostAllocator};
#[cfg(feature = "cuda")]
pub use cuda::CudaAllocator;
pub use defaults::{default_allocator, default_queue, reset_default_allocator, set_default_allocator};
pub use device_buffer::DeviceBuffer;
pub use error::DeviceMemoryError;
pub use exec_queue::ExecQueue;
pub use null_mask::{create_null_mask, mask_allocation_bytes, MaskState};
