use thiserror::Error;

/// Errors surfaced by the device-memory layer.
#[derive(Debug, Error)]
pub enum DeviceMemoryError {
    /// The backing allocator could not satisfy an allocation request.
    #[error("device allocation of {requested} bytes failed: out of memory")]
    OutOfMemory { requested: usize },

    /// A copy or fill targeted memory the allocator does not own, or a range
    /// that does not fit the target allocation.
    #[error("invalid device memory access: {0}")]
    InvalidAccess(String),
}
