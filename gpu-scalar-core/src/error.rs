use gpu_device_memory::DeviceMemoryError;
use thiserror::Error;

/// Failures surfaced by scalar construction.
///
/// The two kinds discriminate programmer error from resource exhaustion.
/// `InvalidArgument` is always detected before any device allocation is
/// attempted, so a failed construction never leaves partial state behind.
#[derive(Debug, Error)]
pub enum ScalarError {
    /// Caller violated a precondition (wrong type category, malformed
    /// string pointer/length pairing, length overflow).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The device allocator could not satisfy the request. No retry and no
    /// fallback allocator substitution happen at this layer.
    #[error("out of device memory: requested {requested} bytes")]
    OutOfMemory { requested: usize },
}

impl ScalarError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<DeviceMemoryError> for ScalarError {
    fn from(err: DeviceMemoryError) -> Self {
        match err {
            DeviceMemoryError::OutOfMemory { requested } => Self::OutOfMemory { requested },
            DeviceMemoryError::InvalidAccess(msg) => Self::InvalidArgument(msg),
        }
    }
}
