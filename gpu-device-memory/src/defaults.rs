//! Process-wide default queue and allocator.
//!
//! The defaults exist so callers at the application edge can construct
//! device-resident values without threading a queue/allocator pair through
//! every call site. Lifecycle: install once at startup with
//! [`set_default_allocator`], tear down at process exit (or between tests)
//! with [`reset_default_allocator`]. When nothing was installed, the first
//! use falls back to the host-backed allocator so the process stays usable
//! without device hardware.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::info;

use crate::allocator::{DeviceAllocator, HostAllocator};
use crate::exec_queue::ExecQueue;

static DEFAULT_ALLOCATOR: Lazy<RwLock<Option<Arc<dyn DeviceAllocator>>>> =
    Lazy::new(|| RwLock::new(None));

/// Install the process-wide default allocator. Call once at startup, before
/// any construction that relies on the defaults.
pub fn set_default_allocator(allocator: Arc<dyn DeviceAllocator>) {
    info!("Installing process default device allocator");
    *DEFAULT_ALLOCATOR.write() = Some(allocator);
}

/// Drop the process-wide default allocator. Subsequent [`default_allocator`]
/// calls fall back to the host backend until a new default is installed.
pub fn reset_default_allocator() {
    info!("Resetting process default device allocator");
    *DEFAULT_ALLOCATOR.write() = None;
}

/// The current process-wide default allocator.
pub fn default_allocator() -> Arc<dyn DeviceAllocator> {
    if let Some(allocator) = DEFAULT_ALLOCATOR.read().as_ref() {
        return Arc::clone(allocator);
    }
    let mut slot = DEFAULT_ALLOCATOR.write();
    // Another thread may have installed one while we waited for the lock.
    let allocator =
        slot.get_or_insert_with(|| Arc::new(HostAllocator::new()) as Arc<dyn DeviceAllocator>);
    Arc::clone(allocator)
}

/// The process-wide default execution queue.
pub fn default_queue() -> ExecQueue {
    ExecQueue::process_default()
}
