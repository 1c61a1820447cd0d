use std::sync::atomic::{AtomicU64, Ordering};

// Queue id 0 is reserved for the process default queue.
static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

/// Handle naming an ordered asynchronous command stream.
///
/// Cloning yields another handle to the same queue. Operations issued on the
/// same queue execute in issue order; distinct queues carry no mutual ordering
/// guarantee. Completion is observed through
/// [`DeviceAllocator::synchronize`](crate::DeviceAllocator::synchronize), not
/// by this handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExecQueue {
    id: u64,
}

impl ExecQueue {
    /// Mint a fresh queue, independent of every existing one.
    pub fn new() -> Self {
        Self {
            id: NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// The process-wide default queue. See [`crate::defaults::default_queue`].
    pub(crate) fn process_default() -> Self {
        Self { id: 0 }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether this handle names the process default queue.
    pub fn is_process_default(&self) -> bool {
        self.id == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_queues_are_distinct() {
        let a = ExecQueue::new();
        let b = ExecQueue::new();
        assert_ne!(a, b);
        assert!(!a.is_process_default());
    }

    #[test]
    fn clones_name_the_same_queue() {
        let a = ExecQueue::new();
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn default_queue_id_is_reserved() {
        assert!(ExecQueue::process_default().is_process_default());
        assert_eq!(ExecQueue::process_default(), ExecQueue::process_default());
    }
}
