//! Integration tests for scalar construction.
//!
//! Everything runs against the host-backed allocator (no CUDA device
//! required); its allocation ledger is what makes the "no allocation on
//! error" and "no leak on failure" properties observable.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gpu_device_memory::{
    reset_default_allocator, set_default_allocator, DeviceAllocation, DeviceAllocator,
    DeviceMemoryError, ExecQueue, HostAllocator,
};
use gpu_scalar_core::{
    make_numeric_scalar, make_numeric_scalar_default, make_string_scalar,
    make_string_scalar_default, make_timestamp_scalar, DataKind, HostStringView, Scalar,
    ScalarError, MAX_STRING_BYTES,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn host() -> (Arc<HostAllocator>, Arc<dyn DeviceAllocator>) {
    let concrete = Arc::new(HostAllocator::new());
    let erased: Arc<dyn DeviceAllocator> = Arc::clone(&concrete) as Arc<dyn DeviceAllocator>;
    (concrete, erased)
}

/// Allocator that refuses every request, for failure-path tests.
struct OomAllocator {
    attempts: AtomicUsize,
}

impl OomAllocator {
    fn new() -> Self {
        Self {
            attempts: AtomicUsize::new(0),
        }
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl DeviceAllocator for OomAllocator {
    fn allocate(&self, len: usize, _queue: &ExecQueue) -> Result<DeviceAllocation, DeviceMemoryError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(DeviceMemoryError::OutOfMemory { requested: len })
    }

    fn deallocate(&self, _allocation: DeviceAllocation, _queue: &ExecQueue) {}

    fn copy_from_host(
        &self,
        _dst: &DeviceAllocation,
        _src: &[u8],
        _queue: &ExecQueue,
    ) -> Result<(), DeviceMemoryError> {
        Err(DeviceMemoryError::InvalidAccess("nothing was allocated".into()))
    }

    fn copy_to_host(
        &self,
        _src: &DeviceAllocation,
        _dst: &mut [u8],
        _queue: &ExecQueue,
    ) -> Result<(), DeviceMemoryError> {
        Err(DeviceMemoryError::InvalidAccess("nothing was allocated".into()))
    }

    fn fill(
        &self,
        _dst: &DeviceAllocation,
        _byte: u8,
        _queue: &ExecQueue,
    ) -> Result<(), DeviceMemoryError> {
        Err(DeviceMemoryError::InvalidAccess("nothing was allocated".into()))
    }

    fn synchronize(&self, _queue: &ExecQueue) -> Result<(), DeviceMemoryError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Numeric factory
// ---------------------------------------------------------------------------

#[test]
fn numeric_payloads_match_the_declared_width() {
    let (_, allocator) = host();
    let queue = ExecQueue::new();

    for kind in DataKind::ALL.into_iter().filter(|k| k.is_numeric()) {
        let scalar = make_numeric_scalar(kind, &queue, &allocator).unwrap();
        assert_eq!(scalar.kind(), kind);
        assert_eq!(scalar.payload_bytes(), kind.fixed_byte_width().unwrap());
        assert!(!scalar.is_valid(), "{kind:?} scalars start invalid");
        assert!(matches!(scalar, Scalar::Numeric(_)));
    }
}

#[test]
fn numeric_factory_rejects_other_categories_without_allocating() {
    let (ledger, allocator) = host();
    let queue = ExecQueue::new();

    for kind in [DataKind::TimestampSeconds, DataKind::TimestampNanos, DataKind::Utf8] {
        let err = make_numeric_scalar(kind, &queue, &allocator).unwrap_err();
        assert!(matches!(err, ScalarError::InvalidArgument(_)), "{kind:?}");
    }
    assert_eq!(ledger.allocation_count(), 0);
}

#[test]
fn numeric_scalar_value_round_trips() {
    let (_, allocator) = host();
    let queue = ExecQueue::new();

    let mut scalar = make_numeric_scalar(DataKind::Int32, &queue, &allocator).unwrap();
    if let Scalar::Numeric(inner) = &mut scalar {
        inner.set_value_bytes(&0x1234_5678i32.to_le_bytes(), &queue).unwrap();
        assert_eq!(inner.value_bytes().unwrap(), 0x1234_5678i32.to_le_bytes());
    } else {
        panic!("numeric factory must produce the numeric variant");
    }
    assert!(scalar.is_valid());
}

// ---------------------------------------------------------------------------
// Timestamp factory
// ---------------------------------------------------------------------------

#[test]
fn timestamp_payloads_match_the_declared_width() {
    let (_, allocator) = host();
    let queue = ExecQueue::new();

    for kind in DataKind::ALL.into_iter().filter(|k| k.is_timestamp()) {
        let scalar = make_timestamp_scalar(kind, &queue, &allocator).unwrap();
        assert_eq!(scalar.kind(), kind);
        assert_eq!(scalar.payload_bytes(), 8);
        assert!(matches!(scalar, Scalar::Timestamp(_)));
    }
}

#[test]
fn timestamp_factory_rejects_other_categories_without_allocating() {
    let (ledger, allocator) = host();
    let queue = ExecQueue::new();

    for kind in [DataKind::Int64, DataKind::Bool, DataKind::Utf8] {
        let err = make_timestamp_scalar(kind, &queue, &allocator).unwrap_err();
        assert!(matches!(err, ScalarError::InvalidArgument(_)), "{kind:?}");
    }
    assert_eq!(ledger.allocation_count(), 0);
}

// ---------------------------------------------------------------------------
// String factory
// ---------------------------------------------------------------------------

#[test]
fn null_string_produces_a_null_scalar() {
    let (_, allocator) = host();
    let queue = ExecQueue::new();

    let scalar = make_string_scalar(HostStringView::null(), &queue, &allocator).unwrap();
    assert!(!scalar.is_valid());
    assert_eq!(scalar.payload_bytes(), 0);
    if let Scalar::String(s) = &scalar {
        assert!(s.to_host_bytes().unwrap().is_empty());
    } else {
        panic!("string factory must produce the string variant");
    }
}

#[test]
fn empty_string_is_valid_and_distinct_from_null() {
    let (_, allocator) = host();
    let queue = ExecQueue::new();

    let scalar = make_string_scalar(HostStringView::from_str(""), &queue, &allocator).unwrap();
    assert!(scalar.is_valid());
    assert_eq!(scalar.payload_bytes(), 0);
}

#[test]
fn string_bytes_round_trip_exactly() {
    let (_, allocator) = host();
    let queue = ExecQueue::new();

    let scalar =
        make_string_scalar(HostStringView::from_str("hello"), &queue, &allocator).unwrap();
    assert!(scalar.is_valid());
    assert_eq!(scalar.payload_bytes(), 5);
    if let Scalar::String(s) = &scalar {
        assert_eq!(s.to_host_bytes().unwrap(), b"hello");
    } else {
        panic!("string factory must produce the string variant");
    }
}

#[test]
fn non_utf8_bytes_are_copied_verbatim() {
    let (_, allocator) = host();
    let queue = ExecQueue::new();

    // Codepoint structure is not validated here; that is the caller's job.
    let raw = [0xFFu8, 0x00, 0xC3, 0x28];
    let view = HostStringView::from_bytes(&raw);
    let scalar = make_string_scalar(view, &queue, &allocator).unwrap();
    if let Scalar::String(s) = &scalar {
        assert_eq!(s.to_host_bytes().unwrap(), raw);
    } else {
        panic!("string factory must produce the string variant");
    }
}

#[test]
fn null_pointer_with_claimed_length_is_rejected_without_allocating() {
    let (ledger, allocator) = host();
    let queue = ExecQueue::new();

    let view = unsafe { HostStringView::from_raw_parts(std::ptr::null(), 5) };
    let err = make_string_scalar(view, &queue, &allocator).unwrap_err();
    assert!(matches!(err, ScalarError::InvalidArgument(_)));
    assert_eq!(ledger.allocation_count(), 0);
}

#[test]
fn oversized_length_is_rejected_without_allocating() {
    let (ledger, allocator) = host();
    let queue = ExecQueue::new();

    // The length check fires before the bytes are ever touched.
    let backing = [0u8; 1];
    let view = unsafe { HostStringView::from_raw_parts(backing.as_ptr(), MAX_STRING_BYTES + 1) };
    let err = make_string_scalar(view, &queue, &allocator).unwrap_err();
    assert!(matches!(err, ScalarError::InvalidArgument(_)));
    assert_eq!(ledger.allocation_count(), 0);
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[test]
fn allocation_failure_surfaces_as_out_of_memory() {
    let oom = Arc::new(OomAllocator::new());
    let allocator: Arc<dyn DeviceAllocator> = Arc::clone(&oom) as Arc<dyn DeviceAllocator>;
    let queue = ExecQueue::new();

    let err = make_numeric_scalar(DataKind::Float64, &queue, &allocator).unwrap_err();
    assert!(matches!(err, ScalarError::OutOfMemory { requested: 8 }));

    let err = make_timestamp_scalar(DataKind::TimestampMicros, &queue, &allocator).unwrap_err();
    assert!(matches!(err, ScalarError::OutOfMemory { .. }));

    let err =
        make_string_scalar(HostStringView::from_str("hello"), &queue, &allocator).unwrap_err();
    assert!(matches!(err, ScalarError::OutOfMemory { requested: 5 }));

    assert_eq!(oom.attempts(), 3);
}

#[test]
fn dropped_scalars_leave_no_live_allocations() {
    let (ledger, allocator) = host();
    let queue = ExecQueue::new();

    {
        let _a = make_numeric_scalar(DataKind::Int64, &queue, &allocator).unwrap();
        let _b =
            make_string_scalar(HostStringView::from_str("payload"), &queue, &allocator).unwrap();
        assert_eq!(ledger.live_allocations(), 2);
    }
    assert_eq!(ledger.live_allocations(), 0);
}

// ---------------------------------------------------------------------------
// Validity mask
// ---------------------------------------------------------------------------

#[test]
fn validity_mask_reflects_the_flag() {
    let (_, allocator) = host();
    let queue = ExecQueue::new();

    let mut scalar = make_numeric_scalar(DataKind::Int8, &queue, &allocator).unwrap();
    let mask = scalar.device_validity_mask(&queue, &allocator).unwrap();
    assert!(mask.read_to_host().unwrap().iter().all(|&b| b == 0x00));

    scalar.set_valid(true);
    let mask = scalar.device_validity_mask(&queue, &allocator).unwrap();
    assert!(mask.read_to_host().unwrap().iter().all(|&b| b == 0xFF));
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn independent_queues_construct_concurrently() {
    let (ledger, allocator) = host();
    const CALLERS: usize = 8;
    const PER_CALLER: usize = 32;

    let mut handles = Vec::with_capacity(CALLERS);
    for caller in 0..CALLERS {
        let allocator = Arc::clone(&allocator);
        handles.push(tokio::task::spawn_blocking(move || {
            let queue = ExecQueue::new();
            let text = format!("caller-{caller}");
            for _ in 0..PER_CALLER {
                let n = make_numeric_scalar(DataKind::Int64, &queue, &allocator).unwrap();
                let s = make_string_scalar(
                    HostStringView::from_str(&text),
                    &queue,
                    &allocator,
                )
                .unwrap();
                assert_eq!(n.payload_bytes(), 8);
                assert_eq!(s.payload_bytes(), text.len());
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(ledger.allocation_count(), CALLERS * PER_CALLER * 2);
    assert_eq!(ledger.live_allocations(), 0);
}

// ---------------------------------------------------------------------------
// Process-wide defaults
// ---------------------------------------------------------------------------

#[test]
fn default_resource_entry_points_work() {
    reset_default_allocator();

    // Unconfigured process: host fallback keeps the defaults usable.
    let scalar = make_numeric_scalar_default(DataKind::UInt16).unwrap();
    assert_eq!(scalar.payload_bytes(), 2);

    // Installed allocator is the one the default entry points use.
    let custom = Arc::new(HostAllocator::new());
    set_default_allocator(Arc::clone(&custom) as Arc<dyn DeviceAllocator>);
    let scalar = make_string_scalar_default(HostStringView::from_str("via default")).unwrap();
    assert!(scalar.is_valid());
    assert_eq!(custom.allocation_count(), 1);

    drop(scalar);
    assert_eq!(custom.live_allocations(), 0);

    reset_default_allocator();
}
