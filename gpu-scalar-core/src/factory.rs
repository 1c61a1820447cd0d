//! Factory entry points for constructing device-resident scalars.
//!
//! Construction is synchronous from the caller's perspective: a factory
//! returns once allocation and any copy have been issued on the supplied
//! queue, not necessarily completed. Preconditions are checked before any
//! allocation, so a failed call leaves nothing behind.

use std::marker::PhantomData;
use std::sync::Arc;

use gpu_device_memory::{default_allocator, default_queue, DeviceAllocator, DeviceBuffer, ExecQueue};
use tracing::debug;

use crate::data_type::DataKind;
use crate::error::ScalarError;
use crate::scalar::{FixedWidthScalar, Scalar, StringScalar};

/// Longest byte length a string scalar can record (`size_type` bound of the
/// surrounding engine's offset columns).
pub const MAX_STRING_BYTES: usize = i32::MAX as usize;

/// Host-resident pointer/length pair naming one string value.
///
/// The null pointer is the sentinel for a null (absent) string; a non-null
/// pointer with length zero is a valid empty string. The two are never
/// conflated. The safe constructors cannot produce an inconsistent pair;
/// [`HostStringView::from_raw_parts`] exists for the FFI boundary.
#[derive(Debug, Clone, Copy)]
pub struct HostStringView<'a> {
    ptr: *const u8,
    len: usize,
    _host: PhantomData<&'a [u8]>,
}

impl<'a> HostStringView<'a> {
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self {
            ptr: bytes.as_ptr(),
            len: bytes.len(),
            _host: PhantomData,
        }
    }

    pub fn from_str(s: &'a str) -> Self {
        Self::from_bytes(s.as_bytes())
    }

    /// The null string.
    pub fn null() -> Self {
        Self {
            ptr: std::ptr::null(),
            len: 0,
            _host: PhantomData,
        }
    }

    /// Build a view from a raw pair.
    ///
    /// # Safety
    ///
    /// `ptr` must be null, or valid for reads of `len` bytes for the lifetime
    /// of the view.
    pub unsafe fn from_raw_parts(ptr: *const u8, len: usize) -> Self {
        Self {
            ptr,
            len,
            _host: PhantomData,
        }
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// Claimed byte length. Meaningful only for non-null views.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn as_bytes(&self) -> Option<&'a [u8]> {
        if self.ptr.is_null() {
            None
        } else {
            // Validity for `len` reads is the constructor's contract.
            Some(unsafe { std::slice::from_raw_parts(self.ptr, self.len) })
        }
    }
}

/// Construct a scalar of the given numeric kind with uninitialized,
/// exactly-sized payload storage.
///
/// The scalar starts invalid; the value is filled in afterward through
/// [`FixedWidthScalar::set_value_bytes`]. Fails with
/// [`ScalarError::InvalidArgument`] when `kind` is not numeric and with
/// [`ScalarError::OutOfMemory`] when the allocator cannot satisfy the
/// request.
pub fn make_numeric_scalar(
    kind: DataKind,
    queue: &ExecQueue,
    allocator: &Arc<dyn DeviceAllocator>,
) -> Result<Scalar, ScalarError> {
    expect_category(kind, DataKind::is_numeric, "numeric")?;
    let data = alloc_fixed(kind, queue, allocator)?;
    Ok(Scalar::Numeric(FixedWidthScalar::new(kind, false, data)))
}

/// [`make_numeric_scalar`] on the process default queue and allocator.
pub fn make_numeric_scalar_default(kind: DataKind) -> Result<Scalar, ScalarError> {
    make_numeric_scalar(kind, &default_queue(), &default_allocator())
}

/// Construct a scalar of the given timestamp kind. Same contract as
/// [`make_numeric_scalar`], restricted to timestamp resolutions.
pub fn make_timestamp_scalar(
    kind: DataKind,
    queue: &ExecQueue,
    allocator: &Arc<dyn DeviceAllocator>,
) -> Result<Scalar, ScalarError> {
    expect_category(kind, DataKind::is_timestamp, "timestamp")?;
    let data = alloc_fixed(kind, queue, allocator)?;
    Ok(Scalar::Timestamp(FixedWidthScalar::new(kind, false, data)))
}

/// [`make_timestamp_scalar`] on the process default queue and allocator.
pub fn make_timestamp_scalar_default(kind: DataKind) -> Result<Scalar, ScalarError> {
    make_timestamp_scalar(kind, &default_queue(), &default_allocator())
}

/// Construct a string scalar from a host pointer/length pair.
///
/// A null pointer yields a null scalar; a non-null pointer with length zero
/// yields a valid empty string. The bytes are treated as UTF-8 without
/// validating codepoint structure. Fails with
/// [`ScalarError::InvalidArgument`] on a null pointer with a nonzero claimed
/// length or a length above [`MAX_STRING_BYTES`], both before any allocation.
pub fn make_string_scalar(
    value: HostStringView<'_>,
    queue: &ExecQueue,
    allocator: &Arc<dyn DeviceAllocator>,
) -> Result<Scalar, ScalarError> {
    if value.is_null() && value.len() != 0 {
        return Err(ScalarError::invalid(format!(
            "null string pointer with claimed length {}",
            value.len()
        )));
    }
    if value.len() > MAX_STRING_BYTES {
        return Err(ScalarError::invalid(format!(
            "string payload of {} bytes exceeds the {} byte limit",
            value.len(),
            MAX_STRING_BYTES
        )));
    }

    let valid = !value.is_null();
    let len = value.len();
    debug!("String scalar: valid={} len={} on queue {}", valid, len, queue.id());

    let mut chars = DeviceBuffer::allocate(len, queue, allocator)?;
    if let Some(bytes) = value.as_bytes() {
        if !bytes.is_empty() {
            chars.write_from_host(bytes, queue)?;
        }
    }
    Ok(Scalar::String(StringScalar::new(valid, len, chars)))
}

/// [`make_string_scalar`] on the process default queue and allocator.
pub fn make_string_scalar_default(value: HostStringView<'_>) -> Result<Scalar, ScalarError> {
    make_string_scalar(value, &default_queue(), &default_allocator())
}

// ---------------------------------------------------------------------------
// Shared validation and allocation
// ---------------------------------------------------------------------------

fn expect_category(
    kind: DataKind,
    legal: fn(DataKind) -> bool,
    category: &str,
) -> Result<(), ScalarError> {
    if legal(kind) {
        Ok(())
    } else {
        Err(ScalarError::invalid(format!(
            "{kind:?} is not a {category} kind"
        )))
    }
}

fn alloc_fixed(
    kind: DataKind,
    queue: &ExecQueue,
    allocator: &Arc<dyn DeviceAllocator>,
) -> Result<DeviceBuffer, ScalarError> {
    let width = kind
        .fixed_byte_width()
        .ok_or_else(|| ScalarError::invalid(format!("{kind:?} has no fixed byte width")))?;
    debug!("{:?} scalar: {} payload bytes on queue {}", kind, width, queue.id());
    Ok(DeviceBuffer::allocate(width, queue, allocator)?)
}
