//! The scalar data model: one typed, nullable value in device memory.

use std::sync::Arc;

use gpu_device_memory::{
    create_null_mask, DeviceAllocator, DeviceBuffer, DevicePtr, ExecQueue, MaskState,
};

use crate::data_type::DataKind;
use crate::error::ScalarError;

/// A single typed, nullable value resident in device memory.
///
/// Exactly one variant is ever active; the variant fixes the physical
/// representation for the scalar's whole life. Scalars are created solely
/// through the factory functions in [`crate::factory`] and exclusively own
/// their device storage; handles may be moved but the storage has exactly one
/// owner at a time.
#[derive(Debug)]
pub enum Scalar {
    Numeric(FixedWidthScalar),
    Timestamp(FixedWidthScalar),
    String(StringScalar),
}

impl Scalar {
    /// The kind fixed at construction.
    pub fn kind(&self) -> DataKind {
        match self {
            Scalar::Numeric(s) | Scalar::Timestamp(s) => s.kind(),
            Scalar::String(_) => DataKind::Utf8,
        }
    }

    /// Whether the value is logically present, independent of payload bytes.
    pub fn is_valid(&self) -> bool {
        match self {
            Scalar::Numeric(s) | Scalar::Timestamp(s) => s.is_valid(),
            Scalar::String(s) => s.is_valid(),
        }
    }

    pub fn set_valid(&mut self, valid: bool) {
        match self {
            Scalar::Numeric(s) | Scalar::Timestamp(s) => s.set_valid(valid),
            Scalar::String(s) => s.set_valid(valid),
        }
    }

    /// Logical payload size in bytes.
    pub fn payload_bytes(&self) -> usize {
        match self {
            Scalar::Numeric(s) | Scalar::Timestamp(s) => s.data().len(),
            Scalar::String(s) => s.len(),
        }
    }

    /// Device address of the payload.
    pub fn device_ptr(&self) -> DevicePtr {
        match self {
            Scalar::Numeric(s) | Scalar::Timestamp(s) => s.data().device_ptr(),
            Scalar::String(s) => s.chars().device_ptr(),
        }
    }

    /// Materialize a one-element device null mask mirroring the validity
    /// flag, for kernels that read validity out-of-band. Queue-ordered; the
    /// caller owns the returned buffer.
    pub fn device_validity_mask(
        &self,
        queue: &ExecQueue,
        allocator: &Arc<dyn DeviceAllocator>,
    ) -> Result<DeviceBuffer, ScalarError> {
        let state = if self.is_valid() {
            MaskState::AllValid
        } else {
            MaskState::AllNull
        };
        Ok(create_null_mask(1, state, queue, allocator)?)
    }
}

/// Payload of a numeric or timestamp scalar: exactly one element of `kind`,
/// sized to the kind's byte width.
#[derive(Debug)]
pub struct FixedWidthScalar {
    kind: DataKind,
    valid: bool,
    data: DeviceBuffer,
}

impl FixedWidthScalar {
    pub(crate) fn new(kind: DataKind, valid: bool, data: DeviceBuffer) -> Self {
        Self { kind, valid, data }
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    pub fn data(&self) -> &DeviceBuffer {
        &self.data
    }

    /// Write the element bytes, queue-ordered, and mark the scalar valid.
    /// `bytes` must be exactly the kind's byte width.
    pub fn set_value_bytes(&mut self, bytes: &[u8], queue: &ExecQueue) -> Result<(), ScalarError> {
        if bytes.len() != self.data.len() {
            return Err(ScalarError::invalid(format!(
                "value of {} bytes for a {}-byte {:?} payload",
                bytes.len(),
                self.data.len(),
                self.kind
            )));
        }
        self.data.write_from_host(bytes, queue)?;
        self.valid = true;
        Ok(())
    }

    /// Read the element bytes back to the host.
    pub fn value_bytes(&self) -> Result<Vec<u8>, ScalarError> {
        Ok(self.data.read_to_host()?)
    }
}

/// Payload of a string scalar.
///
/// Owns the byte-length descriptor and the UTF-8 character buffer as one
/// unit; dropping the scalar releases both. An invalid (null) string has
/// logically empty content, which is distinct from a valid empty string.
#[derive(Debug)]
pub struct StringScalar {
    valid: bool,
    len: usize,
    chars: DeviceBuffer,
}

impl StringScalar {
    pub(crate) fn new(valid: bool, len: usize, chars: DeviceBuffer) -> Self {
        Self { valid, len, chars }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Marking a string null also empties its logical content.
    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
        if !valid {
            self.len = 0;
        }
    }

    /// Byte length of the string content (0 when null).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn chars(&self) -> &DeviceBuffer {
        &self.chars
    }

    /// Copy the string content back to the host.
    pub fn to_host_bytes(&self) -> Result<Vec<u8>, ScalarError> {
        if self.len == 0 {
            return Ok(Vec::new());
        }
        Ok(self.chars.read_to_host()?)
    }
}
