//! The closed set of element kinds a scalar can hold.

use arrow_schema::{DataType as ArrowDataType, TimeUnit};

use crate::error::ScalarError;

/// Tag identifying a scalar's physical and semantic kind.
///
/// Immutable once attached to a scalar; fixed-width kinds determine the exact
/// byte layout of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Bool,
    /// Seconds since the Unix epoch, stored as `i64`.
    TimestampSeconds,
    TimestampMillis,
    TimestampMicros,
    TimestampNanos,
    /// Variable-length UTF-8 byte sequence.
    Utf8,
}

impl DataKind {
    /// Every kind, in declaration order.
    pub const ALL: [DataKind; 16] = [
        DataKind::Int8,
        DataKind::Int16,
        DataKind::Int32,
        DataKind::Int64,
        DataKind::UInt8,
        DataKind::UInt16,
        DataKind::UInt32,
        DataKind::UInt64,
        DataKind::Float32,
        DataKind::Float64,
        DataKind::Bool,
        DataKind::TimestampSeconds,
        DataKind::TimestampMillis,
        DataKind::TimestampMicros,
        DataKind::TimestampNanos,
        DataKind::Utf8,
    ];

    /// Byte width of one element, `None` for variable-length kinds.
    pub fn fixed_byte_width(self) -> Option<usize> {
        match self {
            DataKind::Int8 | DataKind::UInt8 | DataKind::Bool => Some(1),
            DataKind::Int16 | DataKind::UInt16 => Some(2),
            DataKind::Int32 | DataKind::UInt32 | DataKind::Float32 => Some(4),
            DataKind::Int64
            | DataKind::UInt64
            | DataKind::Float64
            | DataKind::TimestampSeconds
            | DataKind::TimestampMillis
            | DataKind::TimestampMicros
            | DataKind::TimestampNanos => Some(8),
            DataKind::Utf8 => None,
        }
    }

    /// Integers of every width, floating point, and boolean.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            DataKind::Int8
                | DataKind::Int16
                | DataKind::Int32
                | DataKind::Int64
                | DataKind::UInt8
                | DataKind::UInt16
                | DataKind::UInt32
                | DataKind::UInt64
                | DataKind::Float32
                | DataKind::Float64
                | DataKind::Bool
        )
    }

    pub fn is_timestamp(self) -> bool {
        matches!(
            self,
            DataKind::TimestampSeconds
                | DataKind::TimestampMillis
                | DataKind::TimestampMicros
                | DataKind::TimestampNanos
        )
    }

    pub fn is_fixed_width(self) -> bool {
        self.fixed_byte_width().is_some()
    }

    /// Map an Arrow `DataType` to a `DataKind`.
    pub fn from_arrow(dt: &ArrowDataType) -> Result<Self, ScalarError> {
        match dt {
            ArrowDataType::Int8 => Ok(DataKind::Int8),
            ArrowDataType::Int16 => Ok(DataKind::Int16),
            ArrowDataType::Int32 => Ok(DataKind::Int32),
            ArrowDataType::Int64 => Ok(DataKind::Int64),
            ArrowDataType::UInt8 => Ok(DataKind::UInt8),
            ArrowDataType::UInt16 => Ok(DataKind::UInt16),
            ArrowDataType::UInt32 => Ok(DataKind::UInt32),
            ArrowDataType::UInt64 => Ok(DataKind::UInt64),
            ArrowDataType::Float32 => Ok(DataKind::Float32),
            ArrowDataType::Float64 => Ok(DataKind::Float64),
            ArrowDataType::Boolean => Ok(DataKind::Bool),
            ArrowDataType::Timestamp(TimeUnit::Second, _) => Ok(DataKind::TimestampSeconds),
            ArrowDataType::Timestamp(TimeUnit::Millisecond, _) => Ok(DataKind::TimestampMillis),
            ArrowDataType::Timestamp(TimeUnit::Microsecond, _) => Ok(DataKind::TimestampMicros),
            ArrowDataType::Timestamp(TimeUnit::Nanosecond, _) => Ok(DataKind::TimestampNanos),
            ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 => Ok(DataKind::Utf8),
            other => Err(ScalarError::invalid(format!(
                "unsupported Arrow type for a scalar: {other:?}"
            ))),
        }
    }

    /// The Arrow `DataType` this kind round-trips to.
    pub fn to_arrow(self) -> ArrowDataType {
        match self {
            DataKind::Int8 => ArrowDataType::Int8,
            DataKind::Int16 => ArrowDataType::Int16,
            DataKind::Int32 => ArrowDataType::Int32,
            DataKind::Int64 => ArrowDataType::Int64,
            DataKind::UInt8 => ArrowDataType::UInt8,
            DataKind::UInt16 => ArrowDataType::UInt16,
            DataKind::UInt32 => ArrowDataType::UInt32,
            DataKind::UInt64 => ArrowDataType::UInt64,
            DataKind::Float32 => ArrowDataType::Float32,
            DataKind::Float64 => ArrowDataType::Float64,
            DataKind::Bool => ArrowDataType::Boolean,
            DataKind::TimestampSeconds => ArrowDataType::Timestamp(TimeUnit::Second, None),
            DataKind::TimestampMillis => ArrowDataType::Timestamp(TimeUnit::Millisecond, None),
            DataKind::TimestampMicros => ArrowDataType::Timestamp(TimeUnit::Microsecond, None),
            DataKind::TimestampNanos => ArrowDataType::Timestamp(TimeUnit::Nanosecond, None),
            DataKind::Utf8 => ArrowDataType::Utf8,
        }
    }
}
