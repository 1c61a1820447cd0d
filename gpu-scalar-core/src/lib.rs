//! Typed, nullable device-resident scalars for the GPU OLAP engine.
//!
//! A [`Scalar`] holds exactly one logical value of a declared kind (numeric,
//! timestamp, or variable-length UTF-8 string) in device memory, with a
//! validity flag independent of the payload bytes. Scalars are built through
//! the three factory entry points:
//!
//! - [`make_numeric_scalar`] — uninitialized fixed-width payload,
//! - [`make_timestamp_scalar`] — same, restricted to timestamp resolutions,
//! - [`make_string_scalar`] — copies a host pointer/length pair, where the
//!   null pointer denotes a null string.
//!
//! Every factory takes an execution queue and an allocator so construction is
//! stream-ordered and never synchronizes the whole device; the `*_default`
//! variants use the process-wide defaults from `gpu-device-memory`. Errors
//! split into [`ScalarError::InvalidArgument`] (precondition violation,
//! detected before any allocation) and [`ScalarError::OutOfMemory`].

pub mod data_type;
pub mod error;
pub mod factory;
pub mod scalar;

pub use data_type::DataKind;
pub use error::ScalarError;
pub use factory::{
    make_numeric_scalar, make_numeric_scalar_default, make_string_scalar,
    make_string_scalar_default, make_timestamp_scalar, make_timestamp_scalar_default,
    HostStringView, MAX_STRING_BYTES,
};
pub use scalar::{FixedWidthScalar, Scalar, StringScalar};
