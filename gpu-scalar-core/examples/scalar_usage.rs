use std::sync::Arc;

use anyhow::Result;
use gpu_device_memory::{DeviceAllocator, ExecQueue, HostAllocator};
use gpu_scalar_core::{
    make_numeric_scalar, make_string_scalar, make_string_scalar_default, make_timestamp_scalar,
    DataKind, HostStringView, Scalar,
};
use tracing::{info, Level};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("GPU Scalar Construction - Rust Examples");

    // The host backend stands in for a CUDA device here; swap in
    // `CudaAllocator` (feature `cuda`) for real device memory.
    let allocator: Arc<dyn DeviceAllocator> = Arc::new(HostAllocator::new());
    let queue = ExecQueue::new();

    numeric_example(&queue, &allocator)?;
    timestamp_example(&queue, &allocator)?;
    string_example(&queue, &allocator)?;
    default_resources_example()?;

    Ok(())
}

fn numeric_example(queue: &ExecQueue, allocator: &Arc<dyn DeviceAllocator>) -> Result<()> {
    info!("=== Example 1: Numeric Scalar ===");

    let mut scalar = make_numeric_scalar(DataKind::Int32, queue, allocator)?;
    info!("Constructed {:?}: {} payload bytes", scalar.kind(), scalar.payload_bytes());
    info!("Starts invalid: is_valid = {}", scalar.is_valid());

    // Fill in the value through the write path.
    if let Scalar::Numeric(inner) = &mut scalar {
        inner.set_value_bytes(&42i32.to_le_bytes(), queue)?;
        info!("After set_value_bytes: is_valid = {}", inner.is_valid());
    }

    Ok(())
}

fn timestamp_example(queue: &ExecQueue, allocator: &Arc<dyn DeviceAllocator>) -> Result<()> {
    info!("=== Example 2: Timestamp Scalar ===");

    let scalar = make_timestamp_scalar(DataKind::TimestampMillis, queue, allocator)?;
    info!("Constructed {:?}: {} payload bytes", scalar.kind(), scalar.payload_bytes());

    // Passing a non-timestamp kind is a precondition violation.
    match make_timestamp_scalar(DataKind::Float32, queue, allocator) {
        Ok(_) => {}
        Err(e) => info!("Expected error: {}", e),
    }

    Ok(())
}

fn string_example(queue: &ExecQueue, allocator: &Arc<dyn DeviceAllocator>) -> Result<()> {
    info!("=== Example 3: String Scalar ===");

    let hello = make_string_scalar(HostStringView::from_str("hello"), queue, allocator)?;
    info!("\"hello\": valid = {}, len = {}", hello.is_valid(), hello.payload_bytes());
    if let Scalar::String(s) = &hello {
        info!("Read back: {:?}", String::from_utf8_lossy(&s.to_host_bytes()?));
    }

    // A valid empty string and a null string are different things.
    let empty = make_string_scalar(HostStringView::from_str(""), queue, allocator)?;
    let null = make_string_scalar(HostStringView::null(), queue, allocator)?;
    info!("\"\":    valid = {}, len = {}", empty.is_valid(), empty.payload_bytes());
    info!("null:  valid = {}, len = {}", null.is_valid(), null.payload_bytes());

    Ok(())
}

fn default_resources_example() -> Result<()> {
    info!("=== Example 4: Process Defaults ===");

    // No queue/allocator in sight: the process-wide defaults are used.
    let scalar = make_string_scalar_default(HostStringView::from_str("defaulted"))?;
    info!("Constructed via defaults: valid = {}, len = {}", scalar.is_valid(), scalar.payload_bytes());

    Ok(())
}
