//! Emulated device memory for the batched band kernels.
//!
//! A [`Device`] hands out [`DeviceBuffer`]s and counts every allocation,
//! transfer and scalar read so callers can check what an operation touched.
//! The memory itself lives in host RAM.
//!
//! # Core Types
//!
//! - [`Device`]: allocation and transfer accounting, optional memory limit
//! - [`DeviceBuffer`]: a typed allocation owned by one device
//! - [`HostStridedBatch`] / [`DeviceStridedBatch`]: owning strided-batch containers
//!
//! # Example
//!
//! ```rust
//! use strided_device::{Device, DeviceConfig};
//!
//! let device = Device::new(DeviceConfig::default());
//! let mut buf = device.alloc::<f64>(4).unwrap();
//! buf.copy_from_host(&[1.0, 2.0, 3.0, 4.0]).unwrap();
//!
//! let stats = device.stats();
//! assert_eq!(stats.allocations, 1);
//! assert_eq!(stats.host_to_device, 1);
//! assert_eq!(stats.bytes_in_use, 32);
//! ```

pub mod container;
pub mod device;

pub use container::{DeviceStridedBatch, HostStridedBatch};
pub use device::{Device, DeviceBuffer, DeviceConfig, DeviceStats, ENV_MEMORY_LIMIT};

use strided_view::StridedError;

/// Errors raised by device allocation and transfers.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The allocation would exceed the configured memory limit.
    #[error("out of device memory: requested {requested} bytes, {available} available")]
    OutOfMemory { requested: usize, available: usize },

    /// Zero-element allocations are rejected.
    #[error("zero-sized device allocation")]
    EmptyAllocation,

    #[error("size mismatch: expected {expected} elements, got {got}")]
    SizeMismatch { expected: usize, got: usize },

    /// Source and destination batches describe different layouts.
    #[error("strided batch layout mismatch")]
    LayoutMismatch,

    /// The buffer was allocated by a different device.
    #[error("buffer belongs to another device")]
    ForeignBuffer,

    #[error(transparent)]
    Strided(#[from] StridedError),
}

/// Result type for device operations.
pub type Result<T> = std::result::Result<T, DeviceError>;
