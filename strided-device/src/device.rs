//! Device handle, typed buffers and allocation accounting.

use std::env;
use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{DeviceError, Result};

/// Environment variable holding the device memory limit in bytes.
pub const ENV_MEMORY_LIMIT: &str = "STRIDED_DEVICE_MEMORY_LIMIT";

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Device configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Upper bound on live bytes; `None` means unlimited.
    pub memory_limit: Option<usize>,
}

impl DeviceConfig {
    /// Read the configuration from the environment.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self {
            memory_limit: env_usize(ENV_MEMORY_LIMIT),
        }
    }
}

fn env_usize(key: &str) -> Option<usize> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring {key}={raw:?}: expected a non-negative integer");
            None
        }
    }
}

/// Snapshot of a device's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub allocations: u64,
    pub deallocations: u64,
    pub bytes_in_use: usize,
    pub peak_bytes: usize,
    /// Host-to-device copies.
    pub host_to_device: u64,
    /// Device-to-host copies.
    pub device_to_host: u64,
    /// Scalars read back through [`Device::load_scalar`].
    pub scalar_loads: u64,
}

#[derive(Default)]
struct Counters {
    allocations: AtomicU64,
    deallocations: AtomicU64,
    bytes_in_use: AtomicUsize,
    peak_bytes: AtomicUsize,
    host_to_device: AtomicU64,
    device_to_host: AtomicU64,
    scalar_loads: AtomicU64,
}

struct DeviceInner {
    id: u64,
    config: DeviceConfig,
    counters: Counters,
}

/// Handle to an emulated device. Clones share the same counters.
#[derive(Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.inner.id)
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::new(DeviceConfig::default())
    }
}

impl Device {
    pub fn new(config: DeviceConfig) -> Self {
        let id = NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed);
        log::trace!("device {id}: created with {config:?}");
        Self {
            inner: Arc::new(DeviceInner {
                id,
                config,
                counters: Counters::default(),
            }),
        }
    }

    /// Device configured from [`DeviceConfig::from_env`].
    pub fn from_env() -> Self {
        Self::new(DeviceConfig::from_env())
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[inline]
    pub fn config(&self) -> DeviceConfig {
        self.inner.config
    }

    /// Allocate `len` default-initialised elements.
    ///
    /// # Errors
    /// [`DeviceError::EmptyAllocation`] when `len == 0`, and
    /// [`DeviceError::OutOfMemory`] when the limit or the host allocator
    /// refuses the request.
    pub fn alloc<T: Copy + Default>(&self, len: usize) -> Result<DeviceBuffer<T>> {
        if len == 0 {
            return Err(DeviceError::EmptyAllocation);
        }
        let bytes = len
            .checked_mul(mem::size_of::<T>())
            .ok_or(DeviceError::OutOfMemory {
                requested: usize::MAX,
                available: self.available(),
            })?;
        self.reserve(bytes)?;

        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            self.release(bytes);
            return Err(DeviceError::OutOfMemory {
                requested: bytes,
                available: self.available(),
            });
        }
        data.resize(len, T::default());

        self.inner.counters.allocations.fetch_add(1, Ordering::Relaxed);
        log::trace!("device {}: alloc {len} elements ({bytes} bytes)", self.inner.id);
        Ok(DeviceBuffer {
            device: self.clone(),
            data,
            bytes,
        })
    }

    /// Allocate a one-element buffer holding `value`.
    pub fn scalar<T: Copy + Default>(&self, value: T) -> Result<DeviceBuffer<T>> {
        let mut buf = self.alloc::<T>(1)?;
        buf.copy_from_host(&[value])?;
        Ok(buf)
    }

    /// Read the first element of a device buffer back to the host.
    ///
    /// # Errors
    /// [`DeviceError::ForeignBuffer`] if `buf` was allocated elsewhere.
    pub fn load_scalar<T: Copy>(&self, buf: &DeviceBuffer<T>) -> Result<T> {
        if !self.owns(buf) {
            return Err(DeviceError::ForeignBuffer);
        }
        let value = *buf.data.first().ok_or(DeviceError::SizeMismatch {
            expected: 1,
            got: 0,
        })?;
        self.inner.counters.scalar_loads.fetch_add(1, Ordering::Relaxed);
        Ok(value)
    }

    /// Returns true if `buf` was allocated by this device (or a clone of it).
    #[inline]
    pub fn owns<T>(&self, buf: &DeviceBuffer<T>) -> bool {
        Arc::ptr_eq(&self.inner, &buf.device.inner)
    }

    pub fn stats(&self) -> DeviceStats {
        let c = &self.inner.counters;
        DeviceStats {
            allocations: c.allocations.load(Ordering::Relaxed),
            deallocations: c.deallocations.load(Ordering::Relaxed),
            bytes_in_use: c.bytes_in_use.load(Ordering::Relaxed),
            peak_bytes: c.peak_bytes.load(Ordering::Relaxed),
            host_to_device: c.host_to_device.load(Ordering::Relaxed),
            device_to_host: c.device_to_host.load(Ordering::Relaxed),
            scalar_loads: c.scalar_loads.load(Ordering::Relaxed),
        }
    }

    /// Zero the event counters. Live bytes are kept and become the new peak.
    pub fn reset_stats(&self) {
        let c = &self.inner.counters;
        c.allocations.store(0, Ordering::Relaxed);
        c.deallocations.store(0, Ordering::Relaxed);
        c.host_to_device.store(0, Ordering::Relaxed);
        c.device_to_host.store(0, Ordering::Relaxed);
        c.scalar_loads.store(0, Ordering::Relaxed);
        c.peak_bytes
            .store(c.bytes_in_use.load(Ordering::Relaxed), Ordering::Relaxed);
    }

    fn available(&self) -> usize {
        let used = self.inner.counters.bytes_in_use.load(Ordering::Relaxed);
        self.inner
            .config
            .memory_limit
            .map_or(usize::MAX, |limit| limit.saturating_sub(used))
    }

    fn reserve(&self, bytes: usize) -> Result<()> {
        let c = &self.inner.counters;
        let used = match self.inner.config.memory_limit {
            Some(limit) => c
                .bytes_in_use
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                    used.checked_add(bytes).filter(|&total| total <= limit)
                })
                .map_err(|used| {
                    log::debug!(
                        "device {}: refusing {bytes} bytes ({used} of {limit} in use)",
                        self.inner.id
                    );
                    DeviceError::OutOfMemory {
                        requested: bytes,
                        available: limit.saturating_sub(used),
                    }
                })?,
            None => c.bytes_in_use.fetch_add(bytes, Ordering::AcqRel),
        };
        c.peak_bytes.fetch_max(used + bytes, Ordering::Relaxed);
        Ok(())
    }

    fn release(&self, bytes: usize) {
        self.inner
            .counters
            .bytes_in_use
            .fetch_sub(bytes, Ordering::AcqRel);
    }
}

/// A typed allocation on a [`Device`].
pub struct DeviceBuffer<T> {
    device: Device,
    data: Vec<T>,
    bytes: usize,
}

impl<T> fmt::Debug for DeviceBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("device", &self.device.inner.id)
            .field("len", &self.data.len())
            .finish()
    }
}

impl<T> DeviceBuffer<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Device-side view for kernels. Not counted as a transfer.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable device-side view for kernels. Not counted as a transfer.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Copy> DeviceBuffer<T> {
    /// Copy `src` into the buffer.
    ///
    /// # Errors
    /// [`DeviceError::SizeMismatch`] unless `src.len() == self.len()`.
    pub fn copy_from_host(&mut self, src: &[T]) -> Result<()> {
        if src.len() != self.data.len() {
            return Err(DeviceError::SizeMismatch {
                expected: self.data.len(),
                got: src.len(),
            });
        }
        self.data.copy_from_slice(src);
        self.device
            .inner
            .counters
            .host_to_device
            .fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Copy the buffer into `dst`.
    ///
    /// # Errors
    /// [`DeviceError::SizeMismatch`] unless `dst.len() == self.len()`.
    pub fn copy_to_host(&self, dst: &mut [T]) -> Result<()> {
        if dst.len() != self.data.len() {
            return Err(DeviceError::SizeMismatch {
                expected: self.data.len(),
                got: dst.len(),
            });
        }
        dst.copy_from_slice(&self.data);
        self.device
            .inner
            .counters
            .device_to_host
            .fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl<T> Drop for DeviceBuffer<T> {
    fn drop(&mut self) {
        self.device.release(self.bytes);
        self.device
            .inner
            .counters
            .deallocations
            .fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "device {}: free {} bytes",
            self.device.inner.id,
            self.bytes
        );
    }
}
