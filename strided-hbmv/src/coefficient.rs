use strided_device::{Device, DeviceBuffer};

use crate::Result;

/// Where `alpha` and `beta` are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerMode {
    /// Passed by value; inspected during validation.
    Host,
    /// Resident in device memory; read only when the kernel runs.
    Device,
}

/// A scalar coefficient (`alpha` or `beta`).
#[derive(Debug)]
pub enum Coefficient<'a, T> {
    Host(T),
    /// First element of a device buffer.
    Device(&'a DeviceBuffer<T>),
}

impl<T: Copy> Clone for Coefficient<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Copy> Copy for Coefficient<'_, T> {}

impl<'a, T> From<&'a DeviceBuffer<T>> for Coefficient<'a, T> {
    fn from(buf: &'a DeviceBuffer<T>) -> Self {
        Coefficient::Device(buf)
    }
}

impl<T> Coefficient<'_, T> {
    #[inline]
    pub fn mode(&self) -> PointerMode {
        match self {
            Coefficient::Host(_) => PointerMode::Host,
            Coefficient::Device(_) => PointerMode::Device,
        }
    }
}

impl<T: Copy> Coefficient<'_, T> {
    /// The value, if it can be read without touching device memory.
    #[inline]
    pub fn host_value(&self) -> Option<T> {
        match *self {
            Coefficient::Host(v) => Some(v),
            Coefficient::Device(_) => None,
        }
    }

    /// Read the value, loading it from `device` when it is device-resident.
    ///
    /// # Errors
    /// Fails when the buffer does not belong to `device`.
    pub fn resolve(&self, device: &Device) -> Result<T> {
        match *self {
            Coefficient::Host(v) => Ok(v),
            Coefficient::Device(buf) => Ok(device.load_scalar(buf)?),
        }
    }
}
