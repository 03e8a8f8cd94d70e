use std::env;
use std::fmt;

use strided_device::{Device, DeviceConfig};

use crate::Result;
#[cfg(feature = "parallel")]
use crate::HbmvError;

/// Environment variable selecting the size of a dedicated worker pool.
pub const ENV_NUM_THREADS: &str = "STRIDED_HBMV_NUM_THREADS";
/// Environment variable overriding [`HandleConfig::parallel_min_work`].
pub const ENV_PARALLEL_MIN_WORK: &str = "STRIDED_HBMV_PARALLEL_MIN_WORK";

/// Minimum multiply-adds per call before batches are spread over threads.
pub const DEFAULT_PARALLEL_MIN_WORK: usize = 1 << 15;

/// Execution settings of a [`Handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleConfig {
    /// Size of a dedicated rayon pool; `None` uses the global pool.
    pub num_threads: Option<usize>,
    /// Work threshold for parallel dispatch.
    pub parallel_min_work: usize,
    pub device: DeviceConfig,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            parallel_min_work: DEFAULT_PARALLEL_MIN_WORK,
            device: DeviceConfig::default(),
        }
    }
}

impl HandleConfig {
    /// Defaults overridden by any of [`ENV_NUM_THREADS`],
    /// [`ENV_PARALLEL_MIN_WORK`] and the device memory limit variable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            num_threads: env_usize(ENV_NUM_THREADS).filter(|&n| n > 0),
            parallel_min_work: env_usize(ENV_PARALLEL_MIN_WORK)
                .unwrap_or(defaults.parallel_min_work),
            device: DeviceConfig::from_env(),
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

/// Execution context: configuration, the device coefficients are read
/// from, and optionally a dedicated worker pool.
pub struct Handle {
    config: HandleConfig,
    device: Device,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("config", &self.config)
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::new()
    }
}

impl Handle {
    /// Handle with the default configuration and a fresh device.
    pub fn new() -> Self {
        let config = HandleConfig::default();
        Self {
            config,
            device: Device::new(config.device),
            #[cfg(feature = "parallel")]
            pool: None,
        }
    }

    /// # Errors
    /// [`HbmvError::Internal`](crate::HbmvError::Internal) if the worker pool
    /// cannot be built.
    pub fn with_config(config: HandleConfig) -> Result<Self> {
        Self::with_device(config, Device::new(config.device))
    }

    /// Handle reading device coefficients from an existing `device`.
    ///
    /// `config.device` is ignored in favour of the device's own settings.
    pub fn with_device(config: HandleConfig, device: Device) -> Result<Self> {
        #[cfg(feature = "parallel")]
        let pool = match config.num_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("strided-hbmv-{i}"))
                    .build()
                    .map_err(|e| HbmvError::Internal(e.to_string()))?,
            ),
            None => None,
        };
        log::debug!("hbmv handle: {config:?}");
        Ok(Self {
            config: HandleConfig {
                device: device.config(),
                ..config
            },
            device,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    /// Handle configured from the environment.
    pub fn from_env() -> Result<Self> {
        Self::with_config(HandleConfig::from_env())
    }

    #[inline]
    pub fn config(&self) -> &HandleConfig {
        &self.config
    }

    #[inline]
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Run `f` inside the dedicated pool, or on the calling thread when
    /// there is none.
    #[cfg(feature = "parallel")]
    pub(crate) fn install<R, F>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }
}
