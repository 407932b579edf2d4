//! Configuration for execution and operation defaults.
//!
//! Configuration can be built in code with the `with_*` builders or loaded
//! from TOML. Every key is optional:
//!
//! ```toml
//! [executor]
//! bands = 8          # 0 = one band per available core
//! timeout_ms = 5000
//!
//! [defaults]
//! kernel_size = 3
//! tint_alpha = "preserve"   # or "additive"
//! ```

use crate::core::error::StrataResult;
use crate::core::kernel::MIN_KERNEL_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default time budget for one tiled execution.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How tinting treats the alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlphaMode {
    /// Alpha passes through unchanged.
    #[default]
    Preserve,
    /// The tint's alpha is added to the pixel's alpha, clipped.
    Additive,
}

/// Configuration for the tiled executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Number of row bands per call (0 = available parallelism).
    pub bands: usize,
    /// Time budget for one call.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            bands: 0,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ExecutorConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the band count (0 = available parallelism).
    pub fn with_bands(mut self, bands: usize) -> Self {
        self.bands = bands;
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The band count actually used for a call.
    pub fn effective_bands(&self) -> usize {
        if self.bands > 0 {
            return self.bands;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Defaults applied when an operation request omits a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationDefaults {
    /// Kernel size for convolution requests without `kernelSize`.
    pub kernel_size: u32,
    /// Alpha handling for tint operations.
    pub tint_alpha: AlphaMode,
}

impl Default for OperationDefaults {
    fn default() -> Self {
        Self {
            kernel_size: MIN_KERNEL_SIZE,
            tint_alpha: AlphaMode::Preserve,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    /// Tiled executor settings.
    pub executor: ExecutorConfig,
    /// Operation construction defaults.
    pub defaults: OperationDefaults,
}

impl StrataConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> StrataResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load a TOML file.
    pub fn load(path: impl AsRef<Path>) -> StrataResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&source)?;
        log::debug!("Loaded configuration from {}: {:?}", path.as_ref().display(), config);
        Ok(config)
    }

    /// Replace the executor settings.
    pub fn with_executor(mut self, executor: ExecutorConfig) -> Self {
        self.executor = executor;
        self
    }

    /// Replace the operation defaults.
    pub fn with_defaults(mut self, defaults: OperationDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
