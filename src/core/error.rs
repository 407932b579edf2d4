//! Error types for Strata.
//!
//! Uses thiserror for structured errors with context. Each concern gets its
//! own enum so callers can match on exactly what they can recover from:
//! - [`ChainError`]: index errors from layer chain mutation and access
//! - [`OperationError`]: failures while constructing an operation
//! - [`ExecutionError`]: failures of a tiled execution
//!
//! [`StrataError`] wraps all of them for callers that only propagate.

use crate::core::kernel::KernelKind;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a layer in a chain.
///
/// Indices shift when layers are inserted, removed or moved; the id does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct LayerId(pub Uuid);

impl LayerId {
    /// Create a new random layer ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Top-level error type for Strata.
#[derive(Error, Debug)]
pub enum StrataError {
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from layer chain mutation and access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Invalid index {index} for chain of {len} layer(s)")]
    InvalidIndex { index: usize, len: usize },
}

/// Errors raised while constructing an operation.
///
/// Construction failures abort layer creation; no operation ever degrades
/// into a silent no-op.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("Unsupported kernel {kind} of size {size} (size must be odd, from 3 to 255)")]
    UnsupportedKernel { kind: String, size: u32 },

    #[error("Unknown operation type '{0}'")]
    UnknownOperation(String),

    #[error("Operation '{operation}' requires parameter '{parameter}'")]
    MissingParameter { operation: String, parameter: String },

    #[error("Invalid parameter '{parameter}' for operation '{operation}': {reason}")]
    InvalidParameter {
        operation: String,
        parameter: String,
        reason: String,
    },
}

/// Errors during tiled execution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Timeout exceeded ({duration_ms} ms)")]
    Timeout { duration_ms: u64 },

    #[error("Worker for band {band} panicked")]
    WorkerPanicked { band: usize },

    #[error("A band worker disconnected before reporting its result")]
    WorkerLost,

    #[error("Worker for band {band} returned a buffer that does not cover its band")]
    BandMismatch { band: usize },

    #[error("Failed to spawn band worker: {0}")]
    Spawn(String),
}

// ============================================================================
// Error Utilities
// ============================================================================

impl OperationError {
    /// Build an `UnsupportedKernel` error for a known kind.
    pub fn unsupported_kernel(kind: KernelKind, size: u32) -> Self {
        OperationError::UnsupportedKernel {
            kind: kind.id().to_string(),
            size,
        }
    }

    /// Build a `MissingParameter` error.
    pub fn missing(operation: &str, parameter: &str) -> Self {
        OperationError::MissingParameter {
            operation: operation.to_string(),
            parameter: parameter.to_string(),
        }
    }

    /// Build an `InvalidParameter` error.
    pub fn invalid(operation: &str, parameter: &str, reason: impl Into<String>) -> Self {
        OperationError::InvalidParameter {
            operation: operation.to_string(),
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }
}

impl ExecutionError {
    /// Check if retrying the same call can reasonably succeed.
    ///
    /// Timeouts depend on load and are worth a retry; panics and lost
    /// workers are deterministic bugs in the worker.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ExecutionError::Timeout { .. })
    }
}

impl StrataError {
    /// Check if this error is a tiled-execution timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, StrataError::Execution(ExecutionError::Timeout { .. }))
    }
}

/// Result type alias for Strata operations.
pub type StrataResult<T> = Result<T, StrataError>;

/// Result type alias for chain mutation and access.
pub type ChainResult<T> = Result<T, ChainError>;

/// Result type alias for operation construction.
pub type OperationResult<T> = Result<T, OperationError>;

/// Result type alias for tiled execution.
pub type ExecutionResult<T> = Result<T, ExecutionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_id_display() {
        let id = LayerId::new();
        let display = format!("{}", id);
        assert_eq!(display.len(), 8);
    }

    #[test]
    fn test_invalid_index_message() {
        let error = ChainError::InvalidIndex { index: 4, len: 2 };
        assert_eq!(error.to_string(), "Invalid index 4 for chain of 2 layer(s)");
    }

    #[test]
    fn test_unsupported_kernel_names_kind() {
        let error = OperationError::unsupported_kernel(KernelKind::Sharpen, 4);
        assert!(error.to_string().contains("sharpen"));
        assert!(error.to_string().contains('4'));
    }

    #[test]
    fn test_recoverable() {
        assert!(ExecutionError::Timeout { duration_ms: 5000 }.is_recoverable());
        assert!(!ExecutionError::WorkerPanicked { band: 0 }.is_recoverable());
    }

    #[test]
    fn test_strata_error_conversion() {
        let error: StrataError = ExecutionError::Timeout { duration_ms: 1 }.into();
        assert!(error.is_timeout());

        let error: StrataError = ChainError::InvalidIndex { index: 0, len: 0 }.into();
        assert!(!error.is_timeout());
    }
}
