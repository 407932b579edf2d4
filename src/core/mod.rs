//! Core types for the Strata layer pipeline.
//!
//! This module contains the foundational pieces every other module builds on:
//! - Pixel buffers with zero-color out-of-bounds reads
//! - Regions and row-band splitting
//! - Convolution kernel generation
//! - Error types and configuration

pub mod buffer;
pub mod config;
pub mod error;
pub mod kernel;
pub mod region;
pub mod types;

// Re-export commonly used types
pub use buffer::PixelBuffer;
pub use config::{AlphaMode, ExecutorConfig, OperationDefaults, StrataConfig};
pub use error::{ChainError, ExecutionError, LayerId, OperationError, StrataError};
pub use kernel::{Kernel, KernelKind};
pub use region::Region;
pub use types::Color;
