//! # Strata - Re-editable Image Layer Chains
//!
//! Strata applies an ordered, editable list of image operations to a base
//! image. Every layer's output is memoized, so editing layer `k` re-renders only
//! layers `k` and later. Point-wise and convolution operations are split into
//! row bands and computed in parallel.
//!
//! ## Features
//!
//! - **Layer Chain**: Append, insert, remove, replace, move and toggle layers by index
//! - **Per-layer Caching**: Structural edits invalidate only the affected suffix
//! - **Tiled Execution**: Bands run concurrently against the full source with a time budget
//! - **Operation Catalog**: Color adjustments, kernel convolutions, mirror and rotate
//! - **Tagged Requests**: Build layers from `{type, level, tint, kernelSize, enabled}` records
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata::prelude::*;
//!
//! let image = image::open("input.png")?;
//! let mut chain = LayerChain::new(PixelBuffer::from_dynamic_image(&image));
//!
//! chain.append(Operation::Brightness { level: 1.2 });
//! chain.append(Operation::kernel(KernelKind::GaussianBlur, 5)?);
//! chain.append(Operation::Sepia);
//! let output = chain.execute()?;
//!
//! // Edit the blur; only layers 1 and 2 are recomputed.
//! chain.replace_at(1, Operation::kernel(KernelKind::BoxBlur, 3)?)?;
//! let output = chain.execute()?;
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Pixel buffers, regions, kernels, errors and configuration
//! - [`filters`]: The operation catalog and the request registry
//! - [`execution`]: The tiled executor and the per-index output cache
//! - [`chain`]: Layers and the layer chain

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod core;
pub mod execution;
pub mod filters;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::buffer::PixelBuffer;
    pub use crate::core::kernel::{Kernel, KernelKind};
    pub use crate::core::region::Region;
    pub use crate::core::types::Color;

    // Configuration
    pub use crate::core::config::{AlphaMode, ExecutorConfig, OperationDefaults, StrataConfig};

    // Errors
    pub use crate::core::error::{
        ChainError, ExecutionError, LayerId, OperationError, StrataError, StrataResult,
    };

    // Operations
    pub use crate::filters::operation::{MirrorAxis, Operation, RotationAngle, Tint};
    pub use crate::filters::registry::{Category, OperationMetadata, OperationRegistry, OperationRequest};

    // Execution
    pub use crate::execution::cache::{CacheStats, OutputCache};
    pub use crate::execution::executor::{Band, ExecutionStats, SharedExecutor, TiledExecutor};

    // Chain
    pub use crate::chain::{Layer, LayerChain};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use image::Rgba;
    use std::sync::Arc;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "strata");
    }

    #[test]
    fn test_chain_from_requests() {
        let registry = OperationRegistry::with_builtins();
        let requests: Vec<OperationRequest> = serde_json::from_str(
            r#"[
                {"type": "brightness", "level": 1.5},
                {"type": "box_blur", "kernelSize": 3, "enabled": false},
                {"type": "greyscale"}
            ]"#,
        )
        .unwrap();

        let mut chain = LayerChain::new(PixelBuffer::filled(4, 4, Rgba([100, 150, 200, 255])));
        for request in &requests {
            chain.append(registry.create_layer(request).unwrap());
        }

        let output = chain.execute().unwrap();
        assert_eq!(output.get(2, 2), Rgba([205, 205, 205, 255]));
        assert_eq!(chain.cached_indices(), vec![0, 1, 2]);
    }

    #[test]
    fn test_edit_recomputes_only_suffix() {
        let executor: SharedExecutor =
            Arc::new(TiledExecutor::with_config(ExecutorConfig::new().with_bands(2)));
        let mut chain = LayerChain::new(PixelBuffer::filled(6, 6, Rgba([40, 80, 120, 255])))
            .with_executor(Arc::clone(&executor));
        chain.append(Operation::Negative);
        chain.append(Operation::Sepia);
        chain.append(Operation::kernel(KernelKind::Sharpen, 3).unwrap());
        chain.execute().unwrap();
        assert_eq!(executor.stats().runs, 3);

        chain.toggle(2, false).unwrap();
        chain.execute().unwrap();
        // The disabled layer runs nothing; layers 0 and 1 came from the cache.
        assert_eq!(executor.stats().runs, 3);

        chain.replace_at(1, Operation::Greyscale).unwrap();
        chain.execute().unwrap();
        assert_eq!(executor.stats().runs, 4);
    }

    #[test]
    fn test_config_drives_executor_and_registry() {
        let config = StrataConfig::from_toml_str(
            "[executor]\nbands = 3\ntimeout_ms = 2000\n\n[defaults]\nkernel_size = 5\n",
        )
        .unwrap();
        let registry = OperationRegistry::with_builtins().with_defaults(config.defaults);
        let executor = TiledExecutor::with_config(config.executor);

        let operation = registry.create(&OperationRequest::new("outline")).unwrap();
        assert_eq!(operation.to_string(), "outline(5)");
        assert_eq!(executor.config().effective_bands(), 3);
    }
}
