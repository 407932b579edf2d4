//! Built-in operation implementations.
//!
//! Pixel-level primitives grouped by family, each with its registry hook.

pub mod color;
pub mod convolution;
pub mod transform;

use crate::filters::registry::OperationRegistry;

/// Register all built-in operations.
pub fn register_all(registry: &mut OperationRegistry) {
    color::register(registry);
    convolution::register(registry);
    transform::register(registry);
}
