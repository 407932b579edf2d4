//! Layer chain module.
//!
//! An ordered, toggleable sequence of operations over a base image, with the
//! output of every layer memoized for cheap re-rendering after edits.

pub mod collection;
pub mod layer;

pub use collection::LayerChain;
pub use layer::Layer;
