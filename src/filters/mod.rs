//! Filter module.
//!
//! Contains the operation catalog, its built-in implementations and the
//! registry that resolves construction requests.

pub mod builtin;
pub mod operation;
pub mod registry;

pub use operation::{MirrorAxis, Operation, RotationAngle, Tint};
pub use registry::{Category, OperationMetadata, OperationRegistry, OperationRequest};
