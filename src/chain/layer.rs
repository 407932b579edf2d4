//! A single stage of a layer chain.

use crate::core::error::LayerId;
use crate::filters::operation::Operation;
use std::fmt;

/// An operation paired with an enabled flag.
///
/// A disabled layer passes its input through unchanged but keeps its index.
#[derive(Debug, Clone)]
pub struct Layer {
    id: LayerId,
    operation: Operation,
    enabled: bool,
}

impl Layer {
    /// Create an enabled layer with a fresh id.
    pub fn new(operation: Operation) -> Self {
        Self {
            id: LayerId::new(),
            operation,
            enabled: true,
        }
    }

    /// Set the initial enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Identifier that follows the layer across moves.
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// The wrapped operation.
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Whether the layer currently applies its operation.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl From<Operation> for Layer {
    fn from(operation: Operation) -> Self {
        Self::new(operation)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.enabled { 'x' } else { ' ' };
        write!(f, "[{}] {} ({})", mark, self.operation, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_layer_is_enabled() {
        let layer = Layer::new(Operation::Sepia);
        assert!(layer.is_enabled());
        assert_eq!(layer.operation(), &Operation::Sepia);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Layer::new(Operation::Negative);
        let b = Layer::new(Operation::Negative);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_display() {
        let layer = Layer::new(Operation::Greyscale).with_enabled(false);
        assert!(layer.to_string().starts_with("[ ] greyscale ("));
    }
}
