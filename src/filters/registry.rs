//! Operation registry for resolving construction requests.
//!
//! Callers describe a layer as a tagged record, [`OperationRequest`], whose
//! `type` names a registered operation. The registry maps each type id to
//! metadata and a factory that validates the request's parameters.

use crate::chain::layer::Layer;
use crate::core::config::OperationDefaults;
use crate::core::error::{OperationError, OperationResult};
use crate::core::types::Color;
use crate::filters::operation::Operation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A tagged operation construction record.
///
/// ```json
/// { "type": "box_blur", "kernelSize": 5, "enabled": true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    /// Registered operation id.
    #[serde(rename = "type")]
    pub kind: String,
    /// Level, factor or intensity, depending on the type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<f64>,
    /// Tint color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tint: Option<Color>,
    /// Kernel size for convolution types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel_size: Option<u32>,
    /// Whether the created layer starts enabled.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl OperationRequest {
    /// Create a request with no parameters.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            level: None,
            tint: None,
            kernel_size: None,
            enabled: true,
        }
    }

    /// Set the level parameter.
    pub fn with_level(mut self, level: f64) -> Self {
        self.level = Some(level);
        self
    }

    /// Set the tint color.
    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = Some(tint);
        self
    }

    /// Set the kernel size.
    pub fn with_kernel_size(mut self, size: u32) -> Self {
        self.kernel_size = Some(size);
        self
    }

    /// Set the initial enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The level parameter, which must be present and finite.
    pub fn require_level(&self) -> OperationResult<f64> {
        let level = self.level.ok_or_else(|| OperationError::missing(&self.kind, "level"))?;
        if !level.is_finite() {
            return Err(OperationError::invalid(&self.kind, "level", "must be a finite number"));
        }
        Ok(level)
    }
}

/// Operation families, used for grouping in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Point-wise color adjustments.
    Color,
    /// Kernel convolutions.
    Convolution,
    /// Whole-image remapping.
    Geometric,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Color => f.write_str("Color"),
            Category::Convolution => f.write_str("Convolution"),
            Category::Geometric => f.write_str("Geometric"),
        }
    }
}

/// Describes a registered operation type.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationMetadata {
    /// Request type id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Operation family.
    pub category: Category,
    /// Request fields the type reads.
    pub parameters: Vec<&'static str>,
}

impl OperationMetadata {
    /// Create metadata with no parameters.
    pub fn new(id: &str, name: &str, category: Category, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category,
            parameters: Vec::new(),
        }
    }

    /// Declare a request field the type reads.
    pub fn parameter(mut self, name: &'static str) -> Self {
        self.parameters.push(name);
        self
    }
}

/// Factory building an operation from a request.
pub type OperationFactory =
    Arc<dyn Fn(&OperationRequest, &OperationDefaults) -> OperationResult<Operation> + Send + Sync>;

/// Registry entry containing metadata and factory.
#[derive(Clone)]
pub struct RegistryEntry {
    /// Cached metadata.
    pub metadata: OperationMetadata,
    /// Factory function to create operations.
    pub factory: OperationFactory,
}

/// Registry of operation types, in registration order.
pub struct OperationRegistry {
    entries: IndexMap<String, RegistryEntry>,
    defaults: OperationDefaults,
}

impl OperationRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            defaults: OperationDefaults::default(),
        }
    }

    /// Create a registry pre-populated with every built-in operation.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::filters::builtin::register_all(&mut registry);
        registry
    }

    /// Replace the defaults used for omitted parameters.
    pub fn with_defaults(mut self, defaults: OperationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// The active defaults.
    pub fn defaults(&self) -> &OperationDefaults {
        &self.defaults
    }

    /// Register an operation type. A later registration with the same id
    /// replaces the earlier one.
    pub fn register<F>(&mut self, metadata: OperationMetadata, factory: F)
    where
        F: Fn(&OperationRequest, &OperationDefaults) -> OperationResult<Operation> + Send + Sync + 'static,
    {
        let id = metadata.id.clone();
        let entry = RegistryEntry {
            metadata,
            factory: Arc::new(factory),
        };
        if self.entries.insert(id.clone(), entry).is_some() {
            log::debug!("Replaced operation type '{}'", id);
        }
    }

    /// Build the operation a request describes.
    pub fn create(&self, request: &OperationRequest) -> OperationResult<Operation> {
        let entry = self
            .entries
            .get(&request.kind)
            .ok_or_else(|| OperationError::UnknownOperation(request.kind.clone()))?;
        let operation = (entry.factory)(request, &self.defaults)?;
        log::debug!("Created operation {}", operation);
        Ok(operation)
    }

    /// Build a layer, honoring the request's `enabled` flag.
    pub fn create_layer(&self, request: &OperationRequest) -> OperationResult<Layer> {
        Ok(Layer::new(self.create(request)?).with_enabled(request.enabled))
    }

    /// Get metadata for an operation type.
    pub fn get_metadata(&self, id: &str) -> Option<&OperationMetadata> {
        self.entries.get(id).map(|e| &e.metadata)
    }

    /// Check if an operation type is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// All registered ids, in registration order.
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    /// Metadata of every registered type in one category.
    pub fn by_category(&self, category: Category) -> Vec<&OperationMetadata> {
        self.entries
            .values()
            .map(|e| &e.metadata)
            .filter(|m| m.category == category)
            .collect()
    }

    /// Get the total number of registered operation types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AlphaMode;

    #[test]
    fn test_builtins_registered_in_order() {
        let registry = OperationRegistry::with_builtins();
        let ids: Vec<&str> = registry.operation_ids().collect();
        assert_eq!(ids.len(), 20);
        assert_eq!(ids[0], "brightness");
        assert_eq!(ids[7], "box_blur");
        assert_eq!(ids[19], "rotate_270");
        assert_eq!(registry.by_category(Category::Convolution).len(), 8);
        assert_eq!(registry.by_category(Category::Geometric).len(), 5);
    }

    #[test]
    fn test_ids_round_trip_through_operations() {
        let registry = OperationRegistry::with_builtins();
        for id in registry.operation_ids() {
            let request = OperationRequest::new(id)
                .with_level(1.0)
                .with_tint(Color::rgb(1, 2, 3));
            assert_eq!(registry.create(&request).unwrap().id(), id);
        }
    }

    #[test]
    fn test_request_json() {
        let request: OperationRequest =
            serde_json::from_str(r#"{"type":"gaussian_blur","kernelSize":5}"#).unwrap();
        assert_eq!(request.kind, "gaussian_blur");
        assert_eq!(request.kernel_size, Some(5));
        assert!(request.enabled);

        let request: OperationRequest = serde_json::from_str(
            r#"{"type":"tint","level":0.5,"tint":{"r":255,"g":0,"b":0,"a":255},"enabled":false}"#,
        )
        .unwrap();
        assert_eq!(request.tint, Some(Color::rgb(255, 0, 0)));
        assert!(!request.enabled);
    }

    #[test]
    fn test_unknown_type() {
        let registry = OperationRegistry::with_builtins();
        let err = registry.create(&OperationRequest::new("posterize")).unwrap_err();
        assert_eq!(err, OperationError::UnknownOperation("posterize".to_string()));
    }

    #[test]
    fn test_missing_parameters() {
        let registry = OperationRegistry::with_builtins();

        let err = registry.create(&OperationRequest::new("brightness")).unwrap_err();
        assert!(matches!(err, OperationError::MissingParameter { ref parameter, .. } if parameter == "level"));

        let err = registry.create(&OperationRequest::new("tint").with_level(1.0)).unwrap_err();
        assert!(matches!(err, OperationError::MissingParameter { ref parameter, .. } if parameter == "tint"));
    }

    #[test]
    fn test_non_finite_level() {
        let registry = OperationRegistry::with_builtins();
        let err = registry
            .create(&OperationRequest::new("contrast").with_level(f64::NAN))
            .unwrap_err();
        assert!(matches!(err, OperationError::InvalidParameter { .. }));
    }

    #[test]
    fn test_kernel_size_defaults() {
        let registry = OperationRegistry::with_builtins();
        let Operation::Kernel(kernel) = registry.create(&OperationRequest::new("sharpen")).unwrap() else {
            panic!("expected a kernel operation");
        };
        assert_eq!(kernel.size(), 3);

        let registry = OperationRegistry::with_builtins().with_defaults(OperationDefaults {
            kernel_size: 7,
            ..OperationDefaults::default()
        });
        let Operation::Kernel(kernel) = registry.create(&OperationRequest::new("emboss")).unwrap() else {
            panic!("expected a kernel operation");
        };
        assert_eq!(kernel.size(), 7);
    }

    #[test]
    fn test_invalid_kernel_size_aborts_creation() {
        let registry = OperationRegistry::with_builtins();
        let err = registry
            .create_layer(&OperationRequest::new("box_blur").with_kernel_size(2))
            .unwrap_err();
        assert!(matches!(err, OperationError::UnsupportedKernel { size: 2, .. }));

        let request: OperationRequest =
            serde_json::from_str(r#"{"type":"gaussian_blur","kernelSize":70001}"#).unwrap();
        let err = registry.create(&request).unwrap_err();
        assert!(matches!(err, OperationError::UnsupportedKernel { size: 70001, .. }));
    }

    #[test]
    fn test_tint_alpha_default() {
        let defaults = OperationDefaults {
            tint_alpha: AlphaMode::Additive,
            ..OperationDefaults::default()
        };
        let registry = OperationRegistry::with_builtins().with_defaults(defaults);
        let request = OperationRequest::new("tint").with_level(1.0).with_tint(Color::rgb(0, 0, 0));
        let Operation::Tint(tint) = registry.create(&request).unwrap() else {
            panic!("expected a tint operation");
        };
        assert_eq!(tint.alpha, AlphaMode::Additive);
    }

    #[test]
    fn test_create_layer_honors_enabled() {
        let registry = OperationRegistry::with_builtins();
        let layer = registry
            .create_layer(&OperationRequest::new("negative").with_enabled(false))
            .unwrap();
        assert!(!layer.is_enabled());
        assert_eq!(layer.operation(), &Operation::Negative);
    }

    #[test]
    fn test_metadata() {
        let registry = OperationRegistry::with_builtins();
        let metadata = registry.get_metadata("tint").unwrap();
        assert_eq!(metadata.parameters, vec!["tint", "level"]);
        assert_eq!(metadata.category, Category::Color);
        assert!(registry.get_metadata("nope").is_none());
        assert!(registry.contains("rotate_90"));
    }
}
