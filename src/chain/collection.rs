//! The layer chain: an ordered, re-editable list of layers over a base image.
//!
//! Every executed layer's output is memoized by index. An edit at index `k`
//! can only change outputs from `k` on, so each mutation invalidates the cache
//! suffix starting at the smallest index it touches, and re-rendering after
//! the edit only recomputes layers `k..`.

use crate::chain::layer::Layer;
use crate::core::buffer::PixelBuffer;
use crate::core::error::{ChainError, ChainResult, LayerId, StrataResult};
use crate::execution::cache::{CacheStats, OutputCache};
use crate::execution::executor::{SharedExecutor, TiledExecutor};
use crate::filters::builtin::transform;
use crate::filters::operation::{MirrorAxis, RotationAngle};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Ordered layers, their base image and the per-index output cache.
pub struct LayerChain {
    base: Arc<PixelBuffer>,
    layers: Vec<Layer>,
    cache: OutputCache,
    executor: SharedExecutor,
}

impl LayerChain {
    /// Create an empty chain over `base` with a default executor.
    pub fn new(base: impl Into<Arc<PixelBuffer>>) -> Self {
        Self {
            base: base.into(),
            layers: Vec::new(),
            cache: OutputCache::new(),
            executor: Arc::new(TiledExecutor::new()),
        }
    }

    /// Use a specific executor for tiled operations.
    pub fn with_executor(mut self, executor: SharedExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// The executor tiled operations run on.
    pub fn executor(&self) -> &SharedExecutor {
        &self.executor
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Add a layer at the end.
    pub fn append(&mut self, layer: impl Into<Layer>) {
        let layer = layer.into();
        log::debug!("Appending layer {} at index {}", layer, self.layers.len());
        self.layers.push(layer);
    }

    /// Insert a layer before `index`. Inserting at `len()` appends.
    pub fn insert_at(&mut self, layer: impl Into<Layer>, index: usize) -> ChainResult<()> {
        if index > self.layers.len() {
            return Err(self.invalid_index(index));
        }
        let layer = layer.into();
        log::debug!("Inserting layer {} at index {}", layer, index);
        self.cache.invalidate_from(index);
        self.layers.insert(index, layer);
        Ok(())
    }

    /// Remove and return the layer at `index`.
    pub fn remove_at(&mut self, index: usize) -> ChainResult<Layer> {
        self.check_index(index)?;
        self.cache.invalidate_from(index);
        let layer = self.layers.remove(index);
        log::debug!("Removed layer {} from index {}", layer, index);
        Ok(layer)
    }

    /// The layer at `index`.
    pub fn at(&self, index: usize) -> ChainResult<&Layer> {
        self.layers.get(index).ok_or_else(|| self.invalid_index(index))
    }

    /// Replace the layer at `index`, returning the previous one.
    pub fn replace_at(&mut self, index: usize, layer: impl Into<Layer>) -> ChainResult<Layer> {
        self.check_index(index)?;
        self.cache.invalidate_from(index);
        let previous = std::mem::replace(&mut self.layers[index], layer.into());
        log::debug!("Replaced layer {} at index {} with {}", previous, index, self.layers[index]);
        Ok(previous)
    }

    /// Move a layer by removing it and reinserting it.
    ///
    /// `new_index` addresses the chain after the removal, so both indices
    /// must be below `len()`. Outputs from `min(old_index, new_index)` on are
    /// invalidated; moving a layer onto its own index changes nothing.
    pub fn move_at(&mut self, old_index: usize, new_index: usize) -> ChainResult<()> {
        self.check_index(old_index)?;
        self.check_index(new_index)?;
        if old_index == new_index {
            return Ok(());
        }

        self.cache.invalidate_from(old_index.min(new_index));
        let layer = self.layers.remove(old_index);
        log::debug!("Moving layer {} from index {} to {}", layer, old_index, new_index);
        self.layers.insert(new_index, layer);
        Ok(())
    }

    /// Set the enabled flag of the layer at `index`.
    ///
    /// Invalidates outputs from `index` on even when the flag is unchanged.
    pub fn toggle(&mut self, index: usize, enabled: bool) -> ChainResult<()> {
        self.check_index(index)?;
        self.cache.invalidate_from(index);
        self.layers[index].set_enabled(enabled);
        log::debug!("Toggled layer {} at index {}", self.layers[index], index);
        Ok(())
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run layers `index..` and return the last layer's output.
    ///
    /// The input to layer `index` is the output cached at `index - 1`. When
    /// that entry is missing, execution resumes after the closest cached
    /// output before it, or from the base image. An empty chain returns the
    /// base image.
    ///
    /// If an operation fails, outputs from the failing layer on stay uncached.
    pub fn execute_from(&mut self, index: usize) -> StrataResult<Arc<PixelBuffer>> {
        if self.layers.is_empty() {
            return Ok(Arc::clone(&self.base));
        }
        self.check_index(index)?;
        self.cache.invalidate_from(index);

        let resumed = index.checked_sub(1).and_then(|previous| self.cache.nearest(previous));
        let (start, mut current) = match resumed {
            Some((cached, buffer)) => (cached + 1, buffer),
            None => (0, Arc::clone(&self.base)),
        };
        if start < index {
            log::debug!("No cached input for layer {}, resuming at layer {}", index, start);
        }

        for (i, layer) in self.layers.iter().enumerate().skip(start) {
            if !layer.is_enabled() {
                self.cache.put(i, Arc::clone(&current), Duration::ZERO);
                continue;
            }

            let started = Instant::now();
            let output = layer.operation().apply(&current, &self.executor).map_err(|error| {
                log::warn!("Layer {} at index {} failed: {}", layer, i, error);
                error
            })?;
            let elapsed = started.elapsed();
            log::trace!("Layer {} at index {} took {:?}", layer, i, elapsed);

            current = Arc::new(output);
            self.cache.put(i, Arc::clone(&current), elapsed);
        }

        Ok(current)
    }

    /// Return the final output, computing only layers without a cached output.
    pub fn execute(&mut self) -> StrataResult<Arc<PixelBuffer>> {
        let Some(last) = self.layers.len().checked_sub(1) else {
            return Ok(Arc::clone(&self.base));
        };
        match (0..=last).find(|i| !self.cache.contains(*i)) {
            Some(first_uncached) => self.execute_from(first_uncached),
            None => Ok(self.cache.get(last).unwrap_or_else(|| Arc::clone(&self.base))),
        }
    }

    // ========================================================================
    // Base image
    // ========================================================================

    /// Rotate the base image itself. Every cached output is discarded.
    pub fn rotate(&mut self, angle: RotationAngle) {
        let rotated = transform::rotate(&self.base, angle);
        log::debug!("Rotated base image by {} degrees", angle);
        self.set_base(rotated);
    }

    /// Mirror the base image itself. Every cached output is discarded.
    pub fn mirror(&mut self, axis: MirrorAxis) {
        let mirrored = transform::mirror(&self.base, axis);
        log::debug!("Mirrored base image across the {} axis", axis);
        self.set_base(mirrored);
    }

    /// Replace the base image. Every cached output is discarded.
    pub fn set_base(&mut self, base: impl Into<Arc<PixelBuffer>>) {
        self.base = base.into();
        self.cache.clear();
    }

    /// The base input image.
    pub fn base(&self) -> &Arc<PixelBuffer> {
        &self.base
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// All layers in order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Index of the layer with `id`.
    pub fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id() == id)
    }

    /// The output cached at `index`, if any.
    pub fn cached(&self, index: usize) -> Option<&Arc<PixelBuffer>> {
        self.cache.peek(index)
    }

    /// Indices with a cached output, ascending.
    pub fn cached_indices(&self) -> Vec<usize> {
        self.cache.indices()
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Check if the chain has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    fn check_index(&self, index: usize) -> ChainResult<()> {
        if index < self.layers.len() {
            Ok(())
        } else {
            Err(self.invalid_index(index))
        }
    }

    fn invalid_index(&self, index: usize) -> ChainError {
        ChainError::InvalidIndex {
            index,
            len: self.layers.len(),
        }
    }
}
