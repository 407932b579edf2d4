//! Per-index output caching for layer chains.
//!
//! Entry `i` holds the image produced by running layers `0..=i` in order.
//! Any edit at index `k` changes every output from `k` on, so invalidation
//! always drops a suffix of the index space.

use crate::core::buffer::PixelBuffer;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Cached output with metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached image.
    pub buffer: Arc<PixelBuffer>,
    /// How long the layer took to compute it.
    pub computation_time: Duration,
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of lookups answered by the entry asked for.
    pub hits: u64,
    /// Number of lookups that found no entry at the index asked for.
    pub misses: u64,
    /// Number of entries dropped by invalidation.
    pub evictions: u64,
    /// Number of entries stored.
    pub insertions: u64,
    /// Total time saved by cache hits.
    pub time_saved: Duration,
}

impl CacheStats {
    /// Calculate hit ratio.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Sparse map from layer index to that layer's output.
#[derive(Debug, Default)]
pub struct OutputCache {
    entries: BTreeMap<usize, CacheEntry>,
    stats: CacheStats,
}

impl OutputCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the output cached at `index`.
    pub fn get(&mut self, index: usize) -> Option<Arc<PixelBuffer>> {
        match self.entries.get(&index) {
            Some(entry) => {
                self.stats.hits += 1;
                self.stats.time_saved += entry.computation_time;
                Some(Arc::clone(&entry.buffer))
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Get the output at `index` without touching statistics.
    pub fn peek(&self, index: usize) -> Option<&Arc<PixelBuffer>> {
        self.entries.get(&index).map(|e| &e.buffer)
    }

    /// Find the closest cached output at or before `index`.
    ///
    /// Counts as a hit only when `index` itself is cached.
    pub fn nearest(&mut self, index: usize) -> Option<(usize, Arc<PixelBuffer>)> {
        if let Some(buffer) = self.get(index) {
            return Some((index, buffer));
        }
        self.entries
            .range(..index)
            .next_back()
            .map(|(i, entry)| (*i, Arc::clone(&entry.buffer)))
    }

    /// Store the output of layer `index`.
    pub fn put(&mut self, index: usize, buffer: Arc<PixelBuffer>, computation_time: Duration) {
        self.stats.insertions += 1;
        self.entries.insert(
            index,
            CacheEntry {
                buffer,
                computation_time,
            },
        );
    }

    /// Check if `index` has a cached output.
    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    /// Drop every entry at `index` or later. Returns how many were dropped.
    pub fn invalidate_from(&mut self, index: usize) -> usize {
        let dropped = self.entries.split_off(&index).len();
        if dropped > 0 {
            self.stats.evictions += dropped as u64;
            log::debug!("Invalidated {} cached output(s) from index {}", dropped, index);
        }
        dropped
    }

    /// Clear the entire cache.
    pub fn clear(&mut self) -> usize {
        self.invalidate_from(0)
    }

    /// Cached indices in ascending order.
    pub fn indices(&self) -> Vec<usize> {
        self.entries.keys().copied().collect()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Get current memory usage of cached pixels in bytes.
    ///
    /// Disabled layers share their input's buffer; shared buffers are counted
    /// once per entry.
    pub fn memory_usage(&self) -> usize {
        self.entries.values().map(|e| e.buffer.memory_size()).sum()
    }

    /// Get number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
