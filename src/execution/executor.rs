//! Concurrent tiled execution.
//!
//! [`TiledExecutor::run`] splits an image into full-width row bands, computes
//! every band on its own worker thread and stitches the results back together.
//! Workers share the immutable source through an `Arc` and each writes only
//! into the buffer it allocates for its band, so no locking is involved.
//!
//! A call either returns the complete image or an error. When a band misses the
//! deadline the call fails with [`ExecutionError::Timeout`] and raises the
//! cancel flag every [`Band`] carries; well-behaved workers poll it per row and
//! stop early.

use crate::core::buffer::{PixelBuffer, BYTES_PER_PIXEL};
use crate::core::config::ExecutorConfig;
use crate::core::error::{ExecutionError, ExecutionResult};
use crate::core::region::Region;
use crossbeam::channel::{self, RecvTimeoutError};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// One unit of work handed to a band worker.
#[derive(Debug, Clone)]
pub struct Band {
    index: usize,
    region: Region,
    cancelled: Arc<AtomicBool>,
}

impl Band {
    /// A band that is never cancelled, for computing outside the executor.
    pub fn standalone(region: Region) -> Self {
        Self {
            index: 0,
            region,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Position of the band, top to bottom.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The rows this band covers, in absolute coordinates.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Whether the call this band belongs to has already failed.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Execution statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Number of successful calls.
    pub runs: u64,
    /// Number of bands computed by successful calls.
    pub bands: u64,
    /// Number of calls that timed out.
    pub timeouts: u64,
    /// Wall time spent in successful calls.
    pub total_duration: Duration,
}

/// Runs per-band workers in parallel with a deadline.
pub struct TiledExecutor {
    config: ExecutorConfig,
    stats: Mutex<ExecutionStats>,
}

/// An executor shared between chains.
pub type SharedExecutor = Arc<TiledExecutor>;

impl TiledExecutor {
    /// Create an executor with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ExecutorConfig::default())
    }

    /// Create an executor with a custom configuration.
    pub fn with_config(config: ExecutorConfig) -> Self {
        Self {
            config,
            stats: Mutex::new(ExecutionStats::default()),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Get execution statistics.
    pub fn stats(&self) -> ExecutionStats {
        self.stats.lock().clone()
    }

    /// Compute `worker` over every band of `source` and stitch the results.
    ///
    /// The worker must return a buffer covering exactly the band's region. It
    /// may read any coordinate of the source, including rows of other bands.
    ///
    /// A failing band raises the cancel flag, but the call still waits for
    /// every other band before returning the first error. Only the deadline
    /// returns early.
    pub fn run<F>(&self, source: Arc<PixelBuffer>, worker: F) -> ExecutionResult<PixelBuffer>
    where
        F: Fn(&PixelBuffer, &Band) -> PixelBuffer + Send + Sync + 'static,
    {
        let start = Instant::now();
        let region = source.region();
        if region.is_empty() {
            return Ok(PixelBuffer::with_region(region));
        }

        let bands = region.bands(self.config.effective_bands());
        let band_height = bands.band_height();
        let count = bands.band_count();
        let regions: Vec<Region> = bands.collect();

        log::trace!(
            "Dispatching {} band(s) of {} row(s) over {}x{}",
            count,
            band_height,
            region.width,
            region.height
        );

        let cancelled = Arc::new(AtomicBool::new(false));
        let worker = Arc::new(worker);
        let (sender, receiver) = channel::bounded(count);
        let mut handles = Vec::with_capacity(count);
        let mut failure: Option<ExecutionError> = None;

        for (index, band_region) in regions.iter().copied().enumerate() {
            let band = Band {
                index,
                region: band_region,
                cancelled: Arc::clone(&cancelled),
            };
            let source = Arc::clone(&source);
            let worker = Arc::clone(&worker);
            let sender = sender.clone();

            let spawned = thread::Builder::new()
                .name(format!("strata-band-{}", index))
                .spawn(move || {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| worker(source.as_ref(), &band)));
                    // The receiver is gone once the call has failed.
                    let _ = sender.send((index, result.ok()));
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(error) => {
                    cancelled.store(true, Ordering::Relaxed);
                    failure = Some(ExecutionError::Spawn(error.to_string()));
                    break;
                }
            }
        }
        drop(sender);

        let deadline = start.checked_add(self.config.timeout);
        let mut results: Vec<Option<PixelBuffer>> = (0..count).map(|_| None).collect();

        // Until the deadline, wait for every spawned band, even after a failure.
        for _ in 0..handles.len() {
            let received = match deadline {
                Some(deadline) => receiver.recv_deadline(deadline),
                None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            let error = match received {
                Ok((index, Some(buffer))) if buffer.region() == regions[index] => {
                    results[index] = Some(buffer);
                    continue;
                }
                Ok((index, Some(_))) => ExecutionError::BandMismatch { band: index },
                Ok((index, None)) => ExecutionError::WorkerPanicked { band: index },
                Err(RecvTimeoutError::Timeout) => {
                    cancelled.store(true, Ordering::Relaxed);
                    let error = failure.unwrap_or_else(|| {
                        self.stats.lock().timeouts += 1;
                        ExecutionError::Timeout {
                            duration_ms: self.config.timeout.as_millis() as u64,
                        }
                    });
                    log::warn!("Tiled execution failed: {}", error);
                    return Err(error);
                }
                Err(RecvTimeoutError::Disconnected) => ExecutionError::WorkerLost,
            };

            if failure.is_none() {
                cancelled.store(true, Ordering::Relaxed);
                failure = Some(error);
            }
        }

        // Every spawned worker has reported, so joining does not block.
        for handle in handles {
            let _ = handle.join();
        }

        if let Some(error) = failure {
            log::warn!("Tiled execution failed: {}", error);
            return Err(error);
        }

        let buffers: Vec<PixelBuffer> = results
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or(ExecutionError::WorkerLost)?;
        let output = stitch(region, band_height, &buffers);

        let elapsed = start.elapsed();
        {
            let mut stats = self.stats.lock();
            stats.runs += 1;
            stats.bands += count as u64;
            stats.total_duration += elapsed;
        }
        log::trace!("Stitched {} band(s) in {:?}", count, elapsed);

        Ok(output)
    }
}

impl Default for TiledExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy band buffers into one image covering `region`.
///
/// Bands are full-width and `band_height` rows tall (the last may be shorter),
/// so each occupies one contiguous run of the output's raw bytes.
fn stitch(region: Region, band_height: u32, bands: &[PixelBuffer]) -> PixelBuffer {
    let mut output = PixelBuffer::with_region(region);
    let chunk = band_height as usize * region.width as usize * BYTES_PER_PIXEL;

    output
        .as_raw_mut()
        .par_chunks_mut(chunk)
        .zip(bands.par_iter())
        .for_each(|(dst, band)| dst.copy_from_slice(band.as_raw()));

    output
}
