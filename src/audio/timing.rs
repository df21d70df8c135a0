// Audio timing utilities for sample-accurate trigger scheduling

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared engine clock counted in rendered samples
///
/// The host's audio callback advances it once per buffer. Engine time never
/// jumps backwards, even when the transport stops or loops.
#[derive(Debug, Clone)]
pub struct AudioTiming {
    /// Current sample position (incremented by audio callback)
    sample_position: Arc<AtomicU64>,
    /// Sample rate (for timestamp conversions)
    sample_rate: f64,
}

impl AudioTiming {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_position: Arc::new(AtomicU64::new(0)),
            sample_rate,
        }
    }

    /// Get current sample position
    pub fn current_sample(&self) -> u64 {
        self.sample_position.load(Ordering::Relaxed)
    }

    /// Advance sample position (called from audio callback)
    /// Returns the sample position at the start of the advanced block
    pub fn advance(&self, frames: usize) -> u64 {
        self.sample_position
            .fetch_add(frames as u64, Ordering::Relaxed)
    }

    /// Current engine time in seconds
    pub fn current_seconds(&self) -> f64 {
        self.samples_to_seconds(self.current_sample() as f64)
    }

    /// Convert a (possibly fractional) sample position to seconds
    pub fn samples_to_seconds(&self, samples: f64) -> f64 {
        samples / self.sample_rate
    }

    /// Get sample rate
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}
