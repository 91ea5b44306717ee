//! Once-per-second frame rate sampling.

use std::time::{Duration, Instant};

const SAMPLE_INTERVAL: Duration = Duration::from_millis(1000);

/// Counts processed frames and publishes a rate once per second.
///
/// Between samples the published value does not change.
#[derive(Clone, Debug)]
pub struct FpsMeter {
    frames: u32,
    last_reset: Instant,
    value: u32,
}

impl FpsMeter {
    pub fn new(now: Instant) -> Self {
        Self {
            frames: 0,
            last_reset: now,
            value: 0,
        }
    }

    /// Record one processed frame.
    ///
    /// Returns the new rate when at least one second has elapsed since the last reset.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.last_reset);
        if elapsed < SAMPLE_INTERVAL {
            return None;
        }

        let elapsed_ms = elapsed.as_millis() as f64;
        self.value = (self.frames as f64 * 1000.0 / elapsed_ms).round() as u32;
        log::debug!("{} frames in {} ms: {} FPS", self.frames, elapsed_ms, self.value);
        self.frames = 0;
        self.last_reset = now;
        Some(self.value)
    }

    /// Last published rate.
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Drop the pending count and start a new sampling window.
    pub fn reset(&mut self, now: Instant) {
        self.frames = 0;
        self.last_reset = now;
        self.value = 0;
    }
}
