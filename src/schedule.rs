//! Display-rate pacing for the detection loop.

use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};

/// Yields the next display slot.
pub trait FrameScheduler {
    /// Block until the next slot.
    fn wait_for_slot(&mut self) -> Result<()>;
}

/// Sleeps to keep a steady refresh rate.
///
/// When a step overruns its slot the schedule resyncs to now instead of bursting to
/// catch up.
#[derive(Debug)]
pub struct PacedScheduler {
    interval: Duration,
    next: Option<Instant>,
}

impl PacedScheduler {
    pub fn new(refresh_hz: u32) -> Result<Self> {
        if refresh_hz == 0 {
            return Err(anyhow!("refresh rate must be greater than zero"));
        }
        Ok(Self {
            interval: Duration::from_secs_f64(1.0 / refresh_hz as f64),
            next: None,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameScheduler for PacedScheduler {
    fn wait_for_slot(&mut self) -> Result<()> {
        let now = Instant::now();
        let deadline = match self.next {
            Some(deadline) if deadline > now => {
                std::thread::sleep(deadline - now);
                deadline
            }
            _ => now,
        };
        self.next = Some(deadline + self.interval);
        Ok(())
    }
}

/// Never waits. Used for tests and offline runs.
#[derive(Debug, Default)]
pub struct ImmediateScheduler;

impl FrameScheduler for ImmediateScheduler {
    fn wait_for_slot(&mut self) -> Result<()> {
        Ok(())
    }
}
