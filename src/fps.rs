//! Sampled frames-per-second estimator.

use std::time::Instant;

/// Frames accumulated between estimate recomputations.
pub const SAMPLE_WINDOW: u32 = 10;

/// Rolling FPS estimate. The rate is only recomputed once per sample window
/// to keep the readout from jittering frame to frame; in between, `tick`
/// returns the last computed value (initially 0).
#[derive(Debug)]
pub struct FpsCounter {
    window: u32,
    frames: u32,
    last_sample: Instant,
    estimate: f64,
}

impl FpsCounter {
    pub fn new(window: u32) -> Self {
        assert!(window > 0, "sample window must be at least one frame");
        Self {
            window,
            frames: 0,
            last_sample: Instant::now(),
            estimate: 0.0,
        }
    }

    /// Count one displayed frame and return the current estimate.
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// `tick` with an explicit timestamp.
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        self.frames += 1;
        if self.frames >= self.window {
            let elapsed = now.duration_since(self.last_sample).as_secs_f64();
            if elapsed > 0.0 {
                self.estimate = f64::from(self.frames) / elapsed;
            }
            self.frames = 0;
            self.last_sample = now;
        }
        self.estimate
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(SAMPLE_WINDOW)
    }
}
