// src/pipeline/timing.rs
//! Wall-clock timing of producer passes.

use log::{info, log, Level};
use std::time::{Duration, Instant};

/// Times one labelled block and logs elapsed time and the implied frame rate.
pub struct FrameTimer {
    label: &'static str,
    level: Level,
    start: Instant,
}

impl FrameTimer {
    pub fn start(label: &'static str, level: Level) -> Self {
        Self {
            label,
            level,
            start: Instant::now(),
        }
    }

    /// Logs and returns the elapsed time. Nothing is logged for a zero-length block.
    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        if let Some(fps) = frames_per_second(1, elapsed) {
            log!(
                self.level,
                "Elapsed {}: {:?} Frames: {:.1}",
                self.label,
                elapsed,
                fps
            );
        }
        elapsed
    }
}

/// Frames per second for `frames` produced over `elapsed`; `None` for zero time.
pub fn frames_per_second(frames: u64, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    (secs > 0.0).then(|| frames as f64 / secs)
}

/// Running totals for a producer run.
pub struct RunStats {
    started: Instant,
    frames: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            frames: 0,
        }
    }

    pub fn record_frame(&mut self) {
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Logs the run summary.
    pub fn report(&self, kernel: &str) {
        let elapsed = self.started.elapsed();
        match frames_per_second(self.frames, elapsed) {
            Some(fps) => info!(
                "FrameProducer[{}]: {} frames in {:?} ({:.1} fps average)",
                kernel, self.frames, elapsed, fps
            ),
            None => info!("FrameProducer[{}]: {} frames", kernel, self.frames),
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
