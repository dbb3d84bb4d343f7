//! Adaptive iterations-per-frame control.
//!
//! The engine's cost per frame shrinks as points escape, so a fixed batch
//! size either starves the display early on or wastes frames later. The
//! controller nudges `it_per_frame` to keep the measured batch time
//! between the 45 fps and 30 fps budgets.

use std::time::{Duration, Instant};

use crate::core::data::plane::CoordinatePlane;

pub const USEC_PER_SEC: u64 = 1_000_000;

const LOW_THRESHOLD_USEC: u64 = USEC_PER_SEC / 45;
const HIGH_THRESHOLD_USEC: u64 = USEC_PER_SEC / 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRateController {
    it_per_frame: u32,
}

impl FrameRateController {
    #[must_use]
    pub fn new() -> Self {
        Self { it_per_frame: 1 }
    }

    #[must_use]
    pub fn it_per_frame(&self) -> u32 {
        self.it_per_frame
    }

    /// Adjusts the batch size from the time the last batch took.
    ///
    /// Below the low budget it creeps up by one. Above the high budget it
    /// steps down by one while small, but cuts proportionally once large
    /// so a deep zoom cannot pin the display for seconds.
    pub fn observe(&mut self, elapsed: Duration) {
        let usec = elapsed.as_micros().min(u128::from(u64::MAX)) as u64;
        if usec < LOW_THRESHOLD_USEC {
            self.it_per_frame += 1;
        } else if usec > HIGH_THRESHOLD_USEC && self.it_per_frame > 1 {
            if self.it_per_frame < 10 {
                self.it_per_frame -= 1;
            } else {
                let scaled = u64::from(self.it_per_frame) * HIGH_THRESHOLD_USEC / usec;
                self.it_per_frame = (scaled as u32).max(1);
            }
        }
    }
}

impl Default for FrameRateController {
    fn default() -> Self {
        Self::new()
    }
}

/// Once-per-second throughput reporting.
#[derive(Debug)]
pub struct ThroughputStats {
    window_start: Instant,
    frames: u64,
    iterations: u64,
}

impl ThroughputStats {
    #[must_use]
    pub fn new() -> Self {
        Self {
            window_start: Instant::now(),
            frames: 0,
            iterations: 0,
        }
    }

    pub fn record_frame(&mut self, iterations: u64) {
        self.frames += 1;
        self.iterations += iterations;
    }

    /// Returns a report line once a wall-clock second has passed, then
    /// starts a new window.
    pub fn maybe_report(
        &mut self,
        plane: &CoordinatePlane,
        it_per_frame: u32,
    ) -> Option<String> {
        let elapsed = self.window_start.elapsed();
        if elapsed < Duration::from_secs(1) {
            return None;
        }
        let seconds = elapsed.as_secs_f64();
        let line = format_stats(
            self.iterations as f64 / seconds,
            self.frames as f64 / seconds,
            it_per_frame,
            plane,
        );
        self.window_start = Instant::now();
        self.frames = 0;
        self.iterations = 0;
        Some(line)
    }
}

impl Default for ThroughputStats {
    fn default() -> Self {
        Self::new()
    }
}

fn format_stats(
    iterations_per_sec: f64,
    frames_per_sec: f64,
    it_per_frame: u32,
    plane: &CoordinatePlane,
) -> String {
    format!(
        "it/s: {:.0} fps: {:.1} it/frame: {} threads: {} escaped: {} not: {}",
        iterations_per_sec,
        frames_per_sec,
        it_per_frame,
        plane.num_threads(),
        plane.escaped_count(),
        plane.not_escaped_count()
    )
}
