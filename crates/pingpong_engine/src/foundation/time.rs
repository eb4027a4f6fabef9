//! Time management utilities

use std::time::{Duration, Instant};

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.delta_time = elapsed.as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Sleeps at the end of a frame so the loop does not exceed a target rate
///
/// This is the only suspension point of the frame loop.
pub struct FrameLimiter {
    frame_budget: Option<Duration>,
    frame_start: Instant,
}

impl FrameLimiter {
    /// Create a limiter; `None` (or zero) disables limiting
    pub fn new(target_fps: Option<u32>) -> Self {
        let frame_budget = target_fps
            .filter(|fps| *fps > 0)
            .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)));
        Self {
            frame_budget,
            frame_start: Instant::now(),
        }
    }

    /// Duration allotted to each frame, if limiting is enabled
    pub fn frame_budget(&self) -> Option<Duration> {
        self.frame_budget
    }

    /// Mark the beginning of a frame
    pub fn begin_frame(&mut self) {
        self.frame_start = Instant::now();
    }

    /// Sleep for whatever is left of the frame budget
    pub fn wait(&mut self) {
        if let Some(budget) = self.frame_budget {
            let spent = self.frame_start.elapsed();
            if spent < budget {
                std::thread::sleep(budget - spent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_counts_frames() {
        let mut timer = Timer::new();
        timer.update();
        timer.update();
        assert_eq!(timer.frame_count(), 2);
        assert!(timer.total_time() >= timer.delta_time());
    }

    #[test]
    fn test_limiter_budget() {
        assert_eq!(FrameLimiter::new(None).frame_budget(), None);
        assert_eq!(FrameLimiter::new(Some(0)).frame_budget(), None);
        let limiter = FrameLimiter::new(Some(50));
        assert_eq!(limiter.frame_budget(), Some(Duration::from_millis(20)));
    }
}
