//! Fixed-step simulation clock.
//!
//! Turns wall-clock frame time into a whole number of fixed simulation
//! steps, and paces a realtime run.

use std::time::{Duration, Instant};

/// Upper bound on steps taken for a single frame.
const MAX_STEPS_PER_FRAME: u32 = 10;

/// Fixed-step accumulator.
#[derive(Debug)]
pub struct FixedStep {
    /// Seconds per step
    fixed_dt: f32,
    /// Largest frame time accepted before clamping
    max_dt: f32,
    /// Unsimulated time carried between frames
    accumulator: f32,
    /// Start of the previous frame
    last_frame: Instant,
}

impl FixedStep {
    /// Create a clock stepping `tick_rate` times per second.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        Self {
            fixed_dt: 1.0 / tick_rate.max(1) as f32,
            max_dt: 0.25, // Max 250ms delta (prevents spiral of death)
            accumulator: 0.0,
            last_frame: Instant::now(),
        }
    }

    /// Wall-clock seconds since the previous call, clamped to the max delta.
    pub fn delta_time(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        dt.min(self.max_dt)
    }

    /// Accumulate frame time. Returns the number of fixed steps to run.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < MAX_STEPS_PER_FRAME {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind after the cap: drop the backlog
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        count
    }

    /// Sleep until roughly one step after the current frame began.
    pub fn sleep_remainder(&self) {
        let budget = Duration::from_secs_f32(self.fixed_dt);
        let elapsed = self.last_frame.elapsed();
        if elapsed < budget {
            std::thread::sleep(budget - elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_creation() {
        let clock = FixedStep::new(60);
        assert!((clock.fixed_dt - 1.0 / 60.0).abs() < 0.001);
        assert!((FixedStep::new(0).fixed_dt - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_accumulate_whole_steps() {
        let mut clock = FixedStep::new(50);
        assert_eq!(clock.accumulate(0.01), 0);
        assert_eq!(clock.accumulate(0.015), 1);
        assert_eq!(clock.accumulate(0.04), 2);
    }

    #[test]
    fn test_accumulate_spiral_prevention() {
        let mut clock = FixedStep::new(60);
        let steps = clock.accumulate(1.0);
        assert_eq!(steps, MAX_STEPS_PER_FRAME);
        // Backlog dropped
        assert_eq!(clock.accumulate(0.0), 0);
    }

    #[test]
    fn test_delta_time_clamped() {
        let mut clock = FixedStep::new(60);
        std::thread::sleep(Duration::from_millis(5));
        let dt = clock.delta_time();
        assert!(dt > 0.0);
        assert!(dt <= 0.25);
    }
}
