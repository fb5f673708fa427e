//! Frame timing utilities

use std::time::Instant;

/// Frame timer producing per-frame delta times
#[derive(Debug)]
pub struct Timer {
    last: Instant,
}

impl Timer {
    /// Create a new timer starting now
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Seconds elapsed since the previous call
    pub fn delta_time(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        delta
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-timestep accumulator for the fixed-update phase
#[derive(Debug)]
pub struct FixedStep {
    step: f32,
    accumulator: f32,
}

impl FixedStep {
    /// Create an accumulator with the given step length in seconds
    pub fn new(step: f32) -> Self {
        Self {
            step,
            accumulator: 0.0,
        }
    }

    /// Step length in seconds
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Accumulate frame time and return how many fixed steps to run
    pub fn advance(&mut self, delta: f32) -> u32 {
        self.accumulator += delta;
        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_accumulation() {
        let mut fixed = FixedStep::new(0.02);
        assert_eq!(fixed.advance(0.01), 0);
        assert_eq!(fixed.advance(0.01), 1);
        assert_eq!(fixed.advance(0.05), 2);
    }

    #[test]
    fn test_timer_advances() {
        let mut timer = Timer::new();
        assert!(timer.delta_time() >= 0.0);
    }
}
