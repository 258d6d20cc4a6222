//! Fixed timestep accumulator.
//!
//! Frames arrive at the render rate; physics-like work (shell arcs, aim) runs
//! at a fixed rate. The accumulator converts one into the other.

/// Maximum fixed updates per frame (prevents spiral of death).
const MAX_UPDATES_PER_FRAME: u32 = 10;

/// Fixed-rate step counter.
#[derive(Debug, Clone)]
pub struct FixedStep {
    /// Fixed timestep delta
    fixed_dt: f32,
    /// Time not yet consumed by fixed steps
    accumulator: f32,
    /// Fixed steps run so far
    total_steps: u64,
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(50)
    }
}

impl FixedStep {
    /// Creates an accumulator running `rate` steps per second.
    #[must_use]
    pub fn new(rate: u32) -> Self {
        Self {
            fixed_dt: 1.0 / rate.max(1) as f32,
            accumulator: 0.0,
            total_steps: 0,
        }
    }

    /// Fixed timestep value.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Fixed steps run so far.
    #[must_use]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Accumulate frame time.
    /// Returns the number of fixed updates that should be performed.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < MAX_UPDATES_PER_FRAME {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // If we're still behind, drop the backlog
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        self.total_steps += u64::from(count);
        count
    }

    /// Fraction of a fixed step left in the accumulator.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.fixed_dt
    }

    /// Clears the accumulator (after a pause or level load).
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_whole_steps() {
        let mut step = FixedStep::new(50);
        assert_eq!(step.accumulate(0.01), 0);
        assert_eq!(step.accumulate(0.011), 1);
        assert!(step.alpha() < 0.1);
        assert_eq!(step.total_steps(), 1);
    }

    #[test]
    fn test_caps_updates_and_drops_backlog() {
        let mut step = FixedStep::new(100);
        assert_eq!(step.accumulate(1.0), MAX_UPDATES_PER_FRAME);
        assert_eq!(step.alpha(), 0.0);
    }

    #[test]
    fn test_frame_rate_above_fixed_rate() {
        let mut step = FixedStep::new(50);
        let steps: u32 = (0..60).map(|_| step.accumulate(1.0 / 60.0)).sum();
        assert!((49..=50).contains(&steps));

        step.reset();
        assert_eq!(step.alpha(), 0.0);
    }
}
