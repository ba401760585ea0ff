//! # Pitch Smoothing
//!
//! First-order exponential smoothing of the frequency estimate across frames.
//! The blend weight depends on the frame duration, so the settling time is the
//! same whatever frame size the host captures with.

/// Smoother state. Starts `Unset`; only an explicit reset returns it there.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SmoothedPitch {
    #[default]
    Unset,
    Tracking(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PitchSmoother {
    /// Time constant in seconds.
    time_constant: f32,
    state: SmoothedPitch,
}

impl Default for PitchSmoother {
    fn default() -> Self {
        Self::new(0.25)
    }
}

impl PitchSmoother {
    pub fn new(time_constant: f32) -> Self {
        Self {
            time_constant,
            state: SmoothedPitch::Unset,
        }
    }

    pub fn state(&self) -> SmoothedPitch {
        self.state
    }

    pub fn current(&self) -> Option<f32> {
        match self.state {
            SmoothedPitch::Unset => None,
            SmoothedPitch::Tracking(value) => Some(value),
        }
    }

    /// Folds a valid estimate into the running value and returns the result.
    ///
    /// # Arguments
    /// * `frequency` - Raw estimate in Hz
    /// * `dt` - Duration of the frame that produced it, in seconds
    pub fn smooth(&mut self, frequency: f32, dt: f32) -> f32 {
        let value = match self.state {
            SmoothedPitch::Unset => frequency,
            SmoothedPitch::Tracking(prev) => {
                let alpha = dt / (self.time_constant + dt);
                prev * (1.0 - alpha) + frequency * alpha
            }
        };
        self.state = SmoothedPitch::Tracking(value);
        value
    }

    pub fn reset(&mut self) {
        self.state = SmoothedPitch::Unset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_passes_through() {
        let mut smoother = PitchSmoother::default();
        assert_eq!(smoother.state(), SmoothedPitch::Unset);
        assert_eq!(smoother.smooth(432.0, 0.085), 432.0);
        assert_eq!(smoother.current(), Some(432.0));
    }

    #[test]
    fn blends_with_frame_duration_weight() {
        let mut smoother = PitchSmoother::new(0.25);
        smoother.smooth(400.0, 0.25);
        // alpha = 0.25 / 0.5 = 0.5
        assert!((smoother.smooth(500.0, 0.25) - 450.0).abs() < 1e-4);
    }

    #[test]
    fn reset_clears_state() {
        let mut smoother = PitchSmoother::default();
        smoother.smooth(300.0, 0.085);
        smoother.smooth(310.0, 0.085);
        smoother.reset();
        assert_eq!(smoother.current(), None);
        assert_eq!(smoother.smooth(520.0, 0.085), 520.0);
    }

    #[test]
    fn converges_monotonically_toward_a_steady_input() {
        let mut smoother = PitchSmoother::default();
        smoother.smooth(200.0, 0.085);
        let mut last_gap = f32::INFINITY;
        for _ in 0..20 {
            let gap = (smoother.smooth(220.0, 0.085) - 220.0).abs();
            assert!(gap < last_gap);
            last_gap = gap;
        }
    }
}
