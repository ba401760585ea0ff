//! # Signal Quality Gate
//!
//! Classifies a frame before pitch detection. Silent and clipping frames are
//! advisory conditions for the host, never errors.

use serde::{Deserialize, Serialize};

/// Outcome of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalQuality {
    Silent,
    Clipping,
    Usable,
}

/// Warning surfaced to the host alongside a frame's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalWarning {
    /// Signal level too low to track.
    Silent,
    /// Signal is saturating the input.
    Clipping,
}

impl SignalQuality {
    pub fn warning(self) -> Option<SignalWarning> {
        match self {
            SignalQuality::Silent => Some(SignalWarning::Silent),
            SignalQuality::Clipping => Some(SignalWarning::Clipping),
            SignalQuality::Usable => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityGate {
    /// RMS level below which a frame is silent.
    pub noise_floor: f32,
    /// Absolute sample value above which a frame is clipping.
    pub peak_ceiling: f32,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self {
            noise_floor: 0.01,
            peak_ceiling: 0.98,
        }
    }
}

impl QualityGate {
    pub fn new(noise_floor: f32, peak_ceiling: f32) -> Self {
        Self {
            noise_floor,
            peak_ceiling,
        }
    }

    /// Silence takes precedence: a quiet frame is reported as silent even if
    /// one stray sample crosses the ceiling.
    pub fn classify(&self, samples: &[f32]) -> SignalQuality {
        if level(samples) < self.noise_floor {
            SignalQuality::Silent
        } else if samples.iter().any(|s| s.abs() > self.peak_ceiling) {
            SignalQuality::Clipping
        } else {
            SignalQuality::Usable
        }
    }
}

/// RMS level of a frame. An empty frame has level 0.
pub fn level(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_frame_is_silent() {
        let gate = QualityGate::default();
        assert_eq!(gate.classify(&[0.0; 1024]), SignalQuality::Silent);
        assert_eq!(gate.classify(&[]), SignalQuality::Silent);
    }

    #[test]
    fn full_scale_sample_is_clipping() {
        let gate = QualityGate::default();
        let mut frame = vec![0.3; 1024];
        frame[100] = 1.0;
        assert_eq!(gate.classify(&frame), SignalQuality::Clipping);
    }

    #[test]
    fn moderate_signal_is_usable() {
        let gate = QualityGate::default();
        let frame: Vec<f32> = (0..1024).map(|i| 0.5 * (i as f32 * 0.05).sin()).collect();
        assert_eq!(gate.classify(&frame), SignalQuality::Usable);
        assert_eq!(gate.classify(&frame).warning(), None);
    }

    #[test]
    fn level_of_constant_signal() {
        assert!((level(&[0.5; 64]) - 0.5).abs() < 1e-6);
    }
}
