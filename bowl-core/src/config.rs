//! # Pipeline Configuration
//!
//! Tunable parameters for the bowl pitch pipeline. Every field has a default
//! suited to struck singing bowls; a settings collaborator may load a partial
//! document and let the rest fall back to [`PipelineConfig::default`].

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Sample rate the host is expected to capture at, in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Number of samples per analysis frame.
///
/// At 48 kHz this is ~85 ms of audio, enough for several periods of a 60 Hz tone.
pub const FRAME_SIZE: usize = 4096;

/// Default A4 calibration in Hz.
pub const DEFAULT_A4_HZ: f32 = 440.0;

/// Which periodicity strategy the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorKind {
    /// Normalized squared difference (McLeod-style). Good for overtone-rich timbres.
    #[default]
    Nsdf,
    /// Cumulative mean normalized difference (YIN). Sharper on unstable onsets.
    Yin,
}

/// What to do with frames the quality gate flags as silent or clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatePolicy {
    /// Skip pitch estimation for flagged frames.
    #[default]
    Bypass,
    /// Surface the warning but still estimate.
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Lowest fundamental searched for (Hz).
    pub min_freq_hz: f32,
    /// Highest fundamental searched for (Hz).
    pub max_freq_hz: f32,
    /// RMS below which a frame is silent.
    pub noise_floor: f32,
    /// Absolute sample value above which a frame is clipping.
    pub peak_ceiling: f32,
    /// CMND dip threshold for the YIN strategy.
    pub yin_threshold: f32,
    /// Fraction of the global NSDF maximum a candidate peak must exceed.
    pub peak_ratio: f32,
    /// Smoothing time constant in seconds.
    pub time_constant_s: f32,
    pub estimator: EstimatorKind,
    pub gate_policy: GatePolicy,
    /// Measure relative partial levels from the spectrum.
    pub measure_partials: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_freq_hz: 60.0,
            max_freq_hz: 1500.0,
            noise_floor: 0.01,
            peak_ceiling: 0.98,
            yin_threshold: 0.12,
            peak_ratio: 0.6,
            time_constant_s: 0.25,
            estimator: EstimatorKind::default(),
            gate_policy: GatePolicy::default(),
            measure_partials: true,
        }
    }
}

impl PipelineConfig {
    /// Checks that the configuration describes a usable pipeline.
    ///
    /// # Returns
    /// * `Ok(())` - All parameters are in range
    /// * `Err(e)` - The first offending parameter
    pub fn validate(&self) -> Result<()> {
        if !(self.min_freq_hz.is_finite() && self.min_freq_hz > 0.0) {
            bail!("min_freq_hz must be positive, got {}", self.min_freq_hz);
        }
        if !(self.max_freq_hz.is_finite() && self.max_freq_hz > self.min_freq_hz) {
            bail!(
                "max_freq_hz ({}) must be above min_freq_hz ({})",
                self.max_freq_hz,
                self.min_freq_hz
            );
        }
        if !(self.time_constant_s.is_finite() && self.time_constant_s > 0.0) {
            bail!("time_constant_s must be positive, got {}", self.time_constant_s);
        }
        if !(self.peak_ratio > 0.0 && self.peak_ratio <= 1.0) {
            bail!("peak_ratio must be in (0, 1], got {}", self.peak_ratio);
        }
        if !(self.yin_threshold > 0.0 && self.yin_threshold <= 1.0) {
            bail!("yin_threshold must be in (0, 1], got {}", self.yin_threshold);
        }
        if !(self.noise_floor >= 0.0 && self.noise_floor < self.peak_ceiling) {
            bail!(
                "noise_floor ({}) must be below peak_ceiling ({})",
                self.noise_floor,
                self.peak_ceiling
            );
        }
        Ok(())
    }
}
