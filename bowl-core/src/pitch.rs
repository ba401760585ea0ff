//! # Pitch Detection Module
//!
//! Lag-domain periodicity search tuned for struck singing bowls, whose onset
//! is noisy and whose overtones are strong.
//!
//! ## Features
//! - NSDF (McLeod-style) peak picking with a greedy first-peak rule
//! - YIN cumulative mean normalized difference with trough walking
//! - Parabolic interpolation for sub-sample accuracy
//! - Uniform [0, 1] confidence for both strategies

mod nsdf;
mod yin;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{EstimatorKind, PipelineConfig};
use crate::error::EstimateError;

/// Result of running a periodicity strategy over one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchEstimate {
    /// Refined fundamental in Hz. 0 when `is_valid` is false.
    pub frequency_hz: f32,
    /// Reliability in [0, 1].
    pub confidence: f32,
    pub is_valid: bool,
}

impl PitchEstimate {
    pub fn valid(frequency_hz: f32, confidence: f32) -> Self {
        Self {
            frequency_hz,
            confidence: confidence.clamp(0.0, 1.0),
            is_valid: true,
        }
    }

    pub fn invalid() -> Self {
        Self {
            frequency_hz: 0.0,
            confidence: 0.0,
            is_valid: false,
        }
    }
}

/// Inclusive lag bounds, in samples, for a sample rate and frequency band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagRange {
    pub min_lag: usize,
    pub max_lag: usize,
}

impl LagRange {
    /// `min_lag = floor(sr / max_freq)`, `max_lag = floor(sr / min_freq)`.
    ///
    /// Returns `None` when the band collapses to fewer than two lags at this
    /// sample rate, so `min_lag < max_lag` holds for every range handed out.
    pub fn new(sample_rate: u32, min_freq_hz: f32, max_freq_hz: f32) -> Option<Self> {
        let sr = sample_rate as f32;
        let min_lag = ((sr / max_freq_hz).floor() as usize).max(1);
        let max_lag = (sr / min_freq_hz).floor() as usize;
        (min_lag < max_lag).then_some(Self { min_lag, max_lag })
    }

    /// Shortest frame either strategy will analyse.
    pub fn required_len(&self) -> usize {
        2 * self.min_lag + 1
    }
}

/// Similarity or difference scores indexed by lag.
///
/// `scores[i]` belongs to lag `first_lag + i`. Ephemeral, rebuilt every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicityProfile {
    pub first_lag: usize,
    pub scores: Vec<f32>,
}

impl PeriodicityProfile {
    pub fn score(&self, lag: usize) -> Option<f32> {
        lag.checked_sub(self.first_lag)
            .and_then(|i| self.scores.get(i))
            .copied()
    }

    pub fn last_lag(&self) -> usize {
        self.first_lag + self.scores.len().saturating_sub(1)
    }

    /// Parabolic interpolation through `lag - 1`, `lag`, `lag + 1`.
    ///
    /// The vertex formula is the same whether the profile peaks (NSDF) or dips
    /// (CMND) at `lag`. Lags on either edge of the profile come back unchanged,
    /// as does a flat neighbourhood.
    pub fn refine(&self, lag: usize) -> f32 {
        if lag <= self.first_lag || lag >= self.last_lag() {
            return lag as f32;
        }
        let i = lag - self.first_lag;
        let s0 = self.scores[i - 1];
        let s1 = self.scores[i];
        let s2 = self.scores[i + 1];

        let denominator = 2.0 * (2.0 * s1 - s2 - s0);
        if denominator == 0.0 {
            return lag as f32;
        }
        lag as f32 + (s2 - s0) / denominator
    }
}

/// Strategy selected when the pipeline is built.
#[derive(Debug, Clone, PartialEq)]
enum Strategy {
    Nsdf { peak_ratio: f32 },
    Yin { threshold: f32 },
}

/// Runs the configured strategy and caches lag bounds per sample rate.
#[derive(Debug, Clone)]
pub struct PeriodicityEstimator {
    strategy: Strategy,
    min_freq_hz: f32,
    max_freq_hz: f32,
    lags: Option<(u32, LagRange)>,
}

impl PeriodicityEstimator {
    pub fn new(config: &PipelineConfig) -> Self {
        let strategy = match config.estimator {
            EstimatorKind::Nsdf => Strategy::Nsdf {
                peak_ratio: config.peak_ratio,
            },
            EstimatorKind::Yin => Strategy::Yin {
                threshold: config.yin_threshold,
            },
        };
        Self {
            strategy,
            min_freq_hz: config.min_freq_hz,
            max_freq_hz: config.max_freq_hz,
            lags: None,
        }
    }

    /// Lag bounds for `sample_rate`, recomputed only when the rate changes.
    pub fn lag_range(&mut self, sample_rate: u32) -> Result<LagRange, EstimateError> {
        if let Some((rate, range)) = self.lags
            && rate == sample_rate
        {
            return Ok(range);
        }
        let range = LagRange::new(sample_rate, self.min_freq_hz, self.max_freq_hz)
            .ok_or(EstimateError::InvalidSampleRate(sample_rate))?;
        debug!(
            "[PITCH] Lag bounds for {} Hz: {}..={}",
            sample_rate, range.min_lag, range.max_lag
        );
        self.lags = Some((sample_rate, range));
        Ok(range)
    }

    /// Estimates the fundamental of a zero-mean frame.
    ///
    /// # Arguments
    /// * `signal` - Preprocessed (bias-free) samples
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    /// * `Ok(estimate)` - A valid estimate with confidence
    /// * `Err(e)` - Why this frame yields no pitch
    pub fn estimate(
        &mut self,
        signal: &[f32],
        sample_rate: u32,
    ) -> Result<PitchEstimate, EstimateError> {
        let lags = self.lag_range(sample_rate)?;
        if signal.len() < lags.required_len() {
            return Err(EstimateError::FrameTooShort {
                len: signal.len(),
                required: lags.required_len(),
            });
        }

        let sr = sample_rate as f32;
        let (frequency, confidence) = match self.strategy {
            Strategy::Nsdf { peak_ratio } => {
                let profile = nsdf::profile(signal, lags);
                nsdf::pick_peak(
                    &profile,
                    lags,
                    sr,
                    peak_ratio,
                    self.min_freq_hz,
                    self.max_freq_hz,
                )?
            }
            Strategy::Yin { threshold } => {
                let profile = yin::profile(signal);
                let (period, frequency, clarity) = yin::pick_trough(&profile, sr, threshold);
                // The fallback trough may land anywhere in [1, N/2).
                if !(lags.min_lag..=lags.max_lag).contains(&period) {
                    return Err(EstimateError::NoPeriodicityFound);
                }
                (frequency, clarity)
            }
        };

        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(EstimateError::InvalidFrequency(frequency));
        }
        Ok(PitchEstimate::valid(frequency, confidence))
    }

    /// Drops per-stream state; lag bounds are rebuilt on the next frame.
    pub fn reset(&mut self) {
        self.lags = None;
    }
}
