//! # Tuner Pipeline
//!
//! One stream's worth of processing: gate, preprocess, estimate, smooth, map.
//! Frames are handled synchronously in arrival order; all mutable state (the
//! smoother, cached lag bounds, the FFT planner) belongs to the pipeline that
//! owns it, so independent streams never interfere.

use anyhow::Result;
use log::{debug, warn};

use crate::config::{GatePolicy, PipelineConfig};
use crate::error::EstimateError;
use crate::fft::SpectrumAnalyzer;
use crate::frame::{AudioFrame, remove_bias};
use crate::harmonics::{self, Partial};
use crate::pitch::{PeriodicityEstimator, PitchEstimate};
use crate::quality::{QualityGate, SignalQuality, SignalWarning};
use crate::smoothing::PitchSmoother;
use crate::tuning::{self, NoteReading};

/// Everything the host learns from one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TunerOutcome {
    /// Note of the smoothed frequency; `None` when this frame gave no estimate.
    pub reading: Option<NoteReading>,
    /// Confidence of this frame's raw estimate, 0 when there was none.
    pub confidence: f32,
    pub warning: Option<SignalWarning>,
    /// The raw, unsmoothed estimate.
    pub estimate: PitchEstimate,
    /// Overtone frequencies of the raw estimate up to Nyquist.
    pub harmonics: Vec<f32>,
    /// Fundamental and overtone levels, when partial measurement is on.
    pub partials: Vec<Partial>,
}

impl TunerOutcome {
    fn skipped(warning: Option<SignalWarning>) -> Self {
        Self {
            reading: None,
            confidence: 0.0,
            warning,
            estimate: PitchEstimate::invalid(),
            harmonics: Vec::new(),
            partials: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct TunerPipeline {
    gate: QualityGate,
    gate_policy: GatePolicy,
    estimator: PeriodicityEstimator,
    smoother: PitchSmoother,
    spectrum: Option<SpectrumAnalyzer>,
}

impl TunerPipeline {
    /// Builds a pipeline after validating `config`.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            gate: QualityGate::new(config.noise_floor, config.peak_ceiling),
            gate_policy: config.gate_policy,
            estimator: PeriodicityEstimator::new(&config),
            smoother: PitchSmoother::new(config.time_constant_s),
            spectrum: config.measure_partials.then(SpectrumAnalyzer::new),
        })
    }

    pub fn smoother(&self) -> &PitchSmoother {
        &self.smoother
    }

    /// Processes one frame against the current reference pitch.
    ///
    /// Never fails: frames that yield no pitch come back with `reading: None`
    /// and the smoother keeps its last value.
    ///
    /// # Arguments
    /// * `frame` - Captured samples, consumed by this call
    /// * `a4_hz` - Latest A4 calibration from the settings collaborator
    pub fn process(&mut self, frame: AudioFrame, a4_hz: f32) -> TunerOutcome {
        let quality = self.gate.classify(&frame.samples);
        let warning = quality.warning();
        if quality != SignalQuality::Usable && self.gate_policy == GatePolicy::Bypass {
            return TunerOutcome::skipped(warning);
        }

        let dt = frame.duration_secs();
        let sample_rate = frame.sample_rate;
        let mut signal = frame.samples;
        remove_bias(&mut signal);

        let estimate = match self.estimator.estimate(&signal, sample_rate) {
            Ok(estimate) => estimate,
            Err(e) => {
                log_skip(&e);
                return TunerOutcome::skipped(warning);
            }
        };

        let overtones: Vec<f32> =
            harmonics::harmonics(estimate.frequency_hz, sample_rate).collect();
        let partials = match self.spectrum.as_mut() {
            Some(spectrum) => {
                let magnitudes = spectrum.magnitudes(&signal);
                harmonics::measure_partials(
                    &magnitudes,
                    signal.len(),
                    sample_rate,
                    estimate.frequency_hz,
                    &overtones,
                )
            }
            None => Vec::new(),
        };

        let smoothed = self.smoother.smooth(estimate.frequency_hz, dt);
        let reading = tuning::frequency_to_note(smoothed, a4_hz);
        if reading.is_none() {
            warn!("[PIPELINE] Cannot map {} Hz against A4 = {} Hz", smoothed, a4_hz);
        }

        TunerOutcome {
            reading,
            confidence: estimate.confidence,
            warning,
            estimate,
            harmonics: overtones,
            partials,
        }
    }

    /// Clears smoothing and per-stream estimator state. Call when the stream stops.
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.estimator.reset();
        if let Some(spectrum) = self.spectrum.as_mut() {
            spectrum.reset();
        }
    }
}

fn log_skip(error: &EstimateError) {
    match error {
        EstimateError::FrameTooShort { .. } | EstimateError::InvalidSampleRate(_) => {
            warn!("[PIPELINE] Frame skipped, check capture settings: {}", error)
        }
        EstimateError::NoPeriodicityFound | EstimateError::InvalidFrequency(_) => {
            debug!("[PIPELINE] Frame skipped: {}", error)
        }
    }
}
