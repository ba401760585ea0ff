// bowl-core/src/lib.rs

//! The core logic for the singing bowl tuner.
//! This crate turns fixed-size audio frames into a note reading with a
//! confidence score and harmonic listing. It is completely headless:
//! microphone capture, profile storage and presentation belong to the host.
//!
//! Per frame: quality gate, DC removal, periodicity search (NSDF or YIN),
//! parabolic refinement, confidence, harmonics, smoothing, note mapping.

pub mod config;
pub mod error;
pub mod fft;
pub mod frame;
pub mod harmonics;
pub mod pipeline;
pub mod pitch;
pub mod quality;
pub mod smoothing;
pub mod tuning;
pub mod worker;

pub use config::{DEFAULT_A4_HZ, EstimatorKind, GatePolicy, PipelineConfig};
pub use error::EstimateError;
pub use frame::AudioFrame;
pub use harmonics::Partial;
pub use pipeline::{TunerOutcome, TunerPipeline};
pub use pitch::PitchEstimate;
pub use quality::{SignalQuality, SignalWarning};
pub use tuning::{NoteName, NoteReading};
pub use worker::AnalysisWorker;
