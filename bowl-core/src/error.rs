//! Per-frame estimation failures.
//!
//! None of these are fatal: the pipeline logs them and skips the frame.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    /// No lag met the peak or threshold criteria inside the search range.
    #[error("no periodicity found in the search range")]
    NoPeriodicityFound,

    /// The frame cannot hold the configured lag range.
    #[error("frame of {len} samples is too short, need at least {required}")]
    FrameTooShort { len: usize, required: usize },

    /// The sample rate cannot resolve the configured frequency band.
    #[error("sample rate {0} Hz cannot resolve the search band")]
    InvalidSampleRate(u32),

    /// The refined frequency came out non-finite or non-positive.
    #[error("invalid frequency: {0}")]
    InvalidFrequency(f32),
}
