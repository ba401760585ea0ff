//! # Audio Frames
//!
//! The unit of work handed to the pipeline by the capture collaborator, plus
//! the preprocessing applied before any periodicity search.
//!
//! Frames are mono, contiguous and non-overlapping. Samples are normalized to
//! roughly [-1, 1]; hosts capturing 16-bit PCM convert with
//! [`AudioFrame::from_pcm_i16`].

/// A fixed-length block of mono samples and the rate they were captured at.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Builds a frame from signed 16-bit PCM, scaling by `i16::MAX`.
    pub fn from_pcm_i16(pcm: &[i16], sample_rate: u32) -> Self {
        let samples = pcm
            .iter()
            .map(|&s| s as f32 / i16::MAX as f32)
            .collect();
        Self::new(samples, sample_rate)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Real-time duration of the frame in seconds.
    ///
    /// Returns 0 for a zero sample rate so callers never divide by it.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Removes the DC offset from a signal by making its average value zero.
///
/// Both periodicity strategies assume zero-mean input; a residual offset
/// inflates the similarity of every lag and skews peak selection near lag 0.
///
/// # Arguments
/// * `signal` - Audio signal to process (modified in-place)
pub fn remove_bias(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let mean = signal.iter().map(|&s| s as f64).sum::<f64>() / len as f64;
    let mean = mean as f32;
    for sample in signal.iter_mut() {
        *sample -= mean;
    }
}
