//! # Fast Fourier Transform (FFT) Module
//!
//! Magnitude spectrum of a preprocessed frame, used to report how loud each
//! partial of the bowl is relative to the others.
//!
//! ## Features
//! - RustFFT with a per-stream planner that caches plans by frame size
//! - Hann windowing for reduced spectral leakage
//! - Half-spectrum magnitudes up to Nyquist

use rustfft::{FftPlanner, num_complex::Complex};

/// Applies a Hann window to the input buffer to reduce spectral leakage.
///
/// # Arguments
/// * `buffer` - Audio buffer to window (modified in-place)
fn apply_hann_window(buffer: &mut [f32]) {
    let n = buffer.len();
    if n < 2 {
        return;
    }
    let n_minus_1 = (n - 1) as f32;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let multiplier = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos());
        *sample *= multiplier;
    }
}

/// Owns the FFT planner for one stream.
pub struct SpectrumAnalyzer {
    planner: FftPlanner<f32>,
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer").finish_non_exhaustive()
    }
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Hann-windows a zero-mean signal and returns its magnitude spectrum.
    ///
    /// # Returns
    /// * `Vec<f32>` - `signal.len() / 2` magnitudes; bin `k` sits at `k·sr/N` Hz
    pub fn magnitudes(&mut self, signal: &[f32]) -> Vec<f32> {
        let n = signal.len();
        if n == 0 {
            return Vec::new();
        }

        let mut windowed = signal.to_vec();
        apply_hann_window(&mut windowed);

        let fft = self.planner.plan_fft_forward(n);
        let mut buffer: Vec<Complex<f32>> = windowed
            .into_iter()
            .map(|sample| Complex { re: sample, im: 0.0 })
            .collect();
        fft.process(&mut buffer);

        buffer
            .iter()
            .take(n / 2)
            .map(|c| c.norm()) // .norm() is sqrt(re^2 + im^2)
            .collect()
    }

    /// Releases cached plans.
    pub fn reset(&mut self) {
        self.planner = FftPlanner::new();
    }
}
