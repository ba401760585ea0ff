//! # Harmonics
//!
//! Overtone listing for a detected fundamental, and relative partial levels
//! read off a magnitude spectrum.

use serde::{Deserialize, Serialize};

/// Highest harmonic number listed.
pub const MAX_HARMONIC: u32 = 8;

/// A single partial of the bowl's sound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Partial {
    /// Partial number (1 = fundamental).
    pub number: u32,
    pub frequency_hz: f32,
    /// Magnitude relative to the loudest measured partial, in [0, 1].
    pub level: f32,
}

/// Yields `f·k` for `k = 2..=8`, stopping at the first one above Nyquist.
///
/// A non-positive or non-finite fundamental yields nothing.
pub fn harmonics(fundamental_hz: f32, sample_rate: u32) -> impl Iterator<Item = f32> {
    let nyquist = sample_rate as f32 / 2.0;
    let usable = fundamental_hz.is_finite() && fundamental_hz > 0.0;
    (2..=MAX_HARMONIC)
        .filter(move |_| usable)
        .map(move |k| fundamental_hz * k as f32)
        .take_while(move |&f| f <= nyquist)
}

/// Measures the fundamental and each harmonic in `magnitudes`.
///
/// Each partial takes the largest bin within one bin of its nominal position;
/// levels are then scaled so the loudest partial is 1.
///
/// # Arguments
/// * `magnitudes` - Half spectrum of an `fft_size`-sample frame
/// * `fft_size` - Frame length the spectrum was computed from
/// * `sample_rate` - Sample rate in Hz
/// * `fundamental_hz` - Detected fundamental
/// * `overtones` - Harmonic frequencies, in order, starting at the 2nd partial
pub fn measure_partials(
    magnitudes: &[f32],
    fft_size: usize,
    sample_rate: u32,
    fundamental_hz: f32,
    overtones: &[f32],
) -> Vec<Partial> {
    if magnitudes.is_empty() || fft_size == 0 || sample_rate == 0 {
        return Vec::new();
    }
    let bin_width = sample_rate as f32 / fft_size as f32;
    let last_bin = magnitudes.len() - 1;

    let mut partials: Vec<Partial> = std::iter::once(fundamental_hz)
        .chain(overtones.iter().copied())
        .enumerate()
        .map(|(i, frequency_hz)| {
            let centre = (frequency_hz / bin_width).round() as usize;
            let start = centre.saturating_sub(1).min(last_bin);
            let end = (centre + 1).min(last_bin);
            let level = magnitudes[start..=end]
                .iter()
                .copied()
                .fold(0.0f32, f32::max);
            Partial {
                number: i as u32 + 1,
                frequency_hz,
                level,
            }
        })
        .collect();

    let loudest = partials.iter().map(|p| p.level).fold(0.0f32, f32::max);
    if loudest > 0.0 {
        for partial in partials.iter_mut() {
            partial.level /= loudest;
        }
    }
    partials
}
