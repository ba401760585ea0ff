//! Normalized squared difference function and greedy peak picking.

use super::{LagRange, PeriodicityProfile};
use crate::error::EstimateError;

/// NSDF over `lags` plus one guard lag on each side, so the boundary lags
/// have neighbours for peak testing and refinement.
///
/// The lower guard never goes below lag 1, and the upper guard (like
/// `max_lag` itself) is capped so every lag has at least one product term.
///
/// `nsdf(τ) = 2·Σ x[i]·x[i+τ] / Σ (x[i]² + x[i+τ]²)`, or 0 for zero energy.
pub(super) fn profile(signal: &[f32], lags: LagRange) -> PeriodicityProfile {
    let n = signal.len();
    let first_lag = lags.min_lag.saturating_sub(1).max(1);
    let last_lag = (lags.max_lag + 1).min(n.saturating_sub(1));
    let scores = (first_lag..=last_lag)
        .map(|tau| {
            let (acf, energy) = signal[..n - tau]
                .iter()
                .zip(&signal[tau..])
                .fold((0.0f32, 0.0f32), |(acf, energy), (&x, &y)| {
                    (acf + x * y, energy + x * x + y * y)
                });
            if energy > 0.0 { 2.0 * acf / energy } else { 0.0 }
        })
        .collect();
    PeriodicityProfile { first_lag, scores }
}

/// Relative slack on the band check, absorbing refinement noise when the
/// true period sits exactly on `min_lag` or `max_lag`.
const BAND_SLACK: f32 = 1e-3;

/// Picks the first local maximum in `lags` above `peak_ratio` of the global
/// maximum whose refined frequency lies in `[min_freq_hz, max_freq_hz]`.
///
/// The scan stops at the first qualifying peak rather than the tallest one,
/// so the lowest-lag candidate (the fundamental, not a harmonic) wins.
///
/// # Returns
/// * `Ok((frequency, confidence))` - Refined frequency and clamped peak value
/// * `Err(NoPeriodicityFound)` - No peak qualified
pub(super) fn pick_peak(
    profile: &PeriodicityProfile,
    lags: LagRange,
    sample_rate: f32,
    peak_ratio: f32,
    min_freq_hz: f32,
    max_freq_hz: f32,
) -> Result<(f32, f32), EstimateError> {
    let global_max = (lags.min_lag..=lags.max_lag)
        .filter_map(|lag| profile.score(lag))
        .fold(f32::NEG_INFINITY, f32::max);
    if !(global_max > 0.0) {
        return Err(EstimateError::NoPeriodicityFound);
    }
    let cutoff = peak_ratio * global_max;
    let band = (min_freq_hz * (1.0 - BAND_SLACK))..=(max_freq_hz * (1.0 + BAND_SLACK));

    for lag in lags.min_lag..=lags.max_lag {
        let (Some(prev), Some(current), Some(next)) = (
            profile.score(lag - 1),
            profile.score(lag),
            profile.score(lag + 1),
        ) else {
            continue;
        };
        if current > prev && current > next && current > cutoff {
            let frequency = sample_rate / profile.refine(lag);
            if band.contains(&frequency) {
                let frequency = frequency.clamp(min_freq_hz, max_freq_hz);
                return Ok((frequency, current.clamp(0.0, 1.0)));
            }
        }
    }
    Err(EstimateError::NoPeriodicityFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::tests::sine;

    #[test]
    fn profile_peaks_near_one_at_the_period() {
        // 480 Hz at 48 kHz has an exact 100-sample period.
        let signal = sine(480.0, 48_000, 2048, 0.5);
        let lags = LagRange::new(48_000, 60.0, 1500.0).unwrap();
        let profile = profile(&signal, lags);
        assert_eq!(profile.first_lag, 31);
        assert_eq!(profile.last_lag(), 801);
        assert!(profile.score(100).unwrap() > 0.99);
        assert!(profile.score(50).unwrap() < -0.99);
    }

    #[test]
    fn max_lag_is_capped_by_frame_length() {
        let signal = sine(480.0, 48_000, 300, 0.5);
        let lags = LagRange::new(48_000, 60.0, 1500.0).unwrap();
        assert_eq!(profile(&signal, lags).last_lag(), 299);
    }

    #[test]
    fn peaks_below_the_ratio_are_skipped() {
        let profile = PeriodicityProfile {
            first_lag: 10,
            scores: vec![0.0, 0.5, 0.0, 0.0, 0.9, 0.0, 1.0, 0.0],
        };
        // Lag 11 is a local max but 0.5 < 0.6; lag 14 qualifies first.
        let lags = LagRange {
            min_lag: 11,
            max_lag: 16,
        };
        let (freq, confidence) = pick_peak(&profile, lags, 1400.0, 0.6, 1.0, 1000.0).unwrap();
        assert!((freq - 100.0).abs() < 1e-3);
        assert!((confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn out_of_band_peaks_are_passed_over() {
        let profile = PeriodicityProfile {
            first_lag: 10,
            scores: vec![0.0, 0.9, 0.0, 0.0, 0.8, 0.0],
        };
        // Lag 11 maps to ~127 Hz, outside a 60..=120 band; lag 14 (100 Hz) is taken.
        let lags = LagRange {
            min_lag: 11,
            max_lag: 14,
        };
        let (freq, _) = pick_peak(&profile, lags, 1400.0, 0.6, 60.0, 120.0).unwrap();
        assert!((freq - 100.0).abs() < 1e-3);
    }

    #[test]
    fn flat_profile_yields_nothing() {
        let profile = PeriodicityProfile {
            first_lag: 10,
            scores: vec![0.0; 16],
        };
        let lags = LagRange {
            min_lag: 11,
            max_lag: 24,
        };
        assert_eq!(
            pick_peak(&profile, lags, 48_000.0, 0.6, 60.0, 1500.0),
            Err(EstimateError::NoPeriodicityFound)
        );
    }

    #[test]
    fn period_on_the_lag_bounds_is_found() {
        let lags = LagRange::new(48_000, 60.0, 1500.0).unwrap();

        // 1500 Hz repeats every 32 samples, exactly min_lag.
        let high = profile(&sine(1500.0, 48_000, 4096, 0.5), lags);
        let (freq, _) = pick_peak(&high, lags, 48_000.0, 0.6, 60.0, 1500.0).unwrap();
        assert!((freq - 1500.0).abs() < 1.0);

        // 60 Hz repeats every 800 samples, exactly max_lag.
        let low = profile(&sine(60.0, 48_000, 6400, 0.5), lags);
        let (freq, _) = pick_peak(&low, lags, 48_000.0, 0.6, 60.0, 1500.0).unwrap();
        assert!((freq - 60.0).abs() < 0.1);
    }

    #[test]
    fn guard_lags_do_not_count_toward_the_global_maximum() {
        // Guard at lag 10 towers over everything inside 11..=14.
        let profile = PeriodicityProfile {
            first_lag: 10,
            scores: vec![5.0, 0.0, 0.8, 0.0, 0.0, 0.0],
        };
        let lags = LagRange {
            min_lag: 11,
            max_lag: 14,
        };
        let (freq, confidence) = pick_peak(&profile, lags, 1200.0, 0.6, 60.0, 120.0).unwrap();
        assert!((freq - 100.0).abs() < 1e-3);
        assert!((confidence - 0.8).abs() < 1e-6);
    }
}
