//! YIN: cumulative mean normalized difference with trough walking.

use super::PeriodicityProfile;

/// CMND over lags `0..N/2`, with `cmnd[0] = 1`.
///
/// The difference at each lag sums over every valid sample pair, so longer
/// lags see fewer terms.
pub(super) fn profile(signal: &[f32]) -> PeriodicityProfile {
    let frame_size = signal.len();
    let tau_max = frame_size / 2;
    let mut yin_buffer = vec![0.0f32; tau_max];

    // --- Difference function ---
    for tau in 1..tau_max {
        let mut diff = 0.0;
        for i in 0..(frame_size - tau) {
            let delta = signal[i] - signal[i + tau];
            diff += delta * delta;
        }
        yin_buffer[tau] = diff;
    }

    // --- Cumulative mean normalized difference ---
    let mut running_sum = 0.0;
    if let Some(first) = yin_buffer.first_mut() {
        *first = 1.0;
    }
    for tau in 1..tau_max {
        running_sum += yin_buffer[tau];
        if running_sum != 0.0 {
            yin_buffer[tau] *= tau as f32 / running_sum;
        } else {
            yin_buffer[tau] = 1.0;
        }
    }

    PeriodicityProfile {
        first_lag: 0,
        scores: yin_buffer,
    }
}

/// Finds the trough marking the period and returns `(lag, frequency, clarity)`.
///
/// The first lag from 2 upward that dips below `threshold` while still
/// falling is followed downhill to its local minimum. With no such dip, the
/// global minimum over `[1, N/2)` is used instead. `lag` is the integer
/// trough before refinement.
pub(super) fn pick_trough(
    profile: &PeriodicityProfile,
    sample_rate: f32,
    threshold: f32,
) -> (usize, f32, f32) {
    let cmnd = &profile.scores;
    let tau_max = cmnd.len();

    let mut period = None;
    for tau in 2..tau_max.saturating_sub(1) {
        if cmnd[tau] < threshold && cmnd[tau] < cmnd[tau - 1] {
            let mut trough = tau;
            while trough + 1 < tau_max && cmnd[trough + 1] < cmnd[trough] {
                trough += 1;
            }
            period = Some(trough);
            break;
        }
    }

    let period = period.unwrap_or_else(|| global_minimum(cmnd));
    let refined = profile.refine(period);
    let clarity = 1.0 - cmnd.get(period).copied().unwrap_or(1.0).clamp(0.0, 1.0);
    (period, sample_rate / refined, clarity)
}

/// First index of the smallest value in `[1, len)`; 0 when that range is empty.
fn global_minimum(cmnd: &[f32]) -> usize {
    cmnd.iter()
        .enumerate()
        .skip(1)
        .fold(None, |best: Option<(usize, f32)>, (tau, &value)| match best {
            Some((_, min)) if min <= value => best,
            _ => Some((tau, value)),
        })
        .map(|(tau, _)| tau)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::tests::sine;

    #[test]
    fn cmnd_starts_at_one_and_dips_at_the_period() {
        let signal = sine(480.0, 48_000, 2048, 0.5);
        let profile = profile(&signal);
        assert_eq!(profile.scores.len(), 1024);
        assert_eq!(profile.scores[0], 1.0);
        assert!((profile.scores[1] - 1.0).abs() < 1e-6);
        assert!(profile.scores[100] < 0.01);
    }

    #[test]
    fn dip_is_followed_to_its_trough() {
        let profile = PeriodicityProfile {
            first_lag: 0,
            scores: vec![1.0, 1.0, 0.8, 0.1, 0.05, 0.02, 0.06, 0.5],
        };
        let (lag, freq, clarity) = pick_trough(&profile, 1000.0, 0.12);
        assert_eq!(lag, 5);
        // Trough at lag 5, nudged toward the lower neighbour at 4.
        assert!(freq > 1000.0 / 5.0 && freq < 1000.0 / 4.5);
        assert!((clarity - 0.98).abs() < 1e-6);
    }

    #[test]
    fn falls_back_to_global_minimum() {
        let profile = PeriodicityProfile {
            first_lag: 0,
            scores: vec![1.0, 0.9, 0.7, 0.5, 0.3, 0.4, 0.6],
        };
        let (lag, freq, clarity) = pick_trough(&profile, 1000.0, 0.12);
        assert_eq!(lag, 4);
        assert!((freq - 1000.0 / 4.0).abs() < 20.0);
        assert!((clarity - 0.7).abs() < 1e-6);
    }

    #[test]
    fn global_minimum_takes_first_of_equals() {
        assert_eq!(global_minimum(&[0.0, 0.5, 0.2, 0.2]), 2);
        assert_eq!(global_minimum(&[1.0]), 0);
    }

    #[test]
    fn trough_exactly_on_the_shortest_period_reports_its_lag() {
        // 1500 Hz at 48 kHz repeats every 32 samples; refinement may nudge
        // the frequency either side of 1500 but the lag stays put.
        let profile = profile(&sine(1500.0, 48_000, 6400, 0.5));
        let (lag, freq, _) = pick_trough(&profile, 48_000.0, 0.12);
        assert_eq!(lag, 32);
        assert!((freq - 1500.0).abs() < 1.0);
    }
}
