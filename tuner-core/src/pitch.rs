//! # Pitch Detection Module
//!
//! This module implements the YIN fundamental-frequency estimator
//! (de Cheveigné & Kawahara, 2002) in its single-pitch form, tuned for
//! plucked strings.
//!
//! ## Steps
//! - Difference function over every lag up to the search maximum
//! - Cumulative mean normalized difference (CMNDF)
//! - Absolute threshold with descent to the bottom of the first dip
//! - Parabolic interpolation for sub-sample accuracy
//!
//! "No pitch" is an ordinary outcome and is reported as `None`.

/// Curvature below which parabolic interpolation keeps the integer lag.
const CURVATURE_EPSILON: f64 = 1e-12;

/// The smallest lag ever searched. Lags 0 and 1 carry no usable period.
const MIN_SEARCHABLE_LAG: usize = 2;

/// Inclusive range of candidate lags (periods in samples) searched for a dip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagRange {
    /// Shortest lag, set by the highest frequency of interest.
    pub min: usize,
    /// Longest lag, set by the lowest frequency of interest and half the frame.
    pub max: usize,
}

impl LagRange {
    /// Derives the lag bounds for a frame of `frame_len` samples.
    ///
    /// `max = min(frame_len / 2, floor(sample_rate / min_freq))` and
    /// `min = max(2, floor(sample_rate / max_freq))`.
    ///
    /// # Returns
    /// * `Some(range)` - A non-empty range with `min < max`
    /// * `None` - Invalid inputs or the bounds collapse
    pub fn for_frame(
        frame_len: usize,
        sample_rate: f64,
        min_freq: f64,
        max_freq: f64,
    ) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(sample_rate) || !valid(min_freq) || !valid(max_freq) {
            return None;
        }

        let max = (frame_len / 2).min((sample_rate / min_freq).floor() as usize);
        let min = MIN_SEARCHABLE_LAG.max((sample_rate / max_freq).floor() as usize);
        (min < max).then_some(Self { min, max })
    }
}

/// Estimates the fundamental frequency of a frame with the YIN algorithm.
///
/// The frame is only read. One scratch buffer of `lags.max + 1` values is
/// allocated per call and reused in place for the difference function and
/// its normalized form.
///
/// # Arguments
/// * `signal` - Input audio frame
/// * `sample_rate` - Sample rate in Hz
/// * `min_freq` - Lowest frequency of interest in Hz
/// * `max_freq` - Highest frequency of interest in Hz
/// * `threshold` - CMNDF value a dip must fall below to count as a period
///
/// # Returns
/// * `Some(frequency)` - Detected fundamental in Hz
/// * `None` - Silence, noise, out-of-range pitch or an empty lag range
pub fn estimate_pitch(
    signal: &[f32],
    sample_rate: f64,
    min_freq: f64,
    max_freq: f64,
    threshold: f64,
) -> Option<f64> {
    let lags = LagRange::for_frame(signal.len(), sample_rate, min_freq, max_freq)?;
    estimate_pitch_in_range(signal, sample_rate, lags, threshold)
}

/// Same as [`estimate_pitch`] with a lag range that was already derived,
/// e.g. once at configuration time.
pub fn estimate_pitch_in_range(
    signal: &[f32],
    sample_rate: f64,
    lags: LagRange,
    threshold: f64,
) -> Option<f64> {
    if lags.max >= signal.len() || lags.min >= lags.max {
        return None;
    }

    let mut yin_buffer = vec![0.0_f64; lags.max + 1];
    difference(signal, &mut yin_buffer);
    cumulative_mean_normalize(&mut yin_buffer);

    let tau = absolute_threshold(&yin_buffer, lags, threshold)?;
    let refined_tau = parabolic_interpolation(&yin_buffer, tau);
    if !refined_tau.is_finite() || refined_tau <= 0.0 {
        return None;
    }

    Some(sample_rate / refined_tau)
}

/// Difference function: `d[τ] = Σ (x[i] - x[i+τ])²` for `i` in `0..n-τ`.
///
/// Fills `yin_buffer[1..]`; index 0 is left for the normalization step.
fn difference(signal: &[f32], yin_buffer: &mut [f64]) {
    for tau in 1..yin_buffer.len() {
        yin_buffer[tau] = signal
            .iter()
            .zip(&signal[tau..])
            .map(|(&a, &b)| {
                let delta = f64::from(a) - f64::from(b);
                delta * delta
            })
            .sum();
    }
}

/// Turns the difference function into the CMNDF, in place.
///
/// `cmndf[0] = 1` and `cmndf[τ] = d[τ]·τ / Σ d[1..=τ]`. A zero running sum
/// (perfectly flat signal so far) yields 1.
fn cumulative_mean_normalize(yin_buffer: &mut [f64]) {
    let mut running_sum = 0.0;
    yin_buffer[0] = 1.0;
    for tau in 1..yin_buffer.len() {
        running_sum += yin_buffer[tau];
        if running_sum == 0.0 {
            yin_buffer[tau] = 1.0;
        } else {
            yin_buffer[tau] *= tau as f64 / running_sum;
        }
    }
}

/// Finds the first lag whose CMNDF falls below `threshold`, then walks down
/// to the bottom of that dip while the next value is strictly smaller.
fn absolute_threshold(cmndf: &[f64], lags: LagRange, threshold: f64) -> Option<usize> {
    let mut tau = (lags.min..=lags.max).find(|&tau| cmndf[tau] < threshold)?;
    while tau < lags.max && cmndf[tau + 1] < cmndf[tau] {
        tau += 1;
    }
    Some(tau)
}

/// Refines an integer lag through the vertex of the parabola fitted to the
/// CMNDF at `tau - 1`, `tau` and `tau + 1`. Neighbours are clamped to
/// `[1, len - 1]`.
fn parabolic_interpolation(cmndf: &[f64], tau: usize) -> f64 {
    let t0 = tau.saturating_sub(1).max(1);
    let t2 = (tau + 1).min(cmndf.len() - 1);
    let (s0, s1, s2) = (cmndf[t0], cmndf[tau], cmndf[t2]);

    let a = (s0 + s2 - 2.0 * s1) / 2.0;
    if a.abs() < CURVATURE_EPSILON {
        return tau as f64;
    }
    let b = (s2 - s0) / 2.0;
    tau as f64 - b / (2.0 * a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const SAMPLE_RATE: f64 = 44100.0;
    const FRAME_SIZE: usize = 4096;

    fn sine(freq: f64, amplitude: f64) -> Vec<f32> {
        (0..FRAME_SIZE)
            .map(|i| (amplitude * (2.0 * PI * freq * i as f64 / SAMPLE_RATE).sin()) as f32)
            .collect()
    }

    fn assert_within_percent(found: f64, expected: f64, percent: f64) {
        let error = (found - expected).abs() / expected * 100.0;
        assert!(
            error < percent,
            "expected ~{expected} Hz, got {found} Hz ({error:.3}% off)"
        );
    }

    #[test]
    fn lag_range_follows_frequency_bounds() {
        let lags = LagRange::for_frame(FRAME_SIZE, SAMPLE_RATE, 70.0, 400.0).unwrap();
        assert_eq!(lags, LagRange { min: 110, max: 630 });
    }

    #[test]
    fn lag_range_is_capped_by_half_frame() {
        let lags = LagRange::for_frame(1024, SAMPLE_RATE, 20.0, 400.0).unwrap();
        assert_eq!(lags.max, 512);
    }

    #[test]
    fn lag_range_never_goes_below_two() {
        let lags = LagRange::for_frame(FRAME_SIZE, 8000.0, 100.0, 7000.0).unwrap();
        assert_eq!(lags.min, 2);
    }

    #[test]
    fn lag_range_rejects_collapsed_or_invalid_bounds() {
        assert_eq!(LagRange::for_frame(FRAME_SIZE, SAMPLE_RATE, 400.0, 400.5), None);
        assert_eq!(LagRange::for_frame(8, SAMPLE_RATE, 70.0, 400.0), None);
        assert_eq!(LagRange::for_frame(FRAME_SIZE, 0.0, 70.0, 400.0), None);
        assert_eq!(LagRange::for_frame(FRAME_SIZE, SAMPLE_RATE, f64::NAN, 400.0), None);
    }

    #[test]
    fn detects_open_a_string() {
        let f0 = estimate_pitch(&sine(110.0, 0.5), SAMPLE_RATE, 70.0, 400.0, 0.15).unwrap();
        assert_within_percent(f0, 110.0, 1.0);
    }

    #[test]
    fn detects_every_guitar_string() {
        for freq in [82.41, 110.0, 146.83, 196.0, 246.94, 329.63] {
            let f0 = estimate_pitch(&sine(freq, 0.3), SAMPLE_RATE, 70.0, 400.0, 0.15)
                .unwrap_or_else(|| panic!("no pitch found for {freq} Hz"));
            assert_within_percent(f0, freq, 1.0);
        }
    }

    #[test]
    fn flat_signal_has_no_pitch() {
        let dc = vec![0.25_f32; FRAME_SIZE];
        assert_eq!(estimate_pitch(&dc, SAMPLE_RATE, 70.0, 400.0, 0.15), None);
        let silence = vec![0.0_f32; FRAME_SIZE];
        assert_eq!(estimate_pitch(&silence, SAMPLE_RATE, 70.0, 400.0, 0.15), None);
    }

    #[test]
    fn pitch_above_search_range_is_not_reported_as_itself() {
        // 1 kHz is far above max_freq; any dip found must be a sub-multiple lag.
        if let Some(f0) = estimate_pitch(&sine(1000.0, 0.5), SAMPLE_RATE, 70.0, 400.0, 0.15) {
            assert!(f0 <= 400.0 + 1.0, "reported {f0} Hz outside the search range");
        }
    }

    #[test]
    fn cmndf_of_zero_signal_is_one() {
        let mut buffer = vec![0.0; 16];
        cumulative_mean_normalize(&mut buffer);
        assert!(buffer.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn threshold_descends_to_bottom_of_dip() {
        let cmndf = [1.0, 1.0, 0.9, 0.14, 0.10, 0.05, 0.08, 0.2, 0.01];
        let lags = LagRange { min: 2, max: 8 };
        assert_eq!(absolute_threshold(&cmndf, lags, 0.15), Some(5));
        // A stricter threshold skips the shallow dip entirely.
        assert_eq!(absolute_threshold(&cmndf, lags, 0.02), Some(8));
        assert_eq!(absolute_threshold(&cmndf, lags, 0.005), None);
    }

    #[test]
    fn parabolic_vertex_is_found() {
        // Samples of (x - 4.25)^2 at x = 3, 4, 5.
        let values = [9.0, 9.0, 9.0, 1.5625, 0.0625, 0.5625, 9.0];
        let refined = parabolic_interpolation(&values, 4);
        assert!((refined - 4.25).abs() < 1e-12);
    }

    #[test]
    fn flat_neighbourhood_keeps_integer_lag() {
        let values = [1.0, 0.5, 0.5, 0.5, 1.0];
        assert_eq!(parabolic_interpolation(&values, 2), 2.0);
    }

    #[test]
    fn interpolation_clamps_at_last_lag() {
        // With tau at the end, s2 == s1 and the vertex sits half a lag further.
        let values = [1.0, 0.75, 0.5, 0.25];
        assert_eq!(parabolic_interpolation(&values, 3), 3.5);
    }
}
