//! # Signal Gate
//!
//! Cheap loudness check run before the pitch search, so silent or
//! near-silent frames never pay for the O(n·τ) difference function.

/// Root-mean-square amplitude of a frame. An empty frame has an RMS of zero.
pub fn rms(signal: &[f32]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let energy: f64 = signal.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (energy / signal.len() as f64).sqrt()
}

/// Returns `true` when the frame's RMS is strictly above `threshold`.
pub fn is_loud_enough(signal: &[f32], threshold: f64) -> bool {
    rms(signal) > threshold
}
