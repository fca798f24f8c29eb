//! Error types for the tuner core.
//!
//! Two families of failure exist, and both are caller-side contract
//! violations rather than runtime conditions:
//! - [`ConfigError`] is returned when a [`DetectionConfig`](crate::config::DetectionConfig)
//!   or [`Tuning`](crate::tuning::Tuning) is built from invalid parameters.
//! - [`FrameError`] is returned when a frame handed to the session does not
//!   honour the configured contract.
//!
//! "No pitch this frame" is not an error; it is the `Ok(None)` outcome of
//! [`process_frame`](crate::session::process_frame).

use thiserror::Error;

/// Invalid construction parameters for a detection config or a tuning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The frame is too short to hold any lag search window.
    #[error("frame size {0} is too small for pitch detection")]
    FrameTooSmall(usize),

    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f64),

    /// A search bound was zero, negative, NaN or infinite.
    #[error("{field} must be positive and finite, got {value}")]
    NonPositiveFrequency { field: &'static str, value: f64 },

    #[error("min frequency {min} Hz must be below max frequency {max} Hz")]
    InvertedRange { min: f64, max: f64 },

    #[error("YIN threshold must lie strictly between 0 and 1, got {0}")]
    ThresholdOutOfRange(f64),

    #[error("silence RMS gate must be finite and non-negative, got {0}")]
    InvalidSilenceGate(f64),

    /// The lowest frequency needs a longer lag than half a frame can hold.
    #[error(
        "min frequency needs a lag of {required_lag} samples but a frame of {frame_size} only allows {available}"
    )]
    SearchRangeExceedsFrame {
        frame_size: usize,
        required_lag: usize,
        available: usize,
    },

    /// The min/max bounds collapse to an empty lag range once floored.
    #[error("lag range {tau_min}..={tau_max} is empty")]
    EmptyLagRange { tau_min: usize, tau_max: usize },

    #[error("a tuning needs at least one target")]
    EmptyTuning,

    #[error("target {name} has invalid frequency {value} Hz")]
    InvalidTargetFrequency { name: String, value: f64 },
}

/// A frame that breaks the session's per-frame contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("frame has {actual} samples, session is configured for {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("sample {index} is not a finite value")]
    NonFiniteSample { index: usize },

    #[error("frame sample rate {actual} Hz does not match configured {expected} Hz")]
    SampleRateMismatch { expected: f64, actual: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_offending_values() {
        let err = FrameError::LengthMismatch {
            expected: 4096,
            actual: 2048,
        };
        assert_eq!(
            err.to_string(),
            "frame has 2048 samples, session is configured for 4096"
        );

        let err = ConfigError::InvertedRange {
            min: 400.0,
            max: 70.0,
        };
        assert!(err.to_string().contains("400"));
    }
}
