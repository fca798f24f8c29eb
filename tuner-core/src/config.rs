//! # Detection Configuration
//!
//! [`DetectionConfig`] is the validated, immutable set of parameters shared
//! by the signal gate and the pitch estimator for a whole session.
//! [`DetectionSettings`] is its serializable, sample-rate-free counterpart,
//! meant for settings files: the sample rate is only known once the audio
//! input has been opened.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pitch::LagRange;

/// Samples per analysis frame. Stable for guitar down to E2 at 44.1/48 kHz.
pub const DEFAULT_FRAME_SIZE: usize = 4096;
/// Lowest frequency searched, with margin below E2.
pub const DEFAULT_MIN_FREQ_HZ: f64 = 70.0;
/// Highest frequency searched, with margin above E4.
pub const DEFAULT_MAX_FREQ_HZ: f64 = 400.0;
/// Typical values lie between 0.10 and 0.20.
pub const DEFAULT_YIN_THRESHOLD: f64 = 0.15;
pub const DEFAULT_SILENCE_RMS_GATE: f64 = 0.01;

/// Validated detection parameters for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    frame_size: usize,
    sample_rate: f64,
    min_freq_hz: f64,
    max_freq_hz: f64,
    yin_threshold: f64,
    silence_rms_gate: f64,
    lags: LagRange,
}

impl DetectionConfig {
    /// Validates and builds a detection config.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] naming the first invalid parameter:
    /// non-positive or non-finite rates and frequencies, `min >= max`,
    /// a threshold outside `(0, 1)`, a negative gate, or a lowest frequency
    /// whose period does not fit in half a frame.
    pub fn new(
        frame_size: usize,
        sample_rate: f64,
        min_freq_hz: f64,
        max_freq_hz: f64,
        yin_threshold: f64,
        silence_rms_gate: f64,
    ) -> Result<Self, ConfigError> {
        if frame_size < 4 {
            return Err(ConfigError::FrameTooSmall(frame_size));
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }
        for (field, value) in [("min_freq_hz", min_freq_hz), ("max_freq_hz", max_freq_hz)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositiveFrequency { field, value });
            }
        }
        if min_freq_hz >= max_freq_hz {
            return Err(ConfigError::InvertedRange {
                min: min_freq_hz,
                max: max_freq_hz,
            });
        }
        if !(yin_threshold > 0.0 && yin_threshold < 1.0) {
            return Err(ConfigError::ThresholdOutOfRange(yin_threshold));
        }
        if !silence_rms_gate.is_finite() || silence_rms_gate < 0.0 {
            return Err(ConfigError::InvalidSilenceGate(silence_rms_gate));
        }

        let required_lag = sample_rate / min_freq_hz;
        let available = frame_size / 2;
        if required_lag > available as f64 {
            return Err(ConfigError::SearchRangeExceedsFrame {
                frame_size,
                required_lag: required_lag.ceil() as usize,
                available,
            });
        }

        let lags = LagRange::for_frame(frame_size, sample_rate, min_freq_hz, max_freq_hz)
            .ok_or_else(|| ConfigError::EmptyLagRange {
                tau_min: 2.max((sample_rate / max_freq_hz).floor() as usize),
                tau_max: available.min(required_lag.floor() as usize),
            })?;

        tracing::debug!(
            frame_size,
            sample_rate,
            min_freq_hz,
            max_freq_hz,
            tau_min = lags.min,
            tau_max = lags.max,
            "detection config built"
        );

        Ok(Self {
            frame_size,
            sample_rate,
            min_freq_hz,
            max_freq_hz,
            yin_threshold,
            silence_rms_gate,
            lags,
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn min_freq_hz(&self) -> f64 {
        self.min_freq_hz
    }

    pub fn max_freq_hz(&self) -> f64 {
        self.max_freq_hz
    }

    pub fn yin_threshold(&self) -> f64 {
        self.yin_threshold
    }

    pub fn silence_rms_gate(&self) -> f64 {
        self.silence_rms_gate
    }

    /// Lag bounds derived from the frame size, sample rate and frequency range.
    pub fn lag_range(&self) -> LagRange {
        self.lags
    }
}

/// Detection parameters as stored in a settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    pub frame_size: usize,
    pub min_freq_hz: f64,
    pub max_freq_hz: f64,
    pub yin_threshold: f64,
    pub silence_rms_gate: f64,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            frame_size: DEFAULT_FRAME_SIZE,
            min_freq_hz: DEFAULT_MIN_FREQ_HZ,
            max_freq_hz: DEFAULT_MAX_FREQ_HZ,
            yin_threshold: DEFAULT_YIN_THRESHOLD,
            silence_rms_gate: DEFAULT_SILENCE_RMS_GATE,
        }
    }
}

impl DetectionSettings {
    /// Validates these settings against the negotiated sample rate.
    pub fn into_config(self, sample_rate: f64) -> Result<DetectionConfig, ConfigError> {
        DetectionConfig::new(
            self.frame_size,
            sample_rate,
            self.min_freq_hz,
            self.max_freq_hz,
            self.yin_threshold,
            self.silence_rms_gate,
        )
    }
}
