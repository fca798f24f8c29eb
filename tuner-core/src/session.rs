//! # Session Controller
//!
//! Composes the signal gate, the pitch estimator, the note mapper and the
//! tuning matcher into the per-frame entry point used by a capture loop.
//!
//! A session holds only read-only configuration. Each call to
//! [`Session::process_frame`] is independent, so a session can be shared by
//! reference across threads and the same frame always gives the same result.

use crate::config::DetectionConfig;
use crate::error::FrameError;
use crate::tuning::Tuning;
use crate::{TuningReading, gate, note, pitch};

/// One detection config and one active tuning, fixed for the session.
#[derive(Debug, Clone)]
pub struct Session {
    config: DetectionConfig,
    tuning: Tuning,
}

impl Session {
    pub fn new(config: DetectionConfig, tuning: Tuning) -> Self {
        tracing::debug!(
            frame_size = config.frame_size(),
            sample_rate = config.sample_rate(),
            targets = tuning.len(),
            "tuner session created"
        );
        Self { config, tuning }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Analyses one frame captured at the session's sample rate.
    ///
    /// # Returns
    /// * `Ok(Some(reading))` - A pitch was found and matched
    /// * `Ok(None)` - Too quiet, or no confident pitch in range
    /// * `Err(FrameError)` - The frame breaks the configured contract
    pub fn process_frame(&self, samples: &[f32]) -> Result<Option<TuningReading>, FrameError> {
        process_frame(&self.config, &self.tuning, samples, self.config.sample_rate())
    }
}

/// Runs the full pipeline on one frame: validation, gate, YIN, note and
/// target matching.
///
/// The frame is only read and is not retained after the call. Samples are
/// widened to `f64` for all arithmetic.
pub fn process_frame(
    config: &DetectionConfig,
    tuning: &Tuning,
    samples: &[f32],
    sample_rate: f64,
) -> Result<Option<TuningReading>, FrameError> {
    if samples.len() != config.frame_size() {
        return Err(FrameError::LengthMismatch {
            expected: config.frame_size(),
            actual: samples.len(),
        });
    }
    if sample_rate != config.sample_rate() {
        return Err(FrameError::SampleRateMismatch {
            expected: config.sample_rate(),
            actual: sample_rate,
        });
    }
    if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
        return Err(FrameError::NonFiniteSample { index });
    }

    if !gate::is_loud_enough(samples, config.silence_rms_gate()) {
        tracing::trace!("frame below silence gate");
        return Ok(None);
    }

    let Some(frequency_hz) = pitch::estimate_pitch_in_range(
        samples,
        sample_rate,
        config.lag_range(),
        config.yin_threshold(),
    ) else {
        tracing::trace!("no pitch found in frame");
        return Ok(None);
    };

    // Both lookups only fail on non-positive or non-finite input, which the
    // estimator never returns; treat a failure as "no reading" all the same.
    let (Some(note), Some(nearest)) = (
        note::frequency_to_note(frequency_hz),
        tuning.nearest(frequency_hz),
    ) else {
        return Ok(None);
    };

    Ok(Some(TuningReading {
        frequency_hz,
        note_name: note.name,
        midi_number: note.midi,
        nearest_target: nearest.target.clone(),
        cents_deviation: nearest.cents,
    }))
}
