// tuner-core/src/lib.rs

//! The core logic for the monophonic string tuner.
//! This crate is responsible for loudness gating, YIN pitch detection,
//! note naming and matching against a tuning. It is completely headless
//! and contains no audio-device or display code.

pub mod config;
pub mod error;
pub mod gate;
pub mod note;
pub mod pitch;
pub mod session;
pub mod tuning;

pub use config::{DetectionConfig, DetectionSettings};
pub use error::{ConfigError, FrameError};
pub use session::{Session, process_frame};
pub use tuning::{Tuning, TuningPreset, TuningTarget};

/// Tolerance, in cents, within which a string counts as in tune.
pub const DEFAULT_IN_TUNE_CENTS: f64 = 5.0;

/// Half-width of the tuning meter in cents. Deviations beyond it pin the needle.
pub const METER_RANGE_CENTS: f64 = 50.0;

/// Represents the result of a single analysed frame that produced a pitch.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningReading {
    /// The detected fundamental frequency in Hz.
    pub frequency_hz: f64,
    /// The name of the nearest equal-tempered note (e.g., "A2").
    pub note_name: String,
    /// MIDI number of that note.
    pub midi_number: i32,
    /// The closest target of the active tuning.
    pub nearest_target: TuningTarget,
    /// The deviation from `nearest_target` in cents (positive = sharp).
    pub cents_deviation: f64,
}

impl TuningReading {
    pub fn is_in_tune(&self, tolerance_cents: f64) -> bool {
        self.cents_deviation.abs() <= tolerance_cents
    }

    /// Needle position on a ±50 cent meter, from 0.0 (flat) to 1.0 (sharp).
    pub fn meter_position(&self) -> f64 {
        let clamped = self
            .cents_deviation
            .clamp(-METER_RANGE_CENTS, METER_RANGE_CENTS);
        (clamped + METER_RANGE_CENTS) / (2.0 * METER_RANGE_CENTS)
    }
}

impl std::fmt::Display for TuningReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}  {:.2} Hz  target {}  {:+.1} cents",
            self.note_name, self.frequency_hz, self.nearest_target, self.cents_deviation
        )
    }
}
