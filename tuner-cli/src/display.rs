//! # Cent Meter
//!
//! One-line text rendering of a tuning reading: note, frequency, target,
//! cents and a needle on a ±50 cent scale.

use yin_tuner_core::TuningReading;

/// Below this deviation the needle is "close" even if not yet in tune.
const CLOSE_CENTS: f64 = 20.0;

/// Accuracy zone of a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    InTune,
    Close,
    Off,
}

impl Zone {
    pub fn of(reading: &TuningReading, in_tune_cents: f64) -> Self {
        if reading.is_in_tune(in_tune_cents) {
            Zone::InTune
        } else if reading.cents_deviation.abs() < CLOSE_CENTS {
            Zone::Close
        } else {
            Zone::Off
        }
    }

    fn label(self) -> &'static str {
        match self {
            Zone::InTune => "OK",
            Zone::Close => "~",
            Zone::Off => "!",
        }
    }
}

/// Draws the meter bar: `-` scale, `|` at the centre, `*` for the needle.
pub fn meter(reading: &TuningReading, width: usize) -> String {
    let last = width.saturating_sub(1);
    let center = last / 2;
    let needle = (reading.meter_position() * last as f64).round() as usize;

    (0..width)
        .map(|i| {
            if i == needle {
                '*'
            } else if i == center {
                '|'
            } else {
                '-'
            }
        })
        .collect()
}

pub fn render_line(reading: &TuningReading, in_tune_cents: f64, width: usize) -> String {
    format!(
        "{reading}  [{}] {}",
        meter(reading, width),
        Zone::of(reading, in_tune_cents).label()
    )
}
