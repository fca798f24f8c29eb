//! # Musical Tuning Module
//!
//! This module holds the tunings a reading is matched against and the cent
//! arithmetic used to report how far a frequency is from its target.
//!
//! ## Features
//! - Ordered, validated tunings of named target frequencies
//! - Built-in presets: standard guitar, drop D, 88-key piano (A0 to C8)
//! - Nearest-target matching with signed cent deviation
//! - Serde support that re-validates tunings on load

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::note::{midi_to_frequency, note_name};

/// A single named frequency a string or key is tuned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningTarget {
    /// Display name (e.g., "E2", "A2")
    pub name: String,
    /// Target frequency in Hz
    pub frequency_hz: f64,
}

impl TuningTarget {
    pub fn new(name: impl Into<String>, frequency_hz: f64) -> Self {
        Self {
            name: name.into(),
            frequency_hz,
        }
    }
}

impl std::fmt::Display for TuningTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.2} Hz)", self.name, self.frequency_hz)
    }
}

/// An ordered, non-empty set of tuning targets.
///
/// Order matters: when two targets are equally close to a frequency, the
/// earlier one wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TuningTarget>", into = "Vec<TuningTarget>")]
pub struct Tuning {
    targets: Vec<TuningTarget>,
}

/// The target closest to a frequency and the signed distance to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetMatch<'a> {
    pub target: &'a TuningTarget,
    /// Positive when sharp, negative when flat
    pub cents: f64,
}

/// Standard 6-string guitar tuning, low to high.
static STANDARD_GUITAR: Lazy<Tuning> = Lazy::new(|| {
    Tuning::from_table(&[
        ("E2", 82.41),
        ("A2", 110.00),
        ("D3", 146.83),
        ("G3", 196.00),
        ("B3", 246.94),
        ("E4", 329.63),
    ])
});

/// Standard tuning with the low E dropped a whole tone.
static DROP_D: Lazy<Tuning> = Lazy::new(|| {
    Tuning::from_table(&[
        ("D2", 73.42),
        ("A2", 110.00),
        ("D3", 146.83),
        ("G3", 196.00),
        ("B3", 246.94),
        ("E4", 329.63),
    ])
});

/// The 88 keys of a standard piano (A0 to C8), equal-tempered from A4 = 440 Hz.
static PIANO: Lazy<Tuning> = Lazy::new(|| {
    // A0 is MIDI 21 and C8 is MIDI 108.
    let targets = (21..=108)
        .map(|midi| TuningTarget::new(note_name(midi), midi_to_frequency(midi)))
        .collect();
    Tuning { targets }
});

impl Tuning {
    /// Builds a tuning from an ordered list of targets.
    ///
    /// # Returns
    /// * `Ok(tuning)` - Every target has a positive, finite frequency
    /// * `Err(ConfigError::EmptyTuning)` - No targets were given
    /// * `Err(ConfigError::InvalidTargetFrequency)` - A target frequency is
    ///   zero, negative or not finite
    pub fn new(targets: Vec<TuningTarget>) -> Result<Self, ConfigError> {
        if targets.is_empty() {
            return Err(ConfigError::EmptyTuning);
        }
        if let Some(bad) = targets
            .iter()
            .find(|t| !t.frequency_hz.is_finite() || t.frequency_hz <= 0.0)
        {
            return Err(ConfigError::InvalidTargetFrequency {
                name: bad.name.clone(),
                value: bad.frequency_hz,
            });
        }

        let mut seen = BTreeSet::new();
        for target in &targets {
            if !seen.insert(target.name.as_str()) {
                tracing::warn!(name = %target.name, "tuning contains a duplicate target name");
            }
        }

        Ok(Self { targets })
    }

    fn from_table(table: &[(&str, f64)]) -> Self {
        let targets = table
            .iter()
            .map(|&(name, freq)| TuningTarget::new(name, freq))
            .collect();
        Self { targets }
    }

    /// The default tuning: standard 6-string guitar, E2 A2 D3 G3 B3 E4.
    pub fn standard_guitar() -> Self {
        STANDARD_GUITAR.clone()
    }

    pub fn drop_d() -> Self {
        DROP_D.clone()
    }

    pub fn piano() -> Self {
        PIANO.clone()
    }

    pub fn targets(&self) -> &[TuningTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Always `false` for a constructed tuning.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Finds the target closest to `freq_hz` in cents.
    ///
    /// Scans in tuning order and only replaces the current best on a strictly
    /// smaller absolute deviation, so ties keep the earlier target.
    ///
    /// # Returns
    /// * `Some(match)` - Closest target and signed cents (positive = sharp)
    /// * `None` - `freq_hz` is non-positive or not finite
    pub fn nearest(&self, freq_hz: f64) -> Option<TargetMatch<'_>> {
        if !freq_hz.is_finite() || freq_hz <= 0.0 {
            return None;
        }

        let mut best: Option<TargetMatch<'_>> = None;
        for target in &self.targets {
            let cents = calculate_cents_deviation(freq_hz, target.frequency_hz);
            if best.is_none_or(|b| cents.abs() < b.cents.abs()) {
                best = Some(TargetMatch { target, cents });
            }
        }
        best
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self::standard_guitar()
    }
}

impl TryFrom<Vec<TuningTarget>> for Tuning {
    type Error = ConfigError;

    fn try_from(targets: Vec<TuningTarget>) -> Result<Self, Self::Error> {
        Self::new(targets)
    }
}

impl From<Tuning> for Vec<TuningTarget> {
    fn from(tuning: Tuning) -> Self {
        tuning.targets
    }
}

/// The built-in tunings, selectable by name in settings files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningPreset {
    #[default]
    StandardGuitar,
    DropD,
    Piano,
}

impl TuningPreset {
    pub fn tuning(self) -> Tuning {
        match self {
            TuningPreset::StandardGuitar => Tuning::standard_guitar(),
            TuningPreset::DropD => Tuning::drop_d(),
            TuningPreset::Piano => Tuning::piano(),
        }
    }
}

/// Free-function form of [`Tuning::nearest`].
pub fn nearest_target(freq_hz: f64, tuning: &Tuning) -> Option<TargetMatch<'_>> {
    tuning.nearest(freq_hz)
}

/// Calculates the deviation from a target frequency in cents.
///
/// Cents are a logarithmic unit of pitch measurement where:
/// - 100 cents = 1 semitone
/// - 1200 cents = 1 octave
/// - Positive values indicate sharpness, negative values indicate flatness
///
/// # Arguments
/// * `freq` - Measured frequency in Hz
/// * `target_freq` - Target frequency in Hz
pub fn calculate_cents_deviation(freq: f64, target_freq: f64) -> f64 {
    1200.0 * (freq / target_freq).log2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn standard_tuning_a_string_is_exact() {
        let tuning = Tuning::standard_guitar();
        let m = tuning.nearest(110.0).unwrap();
        assert_eq!(m.target.name, "A2");
        assert_abs_diff_eq!(m.cents, 0.0, epsilon = 0.1);
    }

    #[test]
    fn sharp_a_string_reports_positive_cents() {
        let tuning = Tuning::standard_guitar();
        let m = nearest_target(113.0, &tuning).unwrap();
        assert_eq!(m.target.name, "A2");
        assert_abs_diff_eq!(m.cents, 46.58, epsilon = 0.1);
    }

    #[test]
    fn flat_low_e_reports_negative_cents() {
        let m = Tuning::standard_guitar().nearest(80.0).map(|m| (m.target.name.clone(), m.cents));
        let (name, cents) = m.unwrap();
        assert_eq!(name, "E2");
        assert!(cents < -50.0);
    }

    #[test]
    fn cents_increase_with_frequency() {
        let mut previous = f64::NEG_INFINITY;
        for step in 0..200 {
            let freq = 100.0 + step as f64 * 0.1;
            let cents = calculate_cents_deviation(freq, 110.0);
            assert!(cents > previous, "cents not increasing at {freq} Hz");
            previous = cents;
        }
    }

    #[test]
    fn octave_is_twelve_hundred_cents() {
        assert_eq!(calculate_cents_deviation(220.0, 110.0), 1200.0);
        assert_eq!(calculate_cents_deviation(55.0, 110.0), -1200.0);
    }

    #[test]
    fn ties_keep_the_earlier_target() {
        let tuning = Tuning::new(vec![
            TuningTarget::new("low", 100.0),
            TuningTarget::new("high", 400.0),
        ])
        .unwrap();
        // 200 Hz is exactly one octave from both.
        assert_eq!(tuning.nearest(200.0).unwrap().target.name, "low");

        let reversed = Tuning::new(vec![
            TuningTarget::new("high", 400.0),
            TuningTarget::new("low", 100.0),
        ])
        .unwrap();
        assert_eq!(reversed.nearest(200.0).unwrap().target.name, "high");
    }

    #[test]
    fn duplicate_frequencies_keep_first_name() {
        let tuning = Tuning::new(vec![
            TuningTarget::new("first", 110.0),
            TuningTarget::new("second", 110.0),
        ])
        .unwrap();
        assert_eq!(tuning.nearest(111.0).unwrap().target.name, "first");
    }

    #[test]
    fn nearest_rejects_invalid_frequency() {
        let tuning = Tuning::standard_guitar();
        assert!(tuning.nearest(0.0).is_none());
        assert!(tuning.nearest(-1.0).is_none());
        assert!(tuning.nearest(f64::NAN).is_none());
    }

    #[test]
    fn construction_is_validated() {
        assert_eq!(Tuning::new(vec![]), Err(ConfigError::EmptyTuning));
        assert_eq!(
            Tuning::new(vec![TuningTarget::new("E2", 82.41), TuningTarget::new("bad", 0.0)]),
            Err(ConfigError::InvalidTargetFrequency {
                name: "bad".to_string(),
                value: 0.0
            })
        );
        assert!(Tuning::new(vec![TuningTarget::new("nan", f64::NAN)]).is_err());
    }

    #[test]
    fn piano_spans_eighty_eight_keys() {
        let piano = Tuning::piano();
        assert_eq!(piano.len(), 88);
        assert_eq!(piano.targets()[0].name, "A0");
        assert_abs_diff_eq!(piano.targets()[0].frequency_hz, 27.5, epsilon = 1e-9);
        assert_eq!(piano.targets()[87].name, "C8");
        assert_eq!(piano.nearest(441.0).unwrap().target.name, "A4");
    }

    #[test]
    fn presets_resolve() {
        assert_eq!(TuningPreset::default().tuning(), Tuning::standard_guitar());
        assert_eq!(TuningPreset::DropD.tuning().targets()[0].name, "D2");
        assert_eq!(Tuning::default().len(), 6);
    }

    #[test]
    fn target_display() {
        assert_eq!(TuningTarget::new("A2", 110.0).to_string(), "A2 (110.00 Hz)");
    }
}
