//! Settings file for the terminal tuner.
//!
//! Settings are stored as pretty-printed JSON. Every field has a default, so
//! a file only needs the values it changes.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use yin_tuner_core::{DEFAULT_IN_TUNE_CENTS, DetectionSettings, Tuning, TuningPreset};

/// Smallest frame the detector accepts.
pub const MIN_FRAME_SIZE: usize = 4;
/// Largest frame accepted from a settings file, about 24 s at 44.1 kHz.
pub const MAX_FRAME_SIZE: usize = 1 << 20;

/// Width of the text meter in characters when not configured.
pub const DEFAULT_METER_WIDTH: usize = 41;

/// Which tuning to match readings against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningChoice {
    Preset(TuningPreset),
    Custom(Tuning),
}

impl Default for TuningChoice {
    fn default() -> Self {
        TuningChoice::Preset(TuningPreset::default())
    }
}

impl TuningChoice {
    pub fn tuning(&self) -> Tuning {
        match self {
            TuningChoice::Preset(preset) => preset.tuning(),
            TuningChoice::Custom(tuning) => tuning.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerSettings {
    pub detection: DetectionSettings,
    pub tuning: TuningChoice,
    /// Deviation in cents still shown as in tune.
    pub in_tune_cents: f64,
    pub meter_width: usize,
}

impl Default for TunerSettings {
    fn default() -> Self {
        Self {
            detection: DetectionSettings::default(),
            tuning: TuningChoice::default(),
            in_tune_cents: DEFAULT_IN_TUNE_CENTS,
            meter_width: DEFAULT_METER_WIDTH,
        }
    }
}

impl TunerSettings {
    /// Checks the values the core does not validate itself.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&self.detection.frame_size),
            "frame_size must be between {MIN_FRAME_SIZE} and {MAX_FRAME_SIZE}, got {}",
            self.detection.frame_size
        );
        ensure!(
            self.in_tune_cents.is_finite() && self.in_tune_cents > 0.0,
            "in_tune_cents must be positive, got {}",
            self.in_tune_cents
        );
        ensure!(
            self.meter_width >= 3,
            "meter_width must be at least 3, got {}",
            self.meter_width
        );
        Ok(())
    }
}

/// Saves the settings to a JSON file.
pub fn save_settings(settings: &TunerSettings, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(settings)?;
    fs::write(path, json_string)
        .with_context(|| format!("writing settings to {}", path.display()))?;
    Ok(())
}

/// Loads and validates settings from a JSON file.
pub fn load_settings(path: &Path) -> Result<TunerSettings> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading settings from {}", path.display()))?;
    let settings: TunerSettings = serde_json::from_str(&data)
        .with_context(|| format!("parsing settings in {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("yin-tuner-{tag}-{}.json", std::process::id()))
    }

    #[test]
    fn empty_object_gives_defaults() {
        let settings: TunerSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, TunerSettings::default());
        assert_eq!(settings.tuning.tuning(), Tuning::standard_guitar());
    }

    #[test]
    fn preset_is_selected_by_name() {
        let settings: TunerSettings =
            serde_json::from_str(r#"{"tuning": {"preset": "drop_d"}}"#).unwrap();
        assert_eq!(settings.tuning, TuningChoice::Preset(TuningPreset::DropD));
    }

    #[test]
    fn custom_tuning_is_validated() {
        let settings: TunerSettings = serde_json::from_str(
            r#"{"tuning": {"custom": [{"name": "C2", "frequency_hz": 65.41}]}}"#,
        )
        .unwrap();
        assert_eq!(settings.tuning.tuning().targets()[0].name, "C2");

        assert!(serde_json::from_str::<TunerSettings>(r#"{"tuning": {"custom": []}}"#).is_err());
    }

    #[test]
    fn file_round_trip() {
        let path = temp_path("round-trip");
        let mut settings = TunerSettings::default();
        settings.detection.min_freq_hz = 60.0;
        settings.in_tune_cents = 3.0;

        save_settings(&settings, &path).unwrap();
        let loaded = load_settings(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn invalid_tolerance_is_rejected() {
        let settings = TunerSettings {
            in_tune_cents: 0.0,
            ..TunerSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn zero_frame_size_is_rejected_on_load() {
        let path = temp_path("zero-frame");
        fs::write(&path, r#"{"detection": {"frame_size": 0}}"#).unwrap();
        let result = load_settings(&path);
        fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("frame_size"), "{err}");
    }

    #[test]
    fn oversized_frame_size_is_rejected() {
        let mut settings = TunerSettings::default();
        settings.detection.frame_size = usize::MAX;
        assert!(settings.validate().is_err());

        settings.detection.frame_size = MIN_FRAME_SIZE;
        assert!(settings.validate().is_ok());
    }
}
