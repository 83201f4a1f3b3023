//! Piano-roll display settings.
//!
//! Settings are plain data owned by the visualizer and mutated from the UI
//! thread. They can be loaded from JSON (validated) or changed at runtime
//! through the visualizer (unvalidated: the caller keeps `low < high`).

use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    APU_CHANNEL_COUNT, DEFAULT_DETECTOR_CHANNEL, DEFAULT_OCTAVE_HIGH, DEFAULT_OCTAVE_LOW,
    DEFAULT_VISIBLE_SECONDS,
};
use crate::{PianoError, Result};

/// Lowest octave number a MIDI note can have.
pub const MIN_OCTAVE: i32 = -1;

/// Highest octave number a MIDI note can have.
pub const MAX_OCTAVE: i32 = 9;

/// Visible history window, displayed octave band and detector routing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PianoSettings {
    /// Seconds of history shown in the piano roll.
    pub visible_seconds: f32,
    /// Lowest displayed octave (its C is the bottom key).
    pub octave_low: i32,
    /// Highest displayed octave (its C is the top key).
    pub octave_high: i32,
    /// Channel that receives detections on the raw-audio path.
    pub detector_channel: usize,
}

impl Default for PianoSettings {
    fn default() -> Self {
        Self {
            visible_seconds: DEFAULT_VISIBLE_SECONDS,
            octave_low: DEFAULT_OCTAVE_LOW,
            octave_high: DEFAULT_OCTAVE_HIGH,
            detector_channel: DEFAULT_DETECTOR_CHANNEL,
        }
    }
}

impl PianoSettings {
    /// Set the visible history length.
    pub fn visible_seconds(mut self, seconds: f32) -> Self {
        self.visible_seconds = seconds;
        self
    }

    /// Set the displayed octave band.
    pub fn octave_range(mut self, low: i32, high: i32) -> Self {
        self.octave_low = low;
        self.octave_high = high;
        self
    }

    /// Route raw-audio detections to another base APU channel.
    pub fn detector_channel(mut self, channel: usize) -> Self {
        self.detector_channel = channel;
        self
    }

    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: PianoSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate settings from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Write settings to a JSON file, replacing any existing one.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }

    /// Check the invariants the renderer relies on.
    pub fn validate(&self) -> Result<()> {
        if !(self.visible_seconds > 0.0 && self.visible_seconds.is_finite()) {
            return Err(PianoError::ConfigError(format!(
                "visible_seconds must be positive, got {}",
                self.visible_seconds
            )));
        }
        if self.octave_low >= self.octave_high {
            return Err(PianoError::ConfigError(format!(
                "octave_low ({}) must be below octave_high ({})",
                self.octave_low, self.octave_high
            )));
        }
        if self.octave_low < MIN_OCTAVE || self.octave_high > MAX_OCTAVE {
            return Err(PianoError::ConfigError(format!(
                "octave range {}..{} outside {MIN_OCTAVE}..{MAX_OCTAVE}",
                self.octave_low, self.octave_high
            )));
        }
        if self.detector_channel >= APU_CHANNEL_COUNT {
            return Err(PianoError::InvalidChannel(self.detector_channel));
        }
        Ok(())
    }

    /// MIDI notes from the C of the low octave to the C of the high octave.
    ///
    /// Clamped to `0..=127`; an inverted range yields an empty band.
    pub fn note_range(&self) -> RangeInclusive<u8> {
        let to_note = |octave: i32| (octave * 12 + 12).clamp(0, 127) as u8;
        to_note(self.octave_low)..=to_note(self.octave_high)
    }

    /// Visible time window ending at `now`.
    pub fn time_window(&self, now: f64) -> (f64, f64) {
        (now - self.visible_seconds as f64, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PianoSettings::default();
        assert_eq!(settings.visible_seconds, 4.0);
        assert_eq!(settings.note_range(), 36..=96);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let settings = PianoSettings::default()
            .visible_seconds(8.0)
            .octave_range(3, 5)
            .detector_channel(0);
        assert_eq!(settings.note_range(), 48..=72);
        assert_eq!(settings.time_window(10.0), (2.0, 10.0));
        assert_eq!(settings.detector_channel, 0);
    }

    #[test]
    fn test_from_json_partial() {
        let settings = PianoSettings::from_json(r#"{ "octave_low": 1 }"#).unwrap();
        assert_eq!(settings.octave_low, 1);
        assert_eq!(settings.octave_high, DEFAULT_OCTAVE_HIGH);
    }

    #[test]
    fn test_from_json_rejects_inverted_octaves() {
        let err = PianoSettings::from_json(r#"{ "octave_low": 6, "octave_high": 6 }"#);
        assert!(matches!(err, Err(PianoError::ConfigError(_))));
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(matches!(
            PianoSettings::from_json(r#"{ "visible_seconds": 0.0 }"#),
            Err(PianoError::ConfigError(_))
        ));
        assert!(matches!(
            PianoSettings::from_json(r#"{ "detector_channel": 6 }"#),
            Err(PianoError::InvalidChannel(6))
        ));
        assert!(matches!(
            PianoSettings::from_json("{ not json"),
            Err(PianoError::Json(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let settings = PianoSettings::default().octave_range(0, 8);
        let json = settings.to_json().unwrap();
        assert_eq!(PianoSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("piano.json");
        let settings = PianoSettings::default().visible_seconds(6.0).octave_range(1, 8);
        settings.save_to_file(&path).unwrap();
        assert_eq!(PianoSettings::from_file(&path).unwrap(), settings);
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = PianoSettings::from_file(dir.path().join("missing.json"));
        assert!(matches!(err, Err(PianoError::Io(_))));
    }

    #[test]
    fn test_from_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{ "octave_low": 7, "octave_high": 2 }"#).unwrap();
        assert!(matches!(
            PianoSettings::from_file(&path),
            Err(PianoError::ConfigError(_))
        ));
    }

    #[test]
    fn test_note_range_clamps() {
        let settings = PianoSettings::default().octave_range(-1, 9);
        assert_eq!(settings.note_range(), 0..=120);
        let wide = PianoSettings::default().octave_range(-3, 12);
        assert_eq!(wide.note_range(), 0..=127);
    }
}
