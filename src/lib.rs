//! NES APU Piano Visualizer Core
//!
//! Turns NES sound telemetry into discrete note events for a piano keyboard
//! and piano-roll display. Telemetry arrives from the audio thread as raw
//! 2A03 oscillator state, per-channel frequencies, or mixed PCM; a UI thread
//! reads snapshots and the bounded note history concurrently.
//!
//! # Features
//! - Frequency ↔ MIDI quantization and keyboard classification
//! - Per-voice register decoding for pulse, triangle, noise and DMC
//! - Optional Konami VRC6 expansion bank (two pulses and a sawtooth)
//! - Autocorrelation pitch detection for raw stereo PCM
//! - Onset/offset tracking into a capacity-bounded event log
//! - Thread-safe façade with JSON-loadable display settings
//!
//! # Crate feature flags
//! - `visualization` (default): renderer data helpers (`visualization`)
//!
//! # Quick start
//! ```
//! use apu_piano::{PianoVisualizer, VoiceRegisters};
//!
//! let piano = PianoVisualizer::new();
//! let mut regs = [VoiceRegisters::default(); 5];
//! regs[2] = VoiceRegisters::new(855, 1, 15); // triangle, ~130.7 Hz
//! piano.update_from_apu(&regs, 0.0);
//!
//! let tri = piano.snapshot()[2];
//! assert_eq!(tri.midi_note, Some(48));
//! assert!(tri.active);
//! ```
//!
//! ## Settings from JSON
//! ```
//! use apu_piano::{PianoSettings, PianoVisualizer};
//!
//! let settings = PianoSettings::from_json(r#"{ "octave_low": 3, "octave_high": 6 }"#).unwrap();
//! let piano = PianoVisualizer::with_settings(settings);
//! assert_eq!(piano.settings().note_range(), 48..=84);
//! ```

#![warn(missing_docs)]

pub mod channel; // Voice table
pub mod constants;
pub mod decoder; // Register → note decoding
pub mod piano_roll; // Event log
pub mod pitch;
pub mod pitch_detect; // Raw-audio path
pub mod settings;
pub mod tracker; // Onset/offset state machine
#[cfg(feature = "visualization")]
pub mod visualization; // Renderer helpers
pub mod visualizer; // Thread-safe façade

/// Error types for piano visualizer operations
#[derive(thiserror::Error, Debug)]
pub enum PianoError {
    /// IO error while reading or writing a settings file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Channel index outside the supported range
    #[error("Invalid channel index: {0}")]
    InvalidChannel(usize),

    /// Malformed settings document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for visualizer operations
pub type Result<T> = std::result::Result<T, PianoError>;

// Public API exports
pub use channel::{channel_info, ChannelInfo, ChannelKind, CHANNELS};
pub use decoder::{decode_apu, decode_vrc6, DecodedVoice, VoiceRegisters, Vrc6Registers};
pub use piano_roll::{NoteEvent, PianoRoll, RollQuery};
pub use pitch::{
    frequency_to_midi, get_note_in_octave, get_octave, is_black_key, midi_to_frequency, note_name,
};
pub use pitch_detect::{detect_frequency, detect_pitch, PitchEstimate};
pub use settings::PianoSettings;
pub use tracker::{NoteState, NoteTracker};
#[cfg(feature = "visualization")]
pub use visualization::{key_owners, roll_bars, velocity_bar, KeyboardLayout, RollBar};
pub use visualizer::{ApuFrame, PianoVisualizer};
