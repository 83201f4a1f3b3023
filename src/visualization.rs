//! Renderer-facing helpers for the keyboard and the piano roll.
//!
//! Everything here is pure data computed from visualizer snapshots, so any
//! frontend (terminal, immediate-mode GUI, web) can draw it without touching
//! the tracker.
//!
//! # Example
//!
//! ```
//! use apu_piano::visualization::{key_owners, KeyboardLayout};
//! use apu_piano::PianoVisualizer;
//!
//! let piano = PianoVisualizer::new();
//! piano.update_from_frequencies(&[440.0, 0.0, 0.0, 0.0, 0.0], &[1.0; 5], 0.0);
//!
//! let layout = KeyboardLayout::new(2, 7);
//! let owners = key_owners(&piano.snapshot());
//! let pressed: Vec<u8> = layout
//!     .keys()
//!     .iter()
//!     .filter(|k| owners[k.midi_note as usize].is_some())
//!     .map(|k| k.midi_note)
//!     .collect();
//! assert_eq!(pressed, vec![69]);
//! ```

use crate::piano_roll::NoteEvent;
use crate::pitch::{is_black_key, white_key_index};
use crate::settings::PianoSettings;
use crate::tracker::NoteState;

/// One key of an on-screen keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    /// MIDI note number.
    pub midi_note: u8,
    /// Whether the key is a sharp/flat.
    pub is_black: bool,
    /// Slot among the layout's white keys. Black keys report the slot of the
    /// white key to their left.
    pub white_slot: usize,
}

/// Keys from the C of the low octave to the C of the high octave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardLayout {
    keys: Vec<Key>,
}

impl KeyboardLayout {
    /// Build the layout for an octave band (see [`PianoSettings::note_range`]).
    pub fn new(octave_low: i32, octave_high: i32) -> Self {
        let range = PianoSettings::default()
            .octave_range(octave_low, octave_high)
            .note_range();
        let first_white = white_key_index(*range.start());
        let keys = range
            .map(|midi_note| Key {
                midi_note,
                is_black: is_black_key(midi_note),
                white_slot: white_key_index(midi_note) - first_white,
            })
            .collect();
        Self { keys }
    }

    /// Layout for the settings' octave band.
    pub fn from_settings(settings: &PianoSettings) -> Self {
        Self::new(settings.octave_low, settings.octave_high)
    }

    /// All keys, lowest first.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Number of white keys.
    pub fn white_key_count(&self) -> usize {
        self.keys.iter().filter(|k| !k.is_black).count()
    }
}

/// Which channel is pressing a key, and how hard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyPress {
    /// Channel index.
    pub channel: usize,
    /// Velocity of that channel (0.0-1.0).
    pub velocity: f32,
}

/// Map every MIDI note to the active channel pressing it.
///
/// When several channels sound the same note the first one wins unless a
/// later one is strictly louder.
pub fn key_owners(states: &[NoteState]) -> [Option<KeyPress>; 128] {
    let mut owners = [None; 128];
    for state in states.iter().filter(|s| s.active) {
        let Some(note) = state.midi_note else {
            continue;
        };
        let Some(slot) = owners.get_mut(note as usize) else {
            continue;
        };
        let louder = match slot {
            Some(KeyPress { velocity, .. }) => state.velocity > *velocity,
            None => true,
        };
        if louder {
            *slot = Some(KeyPress {
                channel: state.channel,
                velocity: state.velocity,
            });
        }
    }
    owners
}

/// Screen-independent geometry of one piano-roll bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollBar {
    /// Left edge, 0.0 at the window start and 1.0 at `now`.
    pub x0: f32,
    /// Right edge on the same scale.
    pub x1: f32,
    /// Row counted down from the top note of the displayed band.
    pub row: usize,
    /// Channel that played the note (selects the colour).
    pub channel: usize,
    /// Onset velocity.
    pub velocity: f32,
}

/// Lay out visible events as bars inside the settings' time window.
///
/// Events outside the octave band are skipped, and bars that collapse to zero
/// width after clamping are dropped.
pub fn roll_bars(events: &[NoteEvent], settings: &PianoSettings, now: f64) -> Vec<RollBar> {
    let (start, _) = settings.time_window(now);
    let span = settings.visible_seconds as f64;
    if span <= 0.0 {
        return Vec::new();
    }
    let notes = settings.note_range();
    let top = *notes.end();
    let to_x = |t: f64| ((t - start) / span).clamp(0.0, 1.0) as f32;

    events
        .iter()
        .filter(|e| notes.contains(&e.midi_note))
        .filter_map(|e| {
            let x0 = to_x(e.start_time);
            let x1 = to_x(e.end_time(now));
            (x1 > x0).then(|| RollBar {
                x0,
                x1,
                row: usize::from(top - e.midi_note),
                channel: e.channel,
                velocity: e.velocity,
            })
        })
        .collect()
}

/// Fixed-width terminal bar of `█` blocks for a velocity (clamped to 0-1).
pub fn velocity_bar(velocity: f32, width: usize) -> String {
    let normalized = velocity.clamp(0.0, 1.0);
    let blocks = ((normalized * width as f32) as usize).min(width);
    format!("{}{}", "█".repeat(blocks), " ".repeat(width - blocks))
}
