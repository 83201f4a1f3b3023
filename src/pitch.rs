//! Pitch math: frequency ↔ MIDI note conversion and keyboard classification.
//!
//! All functions are pure. MIDI note 69 is A4 (440 Hz) and MIDI note 60 is
//! C4 (middle C), so octave numbers follow the `note / 12 - 1` convention.
//!
//! # Example
//!
//! ```
//! use apu_piano::pitch::{frequency_to_midi, get_octave, is_black_key, note_name};
//!
//! let note = frequency_to_midi(440.0).unwrap();
//! assert_eq!(note, 69);
//! assert_eq!(get_octave(note), 4);
//! assert_eq!(note_name(note), "A4");
//! assert!(!is_black_key(note));
//! ```

/// Reference pitch of A4 in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// MIDI note number of A4.
pub const A4_MIDI_NOTE: i32 = 69;

/// Highest valid MIDI note number.
pub const MIDI_NOTE_MAX: u8 = 127;

/// Number of white keys preceding each pitch class within an octave.
const WHITE_KEY_OFFSETS: [usize; 12] = [0, 0, 1, 1, 2, 3, 3, 4, 4, 5, 5, 6];

static NOTE_NAMES: [&str; 128] = [
    "C-1", "C#-1", "D-1", "D#-1", "E-1", "F-1", "F#-1", "G-1", "G#-1", "A-1", "A#-1", "B-1", "C0",
    "C#0", "D0", "D#0", "E0", "F0", "F#0", "G0", "G#0", "A0", "A#0", "B0", "C1", "C#1", "D1",
    "D#1", "E1", "F1", "F#1", "G1", "G#1", "A1", "A#1", "B1", "C2", "C#2", "D2", "D#2", "E2",
    "F2", "F#2", "G2", "G#2", "A2", "A#2", "B2", "C3", "C#3", "D3", "D#3", "E3", "F3", "F#3",
    "G3", "G#3", "A3", "A#3", "B3", "C4", "C#4", "D4", "D#4", "E4", "F4", "F#4", "G4", "G#4",
    "A4", "A#4", "B4", "C5", "C#5", "D5", "D#5", "E5", "F5", "F#5", "G5", "G#5", "A5", "A#5",
    "B5", "C6", "C#6", "D6", "D#6", "E6", "F6", "F#6", "G6", "G#6", "A6", "A#6", "B6", "C7",
    "C#7", "D7", "D#7", "E7", "F7", "F#7", "G7", "G#7", "A7", "A#7", "B7", "C8", "C#8", "D8",
    "D#8", "E8", "F8", "F#8", "G8", "G#8", "A8", "A#8", "B8", "C9", "C#9", "D9", "D#9", "E9",
    "F9", "F#9", "G9",
];

/// Quantize a frequency to the nearest MIDI note.
///
/// Returns `None` for non-positive (or NaN) frequencies and for frequencies
/// whose nearest note falls outside `0..=127`. Ties round away from zero.
pub fn frequency_to_midi(freq: f32) -> Option<u8> {
    if freq.is_nan() || freq <= 0.0 {
        return None;
    }

    // n = 12 * log2(f / 440) + 69
    let midi_float = A4_MIDI_NOTE as f32 + 12.0 * (freq / A4_FREQUENCY).log2();
    let midi = midi_float.round() as i32;

    if !(0..=MIDI_NOTE_MAX as i32).contains(&midi) {
        return None;
    }
    Some(midi as u8)
}

/// Frequency in Hz of a MIDI note (equal temperament, A4 = 440 Hz).
#[inline]
pub fn midi_to_frequency(note: u8) -> f32 {
    A4_FREQUENCY * 2.0_f32.powf((note as i32 - A4_MIDI_NOTE) as f32 / 12.0)
}

/// Whether the note sits on a black key (C#, D#, F#, G#, A#).
#[inline]
pub fn is_black_key(note: u8) -> bool {
    matches!(note % 12, 1 | 3 | 6 | 8 | 10)
}

/// Octave number of a note, with MIDI 60 in octave 4.
#[inline]
pub fn get_octave(note: u8) -> i32 {
    note as i32 / 12 - 1
}

/// Pitch class of a note (0 = C … 11 = B).
#[inline]
pub fn get_note_in_octave(note: u8) -> u8 {
    note % 12
}

/// Index of the note among all white keys from MIDI 0.
///
/// Black keys share the index of the white key directly below them.
#[inline]
pub fn white_key_index(note: u8) -> usize {
    (note as usize / 12) * 7 + WHITE_KEY_OFFSETS[(note % 12) as usize]
}

/// Human-readable note name ("C4", "A#5", ...).
pub fn note_name(note: u8) -> &'static str {
    NOTE_NAMES
        .get(note as usize)
        .copied()
        .unwrap_or("---")
}
