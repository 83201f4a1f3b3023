//! Channel decoding from raw APU/VRC6 oscillator state.
//!
//! This module turns the `(period, length, amplitude)` triple reported by an
//! APU emulator into a `(note, velocity)` pair, using the decode rules of each
//! [`ChannelKind`]. Silence is never an error: a muted, uninitialised or
//! ultrasonic voice simply decodes to [`DecodedVoice::SILENT`].
//!
//! # Example
//!
//! ```
//! use apu_piano::channel::CHANNELS;
//! use apu_piano::decoder::{decode_voice, VoiceRegisters};
//!
//! // Pulse 1, period 253 ≈ 440 Hz at full volume
//! let voice = decode_voice(CHANNELS[0].kind, VoiceRegisters::new(253, 10, 15));
//! assert_eq!(voice.midi_note, Some(69));
//! assert_eq!(voice.velocity, 1.0);
//! ```

use crate::channel::{ChannelKind, MelodicVoice, CHANNELS};
use crate::constants::{
    APU_CHANNEL_COUNT, MIN_AUDIBLE_PERIOD, MIN_DECODED_VELOCITY, NES_CPU_CLOCK,
    VRC6_CHANNEL_BASE, VRC6_CHANNEL_COUNT,
};
use crate::pitch::frequency_to_midi;

/// Oscillator state of one voice as reported by the emulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoiceRegisters {
    /// Timer period in CPU cycles (noise: the 4-bit period selector).
    pub period: i32,
    /// Length counter; zero means the voice is silenced.
    pub length: i32,
    /// Current output amplitude. May be negative; only the magnitude is used.
    pub amplitude: i32,
}

impl VoiceRegisters {
    /// Create a register triple.
    pub const fn new(period: i32, length: i32, amplitude: i32) -> Self {
        Self {
            period,
            length,
            amplitude,
        }
    }
}

/// Oscillator state of one VRC6 voice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vrc6Registers {
    /// 12-bit timer period.
    pub period: i32,
    /// Volume (pulse: 0-15, sawtooth accumulator rate: 0-63).
    pub volume: i32,
    /// Channel enable bit.
    pub enabled: bool,
}

impl Vrc6Registers {
    /// Create a VRC6 register triple.
    pub const fn new(period: i32, volume: i32, enabled: bool) -> Self {
        Self {
            period,
            volume,
            enabled,
        }
    }
}

impl From<Vrc6Registers> for VoiceRegisters {
    /// The enable bit plays the role of the length counter.
    fn from(regs: Vrc6Registers) -> Self {
        VoiceRegisters::new(regs.period, i32::from(regs.enabled), regs.volume)
    }
}

/// Result of decoding one voice.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecodedVoice {
    /// Output frequency in Hz for period-driven voices.
    pub frequency_hz: Option<f32>,
    /// Quantized MIDI note, `None` when silent.
    pub midi_note: Option<u8>,
    /// Normalized loudness (0.0-1.0).
    pub velocity: f32,
}

impl DecodedVoice {
    /// A voice producing no note.
    pub const SILENT: DecodedVoice = DecodedVoice {
        frequency_hz: None,
        midi_note: None,
        velocity: 0.0,
    };

    /// Whether the voice decodes to "no note".
    #[inline]
    pub fn is_silent(&self) -> bool {
        self.midi_note.is_none()
    }
}

/// Frequency produced by a melodic voice at the given period.
#[inline]
pub fn melodic_frequency(voice: MelodicVoice, period: i32, cpu_clock: f32) -> f32 {
    cpu_clock / (voice.divider * (period as f32 + 1.0))
}

/// Decode one voice using the NTSC CPU clock.
pub fn decode_voice(kind: ChannelKind, regs: VoiceRegisters) -> DecodedVoice {
    decode_voice_with_clock(kind, regs, NES_CPU_CLOCK)
}

/// Decode one voice with a custom CPU clock (e.g. PAL at 1,662,607 Hz).
pub fn decode_voice_with_clock(
    kind: ChannelKind,
    regs: VoiceRegisters,
    cpu_clock: f32,
) -> DecodedVoice {
    let amplitude = regs.amplitude.unsigned_abs() as f32;

    let decoded = match kind {
        ChannelKind::Melodic(voice) | ChannelKind::Expansion(voice) => {
            if regs.length == 0 || amplitude == 0.0 || regs.period < MIN_AUDIBLE_PERIOD {
                return DecodedVoice::SILENT;
            }
            let freq = melodic_frequency(voice, regs.period, cpu_clock);
            DecodedVoice {
                frequency_hz: Some(freq),
                midi_note: frequency_to_midi(freq),
                velocity: (amplitude / voice.max_volume).min(1.0),
            }
        }
        ChannelKind::Percussive { lowest_note } => {
            if regs.length <= 0 || amplitude == 0.0 {
                return DecodedVoice::SILENT;
            }
            // Lower selector = faster noise = higher "pitch"
            let selector = (regs.period & 0x0F) as u8;
            DecodedVoice {
                frequency_hz: None,
                midi_note: lowest_note.checked_add(15 - selector),
                velocity: (amplitude / 15.0).min(1.0),
            }
        }
        ChannelKind::SamplePlayback {
            note,
            max_amplitude,
        } => {
            if regs.length <= 0 || amplitude == 0.0 {
                return DecodedVoice::SILENT;
            }
            DecodedVoice {
                frequency_hz: None,
                midi_note: Some(note),
                velocity: (amplitude / max_amplitude).min(1.0),
            }
        }
    };

    match decoded.midi_note {
        Some(note) if note <= 127 && decoded.velocity > MIN_DECODED_VELOCITY => decoded,
        _ => DecodedVoice::SILENT,
    }
}

/// Decode the five base APU voices.
///
/// Returns `None` when fewer than five register triples are supplied.
pub fn decode_apu(regs: &[VoiceRegisters]) -> Option<[DecodedVoice; APU_CHANNEL_COUNT]> {
    if regs.len() < APU_CHANNEL_COUNT {
        return None;
    }
    Some(std::array::from_fn(|ch| {
        decode_voice(CHANNELS[ch].kind, regs[ch])
    }))
}

/// Decode the three VRC6 voices.
///
/// Returns `None` when fewer than three register triples are supplied.
pub fn decode_vrc6(regs: &[Vrc6Registers]) -> Option<[DecodedVoice; VRC6_CHANNEL_COUNT]> {
    if regs.len() < VRC6_CHANNEL_COUNT {
        return None;
    }
    Some(std::array::from_fn(|i| {
        decode_voice(CHANNELS[VRC6_CHANNEL_BASE + i].kind, regs[i].into())
    }))
}
