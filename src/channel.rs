//! Channel table for the APU voices and the VRC6 expansion bank.
//!
//! Channels are plain indices: 0-4 are the 2A03 voices, 5-7 the VRC6 voices.
//! Each index maps to a static [`ChannelInfo`] carrying the voice kind used by
//! the decoder plus the short name and colour used by renderers.

use crate::constants::MAX_CHANNEL_COUNT;
use crate::{PianoError, Result};

/// Decode parameters of a period-driven melodic voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MelodicVoice {
    /// Frequency divider: `freq = clock / (divider * (period + 1))`.
    pub divider: f32,
    /// Volume register value that maps to full velocity.
    pub max_volume: f32,
}

/// 2A03 pulse voices.
pub const APU_PULSE: MelodicVoice = MelodicVoice {
    divider: 16.0,
    max_volume: 15.0,
};

/// 2A03 triangle voice. Uses the same divider as the pulses.
pub const APU_TRIANGLE: MelodicVoice = MelodicVoice {
    divider: 16.0,
    max_volume: 15.0,
};

/// VRC6 pulse voices (4-bit volume).
pub const VRC6_PULSE: MelodicVoice = MelodicVoice {
    divider: 16.0,
    max_volume: 15.0,
};

/// VRC6 sawtooth: 14 CPU steps per period, 6-bit accumulator rate as volume.
pub const VRC6_SAWTOOTH: MelodicVoice = MelodicVoice {
    divider: 14.0,
    max_volume: 63.0,
};

/// How a channel's raw register state turns into a note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelKind {
    /// Pitched voice on the base APU.
    Melodic(MelodicVoice),
    /// Noise voice: the 4-bit noise period selects a note in a fixed band
    /// starting at `lowest_note` (selector 15) and spanning 16 semitones.
    Percussive {
        /// Note emitted for the slowest noise setting.
        lowest_note: u8,
    },
    /// Sample-playback voice shown as one placeholder note while playing.
    SamplePlayback {
        /// Placeholder note.
        note: u8,
        /// Amplitude that maps to full velocity.
        max_amplitude: f32,
    },
    /// Pitched voice on an expansion chip, gated by its enable flag.
    Expansion(MelodicVoice),
}

impl ChannelKind {
    /// Whether the channel belongs to an expansion bank.
    #[inline]
    pub fn is_expansion(&self) -> bool {
        matches!(self, ChannelKind::Expansion(_))
    }
}

/// Static description of one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelInfo {
    /// Short display name.
    pub name: &'static str,
    /// Decoding behaviour.
    pub kind: ChannelKind,
    /// Display colour as RGBA.
    pub color: [u8; 4],
}

/// All tracked channels, APU first then VRC6.
pub const CHANNELS: [ChannelInfo; MAX_CHANNEL_COUNT] = [
    ChannelInfo {
        name: "Sq1",
        kind: ChannelKind::Melodic(APU_PULSE),
        color: [255, 80, 80, 220],
    },
    ChannelInfo {
        name: "Sq2",
        kind: ChannelKind::Melodic(APU_PULSE),
        color: [255, 160, 60, 220],
    },
    ChannelInfo {
        name: "Tri",
        kind: ChannelKind::Melodic(APU_TRIANGLE),
        color: [80, 180, 255, 220],
    },
    ChannelInfo {
        name: "Noi",
        kind: ChannelKind::Percussive { lowest_note: 36 },
        color: [230, 80, 230, 220],
    },
    ChannelInfo {
        name: "DMC",
        kind: ChannelKind::SamplePlayback {
            note: 28,
            max_amplitude: 127.0,
        },
        color: [230, 230, 80, 220],
    },
    ChannelInfo {
        name: "V6P1",
        kind: ChannelKind::Expansion(VRC6_PULSE),
        color: [80, 220, 120, 220],
    },
    ChannelInfo {
        name: "V6P2",
        kind: ChannelKind::Expansion(VRC6_PULSE),
        color: [60, 200, 200, 220],
    },
    ChannelInfo {
        name: "Saw",
        kind: ChannelKind::Expansion(VRC6_SAWTOOTH),
        color: [170, 110, 255, 220],
    },
];

/// Look up a channel by index.
pub fn channel_info(index: usize) -> Result<&'static ChannelInfo> {
    static TABLE: [ChannelInfo; MAX_CHANNEL_COUNT] = CHANNELS;
    TABLE.get(index).ok_or(PianoError::InvalidChannel(index))
}
