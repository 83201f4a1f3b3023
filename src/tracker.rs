//! Per-channel note onset/offset tracking.
//!
//! [`NoteTracker`] turns a stream of `(note, velocity, time)` samples per
//! channel into discrete note events on its [`PianoRoll`]. Each channel is
//! either silent or sounding one note:
//!
//! - silent → sounding `n`: a voiced sample with a note opens an event
//! - sounding `m` → sounding `n`: the event for `m` is closed and one for `n`
//!   opened at the same timestamp
//! - sounding `m` → silent: an unvoiced sample (or no note) closes the event
//! - sounding `m` → sounding `m`: only the current velocity is refreshed
//!
//! A sample is voiced when its velocity exceeds [`ONSET_THRESHOLD`].

use serde::{Deserialize, Serialize};

use crate::constants::{DECAY_FACTOR, MAX_CHANNEL_COUNT, ONSET_THRESHOLD};
use crate::piano_roll::PianoRoll;

/// What a channel is sounding right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteState {
    /// Channel index.
    pub channel: usize,
    /// Last candidate note (`None` when no note).
    pub midi_note: Option<u8>,
    /// Last candidate velocity (0.0-1.0).
    pub velocity: f32,
    /// `midi_note.is_some() && velocity > ONSET_THRESHOLD`.
    pub active: bool,
}

impl NoteState {
    fn silent(channel: usize) -> Self {
        Self {
            channel,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelTrack {
    /// Note of the in-flight event, if any.
    sounding: Option<u8>,
    /// Onset time of the in-flight event.
    started_at: f64,
}

/// Onset/offset state machine for all channels plus the event log it feeds.
#[derive(Debug, Clone)]
pub struct NoteTracker {
    current: [NoteState; MAX_CHANNEL_COUNT],
    tracks: [ChannelTrack; MAX_CHANNEL_COUNT],
    roll: PianoRoll,
}

impl Default for NoteTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteTracker {
    /// Create a tracker with every channel silent and an empty default log.
    pub fn new() -> Self {
        Self::with_roll(PianoRoll::new())
    }

    /// Create a tracker feeding the given (cleared) log.
    pub fn with_roll(mut roll: PianoRoll) -> Self {
        roll.clear();
        Self {
            current: std::array::from_fn(NoteState::silent),
            tracks: [ChannelTrack::default(); MAX_CHANNEL_COUNT],
            roll,
        }
    }

    /// Feed one sample for a channel.
    ///
    /// Out-of-range channels are ignored.
    pub fn process(&mut self, channel: usize, note: Option<u8>, velocity: f32, time: f64) {
        if channel >= MAX_CHANNEL_COUNT {
            return;
        }

        let voiced = velocity > ONSET_THRESHOLD;
        let candidate = if voiced { note } else { None };
        let track = &mut self.tracks[channel];

        if track.sounding != candidate {
            if let Some(prev) = track.sounding.take() {
                let duration = self.roll.close(channel, prev, time);
                log::trace!(
                    target: "apu_piano::tracker",
                    "ch{channel} note off {prev} at {time:.3}s ({duration:?}s)"
                );
            }
            if let Some(next) = candidate {
                self.roll.open(channel, next, velocity, time);
                track.sounding = Some(next);
                track.started_at = time;
                log::trace!(
                    target: "apu_piano::tracker",
                    "ch{channel} note on {next} vel {velocity:.2} at {time:.3}s"
                );
            }
        }

        self.current[channel] = NoteState {
            channel,
            midi_note: note,
            velocity,
            active: candidate.is_some(),
        };
    }

    /// Fade a channel that received no fresh evidence this update.
    ///
    /// The velocity is multiplied by 0.9; once it falls under the onset
    /// threshold the channel goes silent and its event is closed.
    pub fn decay(&mut self, channel: usize, time: f64) {
        if channel >= MAX_CHANNEL_COUNT {
            return;
        }

        let state = self.current[channel];
        let velocity = state.velocity * DECAY_FACTOR;
        if velocity < ONSET_THRESHOLD {
            self.process(channel, None, velocity, time);
        } else {
            self.current[channel].velocity = velocity;
        }
    }

    /// Force a channel silent, closing any in-flight event.
    pub fn silence(&mut self, channel: usize, time: f64) {
        self.process(channel, None, 0.0, time);
    }

    /// Current state of one channel.
    pub fn state(&self, channel: usize) -> Option<&NoteState> {
        self.current.get(channel)
    }

    /// Current state of all channels.
    pub fn states(&self) -> &[NoteState; MAX_CHANNEL_COUNT] {
        &self.current
    }

    /// Onset time of the note a channel is sounding.
    pub fn note_start(&self, channel: usize) -> Option<f64> {
        let track = self.tracks.get(channel)?;
        track.sounding.map(|_| track.started_at)
    }

    /// The event log.
    pub fn roll(&self) -> &PianoRoll {
        &self.roll
    }

    /// Clear the log and return every channel to silent.
    pub fn reset(&mut self) {
        self.roll.clear();
        self.current = std::array::from_fn(NoteState::silent);
        self.tracks = [ChannelTrack::default(); MAX_CHANNEL_COUNT];
    }
}
