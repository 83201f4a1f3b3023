//! Bounded piano-roll history of note events.
//!
//! Events are appended in chronological order and evicted from the front once
//! the log exceeds its capacity. The only in-place mutation is closing an
//! event when its note stops. Active events are always the most recent insert
//! for their channel, so front eviction only ever removes long-closed history
//! unless the whole log is taken up by newer events.

use std::collections::VecDeque;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_ROLL_NOTES;

/// One note on the piano roll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Channel index that played the note.
    pub channel: usize,
    /// MIDI note number.
    pub midi_note: u8,
    /// Velocity at onset (0.0-1.0).
    pub velocity: f32,
    /// Onset time in seconds.
    pub start_time: f64,
    /// Length in seconds; 0 while the note is still sounding.
    pub duration: f64,
    /// Whether the note is still sounding.
    pub active: bool,
}

impl NoteEvent {
    /// End time of the event, using `now` for notes still sounding.
    #[inline]
    pub fn end_time(&self, now: f64) -> f64 {
        if self.active {
            now
        } else {
            self.start_time + self.duration
        }
    }
}

/// Visible window for a piano-roll query.
#[derive(Debug, Clone, PartialEq)]
pub struct RollQuery {
    /// Window start (inclusive), seconds.
    pub start: f64,
    /// Window end (exclusive for onsets), seconds.
    pub end: f64,
    /// Current time, used as the end of active notes.
    pub now: f64,
    /// MIDI notes to include.
    pub notes: RangeInclusive<u8>,
}

impl RollQuery {
    /// Query all notes whose time span meets `[start, end)`.
    pub fn new(start: f64, end: f64, now: f64) -> Self {
        Self {
            start,
            end,
            now,
            notes: 0..=127,
        }
    }

    /// Restrict the query to a MIDI note range.
    pub fn notes(mut self, notes: RangeInclusive<u8>) -> Self {
        self.notes = notes;
        self
    }

    /// Whether an event falls inside the window and note band.
    #[inline]
    pub fn matches(&self, event: &NoteEvent) -> bool {
        self.notes.contains(&event.midi_note)
            && event.start_time < self.end
            && event.end_time(self.now) >= self.start
    }
}

/// Ordered, capacity-bounded log of [`NoteEvent`]s.
#[derive(Debug, Clone)]
pub struct PianoRoll {
    notes: VecDeque<NoteEvent>,
    capacity: usize,
}

impl Default for PianoRoll {
    fn default() -> Self {
        Self::new()
    }
}

impl PianoRoll {
    /// Create a log holding up to 2000 events.
    pub fn new() -> Self {
        Self::with_capacity(MAX_ROLL_NOTES)
    }

    /// Create a log with a custom capacity (at least one event).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            notes: VecDeque::with_capacity(capacity.min(MAX_ROLL_NOTES) + 1),
            capacity,
        }
    }

    /// Maximum number of events kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of events currently stored.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Iterate over events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &NoteEvent> {
        self.notes.iter()
    }

    /// Append a new sounding note and evict the oldest events beyond capacity.
    ///
    /// Returns the number of evicted events.
    pub fn open(&mut self, channel: usize, midi_note: u8, velocity: f32, time: f64) -> usize {
        self.notes.push_back(NoteEvent {
            channel,
            midi_note,
            velocity,
            start_time: time,
            duration: 0.0,
            active: true,
        });

        let mut evicted = 0;
        while self.notes.len() > self.capacity {
            self.notes.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            log::debug!(target: "apu_piano::roll", "evicted {evicted} oldest note(s)");
        }
        evicted
    }

    /// Close the most recent active event for `channel` playing `midi_note`.
    ///
    /// Returns the fixed duration, or `None` if no such event exists (for
    /// example because it was already evicted).
    pub fn close(&mut self, channel: usize, midi_note: u8, time: f64) -> Option<f64> {
        let event = self
            .notes
            .iter_mut()
            .rev()
            .find(|n| n.active && n.channel == channel && n.midi_note == midi_note)?;
        event.active = false;
        event.duration = (time - event.start_time).max(0.0);
        Some(event.duration)
    }

    /// The currently sounding event on a channel, if any.
    pub fn active_event(&self, channel: usize) -> Option<&NoteEvent> {
        self.notes
            .iter()
            .rev()
            .find(|n| n.active && n.channel == channel)
    }

    /// Copy out all events matching the query, oldest first.
    pub fn query(&self, query: &RollQuery) -> Vec<NoteEvent> {
        self.notes
            .iter()
            .filter(|n| query.matches(n))
            .copied()
            .collect()
    }

    /// Remove every event.
    pub fn clear(&mut self) {
        self.notes.clear();
    }
}
