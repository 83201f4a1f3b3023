//! Thread-safe piano visualizer state.
//!
//! [`PianoVisualizer`] is the single entry point shared between the audio
//! thread (producer: telemetry ingest) and the UI thread (consumer: snapshots,
//! roll queries and settings). All state sits behind one `parking_lot::Mutex`
//! that every method holds for its whole body, so the consumer never sees a
//! half-applied update. Nothing borrowed from the guarded state escapes: all
//! queries return owned copies.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use apu_piano::{PianoVisualizer, VoiceRegisters};
//!
//! let piano = Arc::new(PianoVisualizer::new());
//!
//! // Audio thread: pulse 1 plays A4
//! let mut regs = [VoiceRegisters::default(); 5];
//! regs[0] = VoiceRegisters::new(253, 10, 15);
//! piano.update_from_apu(&regs, 0.0);
//!
//! // UI thread
//! let states = piano.snapshot();
//! assert_eq!(states[0].midi_note, Some(69));
//! assert_eq!(piano.visible_notes(0.5).len(), 1);
//! ```

use parking_lot::Mutex;

use crate::constants::{
    APU_CHANNEL_COUNT, DEFAULT_DETECTOR_CHANNEL, MAX_CHANNEL_COUNT, MIN_AUDIO_SAMPLES,
    RMS_VELOCITY_GAIN, VRC6_CHANNEL_BASE,
};
use crate::decoder::{decode_apu, decode_vrc6, VoiceRegisters, Vrc6Registers};
use crate::piano_roll::{NoteEvent, RollQuery};
use crate::pitch::frequency_to_midi;
use crate::pitch_detect::{detect_frequency, downmix_stereo, rms};
use crate::settings::PianoSettings;
use crate::tracker::{NoteState, NoteTracker};

const LOG_TARGET: &str = "apu_piano::visualizer";

/// One timed register capture for batch processing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ApuFrame {
    /// Capture time in seconds.
    pub time: f64,
    /// Base APU voices.
    pub apu: [VoiceRegisters; APU_CHANNEL_COUNT],
    /// VRC6 voices, when the cartridge has the expansion chip.
    pub vrc6: Option<[Vrc6Registers; 3]>,
}

#[derive(Debug)]
struct PianoState {
    tracker: NoteTracker,
    settings: PianoSettings,
    expansion_enabled: bool,
    last_time: f64,
}

impl PianoState {
    fn channel_count(&self) -> usize {
        if self.expansion_enabled {
            MAX_CHANNEL_COUNT
        } else {
            APU_CHANNEL_COUNT
        }
    }

    fn ingest_apu(&mut self, registers: &[VoiceRegisters], time: f64) -> bool {
        let Some(voices) = decode_apu(registers) else {
            return false;
        };
        for (ch, voice) in voices.iter().enumerate() {
            self.tracker.process(ch, voice.midi_note, voice.velocity, time);
        }
        self.last_time = time;
        true
    }

    fn ingest_vrc6(&mut self, registers: &[Vrc6Registers], time: f64) -> bool {
        if !self.expansion_enabled {
            return false;
        }
        let Some(voices) = decode_vrc6(registers) else {
            return false;
        };
        for (i, voice) in voices.iter().enumerate() {
            self.tracker
                .process(VRC6_CHANNEL_BASE + i, voice.midi_note, voice.velocity, time);
        }
        self.last_time = time;
        true
    }
}

/// Shared note-tracking state for one producer and one consumer thread.
#[derive(Debug)]
pub struct PianoVisualizer {
    state: Mutex<PianoState>,
}

impl Default for PianoVisualizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PianoVisualizer {
    /// Create a visualizer with default settings and the VRC6 bank disabled.
    pub fn new() -> Self {
        Self::with_settings(PianoSettings::default())
    }

    /// Create a visualizer with the given settings.
    pub fn with_settings(settings: PianoSettings) -> Self {
        Self {
            state: Mutex::new(PianoState {
                tracker: NoteTracker::new(),
                settings,
                expansion_enabled: false,
                last_time: 0.0,
            }),
        }
    }

    /// Clear the note history and return every channel to silent.
    ///
    /// Settings and the expansion flag are kept.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.tracker.reset();
        state.last_time = 0.0;
        log::debug!(target: LOG_TARGET, "reset");
    }

    /// Ingest per-channel frequencies (Hz, `<= 0` for silent) and amplitudes (0-1).
    ///
    /// Both slices must cover the five APU channels; shorter input is ignored.
    /// With the VRC6 bank enabled, entries 5-7 drive the expansion channels.
    pub fn update_from_frequencies(&self, frequencies: &[f32], amplitudes: &[f32], current_time: f64) {
        let mut state = self.state.lock();
        if frequencies.len() < APU_CHANNEL_COUNT || amplitudes.len() < APU_CHANNEL_COUNT {
            log::debug!(
                target: LOG_TARGET,
                "ignoring frequency update with {}/{} entries",
                frequencies.len(),
                amplitudes.len()
            );
            return;
        }

        let count = state
            .channel_count()
            .min(frequencies.len())
            .min(amplitudes.len());
        for ch in 0..count {
            let note = frequency_to_midi(frequencies[ch]);
            let velocity = amplitudes[ch].clamp(0.0, 1.0);
            state.tracker.process(ch, note, velocity, current_time);
        }
        state.last_time = current_time;
    }

    /// Ingest raw APU oscillator state for the five base voices.
    ///
    /// Input shorter than five channels is ignored.
    pub fn update_from_apu(&self, registers: &[VoiceRegisters], current_time: f64) {
        let mut state = self.state.lock();
        if !state.ingest_apu(registers, current_time) {
            log::debug!(
                target: LOG_TARGET,
                "ignoring APU update with {} channel(s)",
                registers.len()
            );
        }
    }

    /// Ingest VRC6 oscillator state for the three expansion voices.
    ///
    /// Ignored while the expansion bank is disabled or when fewer than three
    /// voices are supplied.
    pub fn update_from_vrc6(&self, registers: &[Vrc6Registers], current_time: f64) {
        let mut state = self.state.lock();
        if !state.ingest_vrc6(registers, current_time) {
            log::debug!(
                target: LOG_TARGET,
                "ignoring VRC6 update ({} voice(s), expansion {})",
                registers.len(),
                state.expansion_enabled
            );
        }
    }

    /// Ingest interleaved stereo 16-bit PCM when no register telemetry exists.
    ///
    /// The window is downmixed to mono, its dominant pitch is assigned to the
    /// detector channel (triangle by default) with an RMS-derived velocity,
    /// and every other channel decays. Windows under 128 samples are ignored.
    pub fn update_from_audio(&self, samples: &[i16], sample_rate: u32, current_time: f64) {
        let mut state = self.state.lock();
        if samples.len() < MIN_AUDIO_SAMPLES {
            log::debug!(
                target: LOG_TARGET,
                "ignoring audio window of {} sample(s)",
                samples.len()
            );
            return;
        }

        let mono = downmix_stereo(samples);
        let velocity = (rms(&mono) * RMS_VELOCITY_GAIN).min(1.0);
        let note = frequency_to_midi(detect_frequency(&mono, sample_rate));

        // Runtime settings are unvalidated; only a base APU channel may host detections
        let detector = match state.settings.detector_channel {
            ch if ch < APU_CHANNEL_COUNT => ch,
            ch => {
                log::debug!(
                    target: LOG_TARGET,
                    "detector channel {ch} is not a base APU channel, using {DEFAULT_DETECTOR_CHANNEL}"
                );
                DEFAULT_DETECTOR_CHANNEL
            }
        };
        state.tracker.process(detector, note, velocity, current_time);
        for ch in (0..state.channel_count()).filter(|&ch| ch != detector) {
            state.tracker.decay(ch, current_time);
        }
        state.last_time = current_time;
    }

    /// Ingest a sequence of timed register frames, e.g. to pre-scan a track.
    ///
    /// The lock is taken per frame so a renderer can interleave. `progress`
    /// receives the completed fraction after each frame. Returns the number of
    /// frames that were ingested.
    pub fn preprocess_frames<F>(&self, frames: &[ApuFrame], mut progress: F) -> usize
    where
        F: FnMut(f32),
    {
        let total = frames.len();
        let mut ingested = 0;
        for (i, frame) in frames.iter().enumerate() {
            {
                let mut state = self.state.lock();
                if state.ingest_apu(&frame.apu, frame.time) {
                    ingested += 1;
                }
                if let Some(vrc6) = &frame.vrc6 {
                    state.ingest_vrc6(vrc6, frame.time);
                }
            }
            progress((i + 1) as f32 / total as f32);
        }
        ingested
    }

    /// Enable or disable the VRC6 expansion channels.
    ///
    /// Disabling silences the expansion channels, closing their notes at the
    /// most recent ingest time.
    pub fn set_expansion_enabled(&self, enabled: bool) {
        let mut state = self.state.lock();
        if state.expansion_enabled == enabled {
            return;
        }
        if !enabled {
            let time = state.last_time;
            for ch in VRC6_CHANNEL_BASE..MAX_CHANNEL_COUNT {
                state.tracker.silence(ch, time);
            }
        }
        state.expansion_enabled = enabled;
        log::debug!(target: LOG_TARGET, "VRC6 expansion enabled: {enabled}");
    }

    /// Whether the VRC6 expansion channels are tracked.
    pub fn expansion_enabled(&self) -> bool {
        self.state.lock().expansion_enabled
    }

    /// Number of channels currently tracked (5, or 8 with VRC6).
    pub fn channel_count(&self) -> usize {
        self.state.lock().channel_count()
    }

    /// Copy of the current note state of every tracked channel.
    pub fn snapshot(&self) -> Vec<NoteState> {
        let state = self.state.lock();
        state.tracker.states()[..state.channel_count()].to_vec()
    }

    /// Events visible in the configured window and octave band at `now`.
    pub fn visible_notes(&self, now: f64) -> Vec<NoteEvent> {
        let state = self.state.lock();
        let (start, end) = state.settings.time_window(now);
        let query = RollQuery::new(start, end, now).notes(state.settings.note_range());
        state.tracker.roll().query(&query)
    }

    /// Events matching an explicit query.
    pub fn query(&self, query: &RollQuery) -> Vec<NoteEvent> {
        self.state.lock().tracker.roll().query(query)
    }

    /// Copy of the whole event log, oldest first.
    pub fn events(&self) -> Vec<NoteEvent> {
        self.state.lock().tracker.roll().iter().copied().collect()
    }

    /// Number of events in the log.
    pub fn note_count(&self) -> usize {
        self.state.lock().tracker.roll().len()
    }

    /// Current settings.
    pub fn settings(&self) -> PianoSettings {
        self.state.lock().settings
    }

    /// Replace all settings (not validated).
    pub fn set_settings(&self, settings: PianoSettings) {
        self.state.lock().settings = settings;
    }

    /// Set how many seconds of history the roll shows.
    pub fn set_piano_roll_seconds(&self, seconds_visible: f32) {
        self.state.lock().settings.visible_seconds = seconds_visible;
    }

    /// Set the displayed octave band. The caller keeps `low < high`.
    pub fn set_octave_range(&self, low: i32, high: i32) {
        let mut state = self.state.lock();
        state.settings.octave_low = low;
        state.settings.octave_high = high;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn silent_apu() -> [VoiceRegisters; APU_CHANNEL_COUNT] {
        [VoiceRegisters::default(); APU_CHANNEL_COUNT]
    }

    #[test]
    fn test_visualizer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PianoVisualizer>();
    }

    #[test]
    fn test_apu_note_lifecycle() {
        let piano = PianoVisualizer::new();
        let mut regs = silent_apu();
        regs[0] = VoiceRegisters::new(253, 10, 15);
        piano.update_from_apu(&regs, 0.0);
        piano.update_from_apu(&regs, 0.5);
        piano.update_from_apu(&silent_apu(), 1.0);

        let events = piano.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].midi_note, 69);
        assert_abs_diff_eq!(events[0].duration, 1.0);
        assert!(!events[0].active);
    }

    #[test]
    fn test_short_apu_input_is_noop() {
        let piano = PianoVisualizer::new();
        piano.update_from_apu(&[VoiceRegisters::new(253, 10, 15); 4], 0.0);
        assert_eq!(piano.note_count(), 0);
        assert!(piano.snapshot().iter().all(|s| s.midi_note.is_none()));
    }

    #[test]
    fn test_frequency_path() {
        let piano = PianoVisualizer::new();
        let freqs = [440.0, 0.0, 261.63, -1.0, 0.0];
        let amps = [0.8, 0.8, 1.5, 0.8, 0.0];
        piano.update_from_frequencies(&freqs, &amps, 2.0);

        let states = piano.snapshot();
        assert_eq!(states[0].midi_note, Some(69));
        assert!(states[0].active);
        assert!(!states[1].active);
        assert_eq!(states[2].midi_note, Some(60));
        assert_eq!(states[2].velocity, 1.0);
        assert_eq!(piano.note_count(), 2);

        piano.update_from_frequencies(&freqs[..3], &amps, 3.0);
        assert_eq!(piano.note_count(), 2);
    }

    #[test]
    fn test_vrc6_requires_expansion() {
        let piano = PianoVisualizer::new();
        let vrc6 = [
            Vrc6Registers::new(253, 15, true),
            Vrc6Registers::default(),
            Vrc6Registers::default(),
        ];
        piano.update_from_vrc6(&vrc6, 0.0);
        assert_eq!(piano.note_count(), 0);
        assert_eq!(piano.channel_count(), APU_CHANNEL_COUNT);

        piano.set_expansion_enabled(true);
        piano.update_from_vrc6(&vrc6, 1.0);
        assert_eq!(piano.channel_count(), MAX_CHANNEL_COUNT);
        let states = piano.snapshot();
        assert_eq!(states.len(), MAX_CHANNEL_COUNT);
        assert_eq!(states[VRC6_CHANNEL_BASE].midi_note, Some(69));

        piano.set_expansion_enabled(false);
        let events = piano.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].channel, VRC6_CHANNEL_BASE);
        assert!(!events[0].active);
        assert_eq!(piano.snapshot().len(), APU_CHANNEL_COUNT);
    }

    #[test]
    fn test_short_audio_window_is_noop() {
        let piano = PianoVisualizer::new();
        piano.update_from_apu(
            &[
                VoiceRegisters::new(253, 10, 15),
                VoiceRegisters::default(),
                VoiceRegisters::default(),
                VoiceRegisters::default(),
                VoiceRegisters::default(),
            ],
            0.0,
        );
        let before = piano.snapshot();
        piano.update_from_audio(&[1000; 127], 44_100, 1.0);
        assert_eq!(piano.snapshot(), before);
    }

    #[test]
    fn test_out_of_range_detector_channel_falls_back_to_triangle() {
        let window: Vec<i16> = (0..2048)
            .flat_map(|i| {
                let s = (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44_100.0).sin();
                let v = (s * 16_000.0) as i16;
                [v, v]
            })
            .collect();

        for (i, channel) in [6, 9].into_iter().enumerate() {
            let piano = PianoVisualizer::new();
            piano.set_settings(PianoSettings::default().detector_channel(channel));
            piano.update_from_audio(&window, 44_100, i as f64);

            let states = piano.snapshot();
            assert_eq!(states[DEFAULT_DETECTOR_CHANNEL].midi_note, Some(69));
            assert!(states[DEFAULT_DETECTOR_CHANNEL].active);

            let visible = piano.visible_notes(i as f64 + 0.5);
            assert_eq!(visible.len(), 1);
            assert_eq!(visible[0].channel, DEFAULT_DETECTOR_CHANNEL);
        }
    }

    #[test]
    fn test_preprocess_reports_progress() {
        let piano = PianoVisualizer::new();
        let mut frames = vec![ApuFrame::default(); 4];
        for (i, frame) in frames.iter_mut().enumerate() {
            frame.time = i as f64 / 60.0;
            frame.apu[1] = VoiceRegisters::new(100 + i as i32 * 50, 10, 12);
        }

        let mut reported = Vec::new();
        let ingested = piano.preprocess_frames(&frames, |p| reported.push(p));
        assert_eq!(ingested, 4);
        assert_eq!(reported, vec![0.25, 0.5, 0.75, 1.0]);
        assert_eq!(piano.note_count(), 4);
    }

    #[test]
    fn test_settings_mutators() {
        let piano = PianoVisualizer::new();
        piano.set_piano_roll_seconds(2.0);
        piano.set_octave_range(3, 4);
        let settings = piano.settings();
        assert_eq!(settings.visible_seconds, 2.0);
        assert_eq!(settings.note_range(), 48..=60);

        let mut regs = silent_apu();
        regs[0] = VoiceRegisters::new(253, 10, 15); // A4 = 69, outside 48..=60
        piano.update_from_apu(&regs, 0.0);
        assert!(piano.visible_notes(1.0).is_empty());

        piano.set_octave_range(4, 5);
        assert_eq!(piano.visible_notes(1.0).len(), 1);
        // Onset has scrolled out of [1.0, 3.0) but the note is still sounding
        assert_eq!(piano.visible_notes(3.0).len(), 1);
    }

    #[test]
    fn test_reset_keeps_settings() {
        let piano = PianoVisualizer::with_settings(PianoSettings::default().octave_range(1, 3));
        let mut regs = silent_apu();
        regs[2] = VoiceRegisters::new(253, 10, 15);
        piano.update_from_apu(&regs, 0.0);
        piano.reset();

        assert_eq!(piano.note_count(), 0);
        assert!(piano
            .snapshot()
            .iter()
            .all(|s| s.midi_note.is_none() && !s.active));
        assert_eq!(piano.settings().octave_low, 1);
    }
}
