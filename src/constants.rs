//! NES APU Constants
//!
//! Shared hardware constants and tracking thresholds used across the decoder,
//! the note tracker and the piano-roll log.

/// NTSC NES CPU clock in Hz. All APU and VRC6 periods count in CPU cycles.
pub const NES_CPU_CLOCK: f32 = 1_789_773.0;

/// Number of voices on the 2A03 APU (pulse 1, pulse 2, triangle, noise, DMC).
pub const APU_CHANNEL_COUNT: usize = 5;

/// Number of voices on the Konami VRC6 expansion chip (pulse 1, pulse 2, sawtooth).
pub const VRC6_CHANNEL_COUNT: usize = 3;

/// Total number of tracked channels (APU followed by VRC6).
pub const MAX_CHANNEL_COUNT: usize = APU_CHANNEL_COUNT + VRC6_CHANNEL_COUNT;

/// Channel index of the first VRC6 voice.
pub const VRC6_CHANNEL_BASE: usize = APU_CHANNEL_COUNT;

/// A candidate is "voiced" when its velocity is strictly above this value.
pub const ONSET_THRESHOLD: f32 = 0.05;

/// Decoded voices at or below this velocity are treated as silent.
pub const MIN_DECODED_VELOCITY: f32 = 0.01;

/// Tone periods below this value produce ultrasonic output and are suppressed.
pub const MIN_AUDIBLE_PERIOD: i32 = 8;

/// Maximum number of events kept in the piano-roll log.
pub const MAX_ROLL_NOTES: usize = 2000;

/// Per-update velocity decay applied to channels without fresh evidence.
pub const DECAY_FACTOR: f32 = 0.9;

/// Gain applied to the window RMS to derive a velocity on the raw-audio path.
pub const RMS_VELOCITY_GAIN: f32 = 3.0;

/// Minimum interleaved stereo sample count accepted by the raw-audio path.
pub const MIN_AUDIO_SAMPLES: usize = 128;

/// Minimum mono window accepted by the pitch detector.
pub const MIN_DETECTION_WINDOW: usize = 64;

/// Normalized correlation a lag must exceed to be accepted as a pitch.
pub const DETECTION_CONFIDENCE: f32 = 0.5;

/// A correlation peak qualifies when it reaches this fraction of the best one.
pub const DETECTION_PEAK_RATIO: f32 = 0.9;

/// Highest frequency the detector searches for (sets the minimum lag).
pub const DETECTION_MAX_FREQ: u32 = 2000;

/// Lowest frequency the detector searches for (sets the maximum lag).
pub const DETECTION_MIN_FREQ: u32 = 50;

/// Default number of seconds of history visible in the piano roll.
pub const DEFAULT_VISIBLE_SECONDS: f32 = 4.0;

/// Default lowest displayed octave (C2).
pub const DEFAULT_OCTAVE_LOW: i32 = 2;

/// Default highest displayed octave (C7).
pub const DEFAULT_OCTAVE_HIGH: i32 = 7;

/// Default channel that receives detections on the raw-audio path (triangle).
pub const DEFAULT_DETECTOR_CHANNEL: usize = 2;
