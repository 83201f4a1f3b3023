//! Autocorrelation pitch detection for raw PCM windows.
//!
//! Used when only the mixed audio output is available (no register
//! telemetry). The detector estimates a single dominant pitch per window by
//! maximising the normalized autocorrelation over a lag range covering
//! roughly 50 Hz to 2 kHz. It cannot separate concurrent voices.

use crate::constants::{
    DETECTION_CONFIDENCE, DETECTION_MAX_FREQ, DETECTION_MIN_FREQ, DETECTION_PEAK_RATIO,
    MIN_DETECTION_WINDOW,
};

/// A pitch accepted by the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Estimated fundamental in Hz.
    pub frequency: f32,
    /// Picked lag in samples.
    pub lag: usize,
    /// Normalized correlation at `lag` (0.0-1.0).
    pub clarity: f32,
}

/// Estimate the dominant pitch of a mono window.
///
/// The normalized correlation is evaluated for every lag in range. A sine
/// correlates almost perfectly at every multiple of its period, so the pick
/// is the shortest-lag local maximum within 10% of the best correlation.
///
/// Returns `None` when the window is shorter than 64 samples, the lag range
/// holds no peak, or the picked correlation does not exceed 0.5.
pub fn detect_pitch(samples: &[f32], sample_rate: u32) -> Option<PitchEstimate> {
    let count = samples.len();
    if count < MIN_DETECTION_WINDOW || sample_rate == 0 {
        return None;
    }

    let min_lag = (sample_rate / DETECTION_MAX_FREQ).max(1) as usize;
    let max_lag = (count / 2).min((sample_rate / DETECTION_MIN_FREQ) as usize);
    if max_lag <= min_lag + 2 {
        return None;
    }

    // Start one lag early so a peak sitting on `min_lag` still has a left neighbour
    let first_lag = min_lag - 1;
    let correlations: Vec<f32> = (first_lag..max_lag)
        .map(|lag| normalized_correlation(samples, lag))
        .collect();

    let best = correlations[1..].iter().copied().fold(0.0f32, f32::max);
    if best <= DETECTION_CONFIDENCE {
        return None;
    }

    let peak = correlations.windows(3).position(|w| {
        w[1] > w[0] && w[1] >= w[2] && w[1] >= best * DETECTION_PEAK_RATIO
    })?;
    let clarity = correlations[peak + 1];
    let lag = first_lag + peak + 1;

    (clarity > DETECTION_CONFIDENCE).then(|| PitchEstimate {
        frequency: sample_rate as f32 / lag as f32,
        lag,
        clarity,
    })
}

/// Correlation of the window with itself shifted by `lag`, normalized by the
/// energy of both overlapping parts. Zero when either part is silent.
fn normalized_correlation(samples: &[f32], lag: usize) -> f32 {
    let head = &samples[..samples.len() - lag];
    let tail = &samples[lag..];

    let mut correlation = 0.0f32;
    let mut energy_head = 0.0f32;
    let mut energy_tail = 0.0f32;
    for (&a, &b) in head.iter().zip(tail) {
        correlation += a * b;
        energy_head += a * a;
        energy_tail += b * b;
    }

    if energy_head > 0.0 && energy_tail > 0.0 {
        correlation / (energy_head * energy_tail).sqrt()
    } else {
        0.0
    }
}

/// Estimate the dominant frequency of a mono window, or `0.0` if none.
#[inline]
pub fn detect_frequency(samples: &[f32], sample_rate: u32) -> f32 {
    detect_pitch(samples, sample_rate).map_or(0.0, |p| p.frequency)
}

/// Downmix interleaved stereo 16-bit PCM to normalized mono.
///
/// A trailing unpaired sample is ignored.
pub fn downmix_stereo(samples: &[i16]) -> Vec<f32> {
    samples
        .chunks_exact(2)
        .map(|frame| {
            let left = frame[0] as f32 / 32768.0;
            let right = frame[1] as f32 / 32768.0;
            (left + right) * 0.5
        })
        .collect()
}

/// Root-mean-square level of a window (0.0 for an empty window).
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}
