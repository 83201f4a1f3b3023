use apu_piano::{detect_pitch, frequency_to_midi, PianoVisualizer};
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::f32::consts::PI;

const SAMPLE_RATE: u32 = 44_100;

/// Interleaved stereo sine, identical on both channels.
fn stereo_sine(freq: f32, frames: usize, amplitude: f32) -> Vec<i16> {
    (0..frames)
        .flat_map(|i| {
            let s = amplitude * (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin();
            let v = (s * i16::MAX as f32) as i16;
            [v, v]
        })
        .collect()
}

#[test]
fn sines_detected_within_a_semitone() {
    for freq in [110.0, 196.0, 329.63, 440.0, 523.25, 987.77] {
        let mono: Vec<f32> = (0..2048)
            .map(|i| (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
            .collect();
        let estimate = detect_pitch(&mono, SAMPLE_RATE).expect("pitch");
        let expected = frequency_to_midi(freq).unwrap() as i32;
        let detected = frequency_to_midi(estimate.frequency).unwrap() as i32;
        assert!(
            (detected - expected).abs() <= 1,
            "{freq} Hz detected as {} Hz",
            estimate.frequency
        );
    }
}

#[test]
fn audio_path_drives_triangle() {
    let piano = PianoVisualizer::new();
    piano.update_from_audio(&stereo_sine(440.0, 2048, 0.5), SAMPLE_RATE, 0.0);

    let tri = piano.snapshot()[2];
    assert_eq!(tri.midi_note, Some(69));
    assert!(tri.active);
    // rms 0.35 * 3 saturates
    assert_eq!(tri.velocity, 1.0);
    assert_eq!(piano.note_count(), 1);
}

#[test]
fn audio_path_respects_detector_channel() {
    let piano = PianoVisualizer::new();
    let mut settings = piano.settings();
    settings.detector_channel = 0;
    piano.set_settings(settings);

    piano.update_from_audio(&stereo_sine(220.0, 2048, 0.5), SAMPLE_RATE, 0.0);
    let states = piano.snapshot();
    assert_eq!(states[0].midi_note, Some(57));
    assert!(!states[2].active);
}

#[test]
fn audio_path_decays_other_channels() {
    let piano = PianoVisualizer::new();
    piano.update_from_frequencies(&[440.0, 0.0, 0.0, 0.0, 0.0], &[0.5, 0.0, 0.0, 0.0, 0.0], 0.0);
    assert!(piano.snapshot()[0].active);

    let window = stereo_sine(330.0, 2048, 0.3);
    let mut t = 0.0;
    for _ in 0..30 {
        t += 0.02;
        piano.update_from_audio(&window, SAMPLE_RATE, t);
    }

    let pulse = piano.snapshot()[0];
    assert!(!pulse.active);
    assert!(pulse.velocity < 0.05);
    let closed = piano.events().into_iter().find(|e| e.channel == 0).unwrap();
    assert!(!closed.active);
    assert!(closed.duration > 0.0);
}

#[test]
fn noise_and_silence_leave_detector_silent() {
    let piano = PianoVisualizer::new();
    let mut rng = Pcg32::seed_from_u64(0x5eed);
    let noise: Vec<i16> = (0..4096).map(|_| rng.gen_range(-8000..8000)).collect();
    piano.update_from_audio(&noise, SAMPLE_RATE, 0.0);
    assert!(!piano.snapshot()[2].active);

    piano.update_from_audio(&[0; 4096], SAMPLE_RATE, 0.1);
    let tri = piano.snapshot()[2];
    assert_eq!(tri.midi_note, None);
    assert!(!tri.active);
    assert_eq!(piano.note_count(), 0);
}
