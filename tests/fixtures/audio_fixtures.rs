//! Audio Test Fixtures
//!
//! Programmatically generated audio standing in for synthesized speech.
//! Using generated audio ensures:
//! - Consistent, reproducible test inputs
//! - No external file dependencies
//! - Exact sample counts to assert against after splicing
//!
//! Audio formats:
//! - Sample rate: 24kHz (the providers' default output rate)
//! - Bit depth: 16-bit signed PCM
//! - Channels: Mono

use std::f32::consts::PI;
use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

/// Standard sample rate for synthesized speech (24kHz)
pub const SAMPLE_RATE: u32 = 24000;

/// Duration constants (in samples at 24kHz)
pub const MS_100: usize = 2400;
pub const SECOND: usize = 24000;

pub fn mono_spec() -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Generate silence (zeros)
pub fn generate_silence(duration_samples: usize) -> Vec<i16> {
    vec![0i16; duration_samples]
}

/// Generate a sine wave tone
pub fn generate_sine_wave(duration_samples: usize, frequency: f32, amplitude: f32) -> Vec<i16> {
    let max_amplitude = amplitude * i16::MAX as f32;
    let angular_freq = 2.0 * PI * frequency / SAMPLE_RATE as f32;

    (0..duration_samples)
        .map(|i| ((angular_freq * i as f32).sin() * max_amplitude) as i16)
        .collect()
}

/// Generate speech-like pattern with variable amplitude envelope
pub fn generate_speech_pattern(duration_samples: usize) -> Vec<i16> {
    let base_freq = 150.0; // Approximate fundamental frequency of speech
    let mut state: u64 = 54321;
    let mut envelope = 0.0f32;

    (0..duration_samples)
        .map(|i| {
            // Update envelope occasionally to simulate syllables
            if i % 1200 == 0 {
                state = state.wrapping_mul(1103515245).wrapping_add(12345);
                let target = ((state >> 16) & 0x7FFF) as f32 / 0x7FFF as f32;
                envelope = envelope * 0.7 + target * 0.3;
            }
            let t = i as f32 / SAMPLE_RATE as f32;
            let fundamental = (2.0 * PI * base_freq * t).sin();
            let harmonic2 = (2.0 * PI * base_freq * 2.0 * t).sin() * 0.5;
            let waveform = (fundamental + harmonic2) / 1.5;
            // Never exactly zero so inserted silence is distinguishable
            let sample = (waveform * envelope * i16::MAX as f32 * 0.6) as i16;
            if sample == 0 { 1 } else { sample }
        })
        .collect()
}

/// Complete WAV file bytes for `samples`
pub fn wav_bytes(samples: &[i16]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, mono_spec()).unwrap();
        for s in samples {
            writer.write_sample(*s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Write `samples` as a WAV file at `path`
pub fn write_wav(path: &Path, samples: &[i16]) {
    std::fs::write(path, wav_bytes(samples)).unwrap();
}

/// Read every sample of a 16-bit WAV file
pub fn read_wav(path: &Path) -> (WavSpec, Vec<i16>) {
    let mut reader = WavReader::open(path).unwrap();
    let spec = reader.spec();
    let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    (spec, samples)
}

/// Bytes that look like an MP3 stream: frame sync followed by `payload`
pub fn fake_mp3(payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFB, 0x90, 0x64];
    bytes.extend_from_slice(payload);
    bytes
}
