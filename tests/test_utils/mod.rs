// tests/test_utils/mod.rs
//
// Deterministic signal generators shared by the integration tests.

#![allow(dead_code)]

use std::f64::consts::PI;
use std::ops::RangeInclusive;

use mastercheckr::{SampleBuffer, SpectrumFrame};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn sine(freq: f64, amplitude: f64, sample_rate: u32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (amplitude * (2.0 * PI * freq * i as f64 / sample_rate as f64).sin()) as f32)
        .collect()
}

pub fn stereo_sine(freq: f64, amplitude: f64, sample_rate: u32, secs: f64) -> SampleBuffer {
    let len = (secs * sample_rate as f64) as usize;
    let samples = sine(freq, amplitude, sample_rate, len);
    SampleBuffer::stereo(samples.clone(), samples, sample_rate).expect("valid buffer")
}

pub fn silence(sample_rate: u32, secs: f64) -> SampleBuffer {
    let len = (secs * sample_rate as f64) as usize;
    SampleBuffer::stereo(vec![0.0; len], vec![0.0; len], sample_rate).expect("valid buffer")
}

pub fn impulse(len: usize, at: usize, amplitude: f32) -> Vec<f32> {
    let mut samples = vec![0.0; len];
    samples[at] = amplitude;
    samples
}

/// Uniform noise in [-amplitude, amplitude) from a fixed xorshift seed
pub fn white_noise(len: usize, amplitude: f64, seed: u64) -> Vec<f32> {
    let mut state = seed.max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
            (amplitude * (2.0 * unit - 1.0)) as f32
        })
        .collect()
}

/// Sum of sines centred on FFT bins `bins`, each of `amplitude`
pub fn bin_centred_tones(
    bins: RangeInclusive<usize>,
    amplitude: f64,
    fft_size: usize,
    len: usize,
) -> Vec<f32> {
    (0..len)
        .map(|i| {
            bins.clone()
                .map(|k| amplitude * (2.0 * PI * k as f64 * i as f64 / fft_size as f64).sin())
                .sum::<f64>() as f32
        })
        .collect()
}

/// Spectrum frame with `magnitude` in `bins` on both channels, zero elsewhere
pub fn flat_spectrum(fft_size: usize, bins: RangeInclusive<usize>, magnitude: f64) -> SpectrumFrame {
    let mut mags = vec![0.0; fft_size / 2];
    for bin in bins {
        mags[bin] = magnitude;
    }
    SpectrumFrame::mono(mags)
}

pub fn funk_targets_json() -> &'static str {
    r#"{
        "funk": {
            "lufs": { "target": -9.0, "tolerance": 2.0 },
            "truePeak": { "target": -1.0, "tolerance": 1.0 },
            "dr": { "target": 8.0, "tolerance": 2.0 },
            "stereo": { "target": 0.7, "tolerance": 0.2 },
            "sub": { "target": -20.0, "tolerance": 3.0 },
            "bass": { "target": -18.0, "tolerance": 3.0 },
            "lowMid": { "target": -20.0, "tolerance": 3.0 },
            "mid": { "target": -20.0, "tolerance": 3.0 },
            "highMid": { "target": -25.0, "tolerance": 3.0 },
            "presence": { "target": -30.0, "tolerance": 3.0 },
            "air": { "target": -35.0, "tolerance": 3.0, "range": { "min": -120.0, "max": -30.0 } }
        },
        "classical": {
            "lufs": { "target": -18.0, "tolerance": 3.0 },
            "truePeak": { "target": -2.0, "tolerance": 1.0 }
        }
    }"#
}
