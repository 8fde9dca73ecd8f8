//! Digital Signal Processing utilities

pub mod delay_line;
pub mod filters;
pub mod stats;
pub mod windows;

pub use delay_line::DelayLine;
pub use filters::{design_lowpass, FilterBankCache, PolyphaseFilterBank, LEGACY_4X_COEFFS};
pub use windows::WindowFunction;

use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::config::EngineConfig;
use crate::core::buffer::{SampleBuffer, SpectrumFrame};
use crate::error::{MeterError, Result};

/// Short-time magnitude spectra for callers without their own FFT.
///
/// Magnitudes are `|X[k]| * 2 / sum(window)`, so a full-scale sine centred on
/// a bin reads 1.0. Each frame carries `fft_size / 2` bins.
pub struct SpectralAnalyzer {
    fft_size: usize,
    hop_size: usize,
    window: Vec<f64>,
    scale: f64,
    fft: Arc<dyn Fft<f64>>,
}

impl SpectralAnalyzer {
    /// Analyzer with 50% overlap
    pub fn new(fft_size: usize, window_fn: WindowFunction) -> Result<Self> {
        if fft_size < 16 || fft_size % 2 != 0 {
            return Err(MeterError::InvalidFftSize(fft_size));
        }
        let window = window_fn.generate(fft_size);
        let coherent: f64 = window.iter().sum();
        if coherent <= 0.0 {
            return Err(MeterError::InvalidConfig(format!(
                "{:?} window has no coherent gain",
                window_fn
            )));
        }

        let mut planner = FftPlanner::new();
        Ok(Self {
            fft_size,
            hop_size: fft_size / 2,
            window,
            scale: 2.0 / coherent,
            fft: planner.plan_fft_forward(fft_size),
        })
    }

    /// Analyzer sized and windowed from the configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(config.fft_size, config.analysis_window)
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Magnitude spectrum of one frame; short input is zero-padded
    pub fn magnitudes(&self, samples: &[f32]) -> Vec<f64> {
        let mut buffer: Vec<Complex<f64>> = samples
            .iter()
            .take(self.fft_size)
            .zip(self.window.iter())
            .map(|(&s, &w)| Complex::new(s as f64 * w, 0.0))
            .collect();

        buffer.resize(self.fft_size, Complex::new(0.0, 0.0));
        self.fft.process(&mut buffer);

        buffer[..self.fft_size / 2]
            .iter()
            .map(|c| c.norm() * self.scale)
            .collect()
    }

    /// Frame start offsets for a signal of `len` samples
    fn frame_starts(&self, len: usize) -> Vec<usize> {
        if len == 0 {
            return Vec::new();
        }
        let count = len.saturating_sub(self.fft_size) / self.hop_size + 1;
        (0..count).map(|i| i * self.hop_size).collect()
    }

    /// Left/right spectra for every frame of a buffer
    pub fn frames(&self, buffer: &SampleBuffer) -> Result<Vec<SpectrumFrame>> {
        let left = buffer.left();
        let right = buffer.right();

        self.frame_starts(buffer.len())
            .into_iter()
            .map(|start| {
                let end = (start + self.fft_size).min(buffer.len());
                let l = self.magnitudes(&left[start..end]);
                if buffer.channel_count() == 1 {
                    Ok(SpectrumFrame::mono(l))
                } else {
                    SpectrumFrame::new(l, self.magnitudes(&right[start..end]))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_bin_centred_sine_reads_amplitude() {
        let analyzer = SpectralAnalyzer::new(4096, WindowFunction::Hann).unwrap();
        // Bin 128 at 48 kHz is exactly 1500 Hz
        let samples: Vec<f32> = (0..4096)
            .map(|i| (2.0 * PI * 1500.0 * i as f64 / 48000.0).sin() as f32)
            .collect();
        let mags = analyzer.magnitudes(&samples);
        assert_eq!(mags.len(), 2048);
        assert!((mags[128] - 1.0).abs() < 0.01, "{}", mags[128]);
        assert!(mags[600] < 1e-3);
    }

    #[test]
    fn test_from_config_follows_window_and_size() {
        let config = EngineConfig {
            fft_size: 1024,
            analysis_window: WindowFunction::Rectangular,
            ..EngineConfig::default()
        };
        let analyzer = SpectralAnalyzer::from_config(&config).unwrap();
        assert_eq!(analyzer.fft_size(), 1024);
        assert_eq!(analyzer.hop_size(), 512);

        // Rectangular: a bin-centred tone stays in one bin
        let samples: Vec<f32> = (0..1024)
            .map(|i| (0.5 * (2.0 * PI * 10.0 * i as f64 / 1024.0).sin()) as f32)
            .collect();
        let mags = analyzer.magnitudes(&samples);
        assert!((mags[10] - 0.5).abs() < 1e-6);
        assert!(mags[9] < 1e-6 && mags[11] < 1e-6);
    }

    #[test]
    fn test_frame_count_with_half_overlap() {
        let analyzer = SpectralAnalyzer::new(1024, WindowFunction::Hann).unwrap();
        let buffer = SampleBuffer::stereo(vec![0.1; 4096], vec![0.2; 4096], 48000).unwrap();
        let frames = analyzer.frames(&buffer).unwrap();
        assert_eq!(frames.len(), 7);
        assert!(frames.iter().all(|f| f.bins() == 512));
    }

    #[test]
    fn test_short_buffer_yields_one_padded_frame() {
        let analyzer = SpectralAnalyzer::new(1024, WindowFunction::Hann).unwrap();
        let buffer = SampleBuffer::mono(vec![0.5; 300], 48000).unwrap();
        assert_eq!(analyzer.frames(&buffer).unwrap().len(), 1);

        let empty = SampleBuffer::mono(Vec::new(), 48000).unwrap();
        assert!(analyzer.frames(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_odd_size() {
        assert!(matches!(
            SpectralAnalyzer::new(1001, WindowFunction::Hann),
            Err(MeterError::InvalidFftSize(1001))
        ));
    }
}
