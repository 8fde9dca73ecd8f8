// src/core/buffer.rs
//
// In-memory inputs of one analysis job: decoded PCM and spectrum frames.

use crate::error::{MeterError, Result};

/// Lowest accepted sample rate in Hz
pub const MIN_SAMPLE_RATE: u32 = 8_000;
/// Highest accepted sample rate in Hz
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Decoded PCM, one or two channels of samples in [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Stereo buffer; both channels must have the same length
    pub fn stereo(left: Vec<f32>, right: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::from_channels(vec![left, right], sample_rate)
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::from_channels(vec![samples], sample_rate)
    }

    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(MeterError::InvalidSampleRate(sample_rate));
        }
        if channels.is_empty() || channels.len() > 2 {
            return Err(MeterError::UnsupportedChannelCount(channels.len()));
        }
        if channels.len() == 2 && channels[0].len() != channels[1].len() {
            return Err(MeterError::ChannelLengthMismatch {
                left: channels[0].len(),
                right: channels[1].len(),
            });
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Left channel (the only channel for mono)
    pub fn left(&self) -> &[f32] {
        &self.channels[0]
    }

    /// Right channel; mono buffers return the single channel
    pub fn right(&self) -> &[f32] {
        self.channels.last().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Samples per channel
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }
}

/// Left/right magnitude spectra for one analysis window
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFrame {
    left: Vec<f64>,
    right: Vec<f64>,
}

impl SpectrumFrame {
    pub fn new(left: Vec<f64>, right: Vec<f64>) -> Result<Self> {
        if left.len() != right.len() {
            return Err(MeterError::ChannelLengthMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        Ok(Self { left, right })
    }

    /// Same magnitudes on both sides
    pub fn mono(magnitudes: Vec<f64>) -> Self {
        Self {
            right: magnitudes.clone(),
            left: magnitudes,
        }
    }

    pub fn left(&self) -> &[f64] {
        &self.left
    }

    pub fn right(&self) -> &[f64] {
        &self.right
    }

    pub fn bins(&self) -> usize {
        self.left.len()
    }

    /// Per-bin stereo RMS: `sqrt((l^2 + r^2) / 2)`
    pub fn combined(&self) -> impl Iterator<Item = f64> + '_ {
        self.left
            .iter()
            .zip(&self.right)
            .map(|(l, r)| ((l * l + r * r) / 2.0).sqrt())
    }
}
