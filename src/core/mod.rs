//! Core measurement modules

pub mod analysis;
pub mod analyzer;
pub mod buffer;
pub mod dsp;

pub use analyzer::{AnalyzerBuilder, TrackAnalyzer, TrackReport};
pub use buffer::{SampleBuffer, SpectrumFrame};
pub use dsp::SpectralAnalyzer;
