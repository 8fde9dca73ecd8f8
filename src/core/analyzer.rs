// src/core/analyzer.rs
//
// High-level track analysis API with builder pattern.

use std::sync::Arc;

use log::info;
use serde::Serialize;

use super::analysis::{
    analyze_buffer, AggregatedBands, FrameAggregator, FrameBands, SpectralBandsCalculator,
    StereoAnalysis, TruePeakDetector, TruePeakResult,
};
use super::buffer::{SampleBuffer, SpectrumFrame};
use super::dsp::filters::FilterBankCache;
use super::dsp::stats::median;
use super::dsp::{SpectralAnalyzer, WindowFunction};
use crate::config::{EngineConfig, FilterPreset};
use crate::error::{AnalysisWarning, MeterError, Result};

/// Everything measured for one track
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackReport {
    pub sample_rate: u32,
    pub channels: usize,
    pub duration_secs: f64,
    pub true_peak: TruePeakResult,
    /// Per-frame band results, in frame order
    pub frames: Vec<FrameBands>,
    /// Median over measurable frames
    pub bands: AggregatedBands,
    pub stereo: StereoAnalysis,
    /// Median spectral flatness of measurable frames
    pub spectral_flatness: Option<f64>,
    pub warnings: Vec<AnalysisWarning>,
}

/// Builder for TrackAnalyzer configuration
pub struct AnalyzerBuilder {
    config: EngineConfig,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn filter(mut self, filter: FilterPreset) -> Self {
        self.config.filter = filter;
        self
    }

    pub fn phase_gain(mut self, gain: f64) -> Self {
        self.config.phase_gain = gain;
        self
    }

    pub fn fft_size(mut self, fft_size: usize) -> Self {
        self.config.fft_size = fft_size;
        self
    }

    pub fn min_frame_energy(mut self, energy: f64) -> Self {
        self.config.min_frame_energy = energy;
        self
    }

    pub fn analysis_window(mut self, window: WindowFunction) -> Self {
        self.config.analysis_window = window;
        self
    }

    pub fn build(self) -> Result<TrackAnalyzer> {
        self.config.validate()?;
        let config = Arc::new(self.config);
        let detector = TruePeakDetector::new(Arc::clone(&config))?;
        Ok(TrackAnalyzer { config, detector })
    }

    /// Build using a bank from `cache`; the cache gain must match the configured phase gain
    pub fn build_with_cache(self, cache: &mut FilterBankCache) -> Result<TrackAnalyzer> {
        self.config.validate()?;
        if (cache.gain() - self.config.phase_gain).abs() > f64::EPSILON {
            return Err(MeterError::InvalidConfig(format!(
                "filter cache gain {} differs from phase_gain {}",
                cache.gain(),
                self.config.phase_gain
            )));
        }
        let bank = cache.get(self.config.filter)?;
        let config = Arc::new(self.config);
        let detector = TruePeakDetector::with_bank(Arc::clone(&config), bank);
        Ok(TrackAnalyzer { config, detector })
    }
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One-pass track analyzer: true peak, spectral bands and aggregation.
///
/// Holds only immutable configuration and the filter bank; all mutable state
/// lives inside a single `analyze` call.
#[derive(Debug, Clone)]
pub struct TrackAnalyzer {
    config: Arc<EngineConfig>,
    detector: TruePeakDetector,
}

impl TrackAnalyzer {
    /// Analyzer with the default configuration
    pub fn new() -> Result<Self> {
        AnalyzerBuilder::new().build()
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        AnalyzerBuilder::new().config(config).build()
    }

    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze PCM together with externally produced spectrum frames
    pub fn analyze(&self, buffer: &SampleBuffer, frames: &[SpectrumFrame]) -> Result<TrackReport> {
        let calculator = SpectralBandsCalculator::new(Arc::clone(&self.config), buffer.sample_rate())?;
        let mut warnings: Vec<AnalysisWarning> = calculator.mapper().warnings().to_vec();

        let true_peak = self.detector.measure(buffer);
        warnings.extend(true_peak.warnings.iter().cloned());

        let frame_results = calculator.calculate_all(frames)?;
        warnings.extend(frame_results.iter().filter_map(|f| f.warning.clone()));

        let bands = FrameAggregator::new().aggregate(&frame_results);

        let mut flatness: Vec<f64> = frame_results
            .iter()
            .filter(|f| f.measurable)
            .map(|f| f.flatness)
            .collect();
        let spectral_flatness = median(&mut flatness);

        let report = TrackReport {
            sample_rate: buffer.sample_rate(),
            channels: buffer.channel_count(),
            duration_secs: buffer.duration_secs(),
            true_peak,
            frames: frame_results,
            bands,
            stereo: analyze_buffer(buffer),
            spectral_flatness,
            warnings,
        };

        info!(
            "analyzed {:.1}s at {} Hz: true peak {:.2} dBTP, {}/{} frames measurable, {} warnings",
            report.duration_secs,
            report.sample_rate,
            report.true_peak.level_db,
            report.bands.frames_used,
            report.bands.frames_total,
            report.warnings.len()
        );

        Ok(report)
    }

    /// Analyze PCM alone, framing it with the configured window and FFT size
    pub fn analyze_pcm(&self, buffer: &SampleBuffer) -> Result<TrackReport> {
        let frames = SpectralAnalyzer::from_config(&self.config)?.frames(buffer)?;
        self.analyze(buffer, &frames)
    }
}
