// src/core/analysis/true_peak.rs
//
// True peak measurement by polyphase oversampling (ITU-R BS.1770 style)

use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use super::clipping_detection::{ComplianceEvaluator, ComplianceReport, SampleClipCounter};
use crate::config::{EngineConfig, FilterPreset};
use crate::core::buffer::SampleBuffer;
use crate::core::dsp::delay_line::DelayLine;
use crate::core::dsp::filters::PolyphaseFilterBank;
use crate::core::dsp::stats::linear_to_db;
use crate::error::{AnalysisWarning, Result};

/// Running state of one channel's oversampling pass.
///
/// Owns the delay line; each pushed sample yields `L` interpolated outputs,
/// one per filter phase.
#[derive(Debug, Clone)]
pub struct TruePeakState {
    history: DelayLine,
    clip_threshold: f64,
    max_linear: f64,
    clip_events: usize,
}

impl TruePeakState {
    pub fn new(bank: &PolyphaseFilterBank, clip_threshold_linear: f64) -> Self {
        Self {
            history: DelayLine::new(bank.taps_per_phase()),
            clip_threshold: clip_threshold_linear,
            max_linear: 0.0,
            clip_events: 0,
        }
    }

    /// Feed one input sample; returns the largest interpolated magnitude it produced
    pub fn push(&mut self, bank: &PolyphaseFilterBank, sample: f64) -> f64 {
        self.history.push(sample);

        let mut largest = 0.0f64;
        for phase in bank.phases() {
            let magnitude = self.history.dot(phase).abs();
            if magnitude > self.clip_threshold {
                self.clip_events += 1;
            }
            largest = largest.max(magnitude);
        }
        self.max_linear = self.max_linear.max(largest);
        largest
    }

    pub fn max_linear(&self) -> f64 {
        self.max_linear
    }

    /// Interpolated outputs above the clip ceiling so far
    pub fn clip_events(&self) -> usize {
        self.clip_events
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.max_linear = 0.0;
        self.clip_events = 0;
    }
}

/// Peak figures for one channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelPeak {
    pub channel: usize,
    pub true_peak_linear: f64,
    pub true_peak_db: f64,
    pub sample_peak_linear: f64,
    pub sample_peak_db: f64,
    pub clip_events: usize,
    pub clipped_samples: usize,
    pub clipped_percentage: f64,
    /// Runs of consecutive clipped samples, as `[start, end)` sample indices
    pub clip_regions: Vec<(usize, usize)>,
}

/// True peak result for a whole buffer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TruePeakResult {
    /// Maximum over channels; negative infinity for silence
    pub level_db: f64,
    pub level_linear: f64,
    /// Interpolated outputs above the clip ceiling, all channels
    pub clip_events: usize,
    pub sample_peak_db: f64,
    pub sample_peak_linear: f64,
    /// Samples at or above the sample clip threshold, all channels
    pub clipped_samples: usize,
    /// Mean clipped-sample percentage over channels
    pub clipped_percentage: f64,
    pub oversampling_factor: usize,
    pub filter: FilterPreset,
    pub channels: Vec<ChannelPeak>,
    pub compliance: ComplianceReport,
    pub warnings: Vec<AnalysisWarning>,
}

impl TruePeakResult {
    pub fn is_silent(&self) -> bool {
        self.level_db == f64::NEG_INFINITY
    }
}

/// True peak detector.
///
/// The filter bank is shared and immutable; every call to
/// [`TruePeakDetector::measure`] creates fresh per-channel state, so one
/// detector may serve concurrent jobs.
#[derive(Debug, Clone)]
pub struct TruePeakDetector {
    config: Arc<EngineConfig>,
    bank: Arc<PolyphaseFilterBank>,
}

impl TruePeakDetector {
    /// Build the bank for the configured preset
    pub fn new(config: Arc<EngineConfig>) -> Result<Self> {
        let bank = PolyphaseFilterBank::for_preset(config.filter, config.phase_gain)?;
        Ok(Self {
            config,
            bank: Arc::new(bank),
        })
    }

    /// Reuse a bank built elsewhere, e.g. from a [`crate::core::dsp::filters::FilterBankCache`]
    pub fn with_bank(config: Arc<EngineConfig>, bank: Arc<PolyphaseFilterBank>) -> Self {
        Self { config, bank }
    }

    pub fn bank(&self) -> &PolyphaseFilterBank {
        &self.bank
    }

    /// Oversampled peak of a single channel
    pub fn measure_channel(&self, channel: usize, samples: &[f32]) -> ChannelPeak {
        let mut state = TruePeakState::new(&self.bank, self.config.clip_threshold_linear());
        let mut clips = SampleClipCounter::new(self.config.sample_clip_threshold)
            .with_min_consecutive(self.config.min_clip_run);

        for &sample in samples {
            let sample = sample as f64;
            state.push(&self.bank, sample);
            clips.push(sample);
        }

        let stats = clips.finish();
        let clipped_percentage = stats.clipped_percentage();
        ChannelPeak {
            channel,
            true_peak_linear: state.max_linear(),
            true_peak_db: linear_to_db(state.max_linear()),
            sample_peak_linear: stats.peak_linear,
            sample_peak_db: stats.peak_db,
            clip_events: state.clip_events(),
            clipped_samples: stats.clipped_samples,
            clipped_percentage,
            clip_regions: stats.regions,
        }
    }

    /// Measure every channel of a buffer
    pub fn measure(&self, buffer: &SampleBuffer) -> TruePeakResult {
        let channels: Vec<ChannelPeak> = buffer
            .channels()
            .enumerate()
            .map(|(i, samples)| self.measure_channel(i, samples))
            .collect();

        let mut warnings = Vec::new();
        for peak in &channels {
            // Reported as measured, never raised to the sample peak
            if peak.sample_peak_linear > 0.0 && peak.true_peak_linear < peak.sample_peak_linear {
                warn!(
                    "channel {}: true peak {:.2} dBTP below sample peak {:.2} dBFS, check filter calibration",
                    peak.channel, peak.true_peak_db, peak.sample_peak_db
                );
                warnings.push(AnalysisWarning::CalibrationAnomaly {
                    channel: peak.channel,
                    true_peak_db: peak.true_peak_db,
                    sample_peak_db: peak.sample_peak_db,
                });
            }
        }

        let level_linear = channels.iter().map(|c| c.true_peak_linear).fold(0.0, f64::max);
        let sample_peak_linear = channels
            .iter()
            .map(|c| c.sample_peak_linear)
            .fold(0.0, f64::max);
        let level_db = linear_to_db(level_linear);
        let clipped_percentage = if channels.is_empty() {
            0.0
        } else {
            channels.iter().map(|c| c.clipped_percentage).sum::<f64>() / channels.len() as f64
        };

        let compliance = ComplianceEvaluator::new(&self.config).evaluate(level_db);

        debug!(
            "true peak {:.2} dBTP ({}x), sample peak {:.2} dBFS, {} clip events, {} clip regions",
            level_db,
            self.bank.factor(),
            linear_to_db(sample_peak_linear),
            channels.iter().map(|c| c.clip_events).sum::<usize>(),
            channels.iter().map(|c| c.clip_regions.len()).sum::<usize>()
        );

        TruePeakResult {
            level_db,
            level_linear,
            clip_events: channels.iter().map(|c| c.clip_events).sum(),
            sample_peak_db: linear_to_db(sample_peak_linear),
            sample_peak_linear,
            clipped_samples: channels.iter().map(|c| c.clipped_samples).sum(),
            clipped_percentage,
            oversampling_factor: self.bank.factor(),
            filter: self.config.filter,
            channels,
            compliance,
            warnings,
        }
    }
}
