//! Clipping statistics and true peak compliance
//!
//! Sample-level clipping is counted in a streaming pass; compliance flags are
//! derived from the final true peak level.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::core::dsp::stats::linear_to_db;

/// True peak above this (dBTP) risks audible digital clipping
const NEAR_FULL_SCALE_DBTP: f64 = -0.1;

/// Sample-level clipping statistics for one channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleClipStats {
    pub peak_linear: f64,
    /// Negative infinity for silence
    pub peak_db: f64,
    pub clipped_samples: usize,
    pub total_samples: usize,
    /// Runs of at least `min_consecutive` clipped samples, as `[start, end)`
    pub regions: Vec<(usize, usize)>,
}

impl SampleClipStats {
    pub fn clipped_percentage(&self) -> f64 {
        if self.total_samples == 0 {
            0.0
        } else {
            self.clipped_samples as f64 / self.total_samples as f64 * 100.0
        }
    }
}

/// Streaming sample clip counter
#[derive(Debug, Clone)]
pub struct SampleClipCounter {
    /// Magnitude at or above which a sample counts as clipped
    clip_threshold: f64,
    /// Minimum consecutive clipped samples to report a region
    min_consecutive: usize,
    peak: f64,
    clipped: usize,
    total: usize,
    run_start: Option<usize>,
    regions: Vec<(usize, usize)>,
}

impl Default for SampleClipCounter {
    fn default() -> Self {
        Self::new(0.99)
    }
}

impl SampleClipCounter {
    pub fn new(clip_threshold: f64) -> Self {
        Self {
            clip_threshold,
            min_consecutive: 3,
            peak: 0.0,
            clipped: 0,
            total: 0,
            run_start: None,
            regions: Vec::new(),
        }
    }

    pub fn with_min_consecutive(mut self, min: usize) -> Self {
        self.min_consecutive = min.max(1);
        self
    }

    pub fn push(&mut self, sample: f64) {
        let magnitude = sample.abs();
        self.peak = self.peak.max(magnitude);

        if magnitude >= self.clip_threshold {
            self.clipped += 1;
            if self.run_start.is_none() {
                self.run_start = Some(self.total);
            }
        } else {
            self.close_run(self.total);
        }
        self.total += 1;
    }

    fn close_run(&mut self, end: usize) {
        if let Some(start) = self.run_start.take() {
            if end - start >= self.min_consecutive {
                self.regions.push((start, end));
            }
        }
    }

    pub fn finish(mut self) -> SampleClipStats {
        // Trailing clipped region
        self.close_run(self.total);
        SampleClipStats {
            peak_linear: self.peak,
            peak_db: linear_to_db(self.peak),
            clipped_samples: self.clipped,
            total_samples: self.total,
            regions: self.regions,
        }
    }
}

/// Delivery compliance of a true peak level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceReport {
    pub exceeds_minus1_dbtp: bool,
    pub exceeds_0_dbtp: bool,
    /// Silent, or at or below the compliance ceiling
    pub broadcast_compliant: bool,
    pub warnings: Vec<String>,
}

/// Evaluates a true peak level against the configured ceilings
#[derive(Debug, Clone, Copy)]
pub struct ComplianceEvaluator {
    clip_threshold_dbtp: f64,
    hot_threshold_dbtp: f64,
}

impl Default for ComplianceEvaluator {
    fn default() -> Self {
        Self {
            clip_threshold_dbtp: -1.0,
            hot_threshold_dbtp: 0.0,
        }
    }
}

impl ComplianceEvaluator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            clip_threshold_dbtp: config.clip_threshold_dbtp,
            hot_threshold_dbtp: config.hot_threshold_dbtp,
        }
    }

    pub fn evaluate(&self, true_peak_db: f64) -> ComplianceReport {
        // -inf compares false against every ceiling
        let exceeds_ceiling = true_peak_db > self.clip_threshold_dbtp;
        let exceeds_hot = true_peak_db > self.hot_threshold_dbtp;

        let mut warnings = Vec::new();
        if exceeds_ceiling {
            warnings.push(format!(
                "True peak exceeds {:.0} dBTP: {:.2} dBTP",
                self.clip_threshold_dbtp, true_peak_db
            ));
        }
        if true_peak_db > NEAR_FULL_SCALE_DBTP {
            warnings.push("True peak very high: risk of digital clipping".to_string());
        }

        ComplianceReport {
            exceeds_minus1_dbtp: exceeds_ceiling,
            exceeds_0_dbtp: exceeds_hot,
            broadcast_compliant: !exceeds_ceiling,
            warnings,
        }
    }
}
