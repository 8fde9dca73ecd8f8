// src/config/profiles.rs
//
// Engine configuration shared by every measurement component

use serde::{Deserialize, Serialize};

use crate::core::analysis::bands::{validate_band_table, BandDefinition, STANDARD_BANDS};
use crate::core::dsp::stats::db_to_linear;
use crate::core::dsp::windows::WindowFunction;
use crate::error::{MeterError, Result};

/// Oversampling filter used by the true peak detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPreset {
    /// Frozen 4x table, 48 taps
    Legacy4x,
    /// 8x, 192 taps, designed when the bank is built
    Upgraded8x,
}

impl FilterPreset {
    pub fn all() -> Vec<Self> {
        vec![Self::Legacy4x, Self::Upgraded8x]
    }

    /// Oversampling factor L
    pub fn factor(&self) -> usize {
        match self {
            Self::Legacy4x => 4,
            Self::Upgraded8x => 8,
        }
    }

    /// Prototype filter length N
    pub fn taps(&self) -> usize {
        match self {
            Self::Legacy4x => 48,
            Self::Upgraded8x => 192,
        }
    }
}

impl Default for FilterPreset {
    fn default() -> Self {
        Self::Upgraded8x
    }
}

/// Preset engine configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePreset {
    /// 8x oversampling with default thresholds
    Standard,
    /// Legacy 4x table, for comparing against older reports
    Legacy,
    /// User-defined settings
    Custom,
}

/// Thresholds and increments that widen a comparison tolerance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceRules {
    /// Tracks shorter than this (seconds) are considered short
    pub short_duration_secs: f64,
    pub short_duration_increment: f64,
    /// Loudness range (LU) above which dynamics are considered wide
    pub wide_lra_lu: f64,
    pub wide_lra_increment: f64,
    /// Stereo correlation above which a track is near-mono
    pub near_mono_correlation: f64,
    pub near_mono_increment: f64,
    /// Spectral flatness below which a track is highly tonal
    pub tonal_flatness: f64,
    pub tonal_increment: f64,
    /// Extra widening for highMid/presence/air on tonal material
    pub tonal_high_band_increment: f64,
    /// True peak (dBTP) above which a track is considered hot
    pub hot_true_peak_dbtp: f64,
    pub hot_true_peak_increment: f64,
    /// True peak above this is critical regardless of tolerance
    pub true_peak_hard_cap_dbtp: Option<f64>,
}

impl Default for ToleranceRules {
    fn default() -> Self {
        Self {
            short_duration_secs: 30.0,
            short_duration_increment: 0.5,
            wide_lra_lu: 10.0,
            wide_lra_increment: 0.5,
            near_mono_correlation: 0.95,
            near_mono_increment: 0.5,
            tonal_flatness: 0.2,
            tonal_increment: 0.5,
            tonal_high_band_increment: 0.5,
            hot_true_peak_dbtp: -1.0,
            hot_true_peak_increment: 0.3,
            true_peak_hard_cap_dbtp: Some(0.0),
        }
    }
}

impl ToleranceRules {
    /// Tolerance widening switched off entirely
    pub fn disabled() -> Self {
        Self {
            short_duration_increment: 0.0,
            wide_lra_increment: 0.0,
            near_mono_increment: 0.0,
            tonal_increment: 0.0,
            tonal_high_band_increment: 0.0,
            hot_true_peak_increment: 0.0,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        let increments = [
            ("short_duration_increment", self.short_duration_increment),
            ("wide_lra_increment", self.wide_lra_increment),
            ("near_mono_increment", self.near_mono_increment),
            ("tonal_increment", self.tonal_increment),
            ("tonal_high_band_increment", self.tonal_high_band_increment),
            ("hot_true_peak_increment", self.hot_true_peak_increment),
        ];
        for (name, value) in increments {
            if !value.is_finite() || value < 0.0 {
                return Err(MeterError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if let Some(cap) = self.true_peak_hard_cap_dbtp {
            if !cap.is_finite() {
                return Err(MeterError::InvalidConfig(
                    "true_peak_hard_cap_dbtp must be finite".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Complete engine configuration.
///
/// Built once per job and shared read-only by the true peak detector, band
/// mapper, calculators and comparator, so thresholds cannot drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Configuration name
    pub name: String,
    /// Base preset this was derived from
    pub base_preset: EnginePreset,
    /// Oversampling filter for true peak detection
    pub filter: FilterPreset,
    /// Gain applied to every polyphase coefficient
    pub phase_gain: f64,
    /// FFT size the spectrum frames were produced with
    pub fft_size: usize,
    /// Window used when the engine frames PCM itself.
    ///
    /// Band levels read the per-bin RMS of the magnitude spectrum. A steady
    /// tone of amplitude `A` inside a band of `n` bins reads
    /// `20 * log10(A * sqrt(enbw / n))`, where `enbw` is 1.5 bins for Hann and
    /// 1.0 for a rectangular window on bin-centred content.
    pub analysis_window: WindowFunction,
    /// The seven contiguous analysis bands
    pub bands: [BandDefinition; 7],
    /// Frames with less total energy are unmeasurable
    pub min_frame_energy: f64,
    /// Level reported for a band with no energy in a measurable frame
    pub level_floor_db: f64,
    /// Compliance ceiling in dBTP; interpolated samples above it count as clip events
    pub clip_threshold_dbtp: f64,
    /// Hard ceiling in dBTP
    pub hot_threshold_dbtp: f64,
    /// Linear sample magnitude counted as a clipped sample
    pub sample_clip_threshold: f64,
    /// Shortest run of clipped samples reported as a clip region
    pub min_clip_run: usize,
    /// Adaptive tolerance rules for the comparator
    pub tolerance: ToleranceRules,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_preset(EnginePreset::Standard)
    }
}

impl EngineConfig {
    /// Create configuration from preset
    pub fn from_preset(preset: EnginePreset) -> Self {
        match preset {
            EnginePreset::Standard | EnginePreset::Custom => Self::standard(),
            EnginePreset::Legacy => Self::legacy(),
        }
    }

    fn standard() -> Self {
        Self {
            name: "Standard".to_string(),
            base_preset: EnginePreset::Standard,
            filter: FilterPreset::Upgraded8x,
            phase_gain: 1.0,
            fft_size: 4096,
            analysis_window: WindowFunction::Hann,
            bands: STANDARD_BANDS,
            min_frame_energy: 1e-12,
            level_floor_db: -120.0,
            clip_threshold_dbtp: -1.0,
            hot_threshold_dbtp: 0.0,
            sample_clip_threshold: 0.99,
            min_clip_run: 3,
            tolerance: ToleranceRules::default(),
        }
    }

    fn legacy() -> Self {
        Self {
            name: "Legacy".to_string(),
            base_preset: EnginePreset::Legacy,
            filter: FilterPreset::Legacy4x,
            ..Self::standard()
        }
    }

    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every value is in range
    pub fn validate(&self) -> Result<()> {
        if self.fft_size < 16 || self.fft_size % 2 != 0 {
            return Err(MeterError::InvalidFftSize(self.fft_size));
        }
        if !self.phase_gain.is_finite() || self.phase_gain <= 0.0 {
            return Err(MeterError::InvalidConfig(format!(
                "phase_gain must be positive, got {}",
                self.phase_gain
            )));
        }
        if !self.min_frame_energy.is_finite() || self.min_frame_energy < 0.0 {
            return Err(MeterError::InvalidConfig(format!(
                "min_frame_energy must be non-negative, got {}",
                self.min_frame_energy
            )));
        }
        if !self.level_floor_db.is_finite() || self.level_floor_db > 0.0 {
            return Err(MeterError::InvalidConfig(format!(
                "level_floor_db must be at most 0 dBFS, got {}",
                self.level_floor_db
            )));
        }
        if !self.clip_threshold_dbtp.is_finite() || !self.hot_threshold_dbtp.is_finite() {
            return Err(MeterError::InvalidConfig(
                "clip thresholds must be finite".to_string(),
            ));
        }
        if !(self.sample_clip_threshold > 0.0 && self.sample_clip_threshold <= 1.0) {
            return Err(MeterError::InvalidConfig(format!(
                "sample_clip_threshold must be in (0, 1], got {}",
                self.sample_clip_threshold
            )));
        }
        if self.min_clip_run == 0 {
            return Err(MeterError::InvalidConfig(
                "min_clip_run must be at least 1".to_string(),
            ));
        }
        validate_band_table(&self.bands)?;
        self.tolerance.validate()
    }

    /// Compliance ceiling as a linear amplitude
    pub fn clip_threshold_linear(&self) -> f64 {
        db_to_linear(self.clip_threshold_dbtp)
    }
}

/// Builder for custom configurations
pub struct ConfigBuilder {
    config: EngineConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn from_preset(preset: EnginePreset) -> Self {
        Self {
            config: EngineConfig::from_preset(preset),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
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

    pub fn analysis_window(mut self, window: WindowFunction) -> Self {
        self.config.analysis_window = window;
        self
    }

    pub fn bands(mut self, bands: [BandDefinition; 7]) -> Self {
        self.config.bands = bands;
        self
    }

    pub fn min_frame_energy(mut self, energy: f64) -> Self {
        self.config.min_frame_energy = energy;
        self
    }

    pub fn level_floor_db(mut self, floor: f64) -> Self {
        self.config.level_floor_db = floor;
        self
    }

    pub fn clip_threshold_dbtp(mut self, threshold: f64) -> Self {
        self.config.clip_threshold_dbtp = threshold;
        self
    }

    pub fn sample_clip_threshold(mut self, threshold: f64) -> Self {
        self.config.sample_clip_threshold = threshold;
        self
    }

    pub fn min_clip_run(mut self, samples: usize) -> Self {
        self.config.min_clip_run = samples;
        self
    }

    pub fn tolerance(mut self, rules: ToleranceRules) -> Self {
        self.config.tolerance = rules;
        self
    }

    pub fn true_peak_hard_cap(mut self, cap: Option<f64>) -> Self {
        self.config.tolerance.true_peak_hard_cap_dbtp = cap;
        self
    }

    pub fn build(mut self) -> Result<EngineConfig> {
        self.config.base_preset = EnginePreset::Custom;
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
