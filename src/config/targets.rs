// src/config/targets.rs
//
// Per-genre reference targets consumed by the comparator

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::analysis::bands::BandKey;
use crate::error::{MeterError, Result};

/// Metric that can be compared against a genre target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MetricKey {
    /// Integrated loudness, LUFS
    Loudness,
    /// Maximum true peak, dBTP
    TruePeak,
    /// Dynamic range, dB
    DynamicRange,
    /// Loudness range, LU
    LoudnessRange,
    /// Left/right correlation, -1..1
    StereoCorrelation,
    /// Spectral band level, dB
    Band(BandKey),
}

impl MetricKey {
    pub fn all() -> Vec<Self> {
        let mut keys = vec![
            Self::Loudness,
            Self::TruePeak,
            Self::DynamicRange,
            Self::LoudnessRange,
            Self::StereoCorrelation,
        ];
        keys.extend(BandKey::ALL.iter().map(|&band| Self::Band(band)));
        keys
    }

    /// Key as written in target tables
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loudness => "lufs",
            Self::TruePeak => "truePeak",
            Self::DynamicRange => "dr",
            Self::LoudnessRange => "lra",
            Self::StereoCorrelation => "stereo",
            Self::Band(band) => band.as_str(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Loudness => "Loudness",
            Self::TruePeak => "True Peak",
            Self::DynamicRange => "Dynamic Range",
            Self::LoudnessRange => "Loudness Range",
            Self::StereoCorrelation => "Stereo Correlation",
            Self::Band(band) => band.display_name(),
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::Loudness => "LUFS",
            Self::TruePeak => "dBTP",
            Self::DynamicRange => "dB",
            Self::LoudnessRange => "LU",
            Self::StereoCorrelation => "",
            Self::Band(_) => "dB",
        }
    }

    pub fn band(&self) -> Option<BandKey> {
        match self {
            Self::Band(band) => Some(*band),
            _ => None,
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = MeterError;

    fn from_str(s: &str) -> Result<Self> {
        let key = match s.trim().to_ascii_lowercase().as_str() {
            "lufs" | "loudness" | "lufs_integrated" | "integrated" => Self::Loudness,
            "truepeak" | "true_peak" | "tp" | "dbtp" => Self::TruePeak,
            "dr" | "dynamic_range" | "dynamicrange" => Self::DynamicRange,
            "lra" | "loudness_range" | "loudnessrange" => Self::LoudnessRange,
            "stereo" | "correlation" | "stereo_correlation" => Self::StereoCorrelation,
            _ => {
                return s
                    .parse::<BandKey>()
                    .map(Self::Band)
                    .map_err(|_| MeterError::UnknownMetricKey(s.to_string()))
            }
        };
        Ok(key)
    }
}

impl From<MetricKey> for String {
    fn from(key: MetricKey) -> Self {
        key.as_str().to_string()
    }
}

impl TryFrom<String> for MetricKey {
    type Error = MeterError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Explicit acceptable window for a metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRange {
    pub min: f64,
    pub max: f64,
}

impl TargetRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Target value and base tolerance for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricTarget {
    pub target: f64,
    #[serde(alias = "toleranceBase", alias = "tolerance")]
    pub tolerance_base: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<TargetRange>,
}

impl MetricTarget {
    pub fn new(target: f64, tolerance_base: f64) -> Self {
        Self {
            target,
            tolerance_base,
            range: None,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some(TargetRange { min, max });
        self
    }

    fn validate(&self, metric: MetricKey) -> Result<()> {
        if !self.tolerance_base.is_finite() || self.tolerance_base <= 0.0 {
            return Err(MeterError::InvalidTolerance {
                metric,
                tolerance: self.tolerance_base,
            });
        }
        if !self.target.is_finite() {
            return Err(MeterError::InvalidConfig(format!(
                "target for '{}' must be finite",
                metric
            )));
        }
        if let Some(range) = self.range {
            if !(range.min.is_finite() && range.max.is_finite() && range.min <= range.max) {
                return Err(MeterError::InvalidConfig(format!(
                    "range for '{}' must satisfy min <= max, got {}..{}",
                    metric, range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

/// Targets for one genre
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TargetTable {
    pub genre: String,
    pub metrics: BTreeMap<MetricKey, MetricTarget>,
}

impl TargetTable {
    pub fn new(genre: impl Into<String>) -> Self {
        Self {
            genre: genre.into(),
            metrics: BTreeMap::new(),
        }
    }

    /// Add or replace a target
    pub fn with(mut self, metric: MetricKey, target: MetricTarget) -> Self {
        self.metrics.insert(metric, target);
        self
    }

    pub fn insert(&mut self, metric: MetricKey, target: MetricTarget) {
        self.metrics.insert(metric, target);
    }

    pub fn get(&self, metric: MetricKey) -> Option<&MetricTarget> {
        self.metrics.get(&metric)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        self.metrics
            .iter()
            .try_for_each(|(&metric, target)| target.validate(metric))
    }

    /// Parse `{ "genre": ..., "metrics": { "lufs": {...}, ... } }`
    pub fn from_json(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }
}

/// Target tables for several genres, looked up case-insensitively
#[derive(Debug, Clone, Default)]
pub struct ReferenceLibrary {
    tables: BTreeMap<String, TargetTable>,
}

impl ReferenceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{ "<genre>": { "<metric>": { "target": .., "tolerance": .. } } }`
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, BTreeMap<MetricKey, MetricTarget>> =
            serde_json::from_str(json)?;
        let mut library = Self::new();
        for (genre, metrics) in raw {
            library.insert(TargetTable { genre, metrics })?;
        }
        Ok(library)
    }

    pub fn insert(&mut self, table: TargetTable) -> Result<()> {
        table.validate()?;
        self.tables.insert(table.genre.to_lowercase(), table);
        Ok(())
    }

    pub fn genre(&self, name: &str) -> Result<&TargetTable> {
        self.tables
            .get(&name.trim().to_lowercase())
            .ok_or_else(|| MeterError::UnknownGenre(name.to_string()))
    }

    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.tables.values().map(|t| t.genre.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
