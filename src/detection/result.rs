//! Comparison result types

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::config::{MetricKey, TargetRange};
use crate::error::AnalysisWarning;

/// How far a metric sits from its target, relative to the effective tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    /// Within tolerance
    Ok,
    /// Up to twice the tolerance
    Adjust,
    /// Up to three times the tolerance
    Correct,
    /// Beyond three times the tolerance, or over a hard cap
    Critical,
}

impl SeverityTier {
    /// Tier for `|delta| / effective_tolerance`; each boundary belongs to the milder tier
    pub fn from_z_score(z_score: f64) -> Self {
        match z_score {
            z if z <= 1.0 => SeverityTier::Ok,
            z if z <= 2.0 => SeverityTier::Adjust,
            z if z <= 3.0 => SeverityTier::Correct,
            _ => SeverityTier::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityTier::Ok => "ok",
            SeverityTier::Adjust => "adjust",
            SeverityTier::Correct => "correct",
            SeverityTier::Critical => "critical",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way the measured value should move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Reduce,
    Increase,
}

impl Direction {
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            Direction::Reduce
        } else {
            Direction::Increase
        }
    }
}

/// Condition that widened a tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    ShortDuration,
    WideLoudnessRange,
    NearMono,
    HighlyTonal,
    /// Extra widening of the upper bands on tonal material
    HighlyTonalHighBand,
    HotTruePeak,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ToleranceAdjustment {
    pub reason: AdjustmentReason,
    pub increment: f64,
}

/// Outcome of comparing one metric with its target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub metric: MetricKey,
    pub label: &'static str,
    pub unit: &'static str,
    pub measured: f64,
    pub target: f64,
    pub tolerance_base: f64,
    pub effective_tolerance: f64,
    pub adjustments: Vec<ToleranceAdjustment>,
    /// `measured - target`
    pub delta: f64,
    /// `|delta|`
    pub deviation: f64,
    /// `deviation / effective_tolerance`
    pub z_score: f64,
    pub severity: SeverityTier,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<TargetRange>,
    /// Measured value inside the explicit range
    pub within_range: bool,
    /// Measured true peak above the hard cap
    pub hard_cap_exceeded: bool,
}

impl ComparisonResult {
    pub fn is_ok(&self) -> bool {
        self.severity == SeverityTier::Ok
    }
}

/// All comparisons for one track against one genre
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ComparisonReport {
    pub genre: String,
    /// Most severe first
    pub results: Vec<ComparisonResult>,
    /// Measured metrics with no target
    pub skipped: Vec<MetricKey>,
    pub warnings: Vec<AnalysisWarning>,
}

impl ComparisonReport {
    pub fn new(genre: impl Into<String>) -> Self {
        Self {
            genre: genre.into(),
            ..Default::default()
        }
    }

    /// Order results by severity, then by z-score, both descending
    pub fn sort(&mut self) {
        self.results.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| b.z_score.partial_cmp(&a.z_score).unwrap_or(Ordering::Equal))
        });
    }

    pub fn get(&self, metric: MetricKey) -> Option<&ComparisonResult> {
        self.results.iter().find(|r| r.metric == metric)
    }

    pub fn worst(&self) -> Option<SeverityTier> {
        self.results.iter().map(|r| r.severity).max()
    }

    pub fn count(&self, tier: SeverityTier) -> usize {
        self.results.iter().filter(|r| r.severity == tier).count()
    }

    /// Every compared metric within tolerance
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(ComparisonResult::is_ok)
    }
}
