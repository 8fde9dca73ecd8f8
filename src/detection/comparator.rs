// src/detection/comparator.rs
//
// Reference comparison with adaptive tolerances

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::result::{
    AdjustmentReason, ComparisonReport, ComparisonResult, Direction, SeverityTier,
    ToleranceAdjustment,
};
use crate::config::{EngineConfig, MetricKey, MetricTarget, TargetTable, ToleranceRules};
use crate::core::analysis::BandKey;
use crate::core::analyzer::TrackReport;
use crate::error::{AnalysisWarning, MeterError, Result};

/// Auxiliary signal properties that widen tolerances. Absent values never trigger.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalCharacteristics {
    pub duration_secs: Option<f64>,
    pub loudness_range_lu: Option<f64>,
    pub stereo_correlation: Option<f64>,
    pub spectral_flatness: Option<f64>,
    pub true_peak_dbtp: Option<f64>,
}

impl SignalCharacteristics {
    /// Everything derivable from the track itself; loudness range stays unset
    pub fn from_report(report: &TrackReport) -> Self {
        Self {
            duration_secs: Some(report.duration_secs),
            loudness_range_lu: None,
            stereo_correlation: Some(report.stereo.correlation),
            spectral_flatness: report.spectral_flatness,
            true_peak_dbtp: Some(report.true_peak.level_db).filter(|db| db.is_finite()),
        }
    }

    pub fn with_loudness_range(mut self, lu: f64) -> Self {
        self.loudness_range_lu = Some(lu);
        self
    }
}

/// Measured metric values for one track
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurements {
    values: BTreeMap<MetricKey, f64>,
}

impl Measurements {
    pub fn new() -> Self {
        Self::default()
    }

    /// True peak and aggregated band levels of a report.
    ///
    /// Loudness, dynamic range, loudness range and correlation targets come
    /// from an external loudness meter and are added with [`Measurements::with`].
    pub fn from_report(report: &TrackReport) -> Self {
        let mut measurements = Self::new();
        if report.true_peak.level_db.is_finite() {
            measurements.insert(MetricKey::TruePeak, report.true_peak.level_db);
        }
        for key in BandKey::ALL {
            if let Some(level) = report.bands.level_db(key) {
                measurements.insert(MetricKey::Band(key), level);
            }
        }
        measurements
    }

    pub fn with(mut self, metric: MetricKey, value: f64) -> Self {
        self.insert(metric, value);
        self
    }

    pub fn insert(&mut self, metric: MetricKey, value: f64) {
        self.values.insert(metric, value);
    }

    pub fn get(&self, metric: MetricKey) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKey, f64)> + '_ {
        self.values.iter().map(|(&k, &v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Stateless comparator; safe to share across threads and metrics
#[derive(Debug, Clone, Default)]
pub struct ReferenceComparator {
    rules: ToleranceRules,
}

impl ReferenceComparator {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_rules(config.tolerance.clone())
    }

    pub fn with_rules(rules: ToleranceRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ToleranceRules {
        &self.rules
    }

    /// Base tolerance widened by every applicable condition
    pub fn effective_tolerance(
        &self,
        metric: MetricKey,
        base: f64,
        characteristics: &SignalCharacteristics,
    ) -> (f64, Vec<ToleranceAdjustment>) {
        let rules = &self.rules;
        let mut adjustments = Vec::new();
        let mut add = |reason, increment: f64| {
            if increment > 0.0 {
                adjustments.push(ToleranceAdjustment { reason, increment });
            }
        };

        if matches!(characteristics.duration_secs, Some(d) if d < rules.short_duration_secs) {
            add(AdjustmentReason::ShortDuration, rules.short_duration_increment);
        }
        if matches!(characteristics.loudness_range_lu, Some(lra) if lra > rules.wide_lra_lu) {
            add(AdjustmentReason::WideLoudnessRange, rules.wide_lra_increment);
        }
        if matches!(characteristics.stereo_correlation, Some(c) if c > rules.near_mono_correlation)
        {
            add(AdjustmentReason::NearMono, rules.near_mono_increment);
        }
        if matches!(characteristics.spectral_flatness, Some(f) if f < rules.tonal_flatness) {
            add(AdjustmentReason::HighlyTonal, rules.tonal_increment);
            if metric.band().map_or(false, |b| b.is_high()) {
                add(
                    AdjustmentReason::HighlyTonalHighBand,
                    rules.tonal_high_band_increment,
                );
            }
        }
        if matches!(characteristics.true_peak_dbtp, Some(tp) if tp > rules.hot_true_peak_dbtp) {
            add(AdjustmentReason::HotTruePeak, rules.hot_true_peak_increment);
        }

        let effective = base + adjustments.iter().map(|a| a.increment).sum::<f64>();
        (effective, adjustments)
    }

    /// Compare one measured value with its target
    pub fn compare(
        &self,
        metric: MetricKey,
        measured: f64,
        target: &MetricTarget,
        characteristics: &SignalCharacteristics,
    ) -> Result<ComparisonResult> {
        if !measured.is_finite() {
            return Err(MeterError::InvalidConfig(format!(
                "measured value for '{}' must be finite, got {}",
                metric, measured
            )));
        }

        let (effective_tolerance, adjustments) =
            self.effective_tolerance(metric, target.tolerance_base, characteristics);
        if !effective_tolerance.is_finite() || effective_tolerance <= 0.0 {
            return Err(MeterError::InvalidTolerance {
                metric,
                tolerance: effective_tolerance,
            });
        }

        let delta = measured - target.target;
        let deviation = delta.abs();
        let z_score = deviation / effective_tolerance;

        let within_range = target.range.map_or(false, |r| r.contains(measured));
        let hard_cap_exceeded = metric == MetricKey::TruePeak
            && matches!(self.rules.true_peak_hard_cap_dbtp, Some(cap) if measured > cap);

        let severity = if hard_cap_exceeded {
            SeverityTier::Critical
        } else if within_range {
            SeverityTier::Ok
        } else {
            SeverityTier::from_z_score(z_score)
        };

        Ok(ComparisonResult {
            metric,
            label: metric.label(),
            unit: metric.unit(),
            measured,
            target: target.target,
            tolerance_base: target.tolerance_base,
            effective_tolerance,
            adjustments,
            delta,
            deviation,
            z_score,
            severity,
            direction: Direction::from_delta(delta),
            range: target.range,
            within_range,
            hard_cap_exceeded,
        })
    }

    /// Compare every measured metric that has a target; the rest are skipped
    pub fn compare_all(
        &self,
        measurements: &Measurements,
        table: &TargetTable,
        characteristics: &SignalCharacteristics,
    ) -> Result<ComparisonReport> {
        let mut report = ComparisonReport::new(table.genre.clone());

        for (metric, measured) in measurements.iter() {
            match table.get(metric) {
                Some(target) => {
                    let result = self.compare(metric, measured, target, characteristics)?;
                    report.results.push(result);
                }
                None => {
                    debug!("no target for '{}' in '{}', skipped", metric, table.genre);
                    report.skipped.push(metric);
                    report
                        .warnings
                        .push(AnalysisWarning::MissingReferenceTarget { metric });
                }
            }
        }

        report.sort();
        debug!(
            "compared {} metrics against '{}' ({} skipped), worst: {:?}",
            report.results.len(),
            table.genre,
            report.skipped.len(),
            report.worst()
        );
        Ok(report)
    }
}
