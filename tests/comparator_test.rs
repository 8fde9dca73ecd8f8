// tests/comparator_test.rs
//
// Reference comparison: adaptive tolerance, tiers, batch evaluation.

mod test_utils;

use mastercheckr::{
    AnalysisWarning, BandKey, Direction, Measurements, MeterError, MetricKey, MetricTarget,
    ReferenceComparator, ReferenceLibrary, SeverityTier, SignalCharacteristics, ToleranceRules,
};
use test_utils::*;

#[test]
fn test_loudness_scenario_with_one_condition() {
    init_logging();
    let chars = SignalCharacteristics {
        stereo_correlation: Some(0.98),
        ..Default::default()
    };
    let result = ReferenceComparator::default()
        .compare(MetricKey::Loudness, -6.2, &MetricTarget::new(-9.0, 2.0), &chars)
        .unwrap();

    assert!((result.effective_tolerance - 2.5).abs() < 1e-12);
    assert!((result.delta - 2.8).abs() < 1e-9);
    assert!((result.deviation - 2.8).abs() < 1e-9);
    assert!((result.z_score - 1.12).abs() < 1e-9);
    assert_eq!(result.severity, SeverityTier::Adjust);
    assert_eq!(result.direction, Direction::Reduce);
}

#[test]
fn test_boundaries_fall_into_milder_tier() {
    let comparator = ReferenceComparator::with_rules(ToleranceRules::disabled());
    let target = MetricTarget::new(-9.0, 2.5);
    let chars = SignalCharacteristics::default();
    let cases = [
        (-6.5, SeverityTier::Ok),
        (-4.0, SeverityTier::Adjust),
        (-1.5, SeverityTier::Correct),
        (-1.4, SeverityTier::Critical),
        (-11.5, SeverityTier::Ok),
        (-14.0, SeverityTier::Adjust),
    ];
    for (measured, expected) in cases {
        let result = comparator
            .compare(MetricKey::Loudness, measured, &target, &chars)
            .unwrap();
        assert_eq!(result.severity, expected, "measured {}", measured);
    }
}

#[test]
fn test_negative_delta_means_increase() {
    let result = ReferenceComparator::default()
        .compare(
            MetricKey::DynamicRange,
            4.0,
            &MetricTarget::new(8.0, 1.0),
            &SignalCharacteristics::default(),
        )
        .unwrap();
    assert_eq!(result.direction, Direction::Increase);
    assert_eq!(result.severity, SeverityTier::Critical);
}

#[test]
fn test_missing_target_skips_metric_only() {
    init_logging();
    let library = ReferenceLibrary::from_json(funk_targets_json()).unwrap();
    let classical = library.genre("Classical").unwrap();

    let measurements = Measurements::new()
        .with(MetricKey::Loudness, -17.0)
        .with(MetricKey::TruePeak, -2.5)
        .with(MetricKey::Band(BandKey::Mid), -20.0);

    let report = ReferenceComparator::default()
        .compare_all(&measurements, classical, &SignalCharacteristics::default())
        .unwrap();

    assert_eq!(report.genre, "classical");
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.skipped, vec![MetricKey::Band(BandKey::Mid)]);
    assert!(matches!(
        report.warnings.as_slice(),
        [AnalysisWarning::MissingReferenceTarget { metric: MetricKey::Band(BandKey::Mid) }]
    ));
    assert!(report.all_ok());
}

#[test]
fn test_tonal_material_widens_high_bands_more() {
    let chars = SignalCharacteristics {
        spectral_flatness: Some(0.05),
        ..Default::default()
    };
    let comparator = ReferenceComparator::default();
    let target = MetricTarget::new(-30.0, 3.0);
    let presence = comparator
        .compare(MetricKey::Band(BandKey::Presence), -36.0, &target, &chars)
        .unwrap();
    let low_mid = comparator
        .compare(MetricKey::Band(BandKey::LowMid), -36.0, &target, &chars)
        .unwrap();
    assert!((presence.effective_tolerance - 4.0).abs() < 1e-12);
    assert!((low_mid.effective_tolerance - 3.5).abs() < 1e-12);
    assert!(presence.z_score < low_mid.z_score);
}

#[test]
fn test_hot_true_peak_is_critical_over_cap() {
    let library = ReferenceLibrary::from_json(funk_targets_json()).unwrap();
    let funk = library.genre("funk").unwrap();
    let measurements = Measurements::new().with(MetricKey::TruePeak, 0.3);
    let chars = SignalCharacteristics {
        true_peak_dbtp: Some(0.3),
        ..Default::default()
    };
    let report = ReferenceComparator::default()
        .compare_all(&measurements, funk, &chars)
        .unwrap();
    let tp = report.get(MetricKey::TruePeak).unwrap();
    assert!(tp.hard_cap_exceeded);
    assert_eq!(tp.severity, SeverityTier::Critical);
    // Widening still recorded
    assert!((tp.effective_tolerance - 1.3).abs() < 1e-12);
}

#[test]
fn test_report_sorted_by_severity() {
    let library = ReferenceLibrary::from_json(funk_targets_json()).unwrap();
    let funk = library.genre("funk").unwrap();
    let measurements = Measurements::new()
        .with(MetricKey::Loudness, -9.5)
        .with(MetricKey::DynamicRange, 3.0)
        .with(MetricKey::Band(BandKey::Bass), -23.0)
        .with(MetricKey::StereoCorrelation, 0.65);
    let report = ReferenceComparator::default()
        .compare_all(&measurements, funk, &SignalCharacteristics::default())
        .unwrap();

    let tiers: Vec<SeverityTier> = report.results.iter().map(|r| r.severity).collect();
    let mut sorted = tiers.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(tiers, sorted);
    assert_eq!(report.results[0].metric, MetricKey::DynamicRange);
    assert_eq!(report.count(SeverityTier::Ok), 2);
}

#[test]
fn test_unknown_genre() {
    let library = ReferenceLibrary::from_json(funk_targets_json()).unwrap();
    assert!(matches!(
        library.genre("reggaeton"),
        Err(MeterError::UnknownGenre(_))
    ));
    assert_eq!(library.genres().count(), 2);
}
