// tests/spectral_bands_test.rs
//
// Band mapping, per-frame calculation and median aggregation.

mod test_utils;

use std::sync::Arc;

use mastercheckr::core::analysis::{BandMapper, FrameAggregator, SpectralBandsCalculator};
use mastercheckr::{
    AnalysisWarning, BandKey, BandStatus, EngineConfig, SampleBuffer, SpectralAnalyzer,
    SpectrumFrame,
};
use test_utils::*;

fn calculator(sample_rate: u32) -> SpectralBandsCalculator {
    SpectralBandsCalculator::new(Arc::new(EngineConfig::default()), sample_rate).unwrap()
}

#[test]
fn test_sub_band_at_minus_20_dbfs() {
    init_logging();
    // Bins 2..=5 cover 20-60 Hz at 48 kHz / 4096
    let frame = flat_spectrum(4096, 2..=5, 0.1);
    let bands = calculator(48000).calculate(0, &frame).unwrap();

    let sub = bands.band(BandKey::Sub);
    assert_eq!(sub.level_db, Some(-20.0));
    assert!((sub.percentage.unwrap() - 100.0).abs() < 0.01);
    for key in &BandKey::ALL[1..] {
        assert!(bands.band(*key).percentage.unwrap() < 0.01, "{}", key);
    }
}

#[test]
fn test_1k_sine_lands_in_mid_band() {
    init_logging();
    let buffer = stereo_sine(1000.0, 1.0, 48000, 1.0);
    let frames = SpectralAnalyzer::new(4096, Default::default())
        .unwrap()
        .frames(&buffer)
        .unwrap();
    let results = calculator(48000).calculate_all(&frames).unwrap();

    for frame in &results {
        assert!(frame.measurable);
        assert!((frame.total_percentage - 100.0).abs() <= 0.1);
        assert!(frame.band(BandKey::Mid).percentage.unwrap() > 99.0);
        assert!(frame.bands.iter().all(|b| b.level_db.unwrap() <= 0.0));
    }

    let agg = FrameAggregator::new().aggregate(&results);
    assert!(agg.valid);
    assert!(agg.percentage(BandKey::Mid).unwrap() > 99.0);
    assert!((agg.total_percentage - 100.0).abs() <= 1.0);
}

#[test]
fn test_all_zero_input_not_calculated() {
    init_logging();
    let frames = vec![SpectrumFrame::mono(vec![0.0; 2048]); 4];
    let results = calculator(48000).calculate_all(&frames).unwrap();
    assert!(results.iter().all(|f| !f.measurable));
    assert!(results.iter().all(|f| f
        .bands
        .iter()
        .all(|b| b.status == BandStatus::NotCalculated)));

    let agg = FrameAggregator::new().aggregate(&results);
    assert!(agg.no_data);
    assert_eq!(agg.frames_total, 4);
    assert!(agg.bands.iter().all(|b| b.status == BandStatus::NotCalculated));
}

#[test]
fn test_noise_percentages_sum_to_100() {
    init_logging();
    let left = white_noise(48000 * 2, 0.5, 42);
    let right = white_noise(48000 * 2, 0.5, 43);
    let buffer = SampleBuffer::stereo(left, right, 48000).unwrap();
    let frames = SpectralAnalyzer::new(4096, Default::default())
        .unwrap()
        .frames(&buffer)
        .unwrap();
    let results = calculator(48000).calculate_all(&frames).unwrap();
    for frame in &results {
        assert!((frame.total_percentage - 100.0).abs() <= 0.1);
        assert!(frame.valid);
        assert!(frame.bands.iter().all(|b| b.level_db.unwrap() <= 0.0));
    }

    let agg = FrameAggregator::new().aggregate(&results);
    assert!((agg.total_percentage - 100.0).abs() <= 1.0);
    // White noise: energy share follows bandwidth, so air dominates
    assert!(agg.percentage(BandKey::Air).unwrap() > agg.percentage(BandKey::Mid).unwrap());
}

#[test]
fn test_aggregation_is_idempotent_and_median_based() {
    init_logging();
    let calc = calculator(48000);
    let mut frames: Vec<SpectrumFrame> =
        (0..9).map(|_| flat_spectrum(4096, 43..=170, 0.05)).collect();
    // One loud transient in the sub band
    frames[4] = flat_spectrum(4096, 2..=5, 0.9);
    let results = calc.calculate_all(&frames).unwrap();

    let aggregator = FrameAggregator::new();
    let first = aggregator.aggregate(&results);
    let second = aggregator.aggregate(&results);
    assert_eq!(first, second);

    assert_eq!(first.percentage(BandKey::Mid), Some(100.0));
    assert_eq!(first.percentage(BandKey::Sub), Some(0.0));
    assert_eq!(first.level_db(BandKey::Mid), Some(-26.0));
}

#[test]
fn test_coarse_fft_falls_back_with_warning() {
    init_logging();
    let mapper = BandMapper::with_bands(&EngineConfig::default().bands, 8000, 16).unwrap();
    assert!(mapper.ranges().iter().all(|r| r.bin_count() >= 1));
    assert!(mapper
        .warnings()
        .iter()
        .all(|w| matches!(w, AnalysisWarning::BandFallback { .. })));
    assert!(!mapper.warnings().is_empty());
}

#[test]
fn test_frame_result_metadata() {
    let bands = calculator(44100)
        .calculate(0, &flat_spectrum(4096, 100..=110, 0.2))
        .unwrap();
    let mid = bands.band(BandKey::Mid);
    assert_eq!(mid.name, "Mid");
    assert_eq!(mid.frequency_range, "500-2000Hz");
    assert!(mid.actual_min_hz >= 500.0 && mid.actual_max_hz < 2000.0);
    let json = serde_json::to_value(&bands).unwrap();
    assert_eq!(json["bands"][3]["status"], "calculated");
    assert_eq!(json["bands"][3]["key"], "mid");
}
