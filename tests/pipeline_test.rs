// tests/pipeline_test.rs
//
// End-to-end track analysis and comparison.

mod test_utils;

use mastercheckr::{
    AnalysisWarning, BandKey, EngineConfig, EnginePreset, FilterPreset, Measurements, MetricKey,
    ReferenceComparator, ReferenceLibrary, SampleBuffer, SeverityTier, SignalCharacteristics,
    TrackAnalyzer,
};
use mastercheckr::core::dsp::WindowFunction;
use test_utils::*;

#[test]
fn test_full_scale_1k_sine_track() {
    init_logging();
    let analyzer = TrackAnalyzer::new().unwrap();
    let report = analyzer
        .analyze_pcm(&stereo_sine(1000.0, 1.0, 48000, 2.0))
        .unwrap();

    assert!(report.true_peak.level_db.abs() <= 0.3);
    assert_eq!(report.true_peak.oversampling_factor, 8);
    assert!(report.bands.valid);
    assert!(report.bands.percentage(BandKey::Mid).unwrap() > 99.0);
    assert!((report.bands.total_percentage - 100.0).abs() <= 1.0);
    assert!(report
        .bands
        .bands
        .iter()
        .all(|b| b.level_db.unwrap() <= 0.0));
    assert!((report.duration_secs - 2.0).abs() < 1e-9);
    assert!((report.stereo.correlation - 1.0).abs() < 1e-9);
    assert!(report.spectral_flatness.unwrap() < 0.2);
    assert!(report.warnings.is_empty());
}

#[test]
fn test_silent_track_reports_no_data() {
    init_logging();
    let report = TrackAnalyzer::new()
        .unwrap()
        .analyze_pcm(&silence(44100, 1.0))
        .unwrap();
    assert_eq!(report.true_peak.level_db, f64::NEG_INFINITY);
    assert!(report.bands.no_data);
    assert!(report
        .warnings
        .iter()
        .all(|w| matches!(w, AnalysisWarning::InsufficientEnergy { .. })));

    // Nothing measurable to compare
    let measurements = Measurements::from_report(&report);
    assert!(measurements.is_empty());
}

#[test]
fn test_external_frames_drive_band_results() {
    init_logging();
    let buffer = SampleBuffer::mono(sine(40.0, 0.1, 48000, 48000), 48000).unwrap();
    let frames: Vec<_> = (0..5).map(|_| flat_spectrum(4096, 2..=5, 0.1)).collect();
    let report = TrackAnalyzer::new().unwrap().analyze(&buffer, &frames).unwrap();

    assert_eq!(report.frames.len(), 5);
    assert_eq!(report.bands.level_db(BandKey::Sub), Some(-20.0));
    assert_eq!(report.bands.percentage(BandKey::Sub), Some(100.0));
    assert!((report.true_peak.level_db - (-20.0)).abs() < 0.2);
    assert_eq!(report.channels, 1);
}

#[test]
fn test_sub_tone_through_hann_frames() {
    init_logging();
    // -20 dBFS tone at 40 Hz: the Hann main lobe spreads its energy over the
    // four sub bins, so the per-bin level reads A * sqrt(1.5 / 4)
    let buffer = SampleBuffer::mono(sine(40.0, 0.1, 48000, 96000), 48000).unwrap();
    let report = TrackAnalyzer::new().unwrap().analyze_pcm(&buffer).unwrap();

    let expected = 20.0 * (0.1 * (1.5f64 / 4.0).sqrt()).log10();
    let sub = report.bands.level_db(BandKey::Sub).unwrap();
    assert!((sub - expected).abs() <= 0.2, "sub {} expected {:.2}", sub, expected);
    assert!(report.bands.percentage(BandKey::Sub).unwrap() > 99.0);
    assert!((report.true_peak.level_db - (-20.0)).abs() < 0.1);
}

#[test]
fn test_sub_band_limited_signal_reads_minus_20_dbfs() {
    init_logging();
    // Bin-centred tones at 23-59 Hz, 0.1 each; a rectangular window keeps
    // every tone in its own bin
    let samples = bin_centred_tones(2..=5, 0.1, 4096, 4096 * 4);
    let buffer = SampleBuffer::mono(samples, 48000).unwrap();
    let analyzer = TrackAnalyzer::builder()
        .analysis_window(WindowFunction::Rectangular)
        .build()
        .unwrap();
    let report = analyzer.analyze_pcm(&buffer).unwrap();

    assert_eq!(report.frames.len(), 7);
    assert_eq!(report.bands.level_db(BandKey::Sub), Some(-20.0));
    assert!(report.bands.percentage(BandKey::Sub).unwrap() > 99.99);
    assert!(report.bands.valid);
}

#[test]
fn test_legacy_preset_analysis() {
    init_logging();
    let analyzer = TrackAnalyzer::with_config(EngineConfig::from_preset(EnginePreset::Legacy))
        .unwrap();
    let report = analyzer
        .analyze_pcm(&stereo_sine(1000.0, 1.0, 48000, 0.5))
        .unwrap();
    assert_eq!(report.true_peak.filter, FilterPreset::Legacy4x);
    assert_eq!(report.true_peak.oversampling_factor, 4);
    assert!(report.true_peak.level_db.abs() <= 0.3);
}

#[test]
fn test_report_to_comparison() {
    init_logging();
    let report = TrackAnalyzer::new()
        .unwrap()
        .analyze_pcm(&stereo_sine(1000.0, 0.5, 48000, 3.0))
        .unwrap();

    let measurements = Measurements::from_report(&report).with(MetricKey::Loudness, -12.0);
    assert!(measurements.get(MetricKey::TruePeak).is_some());
    assert_eq!(measurements.len(), 9);

    let characteristics = SignalCharacteristics::from_report(&report);
    assert_eq!(characteristics.duration_secs, Some(3.0));
    assert!(characteristics.loudness_range_lu.is_none());

    let library = ReferenceLibrary::from_json(funk_targets_json()).unwrap();
    let comparison = ReferenceComparator::new(&EngineConfig::default())
        .compare_all(&measurements, library.genre("funk").unwrap(), &characteristics)
        .unwrap();

    assert_eq!(comparison.results.len(), 9);
    assert!(comparison.skipped.is_empty());
    // Short, mono-correlated, tonal: three widenings on every metric
    let loudness = comparison.get(MetricKey::Loudness).unwrap();
    assert!((loudness.effective_tolerance - 3.5).abs() < 1e-12);
    // Silent air band: -120 dB sits inside the explicit range
    let air = comparison.get(MetricKey::Band(BandKey::Air)).unwrap();
    assert!(air.within_range);
    assert_eq!(air.severity, SeverityTier::Ok);
}

#[test]
fn test_mono_input_at_44k() {
    init_logging();
    let buffer = SampleBuffer::mono(white_noise(44100, 0.3, 5), 44100).unwrap();
    let report = TrackAnalyzer::new().unwrap().analyze_pcm(&buffer).unwrap();
    assert_eq!(report.channels, 1);
    assert_eq!(report.true_peak.channels.len(), 1);
    assert!(report.true_peak.level_db >= report.true_peak.sample_peak_db);
    assert!((report.bands.total_percentage - 100.0).abs() <= 1.0);
    assert!(report.frames.iter().all(|f| (f.total_percentage - 100.0).abs() <= 0.1));
}

#[test]
fn test_report_serializes() {
    let report = TrackAnalyzer::new()
        .unwrap()
        .analyze_pcm(&stereo_sine(440.0, 0.25, 48000, 0.5))
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["true_peak"]["filter"], "upgraded8x");
    assert_eq!(json["bands"]["bands"].as_array().unwrap().len(), 7);
}
