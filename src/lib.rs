//! MasterCheckr - Measure mastered audio against genre references
//!
//! An offline measurement engine for finished masters: inter-sample true peak,
//! seven-band spectral balance, and severity-graded comparison against
//! per-genre target tables.
//!
//! ## Features
//!
//! - **True peak**: polyphase oversampling (legacy 4x/48-tap or 8x/192-tap)
//! - **Compliance**: -1 dBTP / 0 dBTP flags, clip events, sample clipping
//! - **Spectral balance**: energy share and dBFS level for sub, bass, low-mid,
//!   mid, high-mid, presence and air, per frame and as a median summary
//! - **Reference comparison**: adaptive tolerances and ok / adjust / correct /
//!   critical tiers with a suggested direction
//!
//! ## Module Structure
//!
//! - `core` - Buffers, DSP utilities, measurement algorithms, track pipeline
//! - `config` - Engine configuration and genre target tables
//! - `detection` - Reference comparator and result types
//! - `error` - Error and warning types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mastercheckr::{
//!     Measurements, MetricKey, ReferenceComparator, ReferenceLibrary, SampleBuffer,
//!     SignalCharacteristics, TrackAnalyzer,
//! };
//!
//! let buffer = SampleBuffer::stereo(left, right, 48000)?;
//! let report = TrackAnalyzer::new()?.analyze_pcm(&buffer)?;
//! println!("True peak: {:.2} dBTP", report.true_peak.level_db);
//!
//! let library = ReferenceLibrary::from_json(&targets_json)?;
//! let measurements = Measurements::from_report(&report).with(MetricKey::Loudness, -8.4);
//! let characteristics = SignalCharacteristics::from_report(&report);
//! let comparison = ReferenceComparator::default()
//!     .compare_all(&measurements, library.genre("funk")?, &characteristics)?;
//! ```
//!
//! ## Filter Presets
//!
//! | Preset     | Factor | Taps | Notes                                 |
//! |------------|--------|------|---------------------------------------|
//! | Legacy4x   | 4x     | 48   | Frozen table, matches older reports   |
//! | Upgraded8x | 8x     | 192  | Default, designed when first needed   |

// Core measurement functionality
pub mod core;

// Configuration and reference targets
pub mod config;

// Reference comparison
pub mod detection;

// Errors and warnings
pub mod error;

// Re-export commonly used types at crate root for convenience
pub use config::{
    ConfigBuilder, EngineConfig, EnginePreset, FilterPreset, MetricKey, MetricTarget,
    ReferenceLibrary, TargetRange, TargetTable, ToleranceRules,
};
pub use crate::core::analysis::{
    AggregatedBands, BandKey, BandStatus, FrameBands, TruePeakDetector, TruePeakResult,
};
pub use crate::core::{
    AnalyzerBuilder, SampleBuffer, SpectralAnalyzer, SpectrumFrame, TrackAnalyzer, TrackReport,
};
pub use detection::{
    ComparisonReport, ComparisonResult, Direction, Measurements, ReferenceComparator,
    SeverityTier, SignalCharacteristics,
};
pub use error::{AnalysisWarning, MeterError, Result};
