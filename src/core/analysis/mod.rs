//! Measurement algorithms
//!
//! - True peak measurement by polyphase oversampling
//! - Sample clipping statistics and delivery compliance
//! - Seven-band spectral energy, share and level per frame
//! - Median aggregation of frames into a track summary
//! - Stereo correlation

pub mod aggregate;
pub mod bands;
pub mod clipping_detection;
pub mod spectral;
pub mod stereo;
pub mod true_peak;

pub use aggregate::{AggregatedBand, AggregatedBands, FrameAggregator};
pub use bands::{BandBinRange, BandDefinition, BandKey, BandMapper, STANDARD_BANDS};
pub use clipping_detection::{
    ComplianceEvaluator, ComplianceReport, SampleClipCounter, SampleClipStats,
};
pub use spectral::{
    accumulate, band_level_dbfs, normalize_percentages, BandEnergies, BandStatus,
    FrameBandResult, FrameBands, SpectralBandsCalculator,
};
pub use stereo::{analyze_buffer, analyze_stereo, StereoAnalysis};
pub use true_peak::{ChannelPeak, TruePeakDetector, TruePeakResult, TruePeakState};
