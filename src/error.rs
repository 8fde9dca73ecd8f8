//! Error and warning types for the measurement engine

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::MetricKey;
use crate::core::analysis::BandKey;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, MeterError>;

/// Errors that abort the current analysis or comparison
#[derive(Error, Debug)]
pub enum MeterError {
    /// Sample rate outside the supported range
    #[error("Invalid sample rate: {0} Hz (must be between 8000 and 384000)")]
    InvalidSampleRate(u32),

    /// Only mono and stereo input is supported
    #[error("Unsupported channel count: {0} (must be 1 or 2)")]
    UnsupportedChannelCount(usize),

    /// Left and right inputs differ in length
    #[error("Channel length mismatch: left has {left} values, right has {right}")]
    ChannelLengthMismatch { left: usize, right: usize },

    /// FFT size that cannot be mapped to bins
    #[error("Invalid FFT size: {0} (must be even and at least 16)")]
    InvalidFftSize(usize),

    /// Spectrum frame with more bins than the configured FFT produces
    #[error("Spectrum frame has {bins} bins, at most {max} expected")]
    SpectrumTooLong { bins: usize, max: usize },

    /// Filter parameters that cannot produce a polyphase bank
    #[error("Invalid filter design: factor {factor}, {taps} taps (taps must be a non-zero multiple of the factor)")]
    InvalidFilterDesign { factor: usize, taps: usize },

    /// Non-positive or non-finite tolerance
    #[error("Invalid tolerance {tolerance} for metric '{metric}'")]
    InvalidTolerance { metric: MetricKey, tolerance: f64 },

    /// Band table is not the contiguous 7-band layout
    #[error("Invalid band table: {0}")]
    InvalidBandTable(String),

    /// Any other out-of-range configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metric key not recognised in a target table
    #[error("Unknown metric key: {0}")]
    UnknownMetricKey(String),

    /// Genre absent from the reference library
    #[error("Unknown genre: {0}")]
    UnknownGenre(String),

    /// Malformed configuration or target JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Recoverable conditions surfaced alongside a result instead of failing it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    /// Frame total energy below the floor; frame excluded from aggregation
    InsufficientEnergy { frame: usize, total_energy: f64 },
    /// Band narrower than one FFT bin; mapped to the nearest single bin
    BandFallback { band: BandKey, bin: usize },
    /// Reconstructed true peak measured below the plain sample peak
    CalibrationAnomaly {
        channel: usize,
        true_peak_db: f64,
        sample_peak_db: f64,
    },
    /// Comparison requested for a metric with no target
    MissingReferenceTarget { metric: MetricKey },
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisWarning::InsufficientEnergy { frame, total_energy } => write!(
                f,
                "frame {} has insufficient energy ({:.3e}), excluded",
                frame, total_energy
            ),
            AnalysisWarning::BandFallback { band, bin } => write!(
                f,
                "band '{}' narrower than one bin, using bin {}",
                band, bin
            ),
            AnalysisWarning::CalibrationAnomaly {
                channel,
                true_peak_db,
                sample_peak_db,
            } => write!(
                f,
                "channel {}: true peak {:.2} dBTP below sample peak {:.2} dBFS",
                channel, true_peak_db, sample_peak_db
            ),
            AnalysisWarning::MissingReferenceTarget { metric } => {
                write!(f, "no target for metric '{}'", metric)
            }
        }
    }
}
