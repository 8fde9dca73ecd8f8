// src/core/analysis/spectral.rs
//
// Per-frame spectral band energy, percentage share and dBFS level.
// Works on externally produced magnitude spectra (left/right, fft/2 bins).

use std::sync::Arc;

use log::debug;
use serde::Serialize;

use super::bands::{BandBinRange, BandKey, BandMapper};
use crate::config::EngineConfig;
use crate::core::buffer::SpectrumFrame;
use crate::core::dsp::stats::{round_to, spectral_flatness};
use crate::error::{AnalysisWarning, MeterError, Result};

/// Per-frame percentages must sum to 100 within this margin
pub const FRAME_PERCENTAGE_TOLERANCE: f64 = 0.1;

/// Residuals smaller than this are left alone by the normalizer
const RESIDUAL_EPSILON: f64 = 0.001;

/// Whether a band could be measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandStatus {
    Calculated,
    NotCalculated,
}

/// One band of one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameBandResult {
    pub key: BandKey,
    pub name: &'static str,
    pub frequency_range: String,
    pub energy: Option<f64>,
    /// `10 * log10(energy)`, absent for zero energy
    pub energy_db: Option<f64>,
    pub percentage: Option<f64>,
    pub level_db: Option<f64>,
    pub bin_count: usize,
    pub actual_min_hz: f64,
    pub actual_max_hz: f64,
    pub status: BandStatus,
}

impl FrameBandResult {
    fn not_calculated(range: &BandBinRange) -> Self {
        Self {
            key: range.key(),
            name: range.key().display_name(),
            frequency_range: range.definition.frequency_range(),
            energy: None,
            energy_db: None,
            percentage: None,
            level_db: None,
            bin_count: range.bin_count(),
            actual_min_hz: range.actual_min_hz,
            actual_max_hz: range.actual_max_hz,
            status: BandStatus::NotCalculated,
        }
    }
}

/// All seven bands of one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameBands {
    pub frame: usize,
    /// Ordered as [`BandKey::ALL`]
    pub bands: Vec<FrameBandResult>,
    pub total_energy: f64,
    pub total_percentage: f64,
    /// Largest combined bin magnitude
    pub peak_magnitude: f64,
    /// Spectral flatness of the combined magnitudes (0 tonal, 1 noise-like)
    pub flatness: f64,
    /// Percentages sum to 100 within [`FRAME_PERCENTAGE_TOLERANCE`]
    pub valid: bool,
    /// False when total energy is below the floor
    pub measurable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<AnalysisWarning>,
}

impl FrameBands {
    pub fn band(&self, key: BandKey) -> &FrameBandResult {
        &self.bands[key.index()]
    }
}

/// Raw band energies of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandEnergies {
    pub energies: [f64; 7],
    pub total: f64,
    pub peak_magnitude: f64,
    /// Spectral flatness of the combined magnitudes
    pub flatness: f64,
}

/// Sum combined stereo power per band.
///
/// Each bin's magnitude is `sqrt((l^2 + r^2) / 2)` and contributes its
/// square; bins past the end of the frame contribute nothing. The total is
/// the sum of the band energies, so out-of-band bins never count. Peak and
/// flatness are taken over every combined bin.
pub fn accumulate(frame: &SpectrumFrame, ranges: &[BandBinRange]) -> BandEnergies {
    let combined: Vec<f64> = frame.combined().collect();
    let peak_magnitude = combined.iter().cloned().fold(0.0, f64::max);

    let mut energies = [0.0; 7];
    for (slot, range) in energies.iter_mut().zip(ranges) {
        let end = (range.max_bin + 1).min(combined.len());
        if range.min_bin < end {
            *slot = combined[range.min_bin..end].iter().map(|m| m * m).sum();
        }
    }

    BandEnergies {
        total: energies.iter().sum(),
        energies,
        peak_magnitude,
        flatness: spectral_flatness(&combined),
    }
}

/// Convert energies to percentages summing to exactly 100.
///
/// Shares are rescaled to 100, any residual above 0.001 is spread evenly over
/// the bands, and negatives are clamped to 0. No rounding happens here.
pub fn normalize_percentages(energies: &[f64; 7], total: f64) -> [f64; 7] {
    let mut shares = [0.0; 7];
    if total <= 0.0 {
        return shares;
    }

    for (share, energy) in shares.iter_mut().zip(energies) {
        *share = energy / total * 100.0;
    }

    let sum: f64 = shares.iter().sum();
    if sum > 0.0 {
        let scale = 100.0 / sum;
        shares.iter_mut().for_each(|s| *s *= scale);
    }

    let residual = 100.0 - shares.iter().sum::<f64>();
    if residual.abs() > RESIDUAL_EPSILON {
        let step = residual / shares.len() as f64;
        shares.iter_mut().for_each(|s| *s += step);
    }

    shares.iter_mut().for_each(|s| *s = s.max(0.0));
    shares
}

/// Band level in dBFS.
///
/// Per-bin RMS amplitude `sqrt(energy / bins)` referenced to the larger of the
/// frame peak magnitude and 1.0, clamped to `[floor_db, 0]` and rounded to one
/// decimal. Zero energy reads as `floor_db`.
pub fn band_level_dbfs(energy: f64, bin_count: usize, peak_magnitude: f64, floor_db: f64) -> f64 {
    if energy <= 0.0 || bin_count == 0 {
        return floor_db;
    }
    let rms = (energy / bin_count as f64).sqrt();
    let reference = peak_magnitude.max(1.0);
    let level = 20.0 * (rms / reference).log10();
    round_to(level.clamp(floor_db, 0.0), 1)
}

/// Band calculator for one sample rate.
///
/// Holds only the immutable band mapping, so one instance can process any
/// number of frames, in any order, from any thread.
#[derive(Debug, Clone)]
pub struct SpectralBandsCalculator {
    config: Arc<EngineConfig>,
    mapper: BandMapper,
}

impl SpectralBandsCalculator {
    pub fn new(config: Arc<EngineConfig>, sample_rate: u32) -> Result<Self> {
        let mapper = BandMapper::new(&config, sample_rate)?;
        Ok(Self { config, mapper })
    }

    pub fn mapper(&self) -> &BandMapper {
        &self.mapper
    }

    /// Compute every band of one frame
    pub fn calculate(&self, frame_index: usize, frame: &SpectrumFrame) -> Result<FrameBands> {
        let max_bins = self.mapper.fft_size() / 2;
        if frame.bins() > max_bins {
            return Err(MeterError::SpectrumTooLong {
                bins: frame.bins(),
                max: max_bins,
            });
        }

        let ranges = self.mapper.ranges();
        let energies = accumulate(frame, ranges);

        if energies.total < self.config.min_frame_energy || energies.total <= 0.0 {
            debug!(
                "frame {}: insufficient energy ({:.3e}), bands not calculated",
                frame_index, energies.total
            );
            return Ok(FrameBands {
                frame: frame_index,
                bands: ranges.iter().map(FrameBandResult::not_calculated).collect(),
                total_energy: energies.total,
                total_percentage: 0.0,
                peak_magnitude: energies.peak_magnitude,
                flatness: 0.0,
                valid: false,
                measurable: false,
                warning: Some(AnalysisWarning::InsufficientEnergy {
                    frame: frame_index,
                    total_energy: energies.total,
                }),
            });
        }

        let percentages = normalize_percentages(&energies.energies, energies.total);
        let floor = self.config.level_floor_db;

        let bands: Vec<FrameBandResult> = ranges
            .iter()
            .zip(energies.energies.iter().zip(percentages))
            .map(|(range, (&energy, percentage))| FrameBandResult {
                key: range.key(),
                name: range.key().display_name(),
                frequency_range: range.definition.frequency_range(),
                energy: Some(energy),
                energy_db: (energy > 0.0).then(|| 10.0 * energy.log10()),
                percentage: Some(percentage),
                level_db: Some(band_level_dbfs(
                    energy,
                    range.bin_count(),
                    energies.peak_magnitude,
                    floor,
                )),
                bin_count: range.bin_count(),
                actual_min_hz: range.actual_min_hz,
                actual_max_hz: range.actual_max_hz,
                status: BandStatus::Calculated,
            })
            .collect();

        let total_percentage: f64 = percentages.iter().sum();

        Ok(FrameBands {
            frame: frame_index,
            bands,
            total_energy: energies.total,
            total_percentage,
            peak_magnitude: energies.peak_magnitude,
            flatness: energies.flatness,
            valid: (total_percentage - 100.0).abs() < FRAME_PERCENTAGE_TOLERANCE,
            measurable: true,
            warning: None,
        })
    }

    /// Compute every frame of a track, in order
    pub fn calculate_all(&self, frames: &[SpectrumFrame]) -> Result<Vec<FrameBands>> {
        frames
            .iter()
            .enumerate()
            .map(|(i, frame)| self.calculate(i, frame))
            .collect()
    }
}
