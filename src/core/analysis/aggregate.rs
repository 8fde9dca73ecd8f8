//! Track-level band summary from per-frame results

use log::debug;
use serde::Serialize;

use super::bands::BandKey;
use super::spectral::{BandStatus, FrameBands};
use crate::core::dsp::stats::{median, round_to};

/// Aggregated percentages must sum to 100 within this margin
pub const AGGREGATE_PERCENTAGE_TOLERANCE: f64 = 1.0;

/// Median of one band across the measurable frames
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedBand {
    pub key: BandKey,
    pub name: &'static str,
    pub frequency_range: String,
    /// Median percentage, two decimals
    pub percentage: Option<f64>,
    /// Median level in dBFS, one decimal
    pub level_db: Option<f64>,
    pub status: BandStatus,
    pub frames_used: usize,
}

/// Track-level band result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedBands {
    /// Ordered as [`BandKey::ALL`]
    pub bands: Vec<AggregatedBand>,
    pub frames_used: usize,
    pub frames_total: usize,
    pub total_percentage: f64,
    pub valid: bool,
    /// No measurable frame at all
    pub no_data: bool,
}

impl AggregatedBands {
    pub fn band(&self, key: BandKey) -> Option<&AggregatedBand> {
        self.bands.iter().find(|b| b.key == key)
    }

    pub fn level_db(&self, key: BandKey) -> Option<f64> {
        self.band(key).and_then(|b| b.level_db)
    }

    pub fn percentage(&self, key: BandKey) -> Option<f64> {
        self.band(key).and_then(|b| b.percentage)
    }
}

/// Median aggregation over frames.
///
/// Pure: the input is never modified, so aggregating the same frames twice
/// gives identical output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameAggregator;

impl FrameAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, frames: &[FrameBands]) -> AggregatedBands {
        let measurable: Vec<&FrameBands> = frames.iter().filter(|f| f.measurable).collect();

        let bands: Vec<AggregatedBand> = BandKey::ALL
            .iter()
            .map(|&key| Self::aggregate_band(key, frames, &measurable))
            .collect();

        if measurable.is_empty() {
            debug!(
                "no measurable frames out of {}, returning empty aggregate",
                frames.len()
            );
            return AggregatedBands {
                bands,
                frames_used: 0,
                frames_total: frames.len(),
                total_percentage: 0.0,
                valid: false,
                no_data: true,
            };
        }

        let total_percentage = round_to(bands.iter().filter_map(|b| b.percentage).sum(), 2);
        let valid = (total_percentage - 100.0).abs() <= AGGREGATE_PERCENTAGE_TOLERANCE;

        debug!(
            "aggregated {}/{} frames, total {:.2}% (valid: {})",
            measurable.len(),
            frames.len(),
            total_percentage,
            valid
        );

        AggregatedBands {
            bands,
            frames_used: measurable.len(),
            frames_total: frames.len(),
            total_percentage,
            valid,
            no_data: false,
        }
    }

    fn aggregate_band(key: BandKey, all: &[FrameBands], measurable: &[&FrameBands]) -> AggregatedBand {
        let mut percentages = Vec::with_capacity(measurable.len());
        let mut levels = Vec::with_capacity(measurable.len());
        for frame in measurable {
            let band = frame.band(key);
            if band.status != BandStatus::Calculated {
                continue;
            }
            if let Some(p) = band.percentage {
                percentages.push(p);
            }
            if let Some(l) = band.level_db {
                levels.push(l);
            }
        }

        let (name, frequency_range) = all
            .first()
            .map(|f| {
                let band = f.band(key);
                (band.name, band.frequency_range.clone())
            })
            .unwrap_or((key.display_name(), String::new()));

        let percentage = median(&mut percentages).map(|p| round_to(p, 2));
        let level_db = median(&mut levels).map(|l| round_to(l, 1));
        let status = if percentage.is_some() {
            BandStatus::Calculated
        } else {
            BandStatus::NotCalculated
        };

        AggregatedBand {
            key,
            name,
            frequency_range,
            percentage,
            level_db,
            status,
            frames_used: percentages.len(),
        }
    }
}
