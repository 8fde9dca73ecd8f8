//! Frequency band table and FFT bin mapping

use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::core::buffer::{MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
use crate::error::{AnalysisWarning, MeterError, Result};

/// The seven analysis bands, ordered low to high
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BandKey {
    Sub,
    Bass,
    LowMid,
    Mid,
    HighMid,
    Presence,
    Air,
}

impl BandKey {
    pub const ALL: [BandKey; 7] = [
        BandKey::Sub,
        BandKey::Bass,
        BandKey::LowMid,
        BandKey::Mid,
        BandKey::HighMid,
        BandKey::Presence,
        BandKey::Air,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sub => "sub",
            Self::Bass => "bass",
            Self::LowMid => "lowMid",
            Self::Mid => "mid",
            Self::HighMid => "highMid",
            Self::Presence => "presence",
            Self::Air => "air",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Sub => "Sub",
            Self::Bass => "Bass",
            Self::LowMid => "Low-Mid",
            Self::Mid => "Mid",
            Self::HighMid => "High-Mid",
            Self::Presence => "Presence",
            Self::Air => "Air",
        }
    }

    /// Position in [`BandKey::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// highMid, presence and air
    pub fn is_high(&self) -> bool {
        matches!(self, Self::HighMid | Self::Presence | Self::Air)
    }
}

impl fmt::Display for BandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BandKey {
    type Err = MeterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "sub" | "subbass" => Ok(Self::Sub),
            "bass" => Ok(Self::Bass),
            "lowmid" => Ok(Self::LowMid),
            "mid" => Ok(Self::Mid),
            "highmid" => Ok(Self::HighMid),
            "presence" => Ok(Self::Presence),
            "air" | "brilliance" => Ok(Self::Air),
            _ => Err(MeterError::UnknownMetricKey(s.to_string())),
        }
    }
}

/// One band: `[low_hz, high_hz)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandDefinition {
    pub key: BandKey,
    pub low_hz: f64,
    pub high_hz: f64,
}

impl BandDefinition {
    pub const fn new(key: BandKey, low_hz: f64, high_hz: f64) -> Self {
        Self {
            key,
            low_hz,
            high_hz,
        }
    }

    pub fn center_hz(&self) -> f64 {
        (self.low_hz + self.high_hz) / 2.0
    }

    /// Label such as `20-60Hz`
    pub fn frequency_range(&self) -> String {
        format!("{}-{}Hz", self.low_hz, self.high_hz)
    }
}

/// Fixed seven-band table spanning 20 Hz to 20 kHz
pub const STANDARD_BANDS: [BandDefinition; 7] = [
    BandDefinition::new(BandKey::Sub, 20.0, 60.0),
    BandDefinition::new(BandKey::Bass, 60.0, 150.0),
    BandDefinition::new(BandKey::LowMid, 150.0, 500.0),
    BandDefinition::new(BandKey::Mid, 500.0, 2000.0),
    BandDefinition::new(BandKey::HighMid, 2000.0, 5000.0),
    BandDefinition::new(BandKey::Presence, 5000.0, 10000.0),
    BandDefinition::new(BandKey::Air, 10000.0, 20000.0),
];

/// Check the table is the seven bands in order, each non-empty and touching the next
pub fn validate_band_table(bands: &[BandDefinition; 7]) -> Result<()> {
    for (band, expected) in bands.iter().zip(BandKey::ALL) {
        if band.key != expected {
            return Err(MeterError::InvalidBandTable(format!(
                "expected band '{}' at position {}, found '{}'",
                expected,
                expected.index(),
                band.key
            )));
        }
        if !(band.low_hz.is_finite() && band.high_hz.is_finite())
            || band.low_hz <= 0.0
            || band.low_hz >= band.high_hz
        {
            return Err(MeterError::InvalidBandTable(format!(
                "band '{}' has invalid range {}..{} Hz",
                band.key, band.low_hz, band.high_hz
            )));
        }
    }
    for pair in bands.windows(2) {
        if pair[0].high_hz != pair[1].low_hz {
            return Err(MeterError::InvalidBandTable(format!(
                "bands '{}' and '{}' are not contiguous",
                pair[0].key, pair[1].key
            )));
        }
    }
    Ok(())
}

/// Inclusive bin range a band maps to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandBinRange {
    pub definition: BandDefinition,
    pub min_bin: usize,
    pub max_bin: usize,
    /// Collapsed to the single nearest bin
    pub fallback: bool,
    pub actual_min_hz: f64,
    pub actual_max_hz: f64,
}

impl BandBinRange {
    pub fn key(&self) -> BandKey {
        self.definition.key
    }

    /// Always at least one
    pub fn bin_count(&self) -> usize {
        self.max_bin - self.min_bin + 1
    }

    pub fn contains(&self, bin: usize) -> bool {
        bin >= self.min_bin && bin <= self.max_bin
    }
}

/// Maps the band table onto FFT bins for one sample rate and FFT size.
///
/// A bin `k` belongs to a band when `low <= k * sr / fft < high`, so adjacent
/// bands never share a bin.
#[derive(Debug, Clone)]
pub struct BandMapper {
    sample_rate: u32,
    fft_size: usize,
    ranges: Vec<BandBinRange>,
    warnings: Vec<AnalysisWarning>,
}

impl BandMapper {
    pub fn new(config: &EngineConfig, sample_rate: u32) -> Result<Self> {
        Self::with_bands(&config.bands, sample_rate, config.fft_size)
    }

    pub fn with_bands(
        bands: &[BandDefinition; 7],
        sample_rate: u32,
        fft_size: usize,
    ) -> Result<Self> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(MeterError::InvalidSampleRate(sample_rate));
        }
        if fft_size < 16 || fft_size % 2 != 0 {
            return Err(MeterError::InvalidFftSize(fft_size));
        }
        validate_band_table(bands)?;

        let resolution = sample_rate as f64 / fft_size as f64;
        let nyquist_bin = fft_size / 2;
        let mut warnings = Vec::new();

        let ranges = bands
            .iter()
            .map(|band| {
                let min_bin = ((band.low_hz / resolution - 1e-9).ceil().max(0.0) as usize)
                    .min(nyquist_bin);
                let upper = (band.high_hz / resolution - 1e-9).ceil().max(0.0) as usize;
                let max_bin = upper.saturating_sub(1).min(nyquist_bin);

                let (min_bin, max_bin, fallback) = if upper == 0 || max_bin < min_bin {
                    let bin = ((band.center_hz() / resolution).round() as usize).min(nyquist_bin);
                    warn!(
                        "band '{}' ({}) narrower than one bin at {:.2} Hz/bin, using bin {}",
                        band.key,
                        band.frequency_range(),
                        resolution,
                        bin
                    );
                    warnings.push(AnalysisWarning::BandFallback {
                        band: band.key,
                        bin,
                    });
                    (bin, bin, true)
                } else {
                    (min_bin, max_bin, false)
                };

                BandBinRange {
                    definition: *band,
                    min_bin,
                    max_bin,
                    fallback,
                    actual_min_hz: min_bin as f64 * resolution,
                    actual_max_hz: max_bin as f64 * resolution,
                }
            })
            .collect::<Vec<_>>();

        for range in &ranges {
            debug!(
                "band {:>8}: bins {}..={} ({} bins, {:.1}-{:.1} Hz)",
                range.key(),
                range.min_bin,
                range.max_bin,
                range.bin_count(),
                range.actual_min_hz,
                range.actual_max_hz
            );
        }

        Ok(Self {
            sample_rate,
            fft_size,
            ranges,
            warnings,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Hz per bin
    pub fn resolution(&self) -> f64 {
        self.sample_rate as f64 / self.fft_size as f64
    }

    pub fn ranges(&self) -> &[BandBinRange] {
        &self.ranges
    }

    pub fn range(&self, key: BandKey) -> &BandBinRange {
        &self.ranges[key.index()]
    }

    /// Fallback warnings raised while mapping
    pub fn warnings(&self) -> &[AnalysisWarning] {
        &self.warnings
    }

    /// Band owning `bin`, if any
    pub fn band_for_bin(&self, bin: usize) -> Option<BandKey> {
        self.ranges
            .iter()
            .find(|r| r.contains(bin))
            .map(BandBinRange::key)
    }
}
