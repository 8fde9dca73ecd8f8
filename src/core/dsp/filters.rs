//! Oversampling interpolation filters
//!
//! Windowed-sinc low-pass design and the polyphase decomposition used by the
//! true peak detector. Two coefficient sets are available: the frozen 4x/48-tap
//! legacy table and an 8x/192-tap table designed on demand. Which one is used
//! is always an explicit [`FilterPreset`], never inferred from the signal.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

use log::debug;

use super::windows::WindowFunction;
use crate::config::FilterPreset;
use crate::error::{MeterError, Result};

/// Frozen 4x oversampling table, 48 taps, Hamming-windowed sinc at pi/4,
/// normalized to unity DC gain.
pub const LEGACY_4X_COEFFS: [f64; 48] = [
    -0.0004156616640599394, -0.001101867824059863, -0.0013209322852296018, -0.0006938951207477419,
    0.0009030140215973954, 0.0028520432753815594, 0.0037093297784245053, 0.0019768260867345485,
    -0.0025123768325485776, -0.007616882585089583, -0.009462618329968567, -0.004824986286649586,
    0.005896619695221194, 0.017307941463556978, 0.02098460588140303, 0.01053843202135947,
    -0.012820855578682202, -0.037957694719164665, -0.04722648271359681, -0.02494225531683698,
    0.03316108468701464, 0.11490969220042843, 0.19470654476187244, 0.24395037538363992,
    0.24395037538363992, 0.19470654476187244, 0.11490969220042842, 0.03316108468701465,
    -0.024942255316836987, -0.04722648271359681, -0.037957694719164665, -0.012820855578682204,
    0.01053843202135947, 0.020984605881403034, 0.017307941463556978, 0.005896619695221194,
    -0.004824986286649586, -0.009462618329968567, -0.007616882585089589, -0.00251237683254858,
    0.00197682608673455, 0.0037093297784245092, 0.0028520432753815577, 0.0009030140215973961,
    -0.0006938951207477422, -0.0013209322852296024, -0.0011018678240598636, -0.0004156616640599394,
];

/// Design a Hamming-windowed sinc low-pass with cutoff `pi / factor`.
pub fn design_lowpass(factor: usize, taps: usize) -> Result<Vec<f64>> {
    design_lowpass_with_window(factor, taps, WindowFunction::Hamming)
}

/// Design a windowed sinc low-pass with cutoff `pi / factor` and unity DC gain.
///
/// At the sinc singularity the limiting value `cutoff / pi` is used.
pub fn design_lowpass_with_window(
    factor: usize,
    taps: usize,
    window: WindowFunction,
) -> Result<Vec<f64>> {
    if factor == 0 || taps == 0 {
        return Err(MeterError::InvalidFilterDesign { factor, taps });
    }

    let cutoff = PI / factor as f64;
    let center = (taps as f64 - 1.0) / 2.0;
    let window = window.generate(taps);

    let mut coeffs: Vec<f64> = (0..taps)
        .map(|i| {
            let n = i as f64 - center;
            let sinc = if n.abs() < 1e-9 {
                cutoff / PI
            } else {
                (cutoff * n).sin() / (PI * n)
            };
            sinc * window[i]
        })
        .collect();

    let dc_gain: f64 = coeffs.iter().sum();
    if !dc_gain.is_finite() || dc_gain.abs() < 1e-12 {
        return Err(MeterError::InvalidFilterDesign { factor, taps });
    }
    coeffs.iter_mut().for_each(|c| *c /= dc_gain);

    Ok(coeffs)
}

/// Polyphase decomposition of an interpolation filter.
///
/// Phase `p` holds taps `p, p + L, p + 2L, ...` of the prototype, scaled by
/// `L` (zero-stuffing compensation) and by the empirical phase gain.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyphaseFilterBank {
    phases: Vec<Vec<f64>>,
    factor: usize,
    taps_per_phase: usize,
    gain: f64,
}

impl PolyphaseFilterBank {
    /// Design a fresh Hamming prototype and decompose it
    pub fn design(factor: usize, taps: usize, gain: f64) -> Result<Self> {
        Self::check_dimensions(factor, taps)?;
        let prototype = design_lowpass(factor, taps)?;
        Self::from_coefficients(&prototype, factor, gain)
    }

    /// Decompose an existing prototype table
    pub fn from_coefficients(coeffs: &[f64], factor: usize, gain: f64) -> Result<Self> {
        Self::check_dimensions(factor, coeffs.len())?;
        if !gain.is_finite() || gain <= 0.0 {
            return Err(MeterError::InvalidConfig(format!(
                "phase gain must be positive, got {}",
                gain
            )));
        }

        let taps_per_phase = coeffs.len() / factor;
        let scale = factor as f64 * gain;
        let phases = (0..factor)
            .map(|p| {
                (0..taps_per_phase)
                    .map(|j| coeffs[p + j * factor] * scale)
                    .collect()
            })
            .collect();

        Ok(Self {
            phases,
            factor,
            taps_per_phase,
            gain,
        })
    }

    /// Bank for one of the supported presets
    pub fn for_preset(preset: FilterPreset, gain: f64) -> Result<Self> {
        let bank = match preset {
            FilterPreset::Legacy4x => Self::from_coefficients(&LEGACY_4X_COEFFS, 4, gain)?,
            FilterPreset::Upgraded8x => {
                Self::design(preset.factor(), preset.taps(), gain)?
            }
        };
        debug!(
            "polyphase bank {:?}: {}x, {} taps/phase, gain {}",
            preset, bank.factor, bank.taps_per_phase, gain
        );
        Ok(bank)
    }

    fn check_dimensions(factor: usize, taps: usize) -> Result<()> {
        if factor == 0 || taps == 0 || taps % factor != 0 {
            return Err(MeterError::InvalidFilterDesign { factor, taps });
        }
        Ok(())
    }

    pub fn factor(&self) -> usize {
        self.factor
    }

    pub fn taps_per_phase(&self) -> usize {
        self.taps_per_phase
    }

    pub fn total_taps(&self) -> usize {
        self.factor * self.taps_per_phase
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn phases(&self) -> &[Vec<f64>] {
        &self.phases
    }

    pub fn phase(&self, index: usize) -> Option<&[f64]> {
        self.phases.get(index).map(Vec::as_slice)
    }

    /// DC gain of each phase (ideally 1.0 times the phase gain)
    pub fn phase_dc_gains(&self) -> Vec<f64> {
        self.phases.iter().map(|p| p.iter().sum()).collect()
    }
}

/// Caller-owned cache of built banks, one per preset, all sharing one gain.
///
/// Banks are immutable, so a cache can be shared across analyses of the
/// same configuration.
#[derive(Debug)]
pub struct FilterBankCache {
    gain: f64,
    banks: HashMap<FilterPreset, Arc<PolyphaseFilterBank>>,
}

impl Default for FilterBankCache {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl FilterBankCache {
    pub fn new(gain: f64) -> Self {
        Self {
            gain,
            banks: HashMap::new(),
        }
    }

    /// Fetch the bank for `preset`, building it on first use
    pub fn get(&mut self, preset: FilterPreset) -> Result<Arc<PolyphaseFilterBank>> {
        if let Some(bank) = self.banks.get(&preset) {
            return Ok(Arc::clone(bank));
        }
        let bank = Arc::new(PolyphaseFilterBank::for_preset(preset, self.gain)?);
        self.banks.insert(preset, Arc::clone(&bank));
        Ok(bank)
    }

    /// Phase gain every bank in this cache was built with
    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_table_matches_designer() {
        let designed = design_lowpass(4, 48).unwrap();
        for (a, b) in designed.iter().zip(LEGACY_4X_COEFFS.iter()) {
            assert!((a - b).abs() < 1e-12, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_unity_dc_gain() {
        for (factor, taps) in [(4, 48), (8, 192), (2, 31)] {
            let h = design_lowpass(factor, taps).unwrap();
            let sum: f64 = h.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_odd_length_uses_sinc_limit_at_center() {
        // Center tap lands exactly on n = 0
        let h = design_lowpass(4, 49).unwrap();
        assert!(h.iter().all(|c| c.is_finite()));
        let max = h.iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(max, h[24]);
    }

    #[test]
    fn test_bank_shape() {
        let bank = PolyphaseFilterBank::design(8, 192, 1.0).unwrap();
        assert_eq!(bank.phases().len(), 8);
        assert!(bank.phases().iter().all(|p| p.len() == 24));
        assert_eq!(bank.total_taps(), 192);
    }

    #[test]
    fn test_phase_dc_gain_near_unity() {
        for preset in [FilterPreset::Legacy4x, FilterPreset::Upgraded8x] {
            let bank = PolyphaseFilterBank::for_preset(preset, 1.0).unwrap();
            for gain in bank.phase_dc_gains() {
                assert!((gain - 1.0).abs() < 0.005, "{:?}: {}", preset, gain);
            }
        }
    }

    #[test]
    fn test_phase_gain_scales_coefficients() {
        let unit = PolyphaseFilterBank::for_preset(FilterPreset::Legacy4x, 1.0).unwrap();
        let boosted = PolyphaseFilterBank::for_preset(FilterPreset::Legacy4x, 1.1).unwrap();
        let a = unit.phase(2).unwrap();
        let b = boosted.phase(2).unwrap();
        for (x, y) in a.iter().zip(b) {
            assert!((x * 1.1 - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rejects_non_multiple_taps() {
        assert!(PolyphaseFilterBank::design(4, 50, 1.0).is_err());
        assert!(PolyphaseFilterBank::design(0, 48, 1.0).is_err());
        assert!(PolyphaseFilterBank::design(4, 48, 0.0).is_err());
    }

    #[test]
    fn test_cache_reuses_banks() {
        let mut cache = FilterBankCache::new(1.0);
        let a = cache.get(FilterPreset::Upgraded8x).unwrap();
        let b = cache.get(FilterPreset::Upgraded8x).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }
}
