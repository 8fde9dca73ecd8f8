//! Statistical helpers and level conversions

use std::cmp::Ordering;

/// Compute median of a slice, sorting it in place. `None` when empty.
pub fn median(data: &mut [f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }

    data.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = data.len() / 2;
    if data.len() % 2 == 0 {
        Some((data[mid - 1] + data[mid]) / 2.0)
    } else {
        Some(data[mid])
    }
}

/// Convert linear amplitude to dB; non-positive amplitude is negative infinity
pub fn linear_to_db(amplitude: f64) -> f64 {
    if amplitude > 0.0 {
        20.0 * amplitude.log10()
    } else {
        f64::NEG_INFINITY
    }
}

/// Convert dB to linear amplitude
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10.0_f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Compute spectral flatness (Wiener entropy)
/// Returns 1.0 for white noise, approaches 0.0 for tonal signals
pub fn spectral_flatness(magnitudes: &[f64]) -> f64 {
    if magnitudes.is_empty() {
        return 0.0;
    }
    let n = magnitudes.len() as f64;

    // Geometric mean (via log)
    let log_sum: f64 = magnitudes.iter().map(|&m| (m + 1e-10).ln()).sum();
    let geometric_mean = (log_sum / n).exp();

    // Arithmetic mean
    let arithmetic_mean = magnitudes.iter().sum::<f64>() / n;

    if arithmetic_mean < 1e-10 {
        return 0.0;
    }

    (geometric_mean / arithmetic_mean).min(1.0)
}
