//! Window function implementations

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Window functions for filter design and spectral framing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFunction {
    Rectangular,
    Hann,
    Hamming,
    Blackman,
    BlackmanHarris,
    Kaiser(u32), // Beta parameter * 100
}

impl Default for WindowFunction {
    fn default() -> Self {
        Self::Hann
    }
}

impl WindowFunction {
    /// Generate symmetric window coefficients
    pub fn generate(&self, size: usize) -> Vec<f64> {
        if size <= 1 {
            return vec![1.0; size];
        }

        match self {
            WindowFunction::Rectangular => vec![1.0; size],
            WindowFunction::Hann => Self::cosine_sum(size, &[0.5, 0.5]),
            WindowFunction::Hamming => Self::cosine_sum(size, &[0.54, 0.46]),
            WindowFunction::Blackman => Self::cosine_sum(size, &[0.42, 0.5, 0.08]),
            WindowFunction::BlackmanHarris => {
                Self::cosine_sum(size, &[0.35875, 0.48829, 0.14128, 0.01168])
            }
            WindowFunction::Kaiser(beta) => Self::kaiser(size, *beta as f64 / 100.0),
        }
    }

    /// Sum of the window coefficients (coherent gain times length)
    pub fn coherent_sum(&self, size: usize) -> f64 {
        self.generate(size).iter().sum()
    }

    // a0 - a1 cos(x) + a2 cos(2x) - a3 cos(3x) ...
    fn cosine_sum(size: usize, coeffs: &[f64]) -> Vec<f64> {
        let denom = (size - 1) as f64;
        (0..size)
            .map(|i| {
                let x = 2.0 * PI * i as f64 / denom;
                coeffs
                    .iter()
                    .enumerate()
                    .map(|(k, &a)| {
                        let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                        sign * a * (k as f64 * x).cos()
                    })
                    .sum()
            })
            .collect()
    }

    fn kaiser(size: usize, beta: f64) -> Vec<f64> {
        let i0_beta = bessel_i0(beta);
        (0..size)
            .map(|i| {
                let x = 2.0 * i as f64 / (size - 1) as f64 - 1.0;
                bessel_i0(beta * (1.0 - x * x).max(0.0).sqrt()) / i0_beta
            })
            .collect()
    }
}

/// Modified Bessel function of the first kind, order 0
fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0;
    let mut term = 1.0;
    let x_half = x / 2.0;

    for k in 1..50 {
        term *= (x_half / k as f64).powi(2);
        sum += term;
        if term < 1e-15 * sum {
            break;
        }
    }

    sum
}
