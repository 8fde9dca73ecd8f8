// src/core/analysis/stereo.rs
//
// Stereo field measurement: channel correlation and width

use serde::Serialize;

use crate::core::buffer::SampleBuffer;

/// Stereo analysis results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StereoAnalysis {
    /// Pearson correlation of left and right, -1..1
    pub correlation: f64,
    /// 0.0 = mono, 1.0 = fully decorrelated
    pub stereo_width: f64,
    /// Side energy over mid energy
    pub mid_side_ratio: f64,
}

impl Default for StereoAnalysis {
    /// Mono: identical channels
    fn default() -> Self {
        Self {
            correlation: 1.0,
            stereo_width: 0.0,
            mid_side_ratio: 0.0,
        }
    }
}

/// Analyze stereo characteristics
pub fn analyze_stereo(left: &[f32], right: &[f32]) -> StereoAnalysis {
    if left.len() != right.len() || left.is_empty() {
        return StereoAnalysis::default();
    }

    let n = left.len() as f64;

    let mut sum_l = 0.0f64;
    let mut sum_r = 0.0f64;
    let mut sum_ll = 0.0f64;
    let mut sum_rr = 0.0f64;
    let mut sum_lr = 0.0f64;
    let mut mid_energy = 0.0f64;
    let mut side_energy = 0.0f64;

    for (&l, &r) in left.iter().zip(right.iter()) {
        let (l, r) = (l as f64, r as f64);
        sum_l += l;
        sum_r += r;
        sum_ll += l * l;
        sum_rr += r * r;
        sum_lr += l * r;

        let mid = (l + r) * 0.5;
        let side = (l - r) * 0.5;
        mid_energy += mid * mid;
        side_energy += side * side;
    }

    let mean_l = sum_l / n;
    let mean_r = sum_r / n;

    let var_l = sum_ll / n - mean_l * mean_l;
    let var_r = sum_rr / n - mean_r * mean_r;
    let cov_lr = sum_lr / n - mean_l * mean_r;

    let correlation = if var_l > 1e-10 && var_r > 1e-10 {
        (cov_lr / (var_l.sqrt() * var_r.sqrt())).clamp(-1.0, 1.0)
    } else {
        1.0 // Mono or near-silent
    };

    let mid_side_ratio = if mid_energy > 1e-10 {
        side_energy / mid_energy
    } else {
        0.0
    };

    StereoAnalysis {
        correlation,
        stereo_width: (1.0 - correlation.abs()).sqrt(),
        mid_side_ratio,
    }
}

/// Stereo analysis of a buffer; mono buffers read as fully correlated
pub fn analyze_buffer(buffer: &SampleBuffer) -> StereoAnalysis {
    if buffer.channel_count() < 2 {
        return StereoAnalysis::default();
    }
    analyze_stereo(buffer.left(), buffer.right())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(len: usize, freq: f32) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / 48000.0).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_identical_channels() {
        let l = tone(4800, 440.0);
        let result = analyze_stereo(&l, &l);
        assert!((result.correlation - 1.0).abs() < 1e-9);
        assert!(result.mid_side_ratio < 1e-12);
    }

    #[test]
    fn test_inverted_channels() {
        let l = tone(4800, 440.0);
        let r: Vec<f32> = l.iter().map(|s| -s).collect();
        let result = analyze_stereo(&l, &r);
        assert!((result.correlation + 1.0).abs() < 1e-9);
        assert_eq!(result.mid_side_ratio, 0.0);
    }

    #[test]
    fn test_unrelated_channels() {
        let result = analyze_stereo(&tone(48000, 440.0), &tone(48000, 1000.0));
        assert!(result.correlation.abs() < 0.05);
        assert!(result.stereo_width > 0.9);
    }

    #[test]
    fn test_silence_and_mono_default_to_correlated() {
        assert_eq!(analyze_stereo(&[0.0; 100], &[0.0; 100]).correlation, 1.0);
        let mono = SampleBuffer::mono(tone(100, 440.0), 48000).unwrap();
        assert_eq!(analyze_buffer(&mono), StereoAnalysis::default());
    }
}
