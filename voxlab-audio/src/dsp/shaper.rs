//! Table-driven waveshaper with a soft-clip curve

use super::Node;
use std::f32::consts::PI;

/// Number of points in the transfer curve
const CURVE_POINTS: usize = 256;

/// Waveshaper mapping [-1, 1] through a lookup curve
///
/// Inputs outside [-1, 1] take the curve's end values. Between curve points
/// the output is linearly interpolated.
pub struct WaveShaper {
    curve: Vec<f32>,
}

impl WaveShaper {
    /// Build from an explicit transfer curve (at least two points)
    pub fn with_curve(curve: Vec<f32>) -> Self {
        let curve = if curve.len() < 2 { vec![-1.0, 1.0] } else { curve };
        Self { curve }
    }

    /// Soft-clip curve `(π + k)x / (π + k|x|)` with `k = amount * 100`
    ///
    /// `amount = 0` is the identity line; larger amounts push the curve
    /// towards a hard square.
    pub fn soft_clip(amount: f32) -> Self {
        let k = amount.max(0.0) * 100.0;
        let curve = (0..CURVE_POINTS)
            .map(|i| {
                let x = (i as f32 * 2.0) / CURVE_POINTS as f32 - 1.0;
                ((PI + k) * x) / (PI + k * x.abs())
            })
            .collect();
        Self::with_curve(curve)
    }

    pub fn curve(&self) -> &[f32] {
        &self.curve
    }

    #[inline]
    fn shape(&self, input: f32) -> f32 {
        let last = self.curve.len() - 1;
        let pos = (input.clamp(-1.0, 1.0) + 1.0) * 0.5 * last as f32;
        let index = (pos as usize).min(last - 1);
        let frac = pos - index as f32;
        self.curve[index] * (1.0 - frac) + self.curve[index + 1] * frac
    }
}

impl Node for WaveShaper {
    fn process(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            *s = self.shape(*s);
        }
    }

    fn reset(&mut self) {}

    fn name(&self) -> &'static str {
        "Waveshaper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_is_odd_and_bounded() {
        let shaper = WaveShaper::soft_clip(0.2);
        assert_eq!(shaper.curve().len(), CURVE_POINTS);
        assert!(shaper.curve().iter().all(|v| v.abs() <= 1.0 + 1e-6));
        assert!((shaper.curve()[0] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_soft_clip_compresses_peaks() {
        let mut shaper = WaveShaper::soft_clip(0.5);
        let mut samples = vec![0.1, 0.5, 2.0, -2.0];
        shaper.process(&mut samples);
        // Small inputs are boosted by the curve, large inputs saturate
        assert!(samples[0] > 0.1);
        assert!(samples[1] > 0.5 && samples[1] <= 1.0);
        assert!(samples[2] <= 1.0);
        assert!(samples[3] >= -1.0);
    }

    #[test]
    fn test_zero_amount_is_near_linear() {
        let mut shaper = WaveShaper::soft_clip(0.0);
        let mut samples = vec![-0.5, 0.0, 0.25];
        shaper.process(&mut samples);
        assert!((samples[0] + 0.5).abs() < 0.01);
        assert!(samples[1].abs() < 0.01);
        assert!((samples[2] - 0.25).abs() < 0.01);
    }
}
