//! Biquad filter (high-pass, low-pass, band-pass, peaking)
//!
//! Coefficients follow the RBJ audio EQ cookbook. The band-pass variant has
//! a constant 0 dB peak gain.

use super::Node;
use std::f32::consts::PI;

/// Filter response
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FilterType {
    #[default]
    LowPass,
    HighPass,
    BandPass,
    /// Bell boost or cut by `gain_db` around the center frequency
    Peaking { gain_db: f32 },
}

/// Mono biquad filter (direct form I)
pub struct Biquad {
    filter_type: FilterType,
    sample_rate: f32,
    frequency: f32, // Hz
    q: f32,

    // Normalized coefficients
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,

    // State
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Create a filter with the given response, frequency and Q
    pub fn new(filter_type: FilterType, sample_rate: f32, frequency: f32, q: f32) -> Self {
        let mut filter = Self {
            filter_type,
            sample_rate,
            frequency: 1000.0,
            q: 0.707,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };
        filter.frequency = filter.clamp_frequency(frequency);
        filter.q = q.clamp(0.1, 30.0);
        filter.calculate_coefficients();
        filter
    }

    pub fn low_pass(sample_rate: f32, frequency: f32, q: f32) -> Self {
        Self::new(FilterType::LowPass, sample_rate, frequency, q)
    }

    pub fn high_pass(sample_rate: f32, frequency: f32, q: f32) -> Self {
        Self::new(FilterType::HighPass, sample_rate, frequency, q)
    }

    pub fn band_pass(sample_rate: f32, frequency: f32, q: f32) -> Self {
        Self::new(FilterType::BandPass, sample_rate, frequency, q)
    }

    pub fn peaking(sample_rate: f32, frequency: f32, q: f32, gain_db: f32) -> Self {
        Self::new(FilterType::Peaking { gain_db }, sample_rate, frequency, q)
    }

    /// Frequencies are kept between 10 Hz and just below Nyquist
    fn clamp_frequency(&self, frequency: f32) -> f32 {
        frequency.clamp(10.0, self.sample_rate * 0.49)
    }

    fn calculate_coefficients(&mut self) {
        let omega = 2.0 * PI * self.frequency / self.sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * self.q);

        let (b0, b1, b2, a0, a1, a2) = match self.filter_type {
            FilterType::LowPass => (
                (1.0 - cos_omega) / 2.0,
                1.0 - cos_omega,
                (1.0 - cos_omega) / 2.0,
                1.0 + alpha,
                -2.0 * cos_omega,
                1.0 - alpha,
            ),
            FilterType::HighPass => (
                (1.0 + cos_omega) / 2.0,
                -(1.0 + cos_omega),
                (1.0 + cos_omega) / 2.0,
                1.0 + alpha,
                -2.0 * cos_omega,
                1.0 - alpha,
            ),
            FilterType::BandPass => (
                alpha,
                0.0,
                -alpha,
                1.0 + alpha,
                -2.0 * cos_omega,
                1.0 - alpha,
            ),
            FilterType::Peaking { gain_db } => {
                let a = 10.0f32.powf(gain_db / 40.0);
                (
                    1.0 + alpha * a,
                    -2.0 * cos_omega,
                    1.0 - alpha * a,
                    1.0 + alpha / a,
                    -2.0 * cos_omega,
                    1.0 - alpha / a,
                )
            }
        };

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

impl Node for Biquad {
    fn process(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            *s = self.process_sample(*s);
        }
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    fn name(&self) -> &'static str {
        match self.filter_type {
            FilterType::LowPass => "LP Filter",
            FilterType::HighPass => "HP Filter",
            FilterType::BandPass => "BP Filter",
            FilterType::Peaking { .. } => "Peaking EQ",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_frequency_clamped_below_nyquist() {
        let filter = Biquad::low_pass(8000.0, 6000.0, 0.7);
        assert!(filter.frequency < 4000.0);
        let filter = Biquad::band_pass(8000.0, 1.0, 50.0);
        assert_eq!(filter.frequency, 10.0);
        assert_eq!(filter.q, 30.0);
    }

    #[test]
    fn test_low_pass_attenuates_highs() {
        let mut filter = Biquad::low_pass(48000.0, 500.0, 0.707);
        let mut high = sine(8000.0, 48000.0, 4800);
        filter.process(&mut high);
        assert!(rms(&high[2400..]) < 0.05);

        filter.reset();
        let mut low = sine(100.0, 48000.0, 4800);
        filter.process(&mut low);
        assert!(rms(&low[2400..]) > 0.6);
    }

    #[test]
    fn test_high_pass_attenuates_lows() {
        let mut filter = Biquad::high_pass(48000.0, 2000.0, 0.707);
        let mut low = sine(50.0, 48000.0, 9600);
        filter.process(&mut low);
        assert!(rms(&low[4800..]) < 0.01);
    }

    #[test]
    fn test_peaking_boosts_center() {
        let mut filter = Biquad::peaking(48000.0, 1000.0, 2.0, 6.0);
        let mut tone = sine(1000.0, 48000.0, 9600);
        filter.process(&mut tone);
        // +6 dB is a gain of ~2 on a unit sine (rms ~0.707)
        assert!(rms(&tone[4800..]) > 1.3);
    }
}
