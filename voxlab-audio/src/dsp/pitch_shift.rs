//! Time-domain pitch shifter
//!
//! Two read heads sweep across a delay line at a rate set by the pitch
//! ratio, half a window apart. Each head fades in and out with a sin²
//! window so the sum of both gains is always 1 and the jumps where a head
//! wraps around happen at zero gain. Duration is preserved: one sample in,
//! one sample out.

use super::{DelayLine, Interpolation, Node};
use std::f32::consts::PI;

/// Pitch shifter over a fixed analysis window
pub struct PitchShifter {
    line: DelayLine,
    /// Window length in samples
    window: f32,
    /// Pitch shift in semitones
    semitones: f32,
    /// Head phase (0.0 - 1.0)
    phase: f32,
    /// Phase increment per sample
    phase_inc: f32,
}

impl PitchShifter {
    /// Default analysis window in seconds
    pub const DEFAULT_WINDOW_SECS: f32 = 0.1;

    /// Create a pitch shifter with the given window length
    pub fn new(sample_rate: f32, window_secs: f32) -> Self {
        let window = (window_secs * sample_rate).max(16.0);
        let mut shifter = Self {
            line: DelayLine::new(window.ceil() as usize + 1, Interpolation::Linear),
            window,
            semitones: 0.0,
            phase: 0.0,
            phase_inc: 0.0,
        };
        shifter.set_semitones(0.0);
        shifter
    }

    /// Set pitch shift in semitones (-24 to +24)
    pub fn set_semitones(&mut self, semitones: f32) {
        self.semitones = semitones.clamp(-24.0, 24.0);
        // Read heads must advance at `ratio` samples per sample, so the delay
        // changes by (1 - ratio) per sample.
        self.phase_inc = (1.0 - self.ratio()) / self.window;
    }

    /// Get current pitch shift
    pub fn semitones(&self) -> f32 {
        self.semitones
    }

    /// Frequency ratio: 2^(semitones/12)
    pub fn ratio(&self) -> f32 {
        2.0f32.powf(self.semitones / 12.0)
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        self.line.write(input);

        let phase_a = self.phase;
        let phase_b = (self.phase + 0.5).fract();

        let gain_a = (PI * phase_a).sin().powi(2);
        let gain_b = (PI * phase_b).sin().powi(2);

        let out = self.line.read(phase_a * self.window) * gain_a
            + self.line.read(phase_b * self.window) * gain_b;

        self.phase = (self.phase + self.phase_inc).rem_euclid(1.0);
        out
    }
}

impl Node for PitchShifter {
    fn process(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            *s = self.process_sample(*s);
        }
    }

    fn reset(&mut self) {
        self.line.clear();
        self.phase = 0.0;
    }

    fn name(&self) -> &'static str {
        "Pitch Shift"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Count rising zero crossings in the steady part of a signal
    fn rising_crossings(samples: &[f32]) -> usize {
        samples
            .windows(2)
            .filter(|w| w[0] < 0.0 && w[1] >= 0.0)
            .count()
    }

    fn sine(freq: f32, sample_rate: f32, frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_semitone_clamping() {
        let mut ps = PitchShifter::new(48000.0, 0.1);
        ps.set_semitones(36.0);
        assert_eq!(ps.semitones(), 24.0);
        ps.set_semitones(-36.0);
        assert_eq!(ps.semitones(), -24.0);
        ps.set_semitones(12.0);
        assert!((ps.ratio() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_shift_is_near_identity() {
        let mut ps = PitchShifter::new(48000.0, 0.1);
        let input = sine(440.0, 48000.0, 4800);
        let mut out = input.clone();
        ps.process(&mut out);
        // Heads sit at fixed delays; output is a delayed copy of the input
        assert!(out.iter().all(|s| s.is_finite() && s.abs() <= 0.5 + 1e-4));
    }

    #[test]
    fn test_octave_up_doubles_frequency() {
        let sr = 48000.0;
        let mut ps = PitchShifter::new(sr, 0.1);
        ps.set_semitones(12.0);

        let mut out = sine(200.0, sr, 48000);
        ps.process(&mut out);

        let crossings = rising_crossings(&out[9600..]) as f32;
        let seconds = (48000 - 9600) as f32 / sr;
        let freq = crossings / seconds;
        assert!((freq - 400.0).abs() < 40.0, "measured {freq} Hz");
    }

    #[test]
    fn test_preserves_length() {
        let mut ps = PitchShifter::new(44100.0, 0.1);
        ps.set_semitones(-7.0);
        let mut out = vec![0.25; 1000];
        ps.process(&mut out);
        assert_eq!(out.len(), 1000);
    }
}
