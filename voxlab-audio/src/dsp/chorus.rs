//! Multi-voice chorus
//!
//! Each voice reads the input through a short delay swept by its own sine
//! LFO. Voices are spread in base delay, LFO rate and starting phase, then
//! summed and scaled by `1/voices`.

use super::{DelayLine, Interpolation, Node};
use std::f32::consts::TAU;

struct Voice {
    /// Base delay in samples
    base_delay: f32,
    /// LFO phase (0.0 - 1.0)
    lfo_phase: f32,
    /// LFO phase increment per sample
    lfo_inc: f32,
}

/// Chorus with 2 - 8 voices
pub struct Chorus {
    line: DelayLine,
    voices: Vec<Voice>,
    /// Peak delay sweep in samples
    sweep: f32,
}

impl Chorus {
    /// Minimum base delay of the first voice in seconds
    const MIN_DELAY_SECS: f32 = 0.005;
    /// Base delay spread across voices in seconds
    const SPREAD_SECS: f32 = 0.035;
    /// Delay sweep at full depth in seconds
    const MAX_SWEEP_SECS: f32 = 0.004;

    pub const MIN_VOICES: usize = 2;
    pub const MAX_VOICES: usize = 8;

    /// Create a chorus; `rate` in Hz, `depth` 0.0 - 1.0
    pub fn new(sample_rate: f32, voices: usize, rate: f32, depth: f32) -> Self {
        let count = voices.clamp(Self::MIN_VOICES, Self::MAX_VOICES);
        let rate = rate.max(0.0);

        let voices = (0..count)
            .map(|i| {
                let spread = i as f32 / count as f32;
                Voice {
                    base_delay: (Self::MIN_DELAY_SECS + spread * Self::SPREAD_SECS) * sample_rate,
                    lfo_phase: spread,
                    lfo_inc: rate * (0.8 + spread * 0.4) / sample_rate,
                }
            })
            .collect();

        let max_delay =
            (Self::MIN_DELAY_SECS + Self::SPREAD_SECS + Self::MAX_SWEEP_SECS) * sample_rate;

        Self {
            line: DelayLine::new(max_delay.ceil() as usize + 1, Interpolation::Linear),
            voices,
            sweep: depth.clamp(0.0, 1.0) * Self::MAX_SWEEP_SECS * sample_rate,
        }
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }
}

impl Node for Chorus {
    fn process(&mut self, samples: &mut [f32]) {
        let scale = 1.0 / self.voices.len() as f32;

        for s in samples.iter_mut() {
            self.line.write(*s);

            let mut sum = 0.0;
            for voice in &mut self.voices {
                // LFO in 0.0 - 1.0 so the delay never drops below its base
                let lfo = (voice.lfo_phase * TAU).sin() * 0.5 + 0.5;
                voice.lfo_phase += voice.lfo_inc;
                if voice.lfo_phase >= 1.0 {
                    voice.lfo_phase -= 1.0;
                }
                sum += self.line.read(voice.base_delay + lfo * self.sweep);
            }

            *s = sum * scale;
        }
    }

    fn reset(&mut self) {
        self.line.clear();
        let count = self.voices.len();
        for (i, voice) in self.voices.iter_mut().enumerate() {
            voice.lfo_phase = i as f32 / count as f32;
        }
    }

    fn name(&self) -> &'static str {
        "Chorus"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_count_clamped() {
        assert_eq!(Chorus::new(48000.0, 1, 2.0, 0.7).voice_count(), 2);
        assert_eq!(Chorus::new(48000.0, 20, 2.0, 0.7).voice_count(), 8);
        assert_eq!(Chorus::new(48000.0, 4, 2.0, 0.7).voice_count(), 4);
    }

    #[test]
    fn test_output_bounded_by_input_peak() {
        for voices in 2..=8 {
            let mut chorus = Chorus::new(48000.0, voices, 3.0, 1.0);
            let mut samples: Vec<f32> = (0..9600)
                .map(|i| if (i / 40) % 2 == 0 { 1.0 } else { -1.0 })
                .collect();
            chorus.process(&mut samples);
            assert!(samples.iter().all(|s| s.abs() <= 1.0 + 1e-5));
        }
    }
}
