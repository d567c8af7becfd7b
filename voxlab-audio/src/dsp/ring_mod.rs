//! Ring modulator: multiplies the signal by a sine carrier

use super::Node;
use std::f32::consts::TAU;

pub struct RingModulator {
    sample_rate: f32,
    /// Carrier frequency in Hz
    frequency: f32,
    /// Carrier phase (0.0 - 1.0)
    phase: f32,
}

impl RingModulator {
    pub fn new(sample_rate: f32, frequency: f32) -> Self {
        Self {
            sample_rate,
            frequency: frequency.clamp(0.0, sample_rate * 0.5),
            phase: 0.0,
        }
    }
}

impl Node for RingModulator {
    fn process(&mut self, samples: &mut [f32]) {
        let inc = self.frequency / self.sample_rate;
        for s in samples.iter_mut() {
            *s *= (self.phase * TAU).sin();
            self.phase += inc;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }

    fn name(&self) -> &'static str {
        "Ring Mod"
    }
}
