//! DSP building blocks for offline effect chains

mod biquad;
mod chorus;
mod delay_line;
mod feedback_delay;
mod pitch_shift;
mod ring_mod;
mod shaper;

pub use biquad::{Biquad, FilterType};
pub use chorus::Chorus;
pub use delay_line::{DelayLine, Interpolation};
pub use feedback_delay::FeedbackDelay;
pub use pitch_shift::PitchShifter;
pub use ring_mod::RingModulator;
pub use shaper::WaveShaper;

/// A processing stage in a render chain
pub trait Node: Send {
    /// Process a block of mono samples in place
    fn process(&mut self, samples: &mut [f32]);

    /// Reset internal state
    fn reset(&mut self);

    /// Node name for logging
    fn name(&self) -> &'static str;
}

/// Constant gain stage
pub struct Gain {
    gain: f32,
}

impl Gain {
    pub fn new(gain: f32) -> Self {
        Self { gain }
    }
}

impl Node for Gain {
    fn process(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            *s *= self.gain;
        }
    }

    fn reset(&mut self) {}

    fn name(&self) -> &'static str {
        "Gain"
    }
}
