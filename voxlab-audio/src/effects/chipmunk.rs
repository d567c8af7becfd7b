//! Chipmunk: pitch shifted up without changing duration

use super::{EducationalContent, EffectId, ProcessingError, VoiceEffect};
use crate::buffer::AudioBuffer;
use crate::dsp::{Node, PitchShifter};
use crate::params::ChipmunkParams;
use crate::render::RenderContext;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chipmunk;

static EDUCATION: EducationalContent = EducationalContent {
    name: "Chipmunk Voice",
    explanation: "Makes your voice sound higher and squeakier by shifting the pitch up \
        several notes without changing how fast you talk.",
    stem_connection: "Sound is made of vibrations called waves. Higher pitch means faster \
        vibrations (higher frequency). By shifting your voice up 7 semitones, we make those \
        sound waves vibrate about 1.5x faster, like tuning a guitar string tighter to sound higher.",
    did_you_know: Some(
        "Real chipmunks have tiny vocal cords that vibrate very fast. Smaller objects vibrate \
        faster, creating higher-pitched sounds. That's why a small flute sounds higher than a big tuba!",
    ),
};

/// Shift every channel by `semitones` through the shared pitch shifter
pub(super) fn shift_pitch(input: &AudioBuffer, semitones: f32) -> Result<AudioBuffer, ProcessingError> {
    let ctx = RenderContext::for_buffer(input, 0.0)?;
    let sample_rate = ctx.sample_rate() as f32;
    ctx.render(input, |_| {
        let mut shifter = PitchShifter::new(sample_rate, PitchShifter::DEFAULT_WINDOW_SECS);
        shifter.set_semitones(semitones);
        vec![Box::new(shifter) as Box<dyn Node>]
    })
}

impl VoiceEffect for Chipmunk {
    type Params = ChipmunkParams;

    const ID: EffectId = EffectId::Chipmunk;

    fn render_wet(&self, input: &AudioBuffer, params: &ChipmunkParams) -> Result<AudioBuffer, ProcessingError> {
        shift_pitch(input, params.pitch_shift)
    }

    fn educational(&self) -> &'static EducationalContent {
        &EDUCATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::test_util::{mean_abs_diff, sine};

    #[test]
    fn test_keeps_duration() {
        let input = sine(300.0, 0.5, 48000, 0.5);
        let out = Chipmunk.process(&input, &ChipmunkParams::default()).unwrap();
        assert_eq!(out.len(), input.len());
        assert_eq!(out.num_channels(), 1);
        assert_eq!(out.sample_rate(), 48000);
    }

    #[test]
    fn test_dry_returns_original() {
        let input = sine(300.0, 0.25, 48000, 0.5);
        let params = ChipmunkParams {
            wet_dry: 0.0,
            ..Default::default()
        };
        let out = Chipmunk.process(&input, &params).unwrap();
        assert!(out.ptr_eq(&input));
    }

    #[test]
    fn test_wet_differs_from_original() {
        let input = sine(300.0, 0.5, 48000, 0.5);
        let out = Chipmunk.process(&input, &ChipmunkParams::default()).unwrap();
        assert!(mean_abs_diff(&input, &out) > 0.01);
    }
}
