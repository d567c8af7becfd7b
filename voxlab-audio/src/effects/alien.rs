//! Alien: multi-voice chorus

use super::{EducationalContent, EffectId, ProcessingError, VoiceEffect};
use crate::buffer::AudioBuffer;
use crate::dsp::{Chorus, Node};
use crate::params::AlienParams;
use crate::render::RenderContext;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Alien;

static EDUCATION: EducationalContent = EducationalContent {
    name: "Alien Effect",
    explanation: "Makes your voice sound weird and otherworldly by playing multiple slightly \
        different copies of your voice simultaneously with wobbling pitch.",
    stem_connection: "This uses a \"chorus\" effect, named after a choir singing together! \
        When many people sing the same note, they're never perfectly in sync, creating a rich, \
        swirling sound. We simulate this digitally by making copies of your voice, detuning them \
        slightly, and mixing them. An LFO (Low-Frequency Oscillator) makes the pitch wobble \
        over time.",
    did_you_know: Some(
        "Guitar players love chorus effects! The famous \"Come As You Are\" by Nirvana uses a \
        chorus effect on the guitar. Synthesizers also use chorus to make sounds bigger and \
        more interesting.",
    ),
};

impl VoiceEffect for Alien {
    type Params = AlienParams;

    const ID: EffectId = EffectId::Alien;

    fn render_wet(&self, input: &AudioBuffer, params: &AlienParams) -> Result<AudioBuffer, ProcessingError> {
        let ctx = RenderContext::for_buffer(input, 0.0)?;
        let sr = ctx.sample_rate() as f32;
        ctx.render(input, |_| {
            vec![Box::new(Chorus::new(
                sr,
                params.voices as usize,
                params.chorus_rate,
                params.chorus_depth,
            )) as Box<dyn Node>]
        })
    }

    fn educational(&self) -> &'static EducationalContent {
        &EDUCATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::test_util::sine;

    #[test]
    fn test_peak_bounded_for_all_voice_counts() {
        let input = sine(330.0, 0.5, 48000, 1.0);
        for voices in 2..=8 {
            let params = AlienParams {
                voices,
                chorus_depth: 1.0,
                wet_dry: 1.0,
                ..Default::default()
            };
            let out = Alien.process(&input, &params).unwrap();
            assert!(out.peak() <= 1.0 + 1e-5, "voices {voices}: peak {}", out.peak());
        }
    }

    #[test]
    fn test_voice_count_outside_range_is_clamped() {
        let input = sine(330.0, 0.2, 48000, 0.5);
        let too_many = AlienParams {
            voices: 30,
            ..Default::default()
        };
        let eight = AlienParams {
            voices: 8,
            ..Default::default()
        };
        let a = Alien.process(&input, &too_many).unwrap();
        let b = Alien.process(&input, &eight).unwrap();
        assert_eq!(a.channel(0), b.channel(0));
    }
}
