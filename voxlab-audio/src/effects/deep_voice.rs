//! Deep voice: pitch shifted down without changing duration

use super::chipmunk::shift_pitch;
use super::{EducationalContent, EffectId, ProcessingError, VoiceEffect};
use crate::buffer::AudioBuffer;
use crate::params::DeepVoiceParams;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeepVoice;

static EDUCATION: EducationalContent = EducationalContent {
    name: "Deep Voice",
    explanation: "Makes you sound like a giant by lowering the pitch of your voice several \
        notes, like a movie trailer narrator.",
    stem_connection: "Lower pitch means slower vibrations (lower frequency). By shifting your \
        voice down 7 semitones, those sound waves vibrate about 0.67x slower. It's like loosening \
        a guitar string: the looser the string, the lower the sound.",
    did_you_know: Some(
        "Blue whales make the lowest sounds of any animal, as low as 10 Hz (10 vibrations per \
        second). Humans can't even hear below 20 Hz! Large objects vibrate slowly, creating \
        low-pitched sounds.",
    ),
};

impl VoiceEffect for DeepVoice {
    type Params = DeepVoiceParams;

    const ID: EffectId = EffectId::DeepVoice;

    fn render_wet(&self, input: &AudioBuffer, params: &DeepVoiceParams) -> Result<AudioBuffer, ProcessingError> {
        shift_pitch(input, params.pitch_shift)
    }

    fn educational(&self) -> &'static EducationalContent {
        &EDUCATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::test_util::sine;
    use crate::params::ParamSet;

    #[test]
    fn test_positive_shift_is_clamped_down() {
        let input = sine(220.0, 0.3, 44100, 0.5);
        let upward = DeepVoiceParams {
            pitch_shift: 7.0,
            wet_dry: 1.0,
        };
        let clamped = DeepVoiceParams {
            pitch_shift: -4.0,
            wet_dry: 1.0,
        };
        assert_eq!(upward.clamped(), clamped);

        let a = DeepVoice.process(&input, &upward).unwrap();
        let b = DeepVoice.process(&input, &clamped).unwrap();
        assert_eq!(a.channel(0), b.channel(0));
    }

    #[test]
    fn test_stereo_keeps_layout() {
        let left = sine(220.0, 0.2, 44100, 0.5);
        let stereo =
            AudioBuffer::new(vec![left.channel(0).to_vec(), left.channel(0).to_vec()], 44100).unwrap();
        let out = DeepVoice.process(&stereo, &DeepVoiceParams::default()).unwrap();
        assert_eq!(out.num_channels(), 2);
        assert_eq!(out.len(), stereo.len());
        assert_eq!(out.channel(0), out.channel(1));
    }
}
