//! Telephone: band-limited to the old analog phone range and soft-clipped

use super::{EducationalContent, EffectId, ProcessingError, VoiceEffect};
use crate::buffer::AudioBuffer;
use crate::dsp::{Biquad, Node, WaveShaper};
use crate::params::TelephoneParams;
use crate::render::RenderContext;

/// Q of both band edges (gentle, no resonance)
const EDGE_Q: f32 = 0.7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Telephone;

static EDUCATION: EducationalContent = EducationalContent {
    name: "Telephone Voice",
    explanation: "Makes you sound like you're talking on an old telephone by removing very \
        low and very high sounds from your voice.",
    stem_connection: "Old telephone lines could only transmit frequencies from 300 Hz to \
        3400 Hz, called the \"bandwidth.\" We use a high-pass filter to remove sounds below \
        300 Hz (deep rumbles) and a low-pass filter to remove sounds above 3400 Hz (crisp \
        highs). That's why old phone calls sounded \"tinny\"!",
    did_you_know: Some(
        "Modern digital phones transmit 50 Hz to 7000 Hz (\"HD Voice\"), 4x the bandwidth. \
        That's why calls sound much clearer now. The old narrow bandwidth was a limitation of \
        copper telephone wires.",
    ),
};

impl VoiceEffect for Telephone {
    type Params = TelephoneParams;

    const ID: EffectId = EffectId::Telephone;

    fn render_wet(&self, input: &AudioBuffer, params: &TelephoneParams) -> Result<AudioBuffer, ProcessingError> {
        let ctx = RenderContext::for_buffer(input, 0.0)?;
        let sr = ctx.sample_rate() as f32;
        ctx.render(input, |_| {
            vec![
                Box::new(Biquad::high_pass(sr, params.low_cutoff, EDGE_Q)) as Box<dyn Node>,
                Box::new(Biquad::low_pass(sr, params.high_cutoff, EDGE_Q)),
                Box::new(WaveShaper::soft_clip(params.distortion)),
            ]
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

    fn rms(data: &[f32]) -> f32 {
        (data.iter().map(|s| s * s).sum::<f32>() / data.len() as f32).sqrt()
    }

    #[test]
    fn test_sine_440_stays_finite() {
        let input = sine(440.0, 1.0, 48000, 0.5);
        let out = Telephone.process(&input, &TelephoneParams::default()).unwrap();
        assert_eq!(out.len(), input.len());
        assert!(out.channel(0).iter().all(|s| s.is_finite()));
        assert!(out.peak() <= 1.0);
    }

    #[test]
    fn test_removes_low_rumble() {
        let params = TelephoneParams {
            distortion: 0.0,
            ..Default::default()
        };
        let rumble = sine(50.0, 1.0, 48000, 0.5);
        let voice = sine(1000.0, 1.0, 48000, 0.5);

        let rumble_out = Telephone.process(&rumble, &params).unwrap();
        let voice_out = Telephone.process(&voice, &params).unwrap();

        // Skip the filter settling time
        let settle = 4800;
        assert!(rms(&rumble_out.channel(0)[settle..]) < 0.1 * rms(&rumble.channel(0)[settle..]));
        assert!(rms(&voice_out.channel(0)[settle..]) > 0.7 * rms(&voice.channel(0)[settle..]));
    }
}
