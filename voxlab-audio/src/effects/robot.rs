//! Robot: ring modulation followed by resonant filtering
//!
//! carrier (sine) -> band-pass at `filterFreq` -> +6 dB peak at `2 * filterFreq`

use super::{EducationalContent, EffectId, ProcessingError, VoiceEffect};
use crate::buffer::AudioBuffer;
use crate::dsp::{Biquad, Node, RingModulator};
use crate::params::RobotParams;
use crate::render::RenderContext;

/// Harmonic boost applied above the band-pass centre
const HARMONIC_GAIN_DB: f32 = 6.0;
const HARMONIC_Q: f32 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Robot;

static EDUCATION: EducationalContent = EducationalContent {
    name: "Robot Voice",
    explanation: "Makes you sound mechanical and synthetic by mixing your voice with a pure \
        electronic tone and filtering out some frequencies.",
    stem_connection: "This effect uses \"ring modulation\": multiplying your voice sound wave \
        with a simple sine wave (pure tone). This creates new frequencies that weren't in your \
        original voice, giving it a metallic, robotic quality. Then a filter removes some \
        frequencies to make it sound even more mechanical.",
    did_you_know: Some(
        "Early synthesizers used this exact technique in the 1960s! Bands like Kraftwerk used \
        ring modulation to create robot voices. Modern voice assistants sound natural because \
        they use recorded human speech instead.",
    ),
};

impl VoiceEffect for Robot {
    type Params = RobotParams;

    const ID: EffectId = EffectId::Robot;

    fn render_wet(&self, input: &AudioBuffer, params: &RobotParams) -> Result<AudioBuffer, ProcessingError> {
        let ctx = RenderContext::for_buffer(input, 0.0)?;
        let sr = ctx.sample_rate() as f32;
        ctx.render(input, |_| {
            vec![
                Box::new(RingModulator::new(sr, params.modulation_freq)) as Box<dyn Node>,
                Box::new(Biquad::band_pass(sr, params.filter_freq, params.filter_q)),
                Box::new(Biquad::peaking(
                    sr,
                    params.filter_freq * 2.0,
                    HARMONIC_Q,
                    HARMONIC_GAIN_DB,
                )),
            ]
        })
    }

    fn educational(&self) -> &'static EducationalContent {
        &EDUCATION
    }
}
