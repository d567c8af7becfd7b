//! Echo: feedback delay with a decaying tail
//!
//! The wet signal is the delay line output only; the original is blended back
//! in by `wetDry`. Output runs past the input for as long as the echoes take
//! to fall below 1% of the first repeat, capped at four seconds.

use super::{EducationalContent, EffectId, ProcessingError, VoiceEffect};
use crate::buffer::AudioBuffer;
use crate::dsp::{FeedbackDelay, Node};
use crate::params::EchoParams;
use crate::render::RenderContext;

/// Longest decay tail appended to the input
pub const MAX_TAIL_SECS: f32 = 4.0;

/// Level at which an echo counts as gone
const DECAY_THRESHOLD: f32 = 0.01;

/// Lowest feedback used for the tail estimate, keeps ln() finite
const MIN_TAIL_FEEDBACK: f32 = 0.001;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Echo;

static EDUCATION: EducationalContent = EducationalContent {
    name: "Echo Effect",
    explanation: "Makes your voice repeat like you're in a big canyon or empty room by \
        playing delayed copies of your voice.",
    stem_connection: "An echo happens when sound bounces off a surface and returns to your \
        ears. Sound travels about 343 m/s (767 mph). A canyon 34 meters away creates an echo \
        after 0.2 seconds. Our delay effect simulates this digitally, creating copies of your \
        voice that play after a set delay, with each copy quieter than the last!",
    did_you_know: Some(
        "The longest echo ever recorded was in Scotland's Inchindown oil tanks. It lasted 112 \
        seconds! That's nearly 2 minutes from a single sound. Most natural echoes last less \
        than 1 second.",
    ),
};

/// Seconds of output appended after the input
///
/// The smallest `delay_time * n` with `feedback^n < 0.01`, at least one
/// repeat and at most [`MAX_TAIL_SECS`].
pub fn tail_secs(delay_time: f32, feedback: f32) -> f32 {
    let feedback = f64::from(feedback.clamp(MIN_TAIL_FEEDBACK, FeedbackDelay::MAX_FEEDBACK));
    let threshold = f64::from(DECAY_THRESHOLD);
    let mut repeats = (threshold.ln() / feedback.ln()).ceil().max(1.0);
    // The log ratio can land a hair either side of an exact integer
    if feedback.powf(repeats) >= threshold {
        repeats += 1.0;
    } else if repeats > 1.0 && feedback.powf(repeats - 1.0) < threshold {
        repeats -= 1.0;
    }
    (delay_time.max(0.0) * repeats as f32).min(MAX_TAIL_SECS)
}

impl VoiceEffect for Echo {
    type Params = EchoParams;

    const ID: EffectId = EffectId::Echo;

    fn render_wet(&self, input: &AudioBuffer, params: &EchoParams) -> Result<AudioBuffer, ProcessingError> {
        let ctx = RenderContext::for_buffer(input, tail_secs(params.delay_time, params.feedback))?;
        let sr = ctx.sample_rate() as f32;
        ctx.render(input, |_| {
            vec![Box::new(FeedbackDelay::new(sr, params.delay_time, params.feedback)) as Box<dyn Node>]
        })
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
    fn test_tail_length() {
        // 0.5^7 < 0.01 <= 0.5^6
        assert!((tail_secs(0.25, 0.5) - 1.75).abs() < 1e-6);
        assert!((tail_secs(1.0, 0.9) - MAX_TAIL_SECS).abs() < 1e-6);
        // No feedback still leaves room for the first repeat
        assert!((tail_secs(0.3, 0.0) - 0.3).abs() < 1e-6);
        // 0.1^2 sits exactly on the threshold, so a third repeat is kept
        assert!((tail_secs(0.1, 0.1) - 0.3).abs() < 1e-6);
        assert!((tail_secs(0.2, 0.1) - 0.6).abs() < 1e-6);
        assert!(tail_secs(1.0, 0.9999).is_finite());
    }

    #[test]
    fn test_output_extends_past_input() {
        let input = sine(440.0, 0.5, 48000, 0.5);
        let out = Echo.process(&input, &EchoParams::default()).unwrap();
        let tail_frames = (1.75f32 * 48000.0).ceil() as usize;
        assert_eq!(out.len(), input.len() + tail_frames);
        assert!(out.len() - input.len() <= (MAX_TAIL_SECS * 48000.0).ceil() as usize);
    }

    #[test]
    fn test_dry_keeps_original_and_pads() {
        let input = sine(440.0, 0.5, 48000, 0.5);
        let params = EchoParams {
            wet_dry: 0.0,
            ..Default::default()
        };
        let out = Echo.process(&input, &params).unwrap();
        assert!(out.len() > input.len());
        assert!(mean_abs_diff(&input, &out) < 1e-6);
        assert!(out.channel(0)[input.len()..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_first_repeat_arrives_after_delay() {
        let mut samples = vec![0.0; 4800];
        samples[0] = 1.0;
        let input = AudioBuffer::from_mono(samples, 48000).unwrap();
        let params = EchoParams {
            delay_time: 0.1,
            feedback: 0.0,
            wet_dry: 1.0,
        };
        let out = Echo.process(&input, &params).unwrap();
        assert!(out.channel(0)[..4799].iter().all(|s| s.abs() < 1e-6));
        assert!((out.channel(0)[4800] - 1.0).abs() < 1e-4);
    }
}
