//! Feedback delay (echo) producing only the delayed signal
//!
//! `y[n] = x[n - D] + feedback * y[n - D]`. Feedback is capped at 0.9 so
//! the echo train always decays.

use super::{DelayLine, Interpolation, Node};

pub struct FeedbackDelay {
    line: DelayLine,
    /// Delay in samples (>= 1)
    delay: f32,
    /// Feedback gain (0.0 - 0.9)
    feedback: f32,
}

impl FeedbackDelay {
    /// Highest feedback gain accepted
    pub const MAX_FEEDBACK: f32 = 0.9;

    /// Create an echo of `delay_secs` with the given feedback
    pub fn new(sample_rate: f32, delay_secs: f32, feedback: f32) -> Self {
        let delay = (delay_secs.max(0.0) * sample_rate).max(1.0);
        Self {
            line: DelayLine::new(delay.ceil() as usize + 1, Interpolation::Lagrange),
            delay,
            feedback: feedback.clamp(0.0, Self::MAX_FEEDBACK),
        }
    }
}

impl Node for FeedbackDelay {
    fn process(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            // Read before writing: the newest stored sample is one step old
            let delayed = self.line.read(self.delay - 1.0);
            self.line.write(*s + delayed * self.feedback);
            *s = delayed;
        }
    }

    fn reset(&mut self) {
        self.line.clear();
    }

    fn name(&self) -> &'static str {
        "Echo"
    }
}
