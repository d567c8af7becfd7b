//! Voice effects
//!
//! The six effects form a closed set. [`Effect`] dispatches over them
//! exhaustively; each variant renders a fully processed ("wet") buffer
//! through an offline [`RenderContext`](crate::RenderContext) and blends it
//! with the original using its `wetDry` parameter.

mod alien;
mod chipmunk;
mod deep_voice;
mod echo;
mod robot;
mod telephone;

pub use alien::Alien;
pub use chipmunk::Chipmunk;
pub use deep_voice::DeepVoice;
pub use echo::{tail_secs, Echo, MAX_TAIL_SECS};
pub use robot::Robot;
pub use telephone::Telephone;

use crate::buffer::AudioBuffer;
use crate::math::mix;
use crate::params::{EffectParams, ParamSet};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// Rendering failure inside an effect
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessingError {
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(usize),

    #[error("unsupported sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("input buffer is empty")]
    EmptyInput,

    #[error("too many render contexts open (limit {0})")]
    ContextLimit(usize),

    #[error("render produced a non-finite sample (channel {channel}, frame {frame})")]
    NonFinite { channel: usize, frame: usize },

    #[error("render failed: {0}")]
    Render(String),
}

/// Lookup of an identifier outside the six known effects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown effect: {0}")]
pub struct UnknownEffectError(pub String);

/// Identifier of one of the six effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectId {
    Chipmunk,
    DeepVoice,
    Robot,
    Telephone,
    Echo,
    Alien,
}

impl EffectId {
    /// All effects in display order
    pub const ALL: [EffectId; 6] = [
        EffectId::Chipmunk,
        EffectId::DeepVoice,
        EffectId::Robot,
        EffectId::Telephone,
        EffectId::Echo,
        EffectId::Alien,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectId::Chipmunk => "chipmunk",
            EffectId::DeepVoice => "deepVoice",
            EffectId::Robot => "robot",
            EffectId::Telephone => "telephone",
            EffectId::Echo => "echo",
            EffectId::Alien => "alien",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EffectId::Chipmunk => "Chipmunk",
            EffectId::DeepVoice => "Deep Voice",
            EffectId::Robot => "Robot",
            EffectId::Telephone => "Telephone",
            EffectId::Echo => "Echo",
            EffectId::Alien => "Alien",
        }
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectId {
    type Err = UnknownEffectError;

    /// Accepts the canonical id, case-insensitively, plus `deep_voice` / `deep`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let id = match lowered.as_str() {
            "chipmunk" => EffectId::Chipmunk,
            "deepvoice" | "deep_voice" | "deep-voice" | "deep" => EffectId::DeepVoice,
            "robot" => EffectId::Robot,
            "telephone" | "phone" => EffectId::Telephone,
            "echo" => EffectId::Echo,
            "alien" => EffectId::Alien,
            _ => return Err(UnknownEffectError(s.to_string())),
        };
        Ok(id)
    }
}

/// Static explanatory text shown alongside an effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EducationalContent {
    pub name: &'static str,
    pub explanation: &'static str,
    pub stem_connection: &'static str,
    pub did_you_know: Option<&'static str>,
}

/// Contract shared by the six effect algorithms
pub trait VoiceEffect {
    type Params: ParamSet;

    const ID: EffectId;

    /// Render the fully processed signal
    ///
    /// `params` are already clamped. The result has at least as many frames
    /// as `input`.
    fn render_wet(&self, input: &AudioBuffer, params: &Self::Params) -> Result<AudioBuffer, ProcessingError>;

    fn educational(&self) -> &'static EducationalContent;

    fn default_params(&self) -> Self::Params {
        Self::Params::default()
    }

    /// Render and blend with the original; never mutates `input`
    fn process(&self, input: &AudioBuffer, params: &Self::Params) -> Result<AudioBuffer, ProcessingError> {
        if input.is_empty() {
            return Err(ProcessingError::EmptyInput);
        }
        let params = params.clamped();
        let wet = self.render_wet(input, &params)?;

        // Effects with a tail pad the original with silence before blending
        let dry = if wet.len() > input.len() {
            input.resized(wet.len())
        } else {
            input.clone()
        };
        Ok(mix(&dry, &wet, params.wet_dry()))
    }
}

/// One of the six effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Chipmunk(Chipmunk),
    DeepVoice(DeepVoice),
    Robot(Robot),
    Telephone(Telephone),
    Echo(Echo),
    Alien(Alien),
}

impl Effect {
    pub fn from_id(id: EffectId) -> Self {
        match id {
            EffectId::Chipmunk => Effect::Chipmunk(Chipmunk),
            EffectId::DeepVoice => Effect::DeepVoice(DeepVoice),
            EffectId::Robot => Effect::Robot(Robot),
            EffectId::Telephone => Effect::Telephone(Telephone),
            EffectId::Echo => Effect::Echo(Echo),
            EffectId::Alien => Effect::Alien(Alien),
        }
    }

    pub fn id(&self) -> EffectId {
        match self {
            Effect::Chipmunk(_) => EffectId::Chipmunk,
            Effect::DeepVoice(_) => EffectId::DeepVoice,
            Effect::Robot(_) => EffectId::Robot,
            Effect::Telephone(_) => EffectId::Telephone,
            Effect::Echo(_) => EffectId::Echo,
            Effect::Alien(_) => EffectId::Alien,
        }
    }

    pub fn default_params(&self) -> EffectParams {
        EffectParams::defaults(self.id())
    }

    pub fn educational(&self) -> &'static EducationalContent {
        match self {
            Effect::Chipmunk(e) => e.educational(),
            Effect::DeepVoice(e) => e.educational(),
            Effect::Robot(e) => e.educational(),
            Effect::Telephone(e) => e.educational(),
            Effect::Echo(e) => e.educational(),
            Effect::Alien(e) => e.educational(),
        }
    }

    /// Process `input` with `params`
    ///
    /// Parameters meant for a different effect are replaced by this effect's
    /// defaults.
    pub fn process(&self, input: &AudioBuffer, params: &EffectParams) -> Result<AudioBuffer, ProcessingError> {
        let params = if params.id() == self.id() {
            *params
        } else {
            warn!(
                effect = self.id().as_str(),
                given = params.id().as_str(),
                "parameters belong to another effect, using defaults"
            );
            self.default_params()
        };

        let start = Instant::now();
        let result = match (self, &params) {
            (Effect::Chipmunk(e), EffectParams::Chipmunk(p)) => e.process(input, p),
            (Effect::DeepVoice(e), EffectParams::DeepVoice(p)) => e.process(input, p),
            (Effect::Robot(e), EffectParams::Robot(p)) => e.process(input, p),
            (Effect::Telephone(e), EffectParams::Telephone(p)) => e.process(input, p),
            (Effect::Echo(e), EffectParams::Echo(p)) => e.process(input, p),
            (Effect::Alien(e), EffectParams::Alien(p)) => e.process(input, p),
            // Unreachable after the id check above
            _ => Err(ProcessingError::Render(format!(
                "parameter mismatch for {}",
                self.id()
            ))),
        };

        match &result {
            Ok(out) => debug!(
                effect = self.id().as_str(),
                input_frames = input.len(),
                output_frames = out.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "effect processed"
            ),
            Err(e) => warn!(effect = self.id().as_str(), error = %e, "effect failed"),
        }
        result
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trip() {
        for id in EffectId::ALL {
            assert_eq!(id.as_str().parse::<EffectId>().unwrap(), id);
            assert_eq!(Effect::from_id(id).id(), id);
        }
        assert_eq!("Deep_Voice".parse::<EffectId>().unwrap(), EffectId::DeepVoice);
        assert!("karaoke".parse::<EffectId>().is_err());
    }

    #[test]
    fn test_mismatched_params_fall_back_to_defaults() {
        let input = test_util::sine(440.0, 0.1, 48000, 0.5);
        let robot = Effect::from_id(EffectId::Robot);
        let with_wrong = robot
            .process(&input, &EffectParams::defaults(EffectId::Echo))
            .unwrap();
        let with_defaults = robot.process(&input, &robot.default_params()).unwrap();
        assert_eq!(with_wrong.channel(0), with_defaults.channel(0));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let empty = AudioBuffer::silent(1, 0, 48000).unwrap();
        for id in EffectId::ALL {
            let effect = Effect::from_id(id);
            assert_eq!(
                effect.process(&empty, &effect.default_params()),
                Err(ProcessingError::EmptyInput)
            );
        }
    }

    #[test]
    fn test_every_effect_has_education() {
        for id in EffectId::ALL {
            let content = Effect::from_id(id).educational();
            assert!(!content.name.is_empty());
            assert!(!content.explanation.is_empty());
            assert!(!content.stem_connection.is_empty());
        }
    }
}
