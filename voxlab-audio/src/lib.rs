//! Voice effects engine for Voxlab
//!
//! This crate provides the offline processing pipeline:
//! - AudioBuffer: immutable multi-channel sample buffers and buffer math
//! - Render: scoped offline rendering contexts with a global limit
//! - DSP: biquads, delay lines, pitch shifter, ring modulator, chorus
//! - Effects: the six voice effects and their typed parameters
//! - Processor: recording/playback state and last-writer-wins commits

mod buffer;
pub mod dsp;
pub mod effects;
mod math;
mod meter;
pub mod params;
mod processor;
mod registry;
mod render;
pub mod samples;

pub use buffer::{AudioBuffer, BufferError};
pub use effects::{EducationalContent, Effect, EffectId, ProcessingError, UnknownEffectError, VoiceEffect};
pub use math::{mix, normalize};
pub use meter::{LevelMeter, LevelReading};
pub use params::{EffectParams, ParamRange, ParamSet, ParamSpec};
pub use processor::{
    CommitOutcome, PlaybackSource, PlaybackState, ProcessingEvent, ProcessingWorker, Processor,
    ProcessorError, RecordingStatus, Ticket, WorkerCommand,
};
pub use registry::{EffectDefinition, EffectRegistry};
pub use render::{ContextPool, RenderContext, DEFAULT_CONTEXT_LIMIT, MAX_CHANNELS, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
pub use samples::{DemoSample, DEMO_SAMPLE_RATE};
