//! Command definitions for the Voxlab session

use std::path::PathBuf;

pub use voxlab_audio::{DemoSample, EffectId, PlaybackSource};

/// Commands that can be dispatched from the session prompt
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Input
    Record(Option<u32>), // Optional length in seconds
    Load(PathBuf),
    Demo(DemoSample),
    Reset,

    // Effect selection and parameters
    SelectEffect(EffectId),
    Set(String, f32), // camelCase parameter name, value
    Wet(f32),         // Shortcut for `set wetDry`
    Apply,

    // Playback
    Play(PlaybackSource),
    Stop,

    // Output
    Export(Option<PathBuf>),

    // Information
    List,
    Info(Option<EffectId>),
    Params,
    Status,
    Help,

    // Application
    Quit,
}

/// One line of help text per command
pub const HELP: &[(&str, &str)] = &[
    ("record [secs]", "Record from the microphone (up to 10 s)"),
    ("load <path>", "Load an audio file as the original"),
    ("demo <vowels|melody|hello>", "Load a synthesized demo clip"),
    ("effect <id>", "Select an effect and reset its parameters"),
    ("set <param> <value>", "Change a parameter (clamped to its range)"),
    ("wet <0-1>", "Set the effect amount"),
    ("apply", "Process the original with the current effect"),
    ("play [original|processed]", "Play a buffer, stopping any playback"),
    ("stop", "Stop playback"),
    ("export [path]", "Write the processed audio as WAV"),
    ("list", "List effects"),
    ("info [id]", "Explain how an effect works"),
    ("params", "Show the current parameters"),
    ("status", "Show recording and playback state"),
    ("reset", "Discard the recording"),
    ("help", "Show this help"),
    ("quit", "Leave the session"),
];
