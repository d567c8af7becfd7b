//! Line-based command input for the Voxlab session

mod commands;
mod parser;

pub use commands::{Command, DemoSample, EffectId, PlaybackSource, HELP};
pub use parser::{parse_command, ParseError};
