//! Parsing session command lines into [`Command`]s

use crate::commands::{Command, DemoSample, EffectId, PlaybackSource};
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while parsing a command line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0} (try `help`)")]
    UnknownCommand(String),
    #[error("`{command}` needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("invalid {argument}: {value}")]
    InvalidArgument { argument: &'static str, value: String },
    #[error("`{0}` takes no more arguments")]
    TrailingInput(&'static str),
}

/// Strip one pair of matching surrounding quotes
fn unquote(text: &str) -> &str {
    let text = text.trim();
    if text.len() >= 2
        && ((text.starts_with('\'') && text.ends_with('\''))
            || (text.starts_with('"') && text.ends_with('"')))
    {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

fn parse_number<T: std::str::FromStr>(argument: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse::<T>().map_err(|_| ParseError::InvalidArgument {
        argument,
        value: value.to_string(),
    })
}

fn parse_effect(value: &str) -> Result<EffectId, ParseError> {
    value.parse::<EffectId>().map_err(|_| ParseError::InvalidArgument {
        argument: "effect",
        value: value.to_string(),
    })
}

/// Parse one line typed at the session prompt
pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let no_args = |command: &'static str, value: Command| {
        if args.is_empty() {
            Ok(value)
        } else {
            Err(ParseError::TrailingInput(command))
        }
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Err(ParseError::Empty),

        "record" | "rec" => match args.as_slice() {
            [] => Ok(Command::Record(None)),
            [secs] => {
                let secs: u32 = parse_number("duration", secs)?;
                if secs == 0 {
                    return Err(ParseError::InvalidArgument {
                        argument: "duration",
                        value: secs.to_string(),
                    });
                }
                Ok(Command::Record(Some(secs)))
            }
            _ => Err(ParseError::TrailingInput("record")),
        },

        "load" | "open" => {
            let path = unquote(rest);
            if path.is_empty() {
                return Err(ParseError::MissingArgument {
                    command: "load",
                    argument: "a file path",
                });
            }
            Ok(Command::Load(PathBuf::from(path)))
        }

        "demo" => match args.as_slice() {
            [] => Err(ParseError::MissingArgument {
                command: "demo",
                argument: "a sample id",
            }),
            [id] => id
                .parse::<DemoSample>()
                .map(Command::Demo)
                .map_err(|_| ParseError::InvalidArgument {
                    argument: "demo sample",
                    value: id.to_string(),
                }),
            _ => Err(ParseError::TrailingInput("demo")),
        },

        "effect" | "fx" | "use" => match args.as_slice() {
            [] => Err(ParseError::MissingArgument {
                command: "effect",
                argument: "an effect id",
            }),
            [id] => parse_effect(id).map(Command::SelectEffect),
            _ => Err(ParseError::TrailingInput("effect")),
        },

        "set" => match args.as_slice() {
            [key, value] => Ok(Command::Set(key.to_string(), parse_number("value", value)?)),
            // Also accept `set key=value`
            [pair] => match pair.split_once('=') {
                Some((key, value)) if !key.is_empty() => {
                    Ok(Command::Set(key.to_string(), parse_number("value", value)?))
                }
                _ => Err(ParseError::MissingArgument {
                    command: "set",
                    argument: "a parameter name and value",
                }),
            },
            [] => Err(ParseError::MissingArgument {
                command: "set",
                argument: "a parameter name and value",
            }),
            _ => Err(ParseError::TrailingInput("set")),
        },

        "wet" => match args.as_slice() {
            [value] => Ok(Command::Wet(parse_number("amount", value)?)),
            [] => Err(ParseError::MissingArgument {
                command: "wet",
                argument: "an amount between 0 and 1",
            }),
            _ => Err(ParseError::TrailingInput("wet")),
        },

        "apply" | "go" => no_args("apply", Command::Apply),

        "play" | "p" => match args.as_slice() {
            [] => Ok(Command::Play(PlaybackSource::Processed)),
            [source] => match source.to_ascii_lowercase().as_str() {
                "original" | "orig" | "dry" => Ok(Command::Play(PlaybackSource::Original)),
                "processed" | "wet" => Ok(Command::Play(PlaybackSource::Processed)),
                other => Err(ParseError::InvalidArgument {
                    argument: "playback source",
                    value: other.to_string(),
                }),
            },
            _ => Err(ParseError::TrailingInput("play")),
        },

        "stop" => no_args("stop", Command::Stop),

        "export" | "save" => {
            let path = unquote(rest);
            Ok(Command::Export((!path.is_empty()).then(|| PathBuf::from(path))))
        }

        "list" | "ls" => no_args("list", Command::List),

        "info" => match args.as_slice() {
            [] => Ok(Command::Info(None)),
            [id] => parse_effect(id).map(|id| Command::Info(Some(id))),
            _ => Err(ParseError::TrailingInput("info")),
        },

        "params" => no_args("params", Command::Params),
        "status" => no_args("status", Command::Status),
        "reset" => no_args("reset", Command::Reset),
        "help" | "?" => no_args("help", Command::Help),
        "quit" | "q" | "exit" => no_args("quit", Command::Quit),

        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}
