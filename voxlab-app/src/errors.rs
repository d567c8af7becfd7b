//! User-facing error classification
//!
//! Every failure that reaches the binary is sorted into one of a few kinds,
//! each with a single message and a flag saying whether retrying can help.

use voxlab_audio::{ProcessingError, ProcessorError, UnknownEffectError};
use voxlab_library::LoadError;

use crate::capture::CaptureError;
use crate::playback::PlaybackError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Microphone access refused
    Permission,
    /// Missing or failing audio device
    Device,
    /// An effect failed to render
    Processing,
    /// An input file or demo clip failed to load
    SampleLoad,
    /// An effect id outside the registry
    UnknownEffect,
}

impl ErrorKind {
    /// Whether retrying inside the app can succeed
    pub fn recoverable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Device | ErrorKind::Processing | ErrorKind::SampleLoad
        )
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::Permission => {
                "Microphone access was denied. Allow access in your system settings and try again."
            }
            ErrorKind::Device => "No usable audio device was found. Check your microphone or speakers.",
            ErrorKind::Processing => "The effect could not be applied. Try again or record a new clip.",
            ErrorKind::SampleLoad => "The audio could not be loaded. Check the file and try again.",
            ErrorKind::UnknownEffect => "That effect does not exist.",
        }
    }

    /// Classify an error chain; `None` for failures outside the taxonomy
    pub fn classify(error: &anyhow::Error) -> Option<Self> {
        error.chain().find_map(|cause| {
            if let Some(e) = cause.downcast_ref::<CaptureError>() {
                return Some(match e {
                    CaptureError::PermissionDenied(_) => ErrorKind::Permission,
                    _ => ErrorKind::Device,
                });
            }
            if cause.is::<PlaybackError>() {
                return Some(ErrorKind::Device);
            }
            if let Some(e) = cause.downcast_ref::<ProcessorError>() {
                return match e {
                    ProcessorError::UnknownEffect(_) => Some(ErrorKind::UnknownEffect),
                    ProcessorError::Processing(_) => Some(ErrorKind::Processing),
                    _ => None,
                };
            }
            if cause.is::<ProcessingError>() {
                return Some(ErrorKind::Processing);
            }
            if cause.is::<UnknownEffectError>() {
                return Some(ErrorKind::UnknownEffect);
            }
            if cause.is::<LoadError>() {
                return Some(ErrorKind::SampleLoad);
            }
            None
        })
    }
}

/// One line for the user: the classified message followed by the cause
pub fn describe(error: &anyhow::Error) -> String {
    match ErrorKind::classify(error) {
        Some(kind) => format!("{} ({error:#})", kind.message()),
        None => format!("{error:#}"),
    }
}
