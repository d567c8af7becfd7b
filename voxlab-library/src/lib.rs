//! Audio IO for Voxlab - decoding, WAV export and configuration

mod config;
mod export;
mod loader;
mod wav;

pub use config::{Config, MAX_RECORD_SECS};
pub use export::{export_filename, export_filename_today, export_to, export_wav, write_wav, ExportError};
pub use loader::{decode_audio, AudioLoader, LoadError, DEFAULT_SAMPLE_RATE};
pub use wav::{decode_wav, encode_wav, from_pcm16, is_pcm16_wav, to_pcm16, WavError, MAX_WAV_CHANNELS};
