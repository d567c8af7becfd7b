//! Exporting processed audio as WAV files

use crate::wav::{encode_wav, WavError};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use voxlab_audio::AudioBuffer;

/// Errors that can occur during export
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Wav(#[from] WavError),
}

/// File name for an export: `voice_<effect>_<YYYY-MM-DD>.wav`
///
/// The effect name is lowercased and each run of whitespace becomes `_`.
pub fn export_filename(effect_name: &str, date: NaiveDate) -> String {
    let name = effect_name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_");
    format!("voice_{}_{}.wav", name, date.format("%Y-%m-%d"))
}

/// Today's export file name from the local clock
pub fn export_filename_today(effect_name: &str) -> String {
    export_filename(effect_name, chrono::Local::now().date_naive())
}

/// Write `buffer` as `dir/file_name`, creating `dir` if needed
pub fn export_wav(buffer: &AudioBuffer, dir: &Path, file_name: &str) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    write_wav(buffer, &path)?;
    Ok(path)
}

/// Export to a user-chosen target
///
/// `None` writes today's file name into `default_dir`; an existing directory
/// gets today's file name inside it; anything else is used as the file path.
pub fn export_to(
    buffer: &AudioBuffer,
    target: Option<&Path>,
    default_dir: &Path,
    effect_name: &str,
) -> Result<PathBuf, ExportError> {
    match target {
        None => export_wav(buffer, default_dir, &export_filename_today(effect_name)),
        Some(dir) if dir.is_dir() => export_wav(buffer, dir, &export_filename_today(effect_name)),
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            write_wav(buffer, path)?;
            Ok(path.to_path_buf())
        }
    }
}

/// Write `buffer` to an explicit path
pub fn write_wav(buffer: &AudioBuffer, path: &Path) -> Result<(), ExportError> {
    let bytes = encode_wav(buffer)?;
    fs::write(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "exported WAV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_single_word_name() {
        assert_eq!(export_filename("Robot", date()), "voice_robot_2024-03-09.wav");
    }

    #[test]
    fn test_multi_word_name() {
        assert_eq!(export_filename("Deep Voice", date()), "voice_deep_voice_2024-03-09.wav");
        assert_eq!(export_filename("  Deep \t Voice ", date()), "voice_deep_voice_2024-03-09.wav");
    }

    #[test]
    fn test_export_targets() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = AudioBuffer::silent(2, 100, 48000).unwrap();
        let today = export_filename_today("Deep Voice");

        let default = export_to(&buffer, None, dir.path(), "Deep Voice").unwrap();
        assert_eq!(default, dir.path().join(&today));

        let into_dir = export_to(&buffer, Some(dir.path()), Path::new("unused"), "Deep Voice").unwrap();
        assert_eq!(into_dir, dir.path().join(&today));

        let explicit = dir.path().join("takes").join("mine.wav");
        let written = export_to(&buffer, Some(&explicit), Path::new("unused"), "Deep Voice").unwrap();
        assert_eq!(written, explicit);
        assert_eq!(fs::metadata(&explicit).unwrap().len(), 44 + 100 * 4);
    }

    #[test]
    fn test_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = AudioBuffer::silent(1, 480, 48000).unwrap();
        let path = export_wav(&buffer, &dir.path().join("out"), "voice_echo_2024-03-09.wav").unwrap();
        assert!(path.ends_with("out/voice_echo_2024-03-09.wav"));
        assert_eq!(fs::metadata(&path).unwrap().len(), 44 + 480 * 2);
    }
}
