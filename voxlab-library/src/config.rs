//! Simple configuration persistence for Voxlab
//!
//! Stores the session sample rate, export folder and a few defaults.

use crate::loader::DEFAULT_SAMPLE_RATE;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use voxlab_audio::{EffectId, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};

/// Longest recording allowed, in seconds
pub const MAX_RECORD_SECS: u32 = 10;

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Rate every input is decoded to
    pub sample_rate: u32,
    /// Folder exports are written to
    pub export_dir: PathBuf,
    /// Effect selected at startup
    pub default_effect: EffectId,
    /// Recording ceiling (1 - 10 s)
    pub max_record_secs: u32,
    /// Peak-normalize decoded input to this level
    pub normalize_peak: Option<f32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            export_dir: PathBuf::from("."),
            default_effect: EffectId::Chipmunk,
            max_record_secs: MAX_RECORD_SECS,
            normalize_peak: None,
        }
    }
}

impl Config {
    /// Load config from the default location
    ///
    /// Returns default config if file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let path = Self::config_path();
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no config file, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Save config to the default location
    pub fn save(&self) -> io::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.serialize())
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voxlab")
            .join("config.txt")
    }

    /// Parse config from simple key=value format
    ///
    /// Invalid values are skipped one key at a time.
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            let valid = match key {
                "sample_rate" => match value.parse::<u32>() {
                    Ok(rate) if (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&rate) => {
                        config.sample_rate = rate;
                        true
                    }
                    _ => false,
                },
                "export_dir" => {
                    if !value.is_empty() {
                        config.export_dir = PathBuf::from(value);
                    }
                    !value.is_empty()
                }
                "default_effect" => match value.parse::<EffectId>() {
                    Ok(id) => {
                        config.default_effect = id;
                        true
                    }
                    Err(_) => false,
                },
                "max_record_secs" => match value.parse::<u32>() {
                    Ok(secs) => {
                        config.max_record_secs = secs.clamp(1, MAX_RECORD_SECS);
                        true
                    }
                    Err(_) => false,
                },
                "normalize_peak" => match value.parse::<f32>() {
                    Ok(peak) if peak > 0.0 && peak <= 1.0 => {
                        config.normalize_peak = Some(peak);
                        true
                    }
                    _ => false,
                },
                _ => true, // Ignore unknown keys
            };

            if !valid {
                warn!(key, value, "ignoring invalid config value");
            }
        }

        config
    }

    /// Serialize config to simple key=value format
    pub fn serialize(&self) -> String {
        let mut lines = vec![
            "# Voxlab Configuration".to_string(),
            format!("sample_rate={}", self.sample_rate),
            format!("export_dir={}", self.export_dir.display()),
            format!("default_effect={}", self.default_effect.as_str()),
            format!("max_record_secs={}", self.max_record_secs),
        ];
        if let Some(peak) = self.normalize_peak {
            lines.push(format!("normalize_peak={peak}"));
        }
        lines.join("\n")
    }
}
