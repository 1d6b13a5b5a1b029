//! Configuration file support for nextup.
//!
//! This module provides functionality for loading and saving user preferences
//! from a TOML configuration file, and for deriving engine settings from them.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User configuration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Preferred stream quality label (e.g. "1080p"); unset means best ranked
    #[serde(default)]
    pub preferred_quality: Option<String>,

    /// Audio language auto-selected when an item offers two tracks
    #[serde(default = "default_audio_language")]
    pub preferred_audio_language: String,

    /// Seconds between progress saves while playing
    #[serde(default = "default_progress_interval")]
    pub progress_interval_secs: u64,

    /// Played fraction at which the "play next" prompt appears
    #[serde(default = "default_near_end_ratio")]
    pub near_end_ratio: f64,

    /// Saved positions at or below this many seconds start from the top
    #[serde(default = "default_resume_threshold")]
    pub resume_threshold_secs: f64,

    /// Pass sibling translations to lookups made after an automatic transition
    #[serde(default)]
    pub lookahead_includes_siblings: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn default_audio_language() -> String {
    "en".to_string()
}

fn default_progress_interval() -> u64 {
    5
}

fn default_near_end_ratio() -> f64 {
    0.95
}

fn default_resume_threshold() -> f64 {
    5.0
}

/// Tunables the playback engine reads.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub tick_interval: Duration,
    pub near_end_ratio: f64,
    pub resume_threshold_secs: f64,
    pub preferred_audio_language: String,
    pub lookahead_includes_siblings: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Config::new().engine_settings()
    }
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self {
            preferred_quality: None,
            preferred_audio_language: default_audio_language(),
            progress_interval_secs: default_progress_interval(),
            near_end_ratio: default_near_end_ratio(),
            resume_threshold_secs: default_resume_threshold(),
            lookahead_includes_siblings: false,
        }
    }

    /// Engine settings derived from this config.
    ///
    /// A zero progress interval is bumped to one second.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            tick_interval: Duration::from_secs(self.progress_interval_secs.max(1)),
            near_end_ratio: self.near_end_ratio.clamp(0.0, 1.0),
            resume_threshold_secs: self.resume_threshold_secs.max(0.0),
            preferred_audio_language: self.preferred_audio_language.clone(),
            lookahead_includes_siblings: self.lookahead_includes_siblings,
        }
    }

    /// Get the path to the config file.
    ///
    /// Returns ~/.config/nextup/config.toml on Linux,
    /// or a platform-appropriate location on other systems.
    pub fn get_config_path() -> std::result::Result<PathBuf, io::Error> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Could not find config directory")
            })?
            .join("nextup");

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the default location.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load config from `path`, falling back to defaults when it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to `path`.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_config_has_defaults() {
        let config = Config::new();
        assert!(config.preferred_quality.is_none());
        assert_eq!(config.preferred_audio_language, "en");
        assert_eq!(config.progress_interval_secs, 5);
        assert_eq!(config.near_end_ratio, 0.95);
        assert_eq!(config.resume_threshold_secs, 5.0);
        assert!(!config.lookahead_includes_siblings);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config {
            preferred_quality: Some("720p".to_string()),
            lookahead_includes_siblings: true,
            ..Config::new()
        };

        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("preferred_quality = \"720p\""));
        assert!(toml_str.contains("lookahead_includes_siblings = true"));
        assert!(toml_str.contains("progress_interval_secs = 5"));
    }

    #[test]
    fn test_config_partial_deserialization() {
        // Only specify some fields, rest should use defaults
        let toml_str = r#"
            preferred_quality = "1080p"
            near_end_ratio = 0.9
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.preferred_quality.as_deref(), Some("1080p"));
        assert_eq!(config.near_end_ratio, 0.9);
        assert_eq!(config.preferred_audio_language, "en"); // default
        assert_eq!(config.resume_threshold_secs, 5.0); // default
    }

    #[test]
    fn test_engine_settings_clamp() {
        let config = Config {
            progress_interval_secs: 0,
            near_end_ratio: 1.7,
            ..Config::new()
        };
        let settings = config.engine_settings();
        assert_eq!(settings.tick_interval, Duration::from_secs(1));
        assert_eq!(settings.near_end_ratio, 1.0);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nextup").join("config.toml");

        let config = Config {
            preferred_quality: Some("480p".to_string()),
            preferred_audio_language: "ja".to_string(),
            ..Config::new()
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::new());
    }
}
