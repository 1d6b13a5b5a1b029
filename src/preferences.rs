//! Process-wide playback preferences.

use crate::config::Config;
use crate::error::Result;
use crate::types::QualityLabel;
use std::path::PathBuf;

/// Read/write contract for the preferred stream quality.
pub trait PreferenceStore {
    fn preferred_quality(&self) -> Option<QualityLabel>;
    fn set_preferred_quality(&mut self, quality: Option<QualityLabel>) -> Result<()>;
}

/// Preferences that live only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    quality: Option<QualityLabel>,
}

impl MemoryPreferences {
    pub fn new(quality: Option<&str>) -> Self {
        Self {
            quality: quality.map(str::to_string),
        }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn preferred_quality(&self) -> Option<QualityLabel> {
        self.quality.clone()
    }

    fn set_preferred_quality(&mut self, quality: Option<QualityLabel>) -> Result<()> {
        self.quality = quality;
        Ok(())
    }
}

/// Preferences backed by the TOML config file; every change is written through.
#[derive(Debug)]
pub struct ConfigPreferences {
    config: Config,
    path: PathBuf,
}

impl ConfigPreferences {
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self { config, path }
    }

    /// Load the config at its default location.
    pub fn open_default() -> Result<Self> {
        let path = Config::get_config_path()?;
        let config = Config::load_from(&path)?;
        Ok(Self::new(config, path))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl PreferenceStore for ConfigPreferences {
    fn preferred_quality(&self) -> Option<QualityLabel> {
        self.config.preferred_quality.clone()
    }

    fn set_preferred_quality(&mut self, quality: Option<QualityLabel>) -> Result<()> {
        self.config.preferred_quality = quality;
        self.config.save_to(&self.path)
    }
}
