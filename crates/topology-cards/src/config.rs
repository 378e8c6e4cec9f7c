//! Host configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use topology_client::{ClientConfig, JsonFileStorage};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backends: ClientConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// Preference file; defaults to the platform's local data directory
    #[serde(default = "default_preferences_path")]
    pub path: Option<PathBuf>,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}

fn default_preferences_path() -> Option<PathBuf> {
    JsonFileStorage::default_path()
}

impl Config {
    /// Read `path` if it exists, otherwise fall back to defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }
}
