//! Local widget settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stagepanel_common::SettingsStore;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stagepanel")
    }

    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".stagepanel")
    }
}

/// Get the settings file path
pub fn settings_file() -> PathBuf {
    config_dir().join("settings.yml")
}

/// Widget settings, stored as a flat YAML mapping of strings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Load settings from the default file
    pub fn load() -> Result<Self> {
        Self::load_from(&settings_file())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read settings file")?;
        let settings: Settings =
            serde_yaml::from_str(&content).context("Failed to parse settings file")?;

        Ok(settings)
    }

    /// Save settings to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&settings_file())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }
        let content = serde_yaml::to_string(self).context("Failed to serialize settings")?;
        fs::write(path, content).context("Failed to write settings file")?;
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn all(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

impl SettingsStore for Settings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
