use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{client::openweather::DEFAULT_ENDPOINT, sync::StalePolicy};

/// Shared namespace used by both the app and the widget.
pub const DEFAULT_APP_GROUP: &str = "group.com.weatherwidget.app";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_url = "https://api.openweathermap.org/data/2.5/weather"
/// api_key = "..."
/// app_group = "group.com.weatherwidget.app"
/// stale_policy = "publish-last"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub api_key: Option<String>,
    pub app_group: String,
    pub stale_policy: StalePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            app_group: DEFAULT_APP_GROUP.to_string(),
            stale_policy: StalePolicy::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory backing the shared store for this config's app group.
    pub fn shared_store_dir(&self) -> Result<PathBuf> {
        let group = self.app_group.as_str();
        if group.is_empty() || group == "." || group == ".." || group.contains(['/', '\\']) {
            return Err(anyhow!("Invalid app group '{}'", self.app_group));
        }

        Ok(project_dirs()?.data_dir().join(&self.app_group))
    }

    /// API key, or an error telling the user how to set one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `weather-sync configure` and enter your API key."
            )
        })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weather-widget", "weather-sync")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
