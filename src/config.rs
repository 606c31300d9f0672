use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default)]
    pub theme: Theme,

    #[serde(default = "default_auto_save")]
    pub auto_save: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("qr-scout");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("history.db").to_string_lossy().to_string()
}

fn default_auto_save() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            theme: Theme::default(),
            auto_save: default_auto_save(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(Self::parse(&content))
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// A corrupt config file falls back to defaults instead of failing startup.
    fn parse(content: &str) -> Self {
        match toml::from_str(content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Invalid config file, using defaults: {}", e);
                Config::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("qr-scout")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.theme, Theme::Dark);
        assert!(config.auto_save);
    }

    #[test]
    fn partial_config_fills_missing_fields() {
        let config = Config::parse("theme = \"light\"\n");
        assert_eq!(config.theme, Theme::Light);
        assert!(config.auto_save);
        assert!(!config.db_path.is_empty());
    }

    #[test]
    fn corrupt_config_falls_back_to_defaults() {
        let config = Config::parse("theme = [this is not toml");
        assert_eq!(config.theme, Theme::Dark);
        assert!(config.auto_save);
    }

    #[test]
    fn theme_toggles() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }
}
