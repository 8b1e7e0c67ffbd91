//! User settings loaded from `config.toml`
//!
//! ```toml
//! first_weekday = "Mon"
//! up_next_days = 7
//! data_dir = "/home/me/plants"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recurrence::CalendarContext;

/// Settings file name inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not write config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

fn default_first_weekday() -> Weekday {
    Weekday::Sun
}

fn default_up_next_days() -> u32 {
    7
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Weekday with ordinal 1 in weekly rules
    #[serde(default = "default_first_weekday")]
    pub first_weekday: Weekday,
    /// How many days ahead the Up Next list looks
    #[serde(default = "default_up_next_days")]
    pub up_next_days: u32,
    /// Overrides the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            first_weekday: default_first_weekday(),
            up_next_days: default_up_next_days(),
            data_dir: None,
        }
    }
}

impl Settings {
    /// Load settings; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Calendar conventions for date computations
    pub fn calendar(&self) -> CalendarContext {
        CalendarContext::new(self.first_weekday)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::load(&temp.path().join(CONFIG_FILE)).unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.calendar(), CalendarContext::default());
    }

    #[test]
    fn test_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "first_weekday = \"Mon\"\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.first_weekday, Weekday::Mon);
        assert_eq!(settings.up_next_days, 7);
        assert_eq!(settings.calendar().ordinal_of(Weekday::Mon), 1);
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        let settings = Settings {
            first_weekday: Weekday::Sat,
            up_next_days: 14,
            data_dir: Some(temp.path().join("plants")),
        };

        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_invalid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "up_next_days = \"soon\"\n").unwrap();

        assert!(matches!(Settings::load(&path), Err(ConfigError::Parse(_))));
    }
}
