//! Application settings loading from config.toml
//!
//! The file is optional. It can tune the draft idle timeout and replace the built-in
//! map rotation:
//!
//! ```toml
//! [lfg]
//! draft_ttl_minutes = 30
//!
//! [[rotation]]
//! map = "Zero Dam"
//! difficulty = "Easy"
//! permanent = true
//!
//! [[rotation]]
//! map = "Brakkesh"
//! difficulty = "Normal"
//! hours = [22, 23, 0, 1]
//! ```

use crate::core::rotation::{RotationEntry, RotationTable};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

const DEFAULT_DRAFT_TTL_MINUTES: u64 = 30;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// LFG tuning
    #[serde(default)]
    pub lfg: LfgSettings,
    /// Rotation table rows; empty means use the built-in table
    #[serde(default)]
    pub rotation: Vec<RotationEntry>,
}

/// The `[lfg]` table
#[derive(Debug, Deserialize)]
pub struct LfgSettings {
    /// Minutes a draft may sit idle before it is swept; 0 disables sweeping
    #[serde(default = "default_draft_ttl")]
    pub draft_ttl_minutes: u64,
}

const fn default_draft_ttl() -> u64 {
    DEFAULT_DRAFT_TTL_MINUTES
}

impl Default for LfgSettings {
    fn default() -> Self {
        Self {
            draft_ttl_minutes: DEFAULT_DRAFT_TTL_MINUTES,
        }
    }
}

impl Settings {
    /// The rotation table these settings describe.
    #[must_use]
    pub fn rotation_table(&self) -> RotationTable {
        if self.rotation.is_empty() {
            RotationTable::builtin()
        } else {
            RotationTable::new(self.rotation.clone())
        }
    }

    fn validate(self) -> Result<Self> {
        for entry in &self.rotation {
            if let Some(hour) = entry.hours.iter().find(|hour| **hour > 23) {
                return Err(Error::Config {
                    message: format!(
                        "Rotation hour {hour} for {:?} {:?} is outside 0-23",
                        entry.map, entry.difficulty
                    ),
                });
            }
        }
        Ok(self)
    }
}

/// Parses settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str::<Settings>(contents)
        .map_err(|e| Error::Config {
            message: format!("Failed to parse config.toml: {e}"),
        })?
        .validate()
}

/// Loads settings from a TOML file, falling back to defaults if it does not exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be read, is not valid TOML, or
/// contains an out-of-range rotation hour.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No config file at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_settings(&contents)
}

/// Loads settings from `LFG_CONFIG_PATH`, or ./config.toml when unset.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var("LFG_CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_settings(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{Difficulty, GameMap};

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
            [lfg]
            draft_ttl_minutes = 10

            [[rotation]]
            map = "Zero Dam"
            difficulty = "Easy"
            permanent = true

            [[rotation]]
            map = "Brakkesh"
            difficulty = "Normal"
            hours = [23, 0]
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.lfg.draft_ttl_minutes, 10);
        assert_eq!(settings.rotation.len(), 2);

        let table = settings.rotation_table();
        assert!(table.is_available(GameMap::ZeroDam, Difficulty::Easy, 12));
        assert!(table.is_available(GameMap::Brakkesh, Difficulty::Normal, 0));
        assert!(!table.is_available(GameMap::Brakkesh, Difficulty::Normal, 1));
        // Rows not listed are gone
        assert!(!table.is_available(GameMap::ZeroDam, Difficulty::Normal, 12));
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings.lfg.draft_ttl_minutes, 30);
        assert_eq!(settings.rotation_table(), RotationTable::builtin());
    }

    #[test]
    fn test_out_of_range_hour_rejected() {
        let toml_str = r#"
            [[rotation]]
            map = "Space City"
            difficulty = "Easy"
            hours = [24]
        "#;
        assert!(matches!(parse_settings(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_unknown_map_rejected() {
        let toml_str = r#"
            [[rotation]]
            map = "Moon Base"
            difficulty = "Easy"
            permanent = true
        "#;
        assert!(matches!(parse_settings(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = load_settings("definitely/not/here/config.toml").unwrap();
        assert_eq!(settings.lfg.draft_ttl_minutes, 30);
        assert!(settings.rotation.is_empty());
    }
}
