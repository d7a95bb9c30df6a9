//! Application settings persistence for Snipnotes.
//!
//! Stores the gateway choice and note defaults in a JSON file at an
//! OS-appropriate location. `SNIPNOTES_SETTINGS` overrides the path.

use crate::{CopyFailurePolicy, GatewayConfig, Language, Result, SnipnotesError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative settings file.
pub const SETTINGS_ENV: &str = "SNIPNOTES_SETTINGS";

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Where note rows live.
    pub gateway: GatewayConfig,
    /// Title given to notes created by "add".
    pub default_title: String,
    /// Language given to notes created by "add".
    pub default_language: Language,
    /// Appended to the title of a copied root.
    pub copy_suffix: String,
    pub copy_failure: CopyFailurePolicy,
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
    /// Rotating log files go here when set; otherwise logs go to stderr.
    pub log_directory: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::Sqlite {
                path: default_database_path(),
            },
            default_title: "New Note".to_string(),
            default_language: Language::default(),
            copy_suffix: " (Copy)".to_string(),
            copy_failure: CopyFailurePolicy::default(),
            log_level: "info".to_string(),
            log_directory: None,
        }
    }
}

impl Settings {
    /// Checks values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`SnipnotesError::Settings`] for an unknown log level or a
    /// blank default title.
    pub fn validate(&self) -> Result<()> {
        if !matches!(
            self.log_level.to_ascii_lowercase().as_str(),
            "error" | "warn" | "info" | "debug" | "trace" | "off"
        ) {
            return Err(SnipnotesError::Settings(format!(
                "unsupported log level `{}`",
                self.log_level
            )));
        }
        if self.default_title.trim().is_empty() {
            return Err(SnipnotesError::Settings(
                "default title must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns the path to the settings JSON file.
///
/// - `$SNIPNOTES_SETTINGS` when set
/// - macOS / Linux: `~/.config/snipnotes/settings.json`
/// - Windows: `%APPDATA%/Snipnotes/settings.json`
pub fn settings_file_path() -> PathBuf {
    if let Some(path) = std::env::var_os(SETTINGS_ENV) {
        return PathBuf::from(path);
    }
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("Snipnotes").join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("snipnotes").join("settings.json")
    }
}

/// Returns the default SQLite file: `<data dir>/snipnotes/notes.db`.
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share")
        })
        .join("snipnotes")
        .join("notes.db")
}

/// Loads settings from `path`; returns defaults if the file is missing or corrupt.
pub fn load_settings_from(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring corrupt settings file {}: {e}", path.display());
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

/// Writes settings as pretty JSON, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`SnipnotesError::Io`] if the directory or file cannot be written.
pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.default_title, "New Note");
        assert_eq!(settings.default_language, Language::Javascript);
        assert_eq!(settings.copy_suffix, " (Copy)");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("settings.json");
        let settings = Settings {
            default_language: Language::Bash,
            copy_failure: CopyFailurePolicy::Compensate,
            ..Settings::default()
        };

        save_settings_to(&settings, &path).unwrap();
        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn test_missing_or_corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(load_settings_from(&path), Settings::default());

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings_from(&path), Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"defaultTitle":"Snippet","logLevel":"debug"}"#).unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.default_title, "Snippet");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.copy_suffix, " (Copy)");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let settings = Settings {
            log_level: "loud".to_string(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(SnipnotesError::Settings(_))));

        let settings = Settings {
            default_title: "  ".to_string(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
