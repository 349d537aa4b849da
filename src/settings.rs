use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::transition::TRANSITION_DURATION;
use crate::viewport::DEFAULT_NARROW_COLUMNS;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
pub const APP_NAME: &str = "pagebook";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Voice the narrator asks the speech engine for.
    #[serde(default = "default_voice")]
    pub narration_voice: String,

    /// Program (and arguments) used to speak a page; empty disables narration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub narration_command: Vec<String>,

    /// Voices the narration command provides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub narration_voices: Vec<String>,

    /// Overrides the share URL from the book file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,

    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,

    #[serde(default = "default_narrow_columns")]
    pub narrow_columns: u16,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_voice() -> String {
    "Hebrew Female".to_string()
}

fn default_transition_ms() -> u64 {
    TRANSITION_DURATION.as_millis() as u64
}

fn default_narrow_columns() -> u16 {
    DEFAULT_NARROW_COLUMNS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            narration_voice: default_voice(),
            narration_command: Vec::new(),
            narration_voices: Vec::new(),
            share_url: None,
            transition_ms: default_transition_ms(),
            narrow_columns: default_narrow_columns(),
        }
    }
}

impl Settings {
    pub fn transition_duration(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    /// Load from the default location, writing a default file on first run.
    pub fn load_default() -> Self {
        let Some(path) = default_config_path() else {
            warn!("Could not determine config directory, using default settings");
            return Self::default();
        };
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            info!("Settings file not found, creating with defaults at {path:?}");
            let settings = Self::default();
            settings.save_to_path(&path);
            settings
        }
    }

    /// Read settings from `path`. Unreadable files fall back to defaults.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
                Ok(mut settings) => {
                    debug!("Loaded settings from {path:?}");
                    if settings.version < CURRENT_VERSION {
                        migrate_settings(&mut settings);
                        settings.save_to_path(path);
                    }
                    settings
                }
                Err(e) => {
                    error!("Failed to parse settings file {path:?}: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                error!("Failed to read settings file {path:?}: {e}");
                Self::default()
            }
        }
    }

    pub fn save_to_path(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    error!("Failed to create config directory {parent:?}: {e}");
                    return;
                }
            }
        }

        let content = match serde_yaml::to_string(self) {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to serialize settings: {e}");
                return;
            }
        };

        match fs::write(path, content) {
            Ok(()) => debug!("Saved settings to {path:?}"),
            Err(e) => error!("Failed to save settings to {path:?}: {e}"),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: Settings = serde_yaml::from_str("narration_voice: \"he\"\n").unwrap();
        assert_eq!(settings.narration_voice, "he");
        assert_eq!(settings.transition_ms, 300);
        assert_eq!(settings.narrow_columns, DEFAULT_NARROW_COLUMNS);
        assert!(settings.narration_command.is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pagebook").join("config.yaml");

        let settings = Settings {
            narration_command: vec!["espeak-ng".into(), "-v".into(), "{voice}".into()],
            narration_voices: vec!["he".into()],
            narration_voice: "he".into(),
            transition_ms: 120,
            ..Settings::default()
        };
        settings.save_to_path(&path);

        assert_eq!(Settings::load_from_path(&path), settings);
    }

    #[test]
    fn old_version_is_migrated_and_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 0\ntransition_ms: 10\n").unwrap();

        let settings = Settings::load_from_path(&path);
        assert_eq!(settings.version, CURRENT_VERSION);
        assert_eq!(settings.transition_ms, 10);
        assert!(fs::read_to_string(&path).unwrap().contains("version: 1"));
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "transition_ms: [").unwrap();
        assert_eq!(Settings::load_from_path(&path), Settings::default());
    }
}
