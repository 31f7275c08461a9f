use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "RIIVO_DATA_DIR";
pub const LOG_FILTER_ENV: &str = "RIIVO_LOG";

pub const PRESETS_FILE: &str = "presets.json";
pub const GAMEDIRS_FILE: &str = "gamedirs.json";
pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CoreConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    pub filter: Option<String>,
}

/// Global settings persisted next to the preset and directory collections.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct GlobalSettings {
    #[serde(default)]
    pub emulator_binary_path: String,
}

impl CoreConfig {
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            storage: StorageConfig {
                data_dir: non_empty(DATA_DIR_ENV).map(PathBuf::from),
            },
            logging: LoggingConfig {
                filter: non_empty(LOG_FILTER_ENV),
            },
        }
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage.data_dir = Some(dir.into());
        self
    }

    /// Explicit directory first, then the platform data directory, then `.`.
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .or_else(default_data_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn presets_path(&self) -> PathBuf {
        self.data_dir().join(PRESETS_FILE)
    }

    pub fn gamedirs_path(&self) -> PathBuf {
        self.data_dir().join(GAMEDIRS_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir().join(SETTINGS_FILE)
    }
}

pub fn default_data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "riivo", "riivo")
        .map(|dirs| dirs.data_dir().to_path_buf())
}
