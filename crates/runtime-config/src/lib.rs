//! Shared CLI/TUI configuration types.
//!
//! Both the `shelltrail` binary and the TUI read `shelltrail.toml` through
//! these types. Every field has a serde default so partial or older files
//! keep loading.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use shelltrail_core::filter::DisplayMode;
use shelltrail_core::period::Period;
use std::path::{Path, PathBuf};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "shelltrail.toml";

/// Default history database file name inside the data directory.
pub const DB_FILE_NAME: &str = "history.db";

/// Log file written while the TUI owns the terminal.
pub const LOG_FILE_NAME: &str = "shelltrail.log";

/// Top-level configuration (persisted as `shelltrail.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ShelltrailConfig {
    #[serde(default)]
    pub ui: UiSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiSettings {
    #[serde(default)]
    pub default_period: Period,
    #[serde(default)]
    pub default_display_mode: DisplayMode,
    /// Input poll interval of the event loop.
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            default_period: Period::Day,
            default_display_mode: DisplayMode::All,
            tick_rate_ms: default_tick_rate_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StorageSettings {
    /// Empty means `<data_dir>/history.db`.
    #[serde(default)]
    pub db_path: String,
}

fn default_tick_rate_ms() -> u64 {
    100
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "shelltrail")
}

pub fn config_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .context("Could not determine config directory")
}

pub fn data_dir() -> Result<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .context("Could not determine data directory")
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

impl ShelltrailConfig {
    /// Load from the default location, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        match config_path() {
            Ok(path) => Self::load_from(&path),
            Err(_) => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir for {}", path.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Resolved database path: explicit setting, else the data directory default.
    pub fn db_path(&self) -> Result<PathBuf> {
        if self.storage.db_path.trim().is_empty() {
            Ok(data_dir()?.join(DB_FILE_NAME))
        } else {
            Ok(PathBuf::from(self.storage.db_path.trim()))
        }
    }
}
