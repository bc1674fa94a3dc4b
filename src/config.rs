//! Persistent configuration
//!
//! Stored as TOML at `~/.config/pacestream/config.toml`. Every field is
//! optional; missing or unreadable config falls back to defaults so a
//! fresh install works with zero setup.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_PORT: u16 = 7000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// TorBox API key enabling the debrid tier for every request
    pub torbox_api_key: Option<String>,
    /// Directory holding the catalog/meta/stream JSON files
    pub data_dir: Option<PathBuf>,
    pub port: Option<u16>,
    /// ISO-639 subtitle language codes; empty means all languages
    #[serde(default)]
    pub subtitle_languages: Vec<String>,
}

impl Config {
    /// Path to the config file (~/.config/pacestream/config.toml)
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("could not determine config directory")?;
        Ok(base.join("pacestream").join("config.toml"))
    }

    /// Load from disk, falling back to defaults if absent or unreadable
    pub fn load() -> Self {
        let Ok(path) = Self::path() else {
            return Self::default();
        };
        match fs::read_to_string(&path) {
            Ok(raw) => toml::from_str(&raw).unwrap_or_else(|e| {
                debug!(path = %path.display(), error = %e, "config parse failed, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist to disk, creating the parent directory as needed
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(&path, raw).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Effective API key: the TORBOX_API_KEY environment variable wins over
    /// the stored one.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var("TORBOX_API_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.torbox_api_key.clone())
    }

    pub fn resolve_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }
}
