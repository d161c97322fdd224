// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runtime settings.
//!
//! Loaded from `config.toml` in the user config directory, or from the file
//! named by `AMBIENT_NODE_CONFIG`. Every field is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::bluetooth::SERVICE_NAME;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "AMBIENT_NODE_CONFIG";

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// "trace", "debug", "info", "warn" or "error". `RUST_LOG` takes precedence.
    pub level: String,
    pub show_target: bool,
    pub ansi_colors: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_target: false,
            ansi_colors: true,
        }
    }
}

/// Peripheral settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Local name to advertise.
    pub advertised_name: String,
    /// BlueZ adapter, e.g. `hci0`. Default adapter when unset.
    pub adapter: Option<String>,
    /// Pending notifications before new ones are dropped.
    pub notify_queue_capacity: usize,
    pub log: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            advertised_name: SERVICE_NAME.to_string(),
            adapter: None,
            notify_queue_capacity: 32,
            log: LogSettings::default(),
        }
    }
}

impl Settings {
    /// `<config dir>/ambient-node/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ambient-node").join("config.toml"))
    }

    /// Load from `AMBIENT_NODE_CONFIG`, else the default path.
    pub fn resolve() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV).map(PathBuf::from).or_else(Self::default_path) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file {:?} doesn't exist, using defaults", path);
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

        let settings: Settings =
            toml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))?;

        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let settings = Settings::load(&temp_dir.path().join("config.toml"))?;
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.advertised_name, "AmbientNode");
        assert_eq!(settings.notify_queue_capacity, 32);
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "adapter = \"hci1\"\n\n[log]\nlevel = \"debug\"\n")?;

        let settings = Settings::load(&path)?;

        assert_eq!(settings.adapter.as_deref(), Some("hci1"));
        assert_eq!(settings.log.level, "debug");
        assert!(settings.log.ansi_colors);
        assert_eq!(settings.advertised_name, "AmbientNode");
        Ok(())
    }

    #[test]
    fn test_invalid_file_is_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "notify_queue_capacity = \"lots\"")?;

        assert!(Settings::load(&path).is_err());
        Ok(())
    }
}
