// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
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

//! Configuration file support.
//!
//! All settings have defaults, so a configuration file is optional. When one
//! is present it is TOML:
//!
//! ```toml
//! [watcher]
//! enabled = true
//! titles = ["Корневое хранилище сертификатов", "Root Certificate Store"]
//! poll_interval_ms = 400
//! focus_settle_ms = 100
//! accept_settle_ms = 300
//! block_input = true
//!
//! [logging]
//! level = "warn"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CertPurgeError, Result};
use crate::logging::LoggingConfig;

/// Caption of the root store confirmation dialog on Russian-language systems.
pub const PRIMARY_DIALOG_TITLE: &str = "Корневое хранилище сертификатов";

/// Caption of the root store confirmation dialog on English-language systems.
pub const FALLBACK_DIALOG_TITLE: &str = "Root Certificate Store";

/// Environment variable naming a configuration file.
pub const CONFIG_ENV_VAR: &str = "CERTPURGE_CONFIG";

/// Complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Dialog watcher settings.
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed, contains unknown keys or
    /// fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| CertPurgeError::config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would make the watcher misbehave.
    pub fn validate(&self) -> Result<()> {
        self.watcher.validate()
    }
}

/// Dialog watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WatcherConfig {
    /// Start the watcher at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Window titles to look for, tried in order.
    #[serde(default = "default_titles")]
    pub titles: Vec<String>,

    /// Delay between polls (milliseconds).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay after moving focus to the accept button (milliseconds).
    #[serde(default = "default_focus_settle_ms")]
    pub focus_settle_ms: u64,

    /// Delay after accepting the dialog (milliseconds).
    #[serde(default = "default_accept_settle_ms")]
    pub accept_settle_ms: u64,

    /// Block user keyboard and mouse input while the watcher runs.
    #[serde(default = "default_true")]
    pub block_input: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            titles: default_titles(),
            poll_interval_ms: default_poll_interval_ms(),
            focus_settle_ms: default_focus_settle_ms(),
            accept_settle_ms: default_accept_settle_ms(),
            block_input: true,
        }
    }
}

impl WatcherConfig {
    /// Delay between polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Delay between the focus and accept keystrokes.
    pub fn focus_settle(&self) -> Duration {
        Duration::from_millis(self.focus_settle_ms)
    }

    /// Delay after the accept keystroke.
    pub fn accept_settle(&self) -> Duration {
        Duration::from_millis(self.accept_settle_ms)
    }

    /// Validate the watcher settings.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(CertPurgeError::config(
                "watcher.poll_interval_ms must be greater than zero",
            ));
        }
        if self.enabled && self.titles.iter().all(|t| t.trim().is_empty()) {
            return Err(CertPurgeError::config(
                "watcher.titles must contain at least one non-empty title",
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_titles() -> Vec<String> {
    vec![
        PRIMARY_DIALOG_TITLE.to_string(),
        FALLBACK_DIALOG_TITLE.to_string(),
    ]
}

fn default_poll_interval_ms() -> u64 {
    400
}

fn default_focus_settle_ms() -> u64 {
    100
}

fn default_accept_settle_ms() -> u64 {
    300
}

/// Locates and loads the configuration file.
///
/// # Search Order
///
/// 1. Explicit path (if set via `with_path()`); must exist
/// 2. Environment variable `CERTPURGE_CONFIG`; must exist if set
/// 3. `certpurge.toml` next to the executable, if present
///
/// When nothing is found the defaults are used.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Explicit configuration file path.
    explicit_path: Option<PathBuf>,

    /// Environment variable name for config path override.
    env_var_name: String,

    /// Whether to look next to the executable.
    search_exe_dir: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings.
    pub fn new() -> Self {
        Self {
            explicit_path: None,
            env_var_name: CONFIG_ENV_VAR.to_string(),
            search_exe_dir: true,
        }
    }

    /// Set an explicit configuration file path.
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.explicit_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable name for path override.
    ///
    /// Default: `CERTPURGE_CONFIG`
    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var_name = name.into();
        self
    }

    /// Enable or disable the lookup next to the executable.
    ///
    /// Default: `true`
    pub fn with_exe_dir_search(mut self, enabled: bool) -> Self {
        self.search_exe_dir = enabled;
        self
    }

    /// Load the configuration, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly requested file is missing, or if the
    /// file found cannot be read, parsed or validated.
    pub fn load(&self) -> Result<Config> {
        match self.find_config_file()? {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    CertPurgeError::config(format!("Failed to read {}: {e}", path.display()))
                })?;
                Config::from_toml(&content)
            }
            None => Ok(Config::default()),
        }
    }

    /// Find the configuration file, if any.
    pub fn find_config_file(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.explicit_path {
            return require_exists(path.clone());
        }

        if let Some(value) = std::env::var_os(&self.env_var_name)
            && !value.is_empty()
        {
            return require_exists(PathBuf::from(value));
        }

        if self.search_exe_dir
            && let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            let candidate = dir.join("certpurge.toml");
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }
}

fn require_exists(path: PathBuf) -> Result<Option<PathBuf>> {
    if path.is_file() {
        Ok(Some(path))
    } else {
        Err(CertPurgeError::config(format!(
            "Configuration file not found: {}",
            path.display()
        )))
    }
}
