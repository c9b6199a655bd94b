//! Configuration loading and management
//!
//! Handles parsing of `.trek.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::{MAX_PRIORITY, DEFAULT_PRIORITY};

/// Name of the configuration file at the store root
pub const CONFIG_FILE: &str = ".trek.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Identifier generation
    #[serde(default)]
    pub ids: IdsConfig,

    /// Task defaults
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Change feed configuration
    #[serde(default)]
    pub events: EventsConfig,
}

/// Identifier prefixes and suffix length
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdsConfig {
    #[serde(default = "default_task_prefix")]
    pub task_prefix: String,

    #[serde(default = "default_epic_prefix")]
    pub epic_prefix: String,

    #[serde(default = "default_comment_prefix")]
    pub comment_prefix: String,

    /// Length of the random suffix after the prefix
    #[serde(default = "default_suffix_len")]
    pub suffix_len: usize,
}

fn default_task_prefix() -> String {
    "TREK".to_string()
}

fn default_epic_prefix() -> String {
    "EPIC".to_string()
}

fn default_comment_prefix() -> String {
    "CMT".to_string()
}

fn default_suffix_len() -> usize {
    8
}

impl Default for IdsConfig {
    fn default() -> Self {
        Self {
            task_prefix: default_task_prefix(),
            epic_prefix: default_epic_prefix(),
            comment_prefix: default_comment_prefix(),
            suffix_len: default_suffix_len(),
        }
    }
}

/// Task-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Priority assigned when none is given (0 = highest)
    #[serde(default = "default_priority")]
    pub default_priority: u8,
}

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_priority: default_priority(),
        }
    }
}

/// Change feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Polling cadence of the change publisher
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl EventsConfig {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Load configuration from a `.trek.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.trek.toml` if present, falling back to defaults when it is
    /// missing or invalid
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.ids.validate()?;
        if self.tasks.default_priority > MAX_PRIORITY {
            return Err(crate::error::Error::InvalidConfig(format!(
                "tasks.default_priority must be <= {MAX_PRIORITY}"
            )));
        }
        if self.events.poll_interval_ms == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "events.poll_interval_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl IdsConfig {
    fn validate(&self) -> crate::error::Result<()> {
        for (field, prefix) in [
            ("ids.task_prefix", &self.task_prefix),
            ("ids.epic_prefix", &self.epic_prefix),
            ("ids.comment_prefix", &self.comment_prefix),
        ] {
            let prefix = prefix.trim();
            if prefix.is_empty() {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "{field} cannot be empty"
                )));
            }
            if !prefix.chars().all(|ch| ch.is_ascii_alphanumeric()) {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "{field} must be alphanumeric"
                )));
            }
        }

        let mut prefixes = std::collections::HashSet::new();
        for prefix in [&self.task_prefix, &self.epic_prefix, &self.comment_prefix] {
            if !prefixes.insert(prefix.trim().to_ascii_uppercase()) {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "ids prefix '{}' is used twice",
                    prefix.trim()
                )));
            }
        }

        if self.suffix_len < 4 {
            return Err(crate::error::Error::InvalidConfig(
                "ids.suffix_len must be >= 4".to_string(),
            ));
        }
        if self.suffix_len > 16 {
            return Err(crate::error::Error::InvalidConfig(
                "ids.suffix_len must be <= 16".to_string(),
            ));
        }
        Ok(())
    }
}
