//! Configuration system: TOML file + env var overrides + defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{FleetError, Result};
use crate::core::paths;

/// Full fleetdesk configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub list: ListConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// List screen defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListConfig {
    /// Rows per page when a list screen opens.
    pub default_page_size: usize,
    /// Page sizes offered in the page-size selector.
    pub page_size_options: Vec<usize>,
    /// Default sort on the creation timestamp is newest first.
    pub default_sort_descending: bool,
}

/// Activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub jsonl_path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
    pub fsync_interval_secs: u64,
    pub channel_capacity: usize,
}

/// Filesystem paths used by fleetdesk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            page_size_options: vec![5, 10, 25, 50],
            default_sort_descending: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            jsonl_path: paths::data_dir().join("activity.jsonl"),
            fallback_path: Some(env::temp_dir().join("fleetdesk-activity.jsonl")),
            max_size_bytes: 20 * 1024 * 1024,
            max_rotated_files: 5,
            fsync_interval_secs: 10,
            channel_capacity: 1024,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: paths::config_dir().join("config.toml"),
            data_dir: paths::data_dir(),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| FleetError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(FleetError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for the activity log.
    ///
    /// FNV-1a over canonical JSON so the value is stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("FLEET_LIST_DEFAULT_PAGE_SIZE") {
            self.list.default_page_size = parse_env("FLEET_LIST_DEFAULT_PAGE_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("FLEET_LIST_PAGE_SIZE_OPTIONS") {
            self.list.page_size_options = raw
                .split(',')
                .map(|part| parse_env("FLEET_LIST_PAGE_SIZE_OPTIONS", part.trim()))
                .collect::<Result<Vec<usize>>>()?;
        }
        if let Some(raw) = lookup("FLEET_LIST_DEFAULT_SORT_DESCENDING") {
            self.list.default_sort_descending =
                parse_env("FLEET_LIST_DEFAULT_SORT_DESCENDING", &raw)?;
        }

        if let Some(raw) = lookup("FLEET_LOGGING_ENABLED") {
            self.logging.enabled = parse_env("FLEET_LOGGING_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("FLEET_LOGGING_JSONL_PATH") {
            self.logging.jsonl_path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("FLEET_LOGGING_MAX_SIZE_BYTES") {
            self.logging.max_size_bytes = parse_env("FLEET_LOGGING_MAX_SIZE_BYTES", &raw)?;
        }
        if let Some(raw) = lookup("FLEET_LOGGING_MAX_ROTATED_FILES") {
            self.logging.max_rotated_files = parse_env("FLEET_LOGGING_MAX_ROTATED_FILES", &raw)?;
        }

        Ok(())
    }

    /// Sort and deduplicate page-size options.
    fn normalize(&mut self) {
        self.list.page_size_options.sort_unstable();
        self.list.page_size_options.dedup();
    }

    fn validate(&self) -> Result<()> {
        if self.list.default_page_size == 0 {
            return Err(FleetError::InvalidConfig {
                details: "list.default_page_size must be >= 1".to_string(),
            });
        }
        if self.list.page_size_options.is_empty() {
            return Err(FleetError::InvalidConfig {
                details: "list.page_size_options must not be empty".to_string(),
            });
        }
        if self.list.page_size_options.contains(&0) {
            return Err(FleetError::InvalidConfig {
                details: "list.page_size_options entries must be >= 1".to_string(),
            });
        }
        if !self
            .list
            .page_size_options
            .contains(&self.list.default_page_size)
        {
            return Err(FleetError::InvalidConfig {
                details: format!(
                    "list.default_page_size ({}) must be one of list.page_size_options {:?}",
                    self.list.default_page_size, self.list.page_size_options
                ),
            });
        }

        if self.logging.max_size_bytes == 0 || self.logging.channel_capacity == 0 {
            return Err(FleetError::InvalidConfig {
                details: "logging.max_size_bytes and logging.channel_capacity must be > 0"
                    .to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|error| FleetError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
