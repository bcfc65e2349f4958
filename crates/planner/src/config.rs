/// Service configuration loaded from a JSON file
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::schedule::{BuildOptions, DEFAULT_PRIORITY_SUBJECTS};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "PLANNER_CONFIG";

/// Config file used when the environment variable is unset
pub const DEFAULT_CONFIG_PATH: &str = "planner.json";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value: {message}")]
    Invalid { message: String },
}

/// Top-level planner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub address: String,
    pub port: u16,
    /// Base URL of the open-sections service
    pub open_sections_url: String,
    /// Base URL of the professor rating service, if any
    pub rating_url: Option<String>,
    pub priority_subjects: Vec<String>,
    /// Used when a request does not state `preferredUnits`
    pub default_preferred_units: u32,
    pub session_ttl_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
            open_sections_url: "http://127.0.0.1:8000/open".to_string(),
            rating_url: None,
            priority_subjects: DEFAULT_PRIORITY_SUBJECTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_preferred_units: 15,
            session_ttl_secs: 60 * 60,
            request_timeout_secs: 15,
        }
    }
}

impl PlannerConfig {
    /// Loads the config from a JSON file.
    ///
    /// # Arguments
    /// * `path` - Path to the config file
    ///
    /// # Returns
    /// * `Ok(PlannerConfig)` - Loaded configuration; omitted keys take defaults
    /// * `Err` - If the file can't be read or parsed, or a value is invalid
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config: PlannerConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Loads the file named by `PLANNER_CONFIG` (or `planner.json`).
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is an
    /// error.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let path = Path::new(&path);

        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.open_sections_url).map_err(|e| ConfigError::Invalid {
            message: format!("open_sections_url: {}", e),
        })?;

        if let Some(rating_url) = &self.rating_url {
            url::Url::parse(rating_url).map_err(|e| ConfigError::Invalid {
                message: format!("rating_url: {}", e),
            })?;
        }

        if self.session_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "session_ttl_secs must be positive".to_string(),
            });
        }

        Ok(())
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions::with_priority_subjects(&self.priority_subjects)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}
