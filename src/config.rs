//! Optional TOML configuration for storage and telemetry paths.
//!
//! Configuration is entirely optional: with no file present the defaults
//! below apply, and a partial file only overrides the sections it names.
//! Path precedence for the CLI is flag, then config file, then default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Config file looked up in the working directory when no explicit path
/// is given.
pub const DEFAULT_CONFIG_PATH: &str = "clawguard.toml";

/// Default location of the persisted mode record.
pub const DEFAULT_MODE_STATE_PATH: &str = ".runs/runtime_mode.json";

/// Default location of the telemetry trail.
pub const DEFAULT_TELEMETRY_PATH: &str = "logs/escalation_telemetry.jsonl";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub mode_state_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode_state_path: PathBuf::from(DEFAULT_MODE_STATE_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(DEFAULT_TELEMETRY_PATH),
        }
    }
}

impl RouterConfig {
    /// Loads configuration. An explicit path must exist and parse; without
    /// one, [`DEFAULT_CONFIG_PATH`] is used when present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_PATH);
                if fallback.exists() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
