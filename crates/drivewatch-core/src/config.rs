/// Runtime configuration.
///
/// The CLI takes no flags. Settings come from the JSON file named by
/// `DRIVEWATCH_CONFIG` when that variable is set; every field is optional
/// and falls back to its default.
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV_VAR: &str = "DRIVEWATCH_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Time between two enumerations.
    pub poll_interval_ms: u64,
    /// Upper bound on a single disk-usage query.
    pub probe_timeout_ms: u64,
    /// Probe threads allowed to be stuck in the OS at once.
    pub max_inflight_probes: usize,
    /// Directories under which removable media get mounted (Unix only).
    pub mount_roots: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            probe_timeout_ms: 2_500,
            max_inflight_probes: 4,
            mount_roots: vec![
                PathBuf::from("/media"),
                PathBuf::from("/run/media"),
                PathBuf::from("/mnt"),
            ],
        }
    }
}

impl Config {
    /// Load from `$DRIVEWATCH_CONFIG` if set, defaults otherwise.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be > 0".into()));
        }
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::Invalid("probe_timeout_ms must be > 0".into()));
        }
        if self.max_inflight_probes == 0 {
            return Err(ConfigError::Invalid("max_inflight_probes must be >= 1".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
