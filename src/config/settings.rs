use super::ConfigError;
use crate::provider::{Backend, RunnerBinaries, DEFAULT_RUN_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub default_cli: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub binaries: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub log_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_cli: None,
            timeout_secs: default_timeout_secs(),
            binaries: BTreeMap::new(),
            log_enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_RUN_TIMEOUT.as_secs()
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw, path)
    }

    pub fn from_yaml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        // An empty file deserializes to null rather than an empty mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Settings(
                "`timeout_secs` must be greater than zero".to_string(),
            ));
        }
        if let Some(name) = &self.default_cli {
            Backend::try_from(name.as_str())
                .map_err(|err| ConfigError::Settings(format!("`default_cli`: {err}")))?;
        }
        for (name, binary) in &self.binaries {
            Backend::try_from(name.as_str())
                .map_err(|err| ConfigError::Settings(format!("`binaries`: {err}")))?;
            if binary.trim().is_empty() {
                return Err(ConfigError::Settings(format!(
                    "`binaries.{name}` must be non-empty"
                )));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Binary overrides keyed by backend. Call after [`Settings::validate`]; unknown
    /// names are skipped here.
    pub fn runner_binaries(&self) -> RunnerBinaries {
        let mut binaries = RunnerBinaries::default();
        for (name, binary) in &self.binaries {
            if let Ok(backend) = Backend::try_from(name.as_str()) {
                binaries.overrides.insert(backend, binary.trim().to_string());
            }
        }
        binaries
    }
}
