use crate::config::ConfigError;
use std::path::{Path, PathBuf};

pub const GLOBAL_STATE_DIR: &str = ".instassist";
pub const GLOBAL_SETTINGS_FILE_NAME: &str = "config.yaml";
pub const LOG_FILE_REL_PATH: &str = "logs/instassist.log";

pub fn default_state_root() -> Result<PathBuf, ConfigError> {
    let home = std::env::var_os("HOME").ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(PathBuf::from(home).join(GLOBAL_STATE_DIR))
}

pub fn default_global_config_path() -> Result<PathBuf, ConfigError> {
    Ok(default_state_root()?.join(GLOBAL_SETTINGS_FILE_NAME))
}

pub fn log_path(state_root: &Path) -> PathBuf {
    state_root.join(LOG_FILE_REL_PATH)
}
