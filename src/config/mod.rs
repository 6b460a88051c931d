mod error;
mod load;
mod paths;
mod settings;

pub use error::ConfigError;
pub use load::{load_global_settings, load_settings_from};
pub use paths::{
    default_global_config_path, default_state_root, log_path, GLOBAL_SETTINGS_FILE_NAME,
    GLOBAL_STATE_DIR, LOG_FILE_REL_PATH,
};
pub use settings::Settings;
