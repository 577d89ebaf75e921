//! Filesystem locations

use std::path::PathBuf;

use crate::constants;

/// Root config directory (`~/.chatbridge`)
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(constants::ui::CONFIG_DIR_NAME)
}

/// Persisted user configuration file, honouring `CHATBRIDGE_CONFIG`
pub fn config_file() -> PathBuf {
    match std::env::var_os(constants::ui::CONFIG_ENV_VAR) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => config_dir().join("config.json"),
    }
}

/// Log directory
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}
