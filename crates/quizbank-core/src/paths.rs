//! Filesystem locations

use std::path::PathBuf;

use crate::constants;

/// Base directory for quizbank config and data (`~/.quizbank`)
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(constants::fs::CONFIG_DIR_NAME)
}

/// Directory holding the bank database
pub fn data_dir() -> PathBuf {
    config_dir().join("data")
}

/// Default location of `config.toml`
pub fn default_config_path() -> PathBuf {
    config_dir().join(constants::fs::CONFIG_FILE_NAME)
}

/// Default location of the bank database
pub fn default_database_path() -> PathBuf {
    data_dir().join(constants::bank::DATABASE_FILE_NAME)
}
