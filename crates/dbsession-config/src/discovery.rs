//! Config file discovery.
//!
//! Resolution order:
//! 1. An explicit path (e.g. `--config` on the command line)
//! 2. `$DBSESSION_CONFIG_DIR/config.toml`
//! 3. `~/.config/dbsession/config.toml` (platform config dir)
//!
//! A missing file is not an error; defaults are used instead.

use std::path::{Path, PathBuf};

use crate::{ConfigError, DbSessionConfig, Result};

/// Default config filename within the config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for platform directory resolution.
const APP_NAME: &str = "dbsession";

/// Environment variable to override the config directory.
///
/// When set, this takes precedence over the platform default.
/// Useful for testing and running multiple instances with different configs.
const CONFIG_DIR_ENV: &str = "DBSESSION_CONFIG_DIR";

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The loaded (or default) configuration.
    pub config: DbSessionConfig,
    /// The file the configuration came from, if one was found.
    pub source: Option<PathBuf>,
}

/// Load configuration, from `path` if given, otherwise from the config directory.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = path {
        // An explicitly named file must exist.
        let config = load_config_file(path)?;
        return Ok(LoadedConfig {
            config,
            source: Some(path.to_path_buf()),
        });
    }

    match config_path() {
        Some(path) if path.is_file() => Ok(LoadedConfig {
            config: load_config_file(&path)?,
            source: Some(path),
        }),
        _ => Ok(LoadedConfig {
            config: DbSessionConfig::default(),
            source: None,
        }),
    }
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<DbSessionConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    DbSessionConfig::from_toml(&contents)
}

/// Save configuration to a file.
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &DbSessionConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_toml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Path of the discovered config file (which may not exist).
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// The config directory for dbsession.
///
/// Checks `DBSESSION_CONFIG_DIR` first, then falls back to the platform default.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// The platform data directory for dbsession (default database location).
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_NAME))
}
