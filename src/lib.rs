//! Core implementation of the toolbelt command router
//!
//! Toolbelt maps a short path of words (`git save "msg"`, `dot pull`) onto
//! handlers that drive external programs. The tree of commands is built from a
//! [`Config`](config_file::Config) and dispatched by a [`Router`](router::Router);
//! every process goes through the [`executor`], which traces and checks it.

use std::path::{Path, PathBuf};

use log::debug;

use crate::config_file::{Config, ConfigError, ConfigFile};

pub mod config_file;
pub mod executor;
pub mod logger;
pub mod router;
pub mod tools;
pub mod tree;

/// Load configuration from a file (or auto-detect one), falling back to defaults.
///
/// # Errors
///
/// Returns `ConfigError` if an explicit file does not exist, a file cannot be
/// parsed, the home directory is unknown, or the values fail validation.
pub fn load_config(config_file: Option<&str>) -> Result<Config, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::UnknownHomeDirectory)?;
    let config_dir = dirs::config_dir();
    load_config_from(config_file, &home, config_dir.as_deref())
}

/// [`load_config`] with explicit home and config directories.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_from(
    config_file: Option<&str>,
    home: &Path,
    config_dir: Option<&Path>,
) -> Result<Config, ConfigError> {
    let config_path = match config_file {
        Some(file) => {
            let config_path = PathBuf::from(file);
            if !config_path.exists() {
                return Err(ConfigError::ConfigNotFound(config_path));
            }
            Some(config_path)
        }
        None => config_dir.and_then(ConfigFile::find_in),
    };

    let file = match config_path {
        Some(path) => {
            debug!("Loading config file: {}", path.display());
            ConfigFile::from_file(&path)?
        }
        None => {
            debug!("No config file found, using defaults");
            ConfigFile::default()
        }
    };
    Config::resolve(file, home)
}
