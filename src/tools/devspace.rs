use std::io;
use std::path::Path;

use log::debug;

use crate::config_file::Config;
use crate::executor::{self, Cmd};

use super::ToolError;

/// Remove local devspace state at `path`, whether it is a file or a directory.
fn remove_state(path: &Path) -> Result<(), ToolError> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path).map_err(ToolError::io(path)),
        Ok(_) => std::fs::remove_file(path).map_err(ToolError::io(path)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No devspace state at {}", path.display());
            Ok(())
        }
        Err(e) => Err(ToolError::io(path)(e)),
    }
}

/// Throw away the dev environment and point devspace back at our namespace.
///
/// # Errors
///
/// Returns `ToolError::MissingConfig` without a configured namespace, otherwise
/// the first step that fails.
pub fn reset(config: &Config) -> Result<(), ToolError> {
    let namespace = config
        .devspace_namespace
        .as_deref()
        .ok_or(ToolError::MissingConfig("devspace_namespace"))?;
    remove_state(&config.home.join(".devspace"))?;
    executor::run_sequential([
        Cmd::build("fsh dev destroy %v", &[namespace]),
        Cmd::build("devspace use namespace %v", &[namespace]),
    ])?;
    Ok(())
}
