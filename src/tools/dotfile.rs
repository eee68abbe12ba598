use std::io::Write;

use crate::config_file::Config;
use crate::executor::Cmd;

use super::{ToolError, fs, git, vscode};

fn github_username(config: &Config) -> Result<&str, ToolError> {
    config
        .github_username
        .as_deref()
        .ok_or(ToolError::MissingConfig("github_username"))
}

/// Update the dotfiles checkout and apply it to this machine.
///
/// # Errors
///
/// Returns the first step that fails.
pub fn pull(config: &Config) -> Result<(), ToolError> {
    git::clone_if_missing(&config.repos_path, github_username(config)?, &config.dotfiles_repo)?;
    Cmd::build("git pull", &[])
        .in_dir(config.dotfiles_path())
        .run()?;
    fs::copy_file(&config.dotfiles_vscode_settings(), &config.vscode_user_settings)?;
    vscode::pull_extensions(&config.dotfiles_vscode_extensions())
}

/// Capture this machine's settings into the dotfiles checkout and push them.
///
/// # Errors
///
/// Returns the first step that fails.
pub fn push(config: &Config) -> Result<(), ToolError> {
    git::clone_if_missing(&config.repos_path, github_username(config)?, &config.dotfiles_repo)?;
    fs::copy_file(&config.vscode_user_settings, &config.dotfiles_vscode_settings())?;
    vscode::push_extensions(&config.dotfiles_vscode_extensions())?;
    git::save(Some(&config.dotfiles_path()), "dot files push")
}

/// Print where each managed dotfile lives.
pub fn list<W: Write>(config: &Config, out: &mut W) {
    let _ = writeln!(
        out,
        "vscode settings: {} <- {}",
        config.vscode_user_settings.display(),
        config.dotfiles_vscode_settings().display()
    );
    let _ = writeln!(
        out,
        "vscode extensions: {}",
        config.dotfiles_vscode_extensions().display()
    );
}
