use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::executor::{self, Cmd};

use super::ToolError;

const PRETTY_LOG_FORMAT: &str =
    "--pretty=format:%C(auto)%h %C(cyan)%ar %C(auto)%d %C(magenta)%an %C(auto)%s";

/// Stage everything, commit with `message` and push.
///
/// The message always travels as a single argument.
///
/// # Errors
///
/// Returns the first failing git command.
pub fn save(dir: Option<&Path>, message: &str) -> Result<(), ToolError> {
    executor::run_sequential([
        Cmd::build("git add -A", &[]).with_dir(dir),
        Cmd::from_tokens(["git", "commit", "-m", message]).with_dir(dir),
        Cmd::build("git push", &[]).with_dir(dir),
    ])?;
    Ok(())
}

/// Number of files listed by `git diff --numstat`
fn count_changed(numstat: &str) -> usize {
    numstat.lines().filter(|l| !l.trim().is_empty()).count()
}

/// Merge the latest `default_branch` into the current branch, keeping local changes.
///
/// # Errors
///
/// Returns the first failing git command.
pub fn sync(default_branch: &str) -> Result<(), ToolError> {
    Cmd::build("git add -A", &[]).run()?;
    let staged = count_changed(&Cmd::build("git diff --cached --numstat", &[]).run()?);
    debug!("{staged} staged file(s) before sync");

    executor::run_sequential([
        Cmd::build("git stash", &[]),
        Cmd::build("git checkout %v", &[default_branch]),
        Cmd::build("git pull", &[]),
        Cmd::build("git checkout -", &[]),
        Cmd::build("git merge %v", &[default_branch]),
    ])?;

    if staged > 0 {
        Cmd::build("git stash pop", &[]).run()?;
    }
    Ok(())
}

/// Directories directly under `repos_path`, sorted by name.
///
/// # Errors
///
/// Returns `ToolError::Io` if the directory can not be listed.
pub fn repo_dirs(repos_path: &Path) -> Result<Vec<PathBuf>, ToolError> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(repos_path).map_err(ToolError::io(repos_path))? {
        let entry = entry.map_err(ToolError::io(repos_path))?;
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// `git pull` every repository under `repos_path` at the same time.
///
/// # Errors
///
/// Returns `ToolError::Io` if `repos_path` can not be listed, or an aggregate
/// of every pull that failed.
pub fn pull_repos(repos_path: &Path) -> Result<(), ToolError> {
    let dirs = repo_dirs(repos_path)?;
    if dirs.is_empty() {
        warn!("No repositories found in {}", repos_path.display());
        return Ok(());
    }
    let commands = dirs
        .into_iter()
        .map(|dir| Cmd::build("git pull", &[]).in_dir(dir))
        .collect();
    executor::run_concurrent(commands)?;
    Ok(())
}

/// Clone `org/repo` from GitHub into `parent` unless it is already there.
///
/// # Errors
///
/// Returns the failing `git clone`.
pub fn clone_if_missing(parent: &Path, org: &str, repo: &str) -> Result<(), ToolError> {
    if parent.join(repo).exists() {
        debug!("{repo} already cloned in {}", parent.display());
        return Ok(());
    }
    let url = format!("git@github.com:{org}/{repo}.git");
    Cmd::build("git clone %v", &[&url]).in_dir(parent).run()?;
    Ok(())
}

/// Graph of all branches, one line per commit.
///
/// # Errors
///
/// Returns the failing `git log`.
pub fn log() -> Result<(), ToolError> {
    Cmd::from_tokens(["git", "log", "--graph", "--all", PRETTY_LOG_FORMAT]).run()?;
    Ok(())
}
