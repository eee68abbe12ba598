use std::fmt;
use std::path::{Path, PathBuf};

use git2::Repository;
use log::debug;

use crate::config_file::{Config, Project};
use crate::executor::Cmd;

use super::ToolError;

/// A per-project development task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Test,
    Run,
    Lint,
    Format,
}

impl Task {
    pub const ALL: [Task; 4] = [Task::Test, Task::Run, Task::Lint, Task::Format];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Task::Test => "test",
            Task::Run => "run",
            Task::Lint => "lint",
            Task::Format => "format",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Task::Test => "run the tests",
            Task::Run => "run the app locally",
            Task::Lint => "run the lint checks",
            Task::Format => "format the repo",
        }
    }

    fn command(self, project: &Project) -> Option<&str> {
        match self {
            Task::Test => project.test.as_deref(),
            Task::Run => project.run.as_deref(),
            Task::Lint => project.lint.as_deref(),
            Task::Format => project.format.as_deref(),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Root of the working tree containing `path`.
///
/// # Errors
///
/// Returns `ToolError::Git` if `path` is not inside a repository with a working tree.
pub fn repo_root(path: &Path) -> Result<PathBuf, ToolError> {
    let repo = Repository::discover(path)?;
    let root = repo
        .workdir()
        .ok_or_else(|| git2::Error::from_str("repository has no working directory"))?;
    debug!("Discovered git repo at {}", root.display());
    Ok(root.to_path_buf())
}

/// Command configured for `task` in the project that contains `cwd`.
///
/// # Errors
///
/// Returns `ToolError::Git` outside a repository, `ToolError::UnknownProject` if
/// the repository is not configured, and `ToolError::MissingTask` if the project
/// has no command for `task`.
pub fn task_command(config: &Config, cwd: &Path, task: Task) -> Result<Cmd, ToolError> {
    let root = repo_root(cwd)?;
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let project = config
        .project(&name)
        .ok_or_else(|| ToolError::UnknownProject(name.clone()))?;
    let template = task.command(project).ok_or_else(|| ToolError::MissingTask {
        project: name.clone(),
        task,
    })?;
    Ok(Cmd::build(template, &[]).in_dir(root))
}

/// Run `task` for the project the current directory belongs to.
///
/// # Errors
///
/// See [`task_command`]; also returns the task's own failure.
pub fn run_task(config: &Config, task: Task) -> Result<(), ToolError> {
    let cwd = std::env::current_dir().map_err(ToolError::io(Path::new(".")))?;
    task_command(config, &cwd, task)?.run()?;
    Ok(())
}
