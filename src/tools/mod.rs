//! Handlers behind the command tree
//!
//! Every tool reaches the outside world through [`crate::executor`]; the only
//! direct side effects here are file copies and reading directories.

pub mod daily;
pub mod datadog;
pub mod devspace;
pub mod dotfile;
pub mod fs;
pub mod git;
pub mod kill;
pub mod project;
pub mod update;
pub mod vscode;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::executor::ExecError;
use project::Task;

/// Errors a handler can fail with
#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("invalid {name}: {value}")]
    InvalidArgument { name: &'static str, value: String },
    #[error("{}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("config value `{0}` is not set")]
    MissingConfig(&'static str),
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
    #[error("no project configured for repository '{0}'")]
    UnknownProject(String),
    #[error("project '{project}' has no {task} command configured")]
    MissingTask { project: String, task: Task },
    #[error("port {0} is not in use")]
    PortNotInUse(String),
    #[error("prompt failed: {0}")]
    Prompt(#[from] inquire::InquireError),
}

impl ToolError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> ToolError + '_ {
        move |source| ToolError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// The parameter at `index`, or `MissingArgument` naming it.
///
/// # Errors
///
/// Returns `ToolError::MissingArgument` when there are too few parameters.
pub fn required<'a>(
    params: &'a [String],
    index: usize,
    name: &'static str,
) -> Result<&'a str, ToolError> {
    params
        .get(index)
        .map(String::as_str)
        .ok_or(ToolError::MissingArgument(name))
}
