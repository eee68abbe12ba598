//! External process execution
//!
//! A [`Cmd`] is an argv plus an optional working directory. Running one prints a
//! trace line, spawns the program with inherited stdin and captured stdout/stderr,
//! and echoes the captured stdout once the child has exited.

mod argv;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command as ProcessCommand, ExitStatus, Stdio};

use log::{debug, warn};
use parking_lot::Mutex;
use thiserror::Error;

pub use argv::PLACEHOLDER;

/// Errors produced while running commands
#[derive(Error, Debug)]
pub enum ExecError {
    #[error(transparent)]
    MalformedArgv(#[from] MalformedArgvError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Aggregate(#[from] AggregateExecutionError),
}

/// The argv can not be spawned as it stands
#[derive(Error, Debug)]
#[error("malformed command {argv:?}: {reason}")]
pub struct MalformedArgvError {
    pub argv: Vec<String>,
    pub reason: String,
}

/// Why a spawned command failed
#[derive(Error, Debug)]
pub enum FailureCause {
    #[error(transparent)]
    Spawn(io::Error),
    #[error("{0}")]
    Exit(ExitStatus),
}

/// A single command failed to spawn or exited unsuccessfully
#[derive(Error, Debug)]
#[error(
    "could not run command: {argv:?}{} with error: {cause} and stderr: {stderr}",
    in_dir(.dir)
)]
pub struct ExecutionError {
    pub argv: Vec<String>,
    pub dir: Option<PathBuf>,
    #[source]
    pub cause: FailureCause,
    pub stderr: String,
}

/// One or more commands of a batch failed
#[derive(Error, Debug)]
#[error("{}", summarize(.total, .failures))]
pub struct AggregateExecutionError {
    pub total: usize,
    pub failures: Vec<Failure>,
}

/// A failed member of a batch, described by what was run and where.
#[derive(Debug)]
pub struct Failure {
    pub argv: Vec<String>,
    pub dir: Option<PathBuf>,
    pub error: ExecError,
}

#[allow(clippy::ref_option)]
fn in_dir(dir: &Option<PathBuf>) -> String {
    dir.as_ref()
        .map(|d| format!(" in dir {}", d.display()))
        .unwrap_or_default()
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn summarize(total: &usize, failures: &[Failure]) -> String {
    let mut message = format!("{} of {total} commands failed:", failures.len());
    for failure in failures {
        message.push_str(&format!("\ncmd: {:?}", failure.argv));
        if let Some(dir) = &failure.dir {
            message.push_str(&format!(" dir: {}", dir.display()));
        }
        message.push_str(&format!("\n  {}", failure.error));
    }
    message
}

/// A program invocation ready to be spawned.
///
/// Running a `Cmd` consumes it; build a new one from the same template to run again.
#[derive(Debug, PartialEq, Eq)]
pub struct Cmd {
    argv: Vec<String>,
    dir: Option<PathBuf>,
    unfilled: usize,
}

impl Cmd {
    /// Build a command from a template, filling each `%v` with the next value and
    /// then splitting on whitespace (double-quoted spans stay one token).
    ///
    /// Values are split like the rest of the template: `git commit -m %v` with
    /// `fix: bug` produces `["git", "commit", "-m", "fix:", "bug"]`. Quote the
    /// placeholder in the template, or use [`Cmd::from_tokens`], to keep a value whole.
    #[must_use]
    pub fn build(template: &str, vars: &[&str]) -> Self {
        let substituted = argv::substitute(template, vars);
        if substituted.unused > 0 {
            warn!(
                "{} unused value(s) for template `{template}`",
                substituted.unused
            );
        }
        Cmd {
            argv: argv::tokenize(&substituted.line),
            dir: None,
            unfilled: substituted.unfilled,
        }
    }

    /// Build a command from an already split argv. Nothing is substituted or split.
    #[must_use]
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Cmd {
            argv: tokens.into_iter().map(Into::into).collect(),
            dir: None,
            unfilled: 0,
        }
    }

    /// Run in `dir` instead of the caller's working directory.
    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_dir(mut self, dir: Option<&Path>) -> Self {
        self.dir = dir.map(Path::to_path_buf);
        self
    }

    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn malformed(&self, reason: impl Into<String>) -> MalformedArgvError {
        MalformedArgvError {
            argv: self.argv.clone(),
            reason: reason.into(),
        }
    }

    fn check(&self) -> Result<(), MalformedArgvError> {
        let Some(program) = self.argv.first() else {
            return Err(self.malformed("empty command"));
        };
        if self.unfilled > 0 {
            return Err(self.malformed(format!(
                "{} placeholder(s) left unfilled",
                self.unfilled
            )));
        }
        if !program_exists(program, self.dir.as_deref()) {
            return Err(self.malformed(format!("program not found: '{program}'")));
        }
        Ok(())
    }

    fn failed(self, cause: FailureCause, stderr: String) -> ExecutionError {
        ExecutionError {
            argv: self.argv,
            dir: self.dir,
            cause,
            stderr,
        }
    }

    /// Spawn the command and wait for it, returning its captured stdout.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::MalformedArgv` if the argv is empty, has unfilled
    /// placeholders or names a program that can not be found, and
    /// `ExecError::Execution` if spawning fails or the program exits unsuccessfully.
    pub fn run(self) -> Result<String, ExecError> {
        println!("{self}");
        self.check()?;

        let mut command = ProcessCommand::new(&self.argv[0]);
        command
            .args(&self.argv[1..])
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.dir {
            command.current_dir(dir);
        }

        debug!("Spawning {:?}", self.argv);
        let output = match command.output() {
            Ok(output) => output,
            Err(e) => return Err(self.failed(FailureCause::Spawn(e), String::new()).into()),
        };
        debug!("{} exited with {}", self.argv[0], output.status);

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(self.failed(FailureCause::Exit(output.status), stderr).into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim_end_matches(['\n', '\r']);
        if !stdout.is_empty() {
            println!("{stdout}");
        }
        Ok(stdout.to_string())
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dir) = &self.dir {
            write!(f, "dir: {} ", dir.display())?;
        }
        write!(f, "cmd: {:?}", self.argv)
    }
}

/// Whether `program` resolves to an executable file, either as a path or through `PATH`.
fn program_exists(program: &str, dir: Option<&Path>) -> bool {
    if program.trim().is_empty() {
        return false;
    }

    let path = Path::new(program);
    if path.components().count() > 1 {
        return match dir {
            Some(dir) if path.is_relative() => is_executable(&dir.join(path)),
            _ => is_executable(path),
        };
    }

    let Some(path_var) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path_var).any(|dir| is_executable(&dir.join(program)))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Run commands one after another, stopping at the first failure.
///
/// Commands after a failing one are never started, and the outputs of the ones
/// that already ran are dropped.
///
/// # Errors
///
/// Returns the error of the first command that fails.
pub fn run_sequential<I>(commands: I) -> Result<Vec<String>, ExecError>
where
    I: IntoIterator<Item = Cmd>,
{
    commands.into_iter().map(Cmd::run).collect()
}

/// Run commands one after another, continuing past failures.
///
/// # Errors
///
/// Returns `ExecError::Aggregate` listing every command that failed.
pub fn run_each<I>(commands: I) -> Result<Vec<String>, ExecError>
where
    I: IntoIterator<Item = Cmd>,
{
    let mut outputs = Vec::new();
    let mut failures = Vec::new();
    let mut total = 0;
    for cmd in commands {
        total += 1;
        let argv = cmd.argv.clone();
        let dir = cmd.dir.clone();
        match cmd.run() {
            Ok(out) => outputs.push(out),
            Err(error) => failures.push(Failure {
                argv,
                dir,
                error,
            }),
        }
    }
    if failures.is_empty() {
        Ok(outputs)
    } else {
        Err(AggregateExecutionError { total, failures }.into())
    }
}

/// Run every command on its own thread and wait for all of them.
///
/// There is no limit on the number of threads; callers pass small batches.
///
/// # Errors
///
/// Returns `ExecError::Aggregate` listing every command that failed.
pub fn run_concurrent(commands: Vec<Cmd>) -> Result<(), ExecError> {
    let total = commands.len();
    let failures = Mutex::new(Vec::new());

    std::thread::scope(|s| {
        for (index, cmd) in commands.into_iter().enumerate() {
            let failures = &failures;
            s.spawn(move || {
                let argv = cmd.argv.clone();
                let dir = cmd.dir.clone();
                if let Err(error) = cmd.run() {
                    failures.lock().push((
                        index,
                        Failure {
                            argv,
                            dir,
                            error,
                        },
                    ));
                }
            });
        }
    });

    let mut failures = failures.into_inner();
    failures.sort_by_key(|(index, _)| *index);
    let failures: Vec<Failure> = failures.into_iter().map(|(_, failure)| failure).collect();
    debug!("{} of {total} concurrent commands failed", failures.len());
    if failures.is_empty() {
        Ok(())
    } else {
        Err(AggregateExecutionError { total, failures }.into())
    }
}
