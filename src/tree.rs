//! The toolbelt command tree

use std::io;
use std::sync::Arc;

use crate::config_file::Config;
use crate::router::Command;
use crate::tools::project::{self, Task};
use crate::tools::{
    ToolError, daily, datadog, devspace, dotfile, git, kill, required, update,
};

/// Handler closure over a shared config
fn with_config<F>(
    config: &Arc<Config>,
    f: F,
) -> impl Fn(&[String]) -> Result<(), ToolError> + Send + Sync + 'static
where
    F: Fn(&Config, &[String]) -> Result<(), ToolError> + Send + Sync + 'static,
{
    let config = Arc::clone(config);
    move |params| f(&config, params)
}

fn git_commands(config: &Arc<Config>) -> Vec<Command<ToolError>> {
    vec![
        Command::leaf(
            "save",
            "save progress and push it to remote",
            |params: &[String]| git::save(None, required(params, 0, "commit message")?),
        ),
        Command::leaf(
            "sync",
            "sync changes from the default branch into this branch",
            with_config(config, |config, _| git::sync(&config.default_branch)),
        ),
        Command::leaf(
            "pull",
            "pull all repos in the repos folder",
            with_config(config, |config, _| git::pull_repos(&config.repos_path)),
        ),
        Command::leaf("log", "pretty log git branches", |_: &[String]| git::log()),
    ]
}

fn dev_commands(config: &Arc<Config>) -> Vec<Command<ToolError>> {
    Task::ALL
        .into_iter()
        .map(|task| {
            Command::leaf(
                task.name(),
                task.description(),
                with_config(config, move |config, _| project::run_task(config, task)),
            )
        })
        .collect()
}

fn dot_commands(config: &Arc<Config>) -> Vec<Command<ToolError>> {
    vec![
        Command::leaf(
            "pull",
            "pull in dotfile changes",
            with_config(config, |config, _| dotfile::pull(config)),
        ),
        Command::leaf(
            "push",
            "push dotfile changes",
            with_config(config, |config, _| dotfile::push(config)),
        ),
        Command::leaf(
            "list",
            "list dot files",
            with_config(config, |config, _| {
                dotfile::list(config, &mut io::stdout());
                Ok(())
            }),
        ),
    ]
}

/// Build the full command tree over `config`.
#[must_use]
pub fn build(config: Config) -> Vec<Command<ToolError>> {
    let config = Arc::new(config);
    vec![
        Command::leaf(
            "update",
            "update toolbelt",
            with_config(&config, |config, _| update::run(config)),
        ),
        Command::leaf(
            "kill",
            "kill a process for a given port",
            |params: &[String]| kill::port(required(params, 0, "port")?),
        ),
        Command::leaf(
            "morning",
            "morning script",
            with_config(&config, |config, _| daily::morning(config)),
        ),
        Command::leaf(
            "curated",
            "curated list of commands",
            with_config(&config, |config, _| {
                daily::curated(&config.curated, &mut io::stdout());
                Ok(())
            }),
        ),
        Command::group("git", "git utilities", git_commands(&config)),
        Command::group(
            "devspace",
            "utilities for devspace",
            vec![Command::leaf(
                "reset",
                "reset devspace",
                with_config(&config, |config, _| devspace::reset(config)),
            )],
        ),
        Command::group("dev", "generic development utilities", dev_commands(&config)),
        Command::group("dot", "utilities for dotfiles", dot_commands(&config)),
        Command::leaf(
            "datadog",
            "tools for the observability platform DataDog",
            with_config(&config, |config, _| datadog::form(config)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config_file::ConfigFile;
    use crate::router::{Resolution, RouteError, Router};

    fn router() -> Router<ToolError> {
        let config = Config::resolve(ConfigFile::default(), Path::new("/home/me")).unwrap();
        Router::new(build(config)).unwrap()
    }

    fn input(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_top_level_menu() {
        let mut out = Vec::new();
        router().run_to(&[], &mut out).unwrap();
        insta::assert_snapshot!(String::from_utf8(out).unwrap().trim_end(), @r"
        update: update toolbelt
        kill: kill a process for a given port
        morning: morning script
        curated: curated list of commands
        git: git utilities
        devspace: utilities for devspace
        dev: generic development utilities
        dot: utilities for dotfiles
        datadog: tools for the observability platform DataDog
        ");
    }

    #[test]
    fn test_commit_message_reaches_save() {
        let router = router();
        let tokens = input(&["git", "save", "fix: the bug"]);
        match router.resolve(&tokens).unwrap() {
            Resolution::Invoke {
                command, params, ..
            } => {
                assert_eq!(command.name, "save");
                assert_eq!(params, ["fix: the bug"]);
            }
            Resolution::Menu(_) => panic!("Expected Invoke"),
        }
    }

    #[test]
    fn test_dev_menu_lists_tasks() {
        let mut out = Vec::new();
        router().run_to(&input(&["dev"]), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "test: run the tests\nrun: run the app locally\nlint: run the lint checks\nformat: format the repo\n"
        );
    }

    #[test]
    fn test_missing_arguments() {
        let router = router();
        let err = router.run(&input(&["git", "save"])).unwrap_err();
        assert_eq!(err.to_string(), "missing argument: commit message");
        assert!(matches!(
            router.run(&input(&["kill"])),
            Err(RouteError::Handler(ToolError::MissingArgument("port")))
        ));
    }

    #[test]
    fn test_unknown_subcommand() {
        let err = router().run(&input(&["dot", "sync"])).unwrap_err();
        assert_eq!(err.to_string(), "invalid input. sync is not valid");
    }
}
