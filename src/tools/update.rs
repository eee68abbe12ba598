use crate::config_file::Config;
use crate::executor::{self, Cmd};

use super::ToolError;

/// The commands that rebuild toolbelt from its checkout and install the binary.
#[must_use]
pub fn commands(config: &Config) -> Vec<Cmd> {
    let dir = config.self_repo_path();
    vec![
        Cmd::build("git pull", &[]).in_dir(&dir),
        Cmd::build(&config.build_command, &[]).in_dir(&dir),
        Cmd::from_tokens([
            "cp".to_string(),
            config.executable.display().to_string(),
            config.cli_path.display().to_string(),
        ])
        .in_dir(&dir),
    ]
}

/// Pull, rebuild and reinstall toolbelt.
///
/// # Errors
///
/// Returns the first step that fails.
pub fn run(config: &Config) -> Result<(), ToolError> {
    executor::run_sequential(commands(config))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config_file::ConfigFile;

    #[test]
    fn test_commands() {
        let file = ConfigFile {
            build_command: Some("cargo build --release --locked".to_string()),
            ..Default::default()
        };
        let config = Config::resolve(file, Path::new("/home/me")).unwrap();
        let commands = commands(&config);
        assert_eq!(commands.len(), 3);
        assert!(
            commands
                .iter()
                .all(|c| c.dir() == Some(Path::new("/home/me/git/toolbelt")))
        );
        assert_eq!(commands[0].argv(), ["git", "pull"]);
        assert_eq!(
            commands[1].argv(),
            ["cargo", "build", "--release", "--locked"]
        );
        assert_eq!(
            commands[2].argv(),
            ["cp", "target/release/toolbelt", "/home/me/cli"]
        );
    }
}
