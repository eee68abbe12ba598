use std::io::Write;

use crate::config_file::{Config, Curated};
use crate::executor::Cmd;

use super::{ToolError, git};

/// Log in to AWS, then bring every local repository up to date.
///
/// # Errors
///
/// Returns the failed login or an aggregate of the pulls that failed.
pub fn morning(config: &Config) -> Result<(), ToolError> {
    Cmd::build("aws sso login", &[]).run()?;
    git::pull_repos(&config.repos_path)
}

/// Print the curated cheat sheet.
pub fn curated<W: Write>(entries: &[Curated], out: &mut W) {
    for entry in entries {
        let _ = writeln!(out, "\n{}\n- {}", entry.command, entry.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curated() {
        let entries = vec![
            Curated {
                command: "sudo !!".to_string(),
                description: "run the last command as sudo".to_string(),
            },
            Curated {
                command: "cd -".to_string(),
                description: "go back".to_string(),
            },
        ];
        let mut out = Vec::new();
        curated(&entries, &mut out);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nsudo !!\n- run the last command as sudo\n\ncd -\n- go back\n"
        );
    }
}
