use std::collections::HashSet;
use std::path::Path;

use log::info;

use crate::executor::{self, Cmd};

use super::ToolError;

/// Extensions to install and to uninstall so that `installed` matches `wanted`.
fn plan<'a>(wanted: &'a [String], installed: &'a [String]) -> (Vec<&'a str>, Vec<&'a str>) {
    let subtract = |from: &'a [String], other: &'a [String]| {
        let other: HashSet<&str> = other.iter().map(String::as_str).collect();
        from.iter()
            .map(String::as_str)
            .filter(|ext| !other.contains(ext))
            .collect::<Vec<_>>()
    };
    (subtract(wanted, installed), subtract(installed, wanted))
}

fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Extensions currently installed in VS Code.
///
/// # Errors
///
/// Returns the failing `code --list-extensions`.
pub fn installed_extensions() -> Result<Vec<String>, ToolError> {
    let out = Cmd::build("code --list-extensions", &[]).run()?;
    Ok(parse_list(&out))
}

/// Install and uninstall extensions until VS Code matches the list in `extensions_file`.
///
/// Every change is attempted even when some fail.
///
/// # Errors
///
/// Returns `ToolError::Io` if the list can not be read, or an aggregate of every
/// install/uninstall that failed.
pub fn pull_extensions(extensions_file: &Path) -> Result<(), ToolError> {
    let installed = installed_extensions()?;
    let wanted = parse_list(
        &std::fs::read_to_string(extensions_file).map_err(ToolError::io(extensions_file))?,
    );

    let (to_install, to_uninstall) = plan(&wanted, &installed);
    info!(
        "Installing {} and uninstalling {} extension(s)",
        to_install.len(),
        to_uninstall.len()
    );
    let commands = to_install
        .into_iter()
        .map(|ext| Cmd::build("code --install-extension %v", &[ext]))
        .chain(
            to_uninstall
                .into_iter()
                .map(|ext| Cmd::build("code --uninstall-extension %v", &[ext])),
        );
    executor::run_each(commands)?;
    Ok(())
}

/// Write the installed extensions to `extensions_file`, one per line.
///
/// # Errors
///
/// Returns the failing `code --list-extensions` or `ToolError::Io` if the file
/// can not be written.
pub fn push_extensions(extensions_file: &Path) -> Result<(), ToolError> {
    let mut contents = installed_extensions()?.join("\n");
    contents.push('\n');
    if let Some(parent) = extensions_file.parent() {
        std::fs::create_dir_all(parent).map_err(ToolError::io(parent))?;
    }
    std::fs::write(extensions_file, contents).map_err(ToolError::io(extensions_file))
}
