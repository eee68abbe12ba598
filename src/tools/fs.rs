use std::path::Path;

use log::debug;

use super::ToolError;

/// Overwrite `dest` with the contents of `src`, creating `dest`'s directory if needed.
///
/// # Errors
///
/// Returns `ToolError::Io` naming whichever path could not be read or written.
pub fn copy_file(src: &Path, dest: &Path) -> Result<(), ToolError> {
    debug!("Copying {} to {}", src.display(), dest.display());
    let bytes = std::fs::read(src).map_err(ToolError::io(src))?;
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(ToolError::io(parent))?;
    }
    std::fs::write(dest, bytes).map_err(ToolError::io(dest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_overwrites_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("settings.json");
        let dest = dir.path().join("user").join("settings.json");
        std::fs::write(&src, r#"{"editor.tabSize": 4}"#).unwrap();
        std::fs::create_dir(dir.path().join("user")).unwrap();
        std::fs::write(&dest, "old").unwrap();

        copy_file(&src, &dest).unwrap();
        assert_eq!(
            std::fs::read_to_string(&dest).unwrap(),
            r#"{"editor.tabSize": 4}"#
        );
    }

    #[test]
    fn test_copy_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dest = dir.path().join("nested").join("deeper").join("a.txt");
        std::fs::write(&src, "a").unwrap();
        copy_file(&src, &dest).unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "a");
    }

    #[test]
    fn test_copy_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("missing.txt");
        match copy_file(&src, &dir.path().join("out.txt")).unwrap_err() {
            ToolError::Io { path, .. } => assert_eq!(path, src),
            other => panic!("Expected Io, got: {other:?}"),
        }
    }
}
