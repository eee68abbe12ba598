//! Configuration file handling for toolbelt

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Unable to determine the home directory")]
    UnknownHomeDirectory,
    #[error("Unable to parse YAML config file {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON config file {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("Duplicate project in config: {0}")]
    DuplicateId(String),
    #[error("Invalid config: {0}")]
    Validation(String),
}

/// Commands for working on one repository, keyed by the repository's directory name
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub test: Option<String>,
    pub run: Option<String>,
    pub lint: Option<String>,
    pub format: Option<String>,
}

/// An entry of the `curated` cheat sheet
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Curated {
    pub command: String,
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct DatadogInstance {
    pub label: String,
    pub subdomain: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct DatadogService {
    pub label: String,
    pub name: String,
    /// Prefix for structured log attributes, eg `@` or `@extra.`
    pub attribute_prefix: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ConfigDatadog {
    pub instances: Option<Vec<DatadogInstance>>,
    pub services: Option<Vec<DatadogService>>,
}

/// On-disk configuration; every field is optional
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ConfigFile {
    pub repos_path: Option<PathBuf>,
    pub cli_path: Option<PathBuf>,
    pub default_branch: Option<String>,
    pub repo_name: Option<String>,
    pub executable: Option<PathBuf>,
    pub build_command: Option<String>,
    pub github_username: Option<String>,
    pub dotfiles_repo: Option<String>,
    pub devspace_namespace: Option<String>,
    pub vscode_user_settings: Option<PathBuf>,
    pub projects: Option<Vec<Project>>,
    pub curated: Option<Vec<Curated>>,
    pub datadog: Option<ConfigDatadog>,
}

/// Fully resolved configuration handed to the command tree
#[derive(Debug, Clone)]
pub struct Config {
    pub home: PathBuf,
    pub repos_path: PathBuf,
    pub cli_path: PathBuf,
    pub default_branch: String,
    /// Directory name of toolbelt's own checkout under `repos_path`
    pub repo_name: String,
    /// Built binary, relative to the checkout
    pub executable: PathBuf,
    pub build_command: String,
    pub github_username: Option<String>,
    pub dotfiles_repo: String,
    pub devspace_namespace: Option<String>,
    pub vscode_user_settings: PathBuf,
    pub projects: Vec<Project>,
    pub curated: Vec<Curated>,
    pub datadog_instances: Vec<DatadogInstance>,
    pub datadog_services: Vec<DatadogService>,
}

/// List of supported configuration file names
const FILENAMES: [&str; 3] = ["toolbelt.yaml", "toolbelt.yml", "toolbelt.json"];

impl ConfigFile {
    /// Loads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file cannot be read, or
    /// `ConfigError::Yaml`/`ConfigError::Json` if parsing fails.
    pub fn from_file(file: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = std::fs::read_to_string(file)
            .map_err(|_| ConfigError::ConfigNotFound(file.to_path_buf()))?;
        let config: ConfigFile = if file.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents).map_err(|e| ConfigError::Json {
                source: e,
                path: file.to_path_buf(),
            })?
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
                source: e,
                path: file.to_path_buf(),
            })?
        };
        Ok(config)
    }

    /// Looks for a configuration file in `<dir>/toolbelt/`.
    #[must_use]
    pub fn find_in(config_dir: &Path) -> Option<PathBuf> {
        let dir = config_dir.join("toolbelt");
        debug!("Searching for config file in {}", dir.display());
        let found = FILENAMES
            .iter()
            .map(|file| dir.join(file))
            .find(|path| path.exists());
        if let Some(path) = &found {
            info!("Found config file: {}", path.display());
        }
        found
    }
}

/// Replace a leading `~` with `home`.
#[must_use]
pub fn expand_home(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

fn default_vscode_settings(home: &Path) -> PathBuf {
    let config_dir = if cfg!(target_os = "macos") {
        home.join("Library").join("Application Support")
    } else {
        home.join(".config")
    };
    config_dir.join("Code").join("User").join("settings.json")
}

fn default_curated() -> Vec<Curated> {
    vec![Curated {
        command: "sudo !!".to_string(),
        description: "run the last command as sudo".to_string(),
    }]
}

fn default_datadog_instances() -> Vec<DatadogInstance> {
    [
        ("Multi-Tenant", "dbtlabsmt"),
        ("AWS Single-Tenant", "dbtlabsstaws"),
        ("Azure Single-Tenant", "dbtlabsstazure"),
    ]
    .into_iter()
    .map(|(label, subdomain)| DatadogInstance {
        label: label.to_string(),
        subdomain: subdomain.to_string(),
    })
    .collect()
}

fn default_datadog_services() -> Vec<DatadogService> {
    [
        ("Metricflow Server", "metricflow-server", Some("@extra.")),
        ("Semantic Layer Gateway", "semantic-layer-gateway", Some("@")),
        ("Elastic Load Balancer", "elb", None),
        ("Google Sheets", "semantic-layer-gsheets", Some("@extra.")),
    ]
    .into_iter()
    .map(|(label, name, prefix)| DatadogService {
        label: label.to_string(),
        name: name.to_string(),
        attribute_prefix: prefix.map(ToString::to_string),
    })
    .collect()
}

fn non_empty(field: &str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("`{field}` must not be empty")));
    }
    Ok(value)
}

impl Config {
    /// Apply defaults relative to `home` and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` for empty required values and
    /// `ConfigError::DuplicateId` if two projects share a name.
    pub fn resolve(file: ConfigFile, home: &Path) -> Result<Config, ConfigError> {
        let path_or = |value: Option<PathBuf>, default: PathBuf| {
            value.map_or(default, |p| expand_home(&p, home))
        };
        let datadog = file.datadog.unwrap_or_default();

        let config = Config {
            home: home.to_path_buf(),
            repos_path: path_or(file.repos_path, home.join("git")),
            cli_path: path_or(file.cli_path, home.join("cli")),
            default_branch: non_empty(
                "default_branch",
                file.default_branch.unwrap_or_else(|| "main".to_string()),
            )?,
            repo_name: non_empty(
                "repo_name",
                file.repo_name.unwrap_or_else(|| "toolbelt".to_string()),
            )?,
            executable: file
                .executable
                .unwrap_or_else(|| Path::new("target").join("release").join("toolbelt")),
            build_command: non_empty(
                "build_command",
                file.build_command
                    .unwrap_or_else(|| "cargo build --release".to_string()),
            )?,
            github_username: file.github_username,
            dotfiles_repo: non_empty(
                "dotfiles_repo",
                file.dotfiles_repo.unwrap_or_else(|| "dotfiles".to_string()),
            )?,
            devspace_namespace: file.devspace_namespace,
            vscode_user_settings: path_or(file.vscode_user_settings, default_vscode_settings(home)),
            projects: file.projects.unwrap_or_default(),
            curated: file.curated.unwrap_or_else(default_curated),
            datadog_instances: datadog.instances.unwrap_or_else(default_datadog_instances),
            datadog_services: datadog.services.unwrap_or_else(default_datadog_services),
        };
        validate_projects(&config.projects)?;
        Ok(config)
    }

    #[must_use]
    pub fn dotfiles_path(&self) -> PathBuf {
        self.repos_path.join(&self.dotfiles_repo)
    }

    #[must_use]
    pub fn dotfiles_vscode_settings(&self) -> PathBuf {
        self.dotfiles_path().join("vscode").join("settings.json")
    }

    #[must_use]
    pub fn dotfiles_vscode_extensions(&self) -> PathBuf {
        self.dotfiles_path().join("vscode").join("extensions.txt")
    }

    /// Checkout of toolbelt itself
    #[must_use]
    pub fn self_repo_path(&self) -> PathBuf {
        self.repos_path.join(&self.repo_name)
    }

    #[must_use]
    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }
}

fn validate_projects(projects: &[Project]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for project in projects {
        if project.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Project with an empty name".to_string(),
            ));
        }
        if !seen.insert(project.name.as_str()) {
            return Err(ConfigError::DuplicateId(project.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolbelt.yaml");
        std::fs::write(
            &path,
            r"
default_branch: develop
repos_path: ~/src
github_username: octocat
projects:
  - name: api
    test: make test
",
        )
        .unwrap();
        let file = ConfigFile::from_file(&path).unwrap();
        assert_eq!(file.default_branch.as_deref(), Some("develop"));

        let config = Config::resolve(file, Path::new("/home/me")).unwrap();
        assert_eq!(config.repos_path, Path::new("/home/me/src"));
        assert_eq!(config.github_username.as_deref(), Some("octocat"));
        assert_eq!(config.project("api").unwrap().test.as_deref(), Some("make test"));
        assert!(config.project("web").is_none());
    }

    #[test]
    fn test_from_file_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolbelt.json");
        std::fs::write(&path, r#"{"devspace_namespace": "dev-me", "cli_path": "/opt/bin"}"#)
            .unwrap();
        let config = Config::resolve(ConfigFile::from_file(&path).unwrap(), dir.path()).unwrap();
        assert_eq!(config.devspace_namespace.as_deref(), Some("dev-me"));
        assert_eq!(config.cli_path, Path::new("/opt/bin"));
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolbelt.yaml");
        std::fs::write(&path, "projects: [unterminated").unwrap();
        assert!(matches!(
            ConfigFile::from_file(&path),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.yaml");
        assert!(matches!(
            ConfigFile::from_file(&path),
            Err(ConfigError::ConfigNotFound(p)) if p == path
        ));
    }

    #[test]
    fn test_defaults_follow_home() {
        let config = Config::resolve(ConfigFile::default(), Path::new("/home/me")).unwrap();
        assert_eq!(config.repos_path, Path::new("/home/me/git"));
        assert_eq!(config.cli_path, Path::new("/home/me/cli"));
        assert_eq!(config.default_branch, "main");
        assert_eq!(
            config.dotfiles_vscode_extensions(),
            Path::new("/home/me/git/dotfiles/vscode/extensions.txt")
        );
        assert_eq!(config.self_repo_path(), Path::new("/home/me/git/toolbelt"));
        assert_eq!(config.curated.len(), 1);
        assert!(config.github_username.is_none());
    }

    #[test]
    fn test_empty_default_branch_rejected() {
        let file = ConfigFile {
            default_branch: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            Config::resolve(file, Path::new("/home/me")),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_project_rejected() {
        let project = Project {
            name: "api".to_string(),
            ..Default::default()
        };
        let file = ConfigFile {
            projects: Some(vec![project.clone(), project]),
            ..Default::default()
        };
        match Config::resolve(file, Path::new("/home/me")).unwrap_err() {
            ConfigError::DuplicateId(id) => assert_eq!(id, "api"),
            other => panic!("Expected DuplicateId, got: {other:?}"),
        }
    }

    #[test]
    fn test_expand_home() {
        let home = Path::new("/home/me");
        assert_eq!(expand_home(Path::new("~/git"), home), Path::new("/home/me/git"));
        assert_eq!(expand_home(Path::new("~"), home), Path::new("/home/me"));
        assert_eq!(expand_home(Path::new("/abs/~"), home), Path::new("/abs/~"));
    }

    #[test]
    fn test_find_in() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigFile::find_in(dir.path()).is_none());
        std::fs::create_dir(dir.path().join("toolbelt")).unwrap();
        std::fs::write(dir.path().join("toolbelt").join("toolbelt.yml"), "{}").unwrap();
        assert_eq!(
            ConfigFile::find_in(dir.path()),
            Some(dir.path().join("toolbelt").join("toolbelt.yml"))
        );
    }
}
