//! Release configuration.
//!
//! Defaults describe the geotools repository layout. An optional
//! `release.toml` at the repository root overrides them, and
//! `GEOTOOLS_RELEASE_*` environment variables override the file.

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the optional config file at the repository root
pub const CONFIG_FILE_NAME: &str = "release.toml";

/// Environment variable that keeps the pipenv virtualenv inside the repository
pub const VENV_IN_PROJECT_VAR: &str = "PIPENV_VENV_IN_PROJECT";

/// What happens to staged files when the build or upload fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupPolicy {
    /// Unstage on every exit path, including failures and Ctrl-C
    Always,
    /// Unstage only after a successful build, leaving staged files on failure
    OnSuccess,
}

impl CleanupPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "always" => Some(Self::Always),
            "on-success" | "on_success" => Some(Self::OnSuccess),
            _ => None,
        }
    }
}

/// External tool invocations
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Dependency isolation and lock tool
    pub pipenv: String,
    /// Python interpreter used inside the environment
    pub python: String,
    /// Script that prints a flat requirements listing for a mode
    pub requirements_script: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pipenv: "pipenv".to_string(),
            python: "python".to_string(),
            requirements_script: "requirements.py".to_string(),
        }
    }
}

/// Configuration for a release run
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Distribution name, used to find built artifacts
    pub package_name: String,
    /// Package source directory, relative to the repository root
    pub package_dir: PathBuf,
    /// Output directory of the packaging tool, relative to the repository root
    pub dist_dir: PathBuf,
    /// Package index alias from ~/.pypirc used for uploads
    pub repository: String,
    /// Cleanup behaviour on failure
    pub cleanup: CleanupPolicy,
    /// External tools
    pub tools: ToolsConfig,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            package_name: "geotools".to_string(),
            package_dir: PathBuf::from("geotools"),
            dist_dir: PathBuf::from("dist"),
            repository: "pypi".to_string(),
            cleanup: CleanupPolicy::Always,
            tools: ToolsConfig::default(),
        }
    }
}

impl ReleaseConfig {
    /// Load configuration for a repository.
    ///
    /// An explicit `config_path` must exist; otherwise `release.toml` at the
    /// root is used when present. Environment overrides are applied last.
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let default_path = root.join(CONFIG_FILE_NAME);
        let path = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None if default_path.is_file() => Some(default_path),
            None => None,
        };

        let mut config = match path {
            Some(path) => {
                log::debug!("Loading release config from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    fn from_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| {
            ConfigError::ParseFailed {
                path: path.to_path_buf(),
                source,
            }
            .into()
        })
    }

    /// Apply `GEOTOOLS_RELEASE_*` overrides using the given lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("GEOTOOLS_RELEASE_CLEANUP") {
            self.cleanup = CleanupPolicy::parse(&value).ok_or_else(|| ConfigError::InvalidValue {
                key: "GEOTOOLS_RELEASE_CLEANUP".to_string(),
                value: value.clone(),
                reason: "expected 'always' or 'on-success'".to_string(),
            })?;
        }
        if let Some(value) = lookup("GEOTOOLS_RELEASE_REPOSITORY") {
            self.repository = value;
        }
        if let Some(value) = lookup("GEOTOOLS_RELEASE_PIPENV") {
            self.tools.pipenv = value;
        }
        if let Some(value) = lookup("GEOTOOLS_RELEASE_PYTHON") {
            self.tools.python = value;
        }
        Ok(())
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<()> {
        let non_empty = [
            ("package_name", self.package_name.as_str()),
            ("repository", self.repository.as_str()),
            ("tools.pipenv", self.tools.pipenv.as_str()),
            ("tools.python", self.tools.python.as_str()),
            ("tools.requirements_script", self.tools.requirements_script.as_str()),
        ];
        for (key, value) in non_empty {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason: "must not be empty".to_string(),
                }
                .into());
            }
        }

        for (key, path) in [("package_dir", &self.package_dir), ("dist_dir", &self.dist_dir)] {
            if path.as_os_str().is_empty() || path.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: path.display().to_string(),
                    reason: "must be a non-empty path relative to the repository root".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Repository root plus configuration, handed to every pipeline stage
#[derive(Debug, Clone)]
pub struct ReleaseContext {
    /// Absolute repository root
    pub root: PathBuf,
    /// Active configuration
    pub config: ReleaseConfig,
}

impl ReleaseContext {
    /// Create a context
    pub fn new(root: impl Into<PathBuf>, config: ReleaseConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Package source directory that receives staged files
    pub fn package_dir(&self) -> PathBuf {
        self.root.join(&self.config.package_dir)
    }

    /// Directory the packaging tool writes distributions to
    pub fn dist_dir(&self) -> PathBuf {
        self.root.join(&self.config.dist_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(content: &str) -> Result<ReleaseConfig> {
        ReleaseConfig::from_toml(content, Path::new("release.toml"))
    }

    #[test]
    fn test_defaults_match_geotools_layout() {
        let config = ReleaseConfig::default();
        assert_eq!(config.package_dir, PathBuf::from("geotools"));
        assert_eq!(config.dist_dir, PathBuf::from("dist"));
        assert_eq!(config.cleanup, CleanupPolicy::Always);
        assert_eq!(config.tools.pipenv, "pipenv");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = parse(
            r#"
repository = "testpypi"
cleanup = "on-success"

[tools]
python = "python3"
"#,
        )
        .expect("config should parse");
        assert_eq!(config.repository, "testpypi");
        assert_eq!(config.cleanup, CleanupPolicy::OnSuccess);
        assert_eq!(config.tools.python, "python3");
        assert_eq!(config.tools.pipenv, "pipenv");
        assert_eq!(config.package_name, "geotools");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = parse("packge_dir = \"src\"\n");
        assert!(matches!(
            result,
            Err(crate::error::ReleaseError::Config(ConfigError::ParseFailed { .. }))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GEOTOOLS_RELEASE_CLEANUP", "on_success"),
            ("GEOTOOLS_RELEASE_REPOSITORY", "internal"),
            ("GEOTOOLS_RELEASE_PIPENV", "/opt/bin/pipenv"),
        ]
        .into_iter()
        .collect();

        let mut config = ReleaseConfig::default();
        config
            .apply_env_with(|key| env.get(key).map(|v| v.to_string()))
            .expect("overrides should apply");

        assert_eq!(config.cleanup, CleanupPolicy::OnSuccess);
        assert_eq!(config.repository, "internal");
        assert_eq!(config.tools.pipenv, "/opt/bin/pipenv");
        assert_eq!(config.tools.python, "python");
    }

    #[test]
    fn test_invalid_cleanup_env_value() {
        let mut config = ReleaseConfig::default();
        let result = config.apply_env_with(|key| {
            (key == "GEOTOOLS_RELEASE_CLEANUP").then(|| "sometimes".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_absolute_package_dir_is_rejected() {
        let mut config = ReleaseConfig::default();
        config.package_dir = PathBuf::from("/tmp/geotools");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_repository_is_rejected() {
        let mut config = ReleaseConfig::default();
        config.repository = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_reads_release_toml_from_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "package_name = \"geotools-ng\"\n")
            .expect("write config");
        let config = ReleaseConfig::load(dir.path(), None).expect("config should load");
        assert_eq!(config.package_name, "geotools-ng");
    }

    #[test]
    fn test_load_with_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        assert!(ReleaseConfig::load(dir.path(), Some(&missing)).is_err());
    }
}
