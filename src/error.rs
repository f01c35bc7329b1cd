//! Error types for geotools_release operations.
//!
//! Each pipeline stage owns an error enum; `ReleaseError` wraps them all and
//! knows which process exit code and recovery hints belong to each failure.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for geotools_release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Exit code used when the run is interrupted with Ctrl-C
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Main error type for all geotools_release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Environment bootstrap errors
    #[error("Bootstrap error: {0}")]
    Bootstrap(#[from] BootstrapError),

    /// Dependency locking and requirements generation errors
    #[error("Requirements error: {0}")]
    Requirements(#[from] RequirementsError),

    /// Staging errors
    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    /// Unstaging errors
    #[error("Unstage error: {0}")]
    Unstage(#[from] UnstageError),

    /// Build and upload errors
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// CLI and process execution errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// Pipeline state machine violations
    #[error("Invalid pipeline transition from {from} to {to}")]
    InvalidTransition {
        /// State the pipeline was in
        from: crate::pipeline::PipelineState,
        /// State that was requested
        to: crate::pipeline::PipelineState,
    },

    /// Run interrupted by the user
    #[error("Interrupted")]
    Interrupted,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Environment bootstrap errors
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The dependency-isolation tool cannot be found
    #[error("'{tool}' is not installed or not on PATH")]
    MissingPrerequisite {
        /// Tool name
        tool: String,
    },

    /// Creating the isolated environment failed
    #[error("'{command}' exited with {}", describe_code(*code))]
    EnvironmentCreationFailed {
        /// Command that failed
        command: String,
        /// Exit code of the command
        code: Option<i32>,
    },
}

/// Dependency locking and requirements generation errors
#[derive(Error, Debug)]
pub enum RequirementsError {
    /// Locking the dependency graph failed
    #[error("'{command}' exited with {}", describe_code(*code))]
    LockFailed {
        /// Command that failed
        command: String,
        /// Exit code of the command
        code: Option<i32>,
    },

    /// Deriving a requirements listing failed
    #[error("'{command}' ({mode} mode) exited with {}", describe_code(*code))]
    GenerationFailed {
        /// Generation mode
        mode: String,
        /// Command that failed
        command: String,
        /// Exit code of the command
        code: Option<i32>,
    },

    /// Writing the requirements file failed
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        /// Requirements file path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Staging errors
#[derive(Error, Debug)]
pub enum StageError {
    /// A file from the required-file set is absent at the repository root
    #[error("Required file missing: {path}")]
    MissingRequiredFile {
        /// Expected path
        path: PathBuf,
    },

    /// The package source directory does not exist
    #[error("Package directory not found: {path}")]
    PackageDirMissing {
        /// Expected path
        path: PathBuf,
    },

    /// Copying a file into the package directory failed
    #[error("Failed to copy {file} into {dest}: {source}")]
    CopyFailed {
        /// File name
        file: String,
        /// Destination directory
        dest: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A backup from an earlier run is still in the package directory
    #[error("Backup from an earlier run still present: {path}")]
    StaleBackup {
        /// Backup path
        path: PathBuf,
    },

    /// Backing up a pre-existing destination file failed
    #[error("Failed to back up existing {path}: {source}")]
    BackupFailed {
        /// Destination path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Unstaging errors
#[derive(Error, Debug)]
pub enum UnstageError {
    /// Removing a staged copy failed
    #[error("Failed to remove {path}: {source}")]
    RemoveFailed {
        /// Path that could not be removed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Restoring a file that existed before staging failed
    #[error("Failed to restore {path}: {source}")]
    RestoreFailed {
        /// Path that could not be restored
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Build and upload errors
#[derive(Error, Debug)]
pub enum PublishError {
    /// The packaging tool failed to build distributions
    #[error("'{command}' exited with {}", describe_code(*code))]
    BuildFailed {
        /// Command that failed
        command: String,
        /// Exit code of the command
        code: Option<i32>,
    },

    /// Uploading distributions failed
    #[error("Upload to '{repository}' failed: '{command}' exited with {}", describe_code(*code))]
    UploadFailed {
        /// Package index alias
        repository: String,
        /// Command that failed
        command: String,
        /// Exit code of the command
        code: Option<i32>,
    },

    /// The build succeeded but the expected distributions are not there
    #[error("No {kind} distribution for {name}-{version} in {dist_dir}")]
    MissingArtifacts {
        /// "source" or "binary"
        kind: &'static str,
        /// Package name
        name: String,
        /// Package version
        version: String,
        /// Directory that was searched
        dist_dir: PathBuf,
    },

    /// The version marker could not be read
    #[error("Failed to read version marker {path}: {source}")]
    VersionUnreadable {
        /// Version marker path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Artifact search pattern was rejected
    #[error("Invalid artifact pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Glob pattern
        pattern: String,
        /// Reason for the error
        reason: String,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        /// Config file path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse {path}: {source}")]
    ParseFailed {
        /// Config file path
        path: PathBuf,
        /// TOML error
        #[source]
        source: toml::de::Error,
    },

    /// A setting has an unusable value
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        /// Setting name
        key: String,
        /// Offending value
        value: String,
        /// Reason for the error
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Command could not be started
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },

    /// Readiness checks did not pass
    #[error("{failed} readiness check(s) failed")]
    ValidationFailed {
        /// Number of failed checks
        failed: usize,
    },
}

fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl ReleaseError {
    /// Exit status of the external tool this error reports, if any
    fn tool_exit(&self) -> Option<Option<i32>> {
        match self {
            ReleaseError::Bootstrap(BootstrapError::EnvironmentCreationFailed { code, .. })
            | ReleaseError::Requirements(RequirementsError::LockFailed { code, .. })
            | ReleaseError::Requirements(RequirementsError::GenerationFailed { code, .. })
            | ReleaseError::Publish(PublishError::BuildFailed { code, .. })
            | ReleaseError::Publish(PublishError::UploadFailed { code, .. }) => Some(*code),
            _ => None,
        }
    }

    /// Whether an external tool was killed by a signal
    pub fn is_signal_termination(&self) -> bool {
        matches!(self.tool_exit(), Some(None))
    }

    /// Process exit code for this error.
    ///
    /// Failures of external tools propagate the tool's own exit code. A tool
    /// killed by a signal, a missing prerequisite and every internal failure
    /// map to 1.
    pub fn exit_code(&self) -> i32 {
        if matches!(self, ReleaseError::Interrupted) {
            return INTERRUPTED_EXIT_CODE;
        }
        match self.tool_exit() {
            Some(Some(code)) if code != 0 => code,
            _ => 1,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Bootstrap(BootstrapError::MissingPrerequisite { tool }) => vec![
                format!("Install {tool}: pip install --user {tool}"),
                format!("Or point GEOTOOLS_RELEASE_PIPENV at an existing {tool} binary"),
            ],
            ReleaseError::Stage(StageError::MissingRequiredFile { path }) => vec![
                format!("Create {} at the repository root", path.display()),
                "Run 'geotools_release validate' to list every missing file".to_string(),
            ],
            ReleaseError::Stage(StageError::StaleBackup { path }) => vec![
                "Run 'geotools_release clean' to restore the backed up package files".to_string(),
                format!("Or move {} back by hand", path.display()),
            ],
            ReleaseError::Requirements(RequirementsError::LockFailed { .. }) => vec![
                "Check Pipfile for conflicting version constraints".to_string(),
                "Run 'pipenv lock --verbose' to inspect the resolver output".to_string(),
            ],
            ReleaseError::Publish(PublishError::UploadFailed { repository, .. }) => vec![
                format!("Check the credentials for '{repository}' in ~/.pypirc"),
                "Verify this version has not already been uploaded".to_string(),
            ],
            ReleaseError::Publish(PublishError::BuildFailed { .. })
            | ReleaseError::Interrupted => vec![
                "Run 'geotools_release clean' if staged files were left in the package directory"
                    .to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
