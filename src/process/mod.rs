//! External tool execution.
//!
//! Every pipeline stage talks to the outside world through [`CommandRunner`],
//! so the orchestration can be exercised without pipenv or setuptools
//! installed.

#[cfg(test)]
pub(crate) mod fake;

use crate::error::{CliError, ReleaseError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// A single external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Program name or path
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory
    pub current_dir: PathBuf,
    /// Extra environment variables
    pub envs: Vec<(String, String)>,
    /// Capture stdout instead of passing it through
    pub capture_stdout: bool,
}

impl ToolCommand {
    /// Create a command running in `current_dir`
    pub fn new(program: impl Into<String>, current_dir: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: current_dir.to_path_buf(),
            envs: Vec::new(),
            capture_stdout: false,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Capture stdout; stderr is still passed through
    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    /// Shell-like rendering for logs and error messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Captured stdout (empty unless capture was requested)
    pub stdout: String,
}

impl ToolOutput {
    /// Successful exit with the given stdout
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
        }
    }

    /// Failed exit with the given code
    pub fn failure(code: i32) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
        }
    }

    /// Whether the command exited with status 0
    pub fn success_status(&self) -> bool {
        self.code == Some(0)
    }
}

/// Locates and runs external tools
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Resolve a program to an executable path, `None` when it cannot be run
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run a command to completion
    ///
    /// A non-zero exit is reported through [`ToolOutput::code`], not as an
    /// error. Errors mean the command could not be started at all.
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        log::debug!(
            "Running '{}' in {}",
            command.display(),
            command.current_dir.display()
        );

        let mut child = tokio::process::Command::new(&command.program);
        child
            .args(&command.args)
            .current_dir(&command.current_dir)
            .envs(command.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let spawn_error = |e: std::io::Error| {
            ReleaseError::Cli(CliError::ExecutionFailed {
                command: command.display(),
                reason: e.to_string(),
            })
        };

        let output = if command.capture_stdout {
            let output = child
                .stdout(Stdio::piped())
                .output()
                .await
                .map_err(spawn_error)?;
            ToolOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            }
        } else {
            let status = child
                .stdout(Stdio::inherit())
                .status()
                .await
                .map_err(spawn_error)?;
            ToolOutput {
                code: status.code(),
                stdout: String::new(),
            }
        };

        log::debug!("'{}' finished with {:?}", command.display(), output.code);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_program_and_args() {
        let cmd = ToolCommand::new("pipenv", Path::new("/repo"))
            .arg("install")
            .arg("--dev");
        assert_eq!(cmd.display(), "pipenv install --dev");
    }

    #[test]
    fn test_builder_collects_env_and_capture() {
        let cmd = ToolCommand::new("pipenv", Path::new("/repo"))
            .args(["--venv"])
            .env("PIPENV_VENV_IN_PROJECT", "1")
            .capture_stdout();
        assert!(cmd.capture_stdout);
        assert_eq!(
            cmd.envs,
            vec![("PIPENV_VENV_IN_PROJECT".to_string(), "1".to_string())]
        );
    }

    #[test]
    fn test_signal_exit_is_not_success() {
        let output = ToolOutput {
            code: None,
            stdout: String::new(),
        };
        assert!(!output.success_status());
        assert!(ToolOutput::success("").success_status());
        assert!(!ToolOutput::failure(2).success_status());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_captures_stdout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cmd = ToolCommand::new("sh", dir.path())
            .args(["-c", "printf 'six==1.11.0\\n'"])
            .capture_stdout();
        let output = SystemRunner.run(&cmd).await.expect("sh should run");
        assert!(output.success_status());
        assert_eq!(output.stdout, "six==1.11.0\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_reports_exit_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cmd = ToolCommand::new("sh", dir.path()).args(["-c", "exit 7"]);
        let output = SystemRunner.run(&cmd).await.expect("sh should run");
        assert_eq!(output.code, Some(7));
    }

    #[tokio::test]
    async fn test_system_runner_spawn_failure_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cmd = ToolCommand::new("geotools-release-no-such-program", dir.path());
        let result = SystemRunner.run(&cmd).await;
        assert!(matches!(
            result,
            Err(ReleaseError::Cli(CliError::ExecutionFailed { .. }))
        ));
    }
}
