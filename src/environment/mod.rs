//! Isolated dependency environment bootstrap.
//!
//! The pipenv virtualenv lives inside the repository and is created at most
//! once; later runs reuse it.

use crate::config::{ReleaseContext, VENV_IN_PROJECT_VAR};
use crate::error::{BootstrapError, Result};
use crate::process::{CommandRunner, ToolCommand};

/// Whether the environment had to be created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A new environment was created
    Created,
    /// An existing environment was found
    Reused,
}

/// Build a pipenv invocation with the in-project virtualenv setting
pub(crate) fn pipenv_command(ctx: &ReleaseContext) -> ToolCommand {
    ToolCommand::new(ctx.config.tools.pipenv.as_str(), &ctx.root).env(VENV_IN_PROJECT_VAR, "1")
}

/// Make sure the dependency tool is available and the environment exists
pub async fn ensure_environment<R: CommandRunner>(
    ctx: &ReleaseContext,
    runner: &R,
) -> Result<BootstrapOutcome> {
    let tool = &ctx.config.tools.pipenv;
    let Some(location) = runner.locate(tool) else {
        return Err(BootstrapError::MissingPrerequisite { tool: tool.clone() }.into());
    };
    log::debug!("Found {} at {}", tool, location.display());

    let probe = pipenv_command(ctx).arg("--venv").capture_stdout();
    let existing = runner.run(&probe).await?;
    if existing.success_status() {
        log::info!("Reusing environment at {}", existing.stdout.trim());
        return Ok(BootstrapOutcome::Reused);
    }

    log::info!("Creating environment for {}", ctx.root.display());
    let install = pipenv_command(ctx).args(["install", "--dev"]);
    let output = runner.run(&install).await?;
    if !output.success_status() {
        return Err(BootstrapError::EnvironmentCreationFailed {
            command: install.display(),
            code: output.code,
        }
        .into());
    }

    Ok(BootstrapOutcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReleaseConfig;
    use crate::error::ReleaseError;
    use crate::process::ToolOutput;
    use crate::process::fake::FakeRunner;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn context() -> ReleaseContext {
        ReleaseContext::new("/repo", ReleaseConfig::default())
    }

    #[tokio::test]
    async fn test_missing_tool_fails_before_running_anything() {
        let runner = FakeRunner::without_tools();
        let result = ensure_environment(&context(), &runner).await;
        assert!(matches!(
            result,
            Err(ReleaseError::Bootstrap(BootstrapError::MissingPrerequisite { .. }))
        ));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_existing_environment_is_reused() {
        let runner = FakeRunner::new(|_| ToolOutput::success("/repo/.venv\n"));
        let outcome = ensure_environment(&context(), &runner)
            .await
            .expect("bootstrap should succeed");
        assert_eq!(outcome, BootstrapOutcome::Reused);
        assert_eq!(runner.calls(), vec!["pipenv --venv"]);
    }

    #[tokio::test]
    async fn test_second_call_creates_nothing() {
        let created = Arc::new(AtomicBool::new(false));
        let state = created.clone();
        let runner = FakeRunner::new(move |cmd| match cmd.args.first().map(String::as_str) {
            Some("--venv") if state.load(Ordering::SeqCst) => ToolOutput::success("/repo/.venv"),
            Some("--venv") => ToolOutput::failure(1),
            Some("install") => {
                state.store(true, Ordering::SeqCst);
                ToolOutput::success("")
            }
            _ => ToolOutput::failure(99),
        });

        let first = ensure_environment(&context(), &runner).await.expect("first call");
        let second = ensure_environment(&context(), &runner).await.expect("second call");

        assert_eq!(first, BootstrapOutcome::Created);
        assert_eq!(second, BootstrapOutcome::Reused);
        let installs = runner
            .calls()
            .iter()
            .filter(|c| c.starts_with("pipenv install"))
            .count();
        assert_eq!(installs, 1);
    }

    #[tokio::test]
    async fn test_failed_creation_carries_exit_code() {
        let runner = FakeRunner::new(|cmd| match cmd.args.first().map(String::as_str) {
            Some("install") => ToolOutput::failure(4),
            _ => ToolOutput::failure(1),
        });
        let err = ensure_environment(&context(), &runner)
            .await
            .expect_err("creation should fail");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_pipenv_commands_keep_venv_in_project() {
        let cmd = pipenv_command(&context());
        assert!(cmd.envs.contains(&(VENV_IN_PROJECT_VAR.to_string(), "1".to_string())));
    }
}
