//! Dependency locking and requirements file generation.

use crate::config::ReleaseContext;
use crate::environment::pipenv_command;
use crate::error::{RequirementsError, Result};
use crate::process::CommandRunner;
use std::fmt;
use std::path::PathBuf;

/// Requirements listing flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementsMode {
    /// Runtime dependencies only
    Default,
    /// Runtime plus development dependencies
    Develop,
}

impl RequirementsMode {
    /// Both modes, in generation order
    pub const ALL: [RequirementsMode; 2] = [RequirementsMode::Default, RequirementsMode::Develop];

    /// Argument passed to the requirements script
    pub fn as_str(self) -> &'static str {
        match self {
            RequirementsMode::Default => "default",
            RequirementsMode::Develop => "develop",
        }
    }

    /// File written at the repository root for this mode
    pub fn file_name(self) -> &'static str {
        match self {
            RequirementsMode::Default => "requirements.txt",
            RequirementsMode::Develop => "dev-requirements.txt",
        }
    }
}

impl fmt::Display for RequirementsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pin the dependency graph with `pipenv lock`
pub async fn lock_dependencies<R: CommandRunner>(ctx: &ReleaseContext, runner: &R) -> Result<()> {
    let lock = pipenv_command(ctx).arg("lock");
    let output = runner.run(&lock).await?;
    if !output.success_status() {
        return Err(RequirementsError::LockFailed {
            command: lock.display(),
            code: output.code,
        }
        .into());
    }
    Ok(())
}

/// Derive one flat requirements file from the lock state
pub async fn generate_requirements<R: CommandRunner>(
    ctx: &ReleaseContext,
    runner: &R,
    mode: RequirementsMode,
) -> Result<PathBuf> {
    let generate = pipenv_command(ctx)
        .args(["run", ctx.config.tools.python.as_str()])
        .arg(ctx.config.tools.requirements_script.as_str())
        .arg(mode.as_str())
        .capture_stdout();

    let output = runner.run(&generate).await?;
    if !output.success_status() {
        return Err(RequirementsError::GenerationFailed {
            mode: mode.to_string(),
            command: generate.display(),
            code: output.code,
        }
        .into());
    }

    let path = ctx.root.join(mode.file_name());
    tokio::fs::write(&path, output.stdout.as_bytes())
        .await
        .map_err(|source| RequirementsError::WriteFailed {
            path: path.clone(),
            source,
        })?;

    log::info!("Wrote {} ({} mode)", path.display(), mode);
    Ok(path)
}

/// Lock, then write both requirements files
///
/// Returns the generated paths in [`RequirementsMode::ALL`] order.
pub async fn refresh_requirements<R: CommandRunner>(
    ctx: &ReleaseContext,
    runner: &R,
) -> Result<Vec<PathBuf>> {
    lock_dependencies(ctx, runner).await?;

    let mut generated = Vec::with_capacity(RequirementsMode::ALL.len());
    for mode in RequirementsMode::ALL {
        generated.push(generate_requirements(ctx, runner, mode).await?);
    }
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReleaseConfig;
    use crate::error::ReleaseError;
    use crate::process::ToolOutput;
    use crate::process::fake::FakeRunner;

    fn context(root: &std::path::Path) -> ReleaseContext {
        ReleaseContext::new(root, ReleaseConfig::default())
    }

    fn listing_for(cmd: &crate::process::ToolCommand) -> ToolOutput {
        match cmd.args.last().map(String::as_str) {
            Some("default") => ToolOutput::success("numpy==1.14.0\n"),
            Some("develop") => ToolOutput::success("numpy==1.14.0\npytest==3.4.0\n"),
            _ => ToolOutput::success(""),
        }
    }

    #[tokio::test]
    async fn test_refresh_writes_both_files_after_lock() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = FakeRunner::new(listing_for);

        let paths = refresh_requirements(&context(dir.path()), &runner)
            .await
            .expect("refresh should succeed");

        assert_eq!(
            paths,
            vec![
                dir.path().join("requirements.txt"),
                dir.path().join("dev-requirements.txt")
            ]
        );
        let runtime = std::fs::read_to_string(&paths[0]).expect("read requirements");
        let develop = std::fs::read_to_string(&paths[1]).expect("read dev requirements");
        assert_eq!(runtime, "numpy==1.14.0\n");
        assert!(develop.contains("pytest==3.4.0"));

        assert_eq!(
            runner.calls(),
            vec![
                "pipenv lock",
                "pipenv run python requirements.py default",
                "pipenv run python requirements.py develop",
            ]
        );
    }

    #[tokio::test]
    async fn test_lock_failure_stops_generation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = FakeRunner::new(|cmd| {
            if cmd.args == ["lock"] {
                ToolOutput::failure(2)
            } else {
                ToolOutput::success("")
            }
        });

        let err = refresh_requirements(&context(dir.path()), &runner)
            .await
            .expect_err("lock should fail");

        assert!(matches!(
            err,
            ReleaseError::Requirements(RequirementsError::LockFailed { code: Some(2), .. })
        ));
        assert_eq!(runner.calls().len(), 1);
        assert!(!dir.path().join("requirements.txt").exists());
    }

    #[tokio::test]
    async fn test_generation_failure_names_the_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let runner = FakeRunner::new(|cmd| match cmd.args.last().map(String::as_str) {
            Some("develop") => ToolOutput::failure(5),
            _ => ToolOutput::success("six==1.11.0\n"),
        });

        let err = refresh_requirements(&context(dir.path()), &runner)
            .await
            .expect_err("develop generation should fail");

        match err {
            ReleaseError::Requirements(RequirementsError::GenerationFailed { mode, code, .. }) => {
                assert_eq!(mode, "develop");
                assert_eq!(code, Some(5));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(dir.path().join("requirements.txt").exists());
        assert!(!dir.path().join("dev-requirements.txt").exists());
    }
}
