//! Validate command implementation.
//!
//! Checks release readiness without running any external tool or touching
//! the repository.

use crate::cli::RuntimeConfig;
use crate::config::ReleaseContext;
use crate::error::{CliError, Result};
use crate::process::CommandRunner;
use crate::staging::{REQUIRED_FILES, is_generated};

/// Individual readiness check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ReadinessCheck {
    pub name: String,
    pub passed: bool,
    pub message: String,
}

impl ReadinessCheck {
    fn new(name: impl Into<String>, passed: bool, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            message: message.into(),
        }
    }
}

/// Evaluate every readiness check for a repository
pub(super) fn readiness_checks<R: CommandRunner>(
    ctx: &ReleaseContext,
    runner: &R,
) -> Vec<ReadinessCheck> {
    let mut checks = Vec::new();

    let tool = &ctx.config.tools.pipenv;
    checks.push(match runner.locate(tool) {
        Some(path) => ReadinessCheck::new(tool.as_str(), true, path.display().to_string()),
        None => ReadinessCheck::new(tool.as_str(), false, "not found on PATH"),
    });

    let package_dir = ctx.package_dir();
    checks.push(ReadinessCheck::new(
        "package directory",
        package_dir.is_dir(),
        package_dir.display().to_string(),
    ));

    for file in ["setup.py", ctx.config.tools.requirements_script.as_str()] {
        let path = ctx.root.join(file);
        checks.push(ReadinessCheck::new(file, path.is_file(), path.display().to_string()));
    }

    // requirements files are regenerated by every run
    for file in REQUIRED_FILES.iter().filter(|f| !is_generated(f)) {
        let path = ctx.root.join(file);
        let passed = path.is_file();
        let message = if passed { "present" } else { "missing" };
        checks.push(ReadinessCheck::new(*file, passed, message));
    }

    checks
}

/// Execute validate command
pub(super) fn execute_validate<R: CommandRunner>(config: &RuntimeConfig, runner: &R) -> Result<()> {
    config.section("Release readiness");

    let checks = readiness_checks(config.context(), runner);
    for check in &checks {
        let line = format!("{}: {}", check.name, check.message);
        if check.passed {
            config.success_println(&line);
        } else {
            config.error_println(&line);
        }
    }

    let failed = checks.iter().filter(|c| !c.passed).count();
    if failed > 0 {
        return Err(CliError::ValidationFailed { failed }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReleaseConfig;
    use crate::process::fake::FakeRunner;

    fn ready_repository() -> (tempfile::TempDir, ReleaseContext) {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        std::fs::create_dir(root.join("geotools")).expect("package dir");
        for file in ["setup.py", "requirements.py"] {
            std::fs::write(root.join(file), "").expect("write");
        }
        for file in REQUIRED_FILES.iter().filter(|f| !is_generated(f)) {
            std::fs::write(root.join(file), "").expect("write");
        }
        let ctx = ReleaseContext::new(root, ReleaseConfig::default());
        (dir, ctx)
    }

    #[test]
    fn test_ready_repository_passes_without_generated_files() {
        let (_dir, ctx) = ready_repository();
        let checks = readiness_checks(&ctx, &FakeRunner::succeeding());
        assert!(checks.iter().all(|c| c.passed), "{checks:?}");
        assert!(!checks.iter().any(|c| c.name == "requirements.txt"));
    }

    #[test]
    fn test_missing_tool_and_file_are_reported() {
        let (_dir, ctx) = ready_repository();
        std::fs::remove_file(ctx.root.join("USAGE.rst")).expect("remove");

        let checks = readiness_checks(&ctx, &FakeRunner::without_tools());
        let failed: Vec<&str> = checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.name.as_str())
            .collect();

        assert_eq!(failed, vec!["pipenv", "USAGE.rst"]);
    }

    #[test]
    fn test_validation_never_runs_commands() {
        let (_dir, ctx) = ready_repository();
        let runner = FakeRunner::succeeding();
        readiness_checks(&ctx, &runner);
        assert!(runner.calls().is_empty());
    }
}
