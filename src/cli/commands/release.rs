//! Build and upload command implementation.

use crate::cli::RuntimeConfig;
use crate::config::CleanupPolicy;
use crate::error::{ReleaseError, Result};
use crate::pipeline::{PipelineReport, ReleasePipeline};
use crate::process::CommandRunner;
use std::future::Future;
use std::time::Duration;

/// How long a tool killed by a signal waits for the matching Ctrl-C
const INTERRUPT_GRACE: Duration = Duration::from_millis(250);

/// Run the full pipeline, uploading when `publish` is set.
///
/// Ctrl-C drops the pipeline future; under the `always` cleanup policy the
/// staged-file guard removes the copies on the way out.
pub(super) async fn execute_release<R: CommandRunner>(
    config: &RuntimeConfig,
    runner: &R,
    publish: bool,
) -> Result<()> {
    let ctx = config.context();
    config.section(if publish {
        "Publishing geotools"
    } else {
        "Building geotools"
    });
    config.verbose_println(&format!("Repository: {}", ctx.root.display()));
    if ctx.config.cleanup == CleanupPolicy::OnSuccess {
        config.warning_println("Staged files will be left in place if the build fails");
    }

    let mut pipeline = ReleasePipeline::new(ctx, runner);
    let report = interruptible(pipeline.run(publish), tokio::signal::ctrl_c()).await?;
    print_report(config, &report);
    Ok(())
}

/// Race `run` against `interrupt`, preferring the interrupt.
///
/// A terminal Ctrl-C also reaches the child, which may exit before the
/// signal is observed here. A tool killed by a signal therefore waits
/// briefly for the interrupt before its failure is reported. An interrupt
/// that fails to register never fires.
async fn interruptible<F, S>(run: F, interrupt: S) -> Result<PipelineReport>
where
    F: Future<Output = Result<PipelineReport>>,
    S: Future<Output = std::io::Result<()>>,
{
    let interrupt = async {
        if let Err(e) = interrupt.await {
            log::warn!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };
    tokio::pin!(interrupt);

    let finished = tokio::select! {
        biased;
        () = &mut interrupt => None,
        result = run => Some(result),
    };
    let Some(result) = finished else {
        return Err(ReleaseError::Interrupted);
    };

    match result {
        Err(e) if e.is_signal_termination() => {
            match tokio::time::timeout(INTERRUPT_GRACE, &mut interrupt).await {
                Ok(()) => Err(ReleaseError::Interrupted),
                Err(_) => Err(e),
            }
        }
        other => other,
    }
}

fn print_report(config: &RuntimeConfig, report: &PipelineReport) {
    let verb = if report.published { "Uploaded" } else { "Built" };
    config.success_println(&format!("{} {} distribution(s)", verb, report.artifacts.len()));
    for artifact in report.artifacts.all() {
        config.indent(&format!("📦 {}", artifact.display()));
    }

    let stages = report
        .history
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" → ");
    config.verbose_println(&format!("Stages: {}", stages));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::BootstrapOutcome;
    use crate::error::PublishError;
    use crate::publish::ArtifactSet;
    use std::future::pending;

    fn report() -> PipelineReport {
        PipelineReport {
            bootstrap: BootstrapOutcome::Reused,
            artifacts: ArtifactSet::default(),
            published: false,
            history: Vec::new(),
        }
    }

    fn build_failed(code: Option<i32>) -> ReleaseError {
        ReleaseError::Publish(PublishError::BuildFailed {
            command: "python setup.py sdist bdist_egg".to_string(),
            code,
        })
    }

    #[tokio::test]
    async fn test_ctrl_c_interrupts_running_pipeline() {
        let result = interruptible(pending(), async { Ok(()) }).await;
        assert!(matches!(result, Err(ReleaseError::Interrupted)));
        assert_eq!(
            result.map(|_| ()).unwrap_err().exit_code(),
            crate::error::INTERRUPTED_EXIT_CODE
        );
    }

    #[tokio::test]
    async fn test_ctrl_c_wins_when_both_are_ready() {
        let result = interruptible(async { Err(build_failed(None)) }, async { Ok(()) }).await;
        assert!(matches!(result, Err(ReleaseError::Interrupted)));
    }

    #[tokio::test]
    async fn test_child_killed_before_ctrl_c_is_observed() {
        let late_interrupt = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(())
        };
        let result = interruptible(async { Err(build_failed(None)) }, late_interrupt).await;
        assert!(matches!(result, Err(ReleaseError::Interrupted)));
    }

    #[tokio::test]
    async fn test_signal_kill_without_ctrl_c_is_a_build_failure() {
        let result = interruptible(async { Err(build_failed(None)) }, pending()).await;
        assert!(matches!(
            result,
            Err(ReleaseError::Publish(PublishError::BuildFailed { code: None, .. }))
        ));
    }

    #[tokio::test]
    async fn test_tool_exit_code_passes_through() {
        let result = interruptible(async { Err(build_failed(Some(3))) }, pending()).await;
        assert_eq!(result.map(|_| ()).unwrap_err().exit_code(), 3);
    }

    #[tokio::test]
    async fn test_failed_handler_registration_does_not_interrupt() {
        let broken = async { Err(std::io::Error::other("no signal driver")) };
        let result = interruptible(async { Ok(report()) }, broken).await;
        assert!(result.is_ok());
    }
}
