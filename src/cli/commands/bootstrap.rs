//! Bootstrap command implementation.

use crate::cli::RuntimeConfig;
use crate::environment::{BootstrapOutcome, ensure_environment};
use crate::error::Result;
use crate::process::CommandRunner;

/// Execute bootstrap command
pub(super) async fn execute_bootstrap<R: CommandRunner>(
    config: &RuntimeConfig,
    runner: &R,
) -> Result<()> {
    config.verbose_println(&format!(
        "Checking environment for {}",
        config.context().root.display()
    ));

    match ensure_environment(config.context(), runner).await? {
        BootstrapOutcome::Created => config.success_println("Created pipenv environment"),
        BootstrapOutcome::Reused => config.success_println("pipenv environment already exists"),
    }
    Ok(())
}
