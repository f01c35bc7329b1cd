//! Command execution functions.
//!
//! Each subcommand runs against the real toolchain through
//! [`SystemRunner`]; the executors themselves are generic so they can be
//! driven by a scripted runner in tests.

mod bootstrap;
mod clean;
mod release;
mod validate;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;
use crate::process::SystemRunner;

use bootstrap::execute_bootstrap;
use clean::execute_clean;
use release::execute_release;
use validate::execute_validate;

/// Execute the command selected by `args` and return the process exit code
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        let output = super::OutputManager::new(false, false);
        output.error(&format!("Invalid arguments: {}", validation_error));
        return Ok(1);
    }

    let config = RuntimeConfig::from_args(&args)?;
    let runner = SystemRunner;

    let result = match args.command {
        Command::Bootstrap => execute_bootstrap(&config, &runner).await,
        Command::Build => execute_release(&config, &runner, false).await,
        Command::Upload => execute_release(&config, &runner, true).await,
        Command::Validate => execute_validate(&config, &runner),
        Command::Clean => execute_clean(&config),
    };

    match result {
        Ok(()) => {
            config.success_println(&format!(
                "Command '{}' completed successfully",
                args.command.name()
            ));
            Ok(0)
        }
        Err(e) => {
            config.error_println(&format!("Command '{}' failed: {}", args.command.name(), e));

            if !config.is_quiet() {
                let suggestions = e.recovery_suggestions();
                if !suggestions.is_empty() {
                    config.println("\n💡 Recovery suggestions:");
                    for suggestion in suggestions {
                        config.println(&format!("  • {}", suggestion));
                    }
                }
            }

            Ok(e.exit_code())
        }
    }
}
