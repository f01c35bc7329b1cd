//! Command line interface for geotools_release.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    init_logging(&args);
    execute_command(args).await
}

/// Install the env_logger backend.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` enables debug logs for
/// this crate and everything else stays at warnings.
pub fn init_logging(args: &Args) {
    let default_filter = if args.verbose {
        "geotools_release=debug"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();
}
