//! Command line argument parsing and validation.
//!
//! Every option has a default; `geotools_release build` run from the
//! repository root needs nothing else.

use crate::config::{CleanupPolicy, ReleaseConfig, ReleaseContext};
use crate::error::{CliError, ReleaseError, Result};
use clap::{Parser, Subcommand};
use path_absolutize::Absolutize;
use std::path::PathBuf;

/// Packaging and publishing pipeline for the geotools library
#[derive(Parser, Debug)]
#[command(
    name = "geotools_release",
    version,
    about = "Build and publish geotools distributions",
    long_about = "Lock dependencies, regenerate requirements files, stage release metadata into the
package directory, build source and egg distributions, optionally upload them,
and remove the staged files again.

Usage:
  geotools_release build
  geotools_release upload
  geotools_release --repo ../geotools --cleanup on-success build"
)]
pub struct Args {
    /// Repository root
    #[arg(long, global = true, value_name = "PATH", default_value = ".")]
    pub repo: PathBuf,

    /// Config file (defaults to release.toml in the repository root)
    #[arg(long, global = true, value_name = "FILE", env = "GEOTOOLS_RELEASE_CONFIG")]
    pub config: Option<PathBuf>,

    /// What to do with staged files when the build fails
    #[arg(long, global = true, value_enum)]
    pub cleanup: Option<CleanupPolicy>,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print debug logs from every stage
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Pipeline entry points
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Create the in-project pipenv environment if it does not exist
    Bootstrap,
    /// Build source and binary distributions
    Build,
    /// Build distributions and upload them to the package index
    Upload,
    /// Check that a release could run, without changing anything
    Validate,
    /// Remove staged files left behind by an earlier failed run
    Clean,
}

impl Command {
    /// Name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Bootstrap => "bootstrap",
            Command::Build => "build",
            Command::Upload => "upload",
            Command::Validate => "validate",
            Command::Clean => "clean",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.repo.is_dir() {
            return Err(format!(
                "Repository path '{}' is not a directory",
                self.repo.display()
            ));
        }
        if let Some(config) = &self.config
            && !config.is_file()
        {
            return Err(format!("Config file '{}' does not exist", config.display()));
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
    context: ReleaseContext,
}

impl RuntimeConfig {
    /// Resolve the repository, load its config and apply CLI overrides
    pub fn from_args(args: &Args) -> Result<Self> {
        let root = args
            .repo
            .absolutize()
            .map_err(|e| {
                ReleaseError::Cli(CliError::InvalidArguments {
                    reason: format!("Cannot resolve '{}': {}", args.repo.display(), e),
                })
            })?
            .into_owned();

        let mut config = ReleaseConfig::load(&root, args.config.as_deref())?;
        if let Some(cleanup) = args.cleanup {
            config.cleanup = cleanup;
        }

        Ok(Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
            context: ReleaseContext::new(root, config),
        })
    }

    /// Repository and configuration for the pipeline
    pub fn context(&self) -> &ReleaseContext {
        &self.context
    }
}

impl RuntimeConfig {
    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print informational message
    pub fn info_println(&self, message: &str) {
        let _ = self.output.info(message);
    }

    /// Print verbose message
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        let _ = self.output.section(title);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.output.is_quiet()
    }
}
