//! # geotools_release
//!
//! Packaging and publishing pipeline for the geotools Python library.
//!
//! A release run is strictly sequential:
//!
//! 1. make sure the in-project pipenv environment exists
//! 2. lock dependencies and regenerate `requirements.txt` and
//!    `dev-requirements.txt`
//! 3. copy the release metadata into the package directory
//! 4. build the sdist and egg, and upload them when publishing
//! 5. remove the staged copies again
//!
//! The first failing step aborts the run and its exit code becomes the exit
//! code of the process. Staged files are removed on every exit path unless
//! the `on-success` cleanup policy is selected.
//!
//! ## Usage
//!
//! ```bash
//! geotools_release build                  # build distributions
//! geotools_release upload                 # build and upload to the index
//! geotools_release validate               # check readiness, change nothing
//! geotools_release clean                  # remove leftovers of a failed run
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod pipeline;
pub mod process;
pub mod publish;
pub mod requirements;
pub mod staging;

pub use config::{CleanupPolicy, ReleaseConfig, ReleaseContext};
pub use environment::{BootstrapOutcome, ensure_environment};
pub use error::{ReleaseError, Result};
pub use pipeline::{PipelineReport, PipelineState, ReleasePipeline};
pub use process::{CommandRunner, SystemRunner, ToolCommand, ToolOutput};
pub use publish::ArtifactSet;
pub use requirements::RequirementsMode;
pub use staging::{REQUIRED_FILES, StagedRelease};
