//! Release pipeline orchestration.
//!
//! Runs bootstrap, lock, stage, build and unstage strictly in order and stops
//! at the first failure. What happens to staged files on failure depends on
//! the configured [`CleanupPolicy`].

mod state;

pub use state::{PipelineState, StateTracker};

use crate::config::{CleanupPolicy, ReleaseContext};
use crate::environment::{BootstrapOutcome, ensure_environment};
use crate::error::Result;
use crate::process::CommandRunner;
use crate::publish::{ArtifactSet, build};
use crate::requirements::{RequirementsMode, refresh_requirements};
use crate::staging::{REQUIRED_FILES, StagedRelease, remove_if_present, stage};

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Whether the environment was created or reused
    pub bootstrap: BootstrapOutcome,
    /// Distributions produced
    pub artifacts: ArtifactSet,
    /// Whether the distributions were uploaded
    pub published: bool,
    /// States visited, in order
    pub history: Vec<PipelineState>,
}

/// One release run over a repository
pub struct ReleasePipeline<'a, R: CommandRunner> {
    ctx: &'a ReleaseContext,
    runner: &'a R,
    tracker: StateTracker,
}

impl<'a, R: CommandRunner> ReleasePipeline<'a, R> {
    /// Create a pipeline in the `Pending` state
    pub fn new(ctx: &'a ReleaseContext, runner: &'a R) -> Self {
        Self {
            ctx,
            runner,
            tracker: StateTracker::default(),
        }
    }

    /// Current state
    pub fn state(&self) -> PipelineState {
        self.tracker.current()
    }

    /// States visited so far
    pub fn history(&self) -> &[PipelineState] {
        self.tracker.history()
    }

    /// Run every stage; uploads the distributions when `publish` is set
    pub async fn run(&mut self, publish: bool) -> Result<PipelineReport> {
        match self.execute(publish).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.tracker.fail();
                log::error!("Release pipeline failed: {}", e);
                Err(e)
            }
        }
    }

    async fn execute(&mut self, publish: bool) -> Result<PipelineReport> {
        let ctx = self.ctx;
        let policy = ctx.config.cleanup;

        let bootstrap = ensure_environment(ctx, self.runner).await?;
        self.tracker.advance(PipelineState::Bootstrapped)?;

        refresh_requirements(ctx, self.runner).await?;
        self.tracker.advance(PipelineState::Locked)?;

        let staged = match stage(&ctx.root, &REQUIRED_FILES, &ctx.package_dir(), policy).await {
            Ok(staged) => staged,
            Err(e) => {
                if policy == CleanupPolicy::Always {
                    self.discard_dev_requirements();
                }
                return Err(e);
            }
        };
        self.tracker.advance(PipelineState::Staged)?;

        let artifacts = match build(ctx, self.runner, publish).await {
            Ok(artifacts) => artifacts,
            Err(e) => {
                Self::abandon(staged, policy);
                return Err(e);
            }
        };
        self.tracker.advance(PipelineState::Built)?;

        staged.unstage()?;
        self.tracker.advance(PipelineState::Unstaged)?;

        Ok(PipelineReport {
            bootstrap,
            artifacts,
            published: publish,
            history: self.tracker.history().to_vec(),
        })
    }

    fn abandon(staged: StagedRelease, policy: CleanupPolicy) {
        match policy {
            CleanupPolicy::Always => {
                if let Err(e) = staged.unstage() {
                    log::warn!("Cleanup after failed build was incomplete: {}", e);
                }
            }
            CleanupPolicy::OnSuccess => {
                let left = staged.persist();
                log::warn!(
                    "Leaving {} staged file(s) in place after failure; run 'geotools_release clean' to remove them",
                    left.len()
                );
            }
        }
    }

    fn discard_dev_requirements(&self) {
        let path = self.ctx.root.join(RequirementsMode::Develop.file_name());
        if let Err(e) = remove_if_present(&path) {
            log::warn!("{}", e);
        }
    }
}
