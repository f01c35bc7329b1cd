//! Pipeline state tracking.

use crate::error::{ReleaseError, Result};
use std::fmt;

/// Position of a run in the release pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    /// Nothing has run yet
    Pending,
    /// Dependency environment is available
    Bootstrapped,
    /// Dependencies locked and requirements files written
    Locked,
    /// Release files copied into the package directory
    Staged,
    /// Distributions built (and uploaded when publishing)
    Built,
    /// Staged files removed; the run is complete
    Unstaged,
    /// A stage failed
    Failed,
}

impl PipelineState {
    /// The state that follows this one on success
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Bootstrapped),
            Self::Bootstrapped => Some(Self::Locked),
            Self::Locked => Some(Self::Staged),
            Self::Staged => Some(Self::Built),
            Self::Built => Some(Self::Unstaged),
            Self::Unstaged | Self::Failed => None,
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Unstaged | Self::Failed)
    }

    /// Whether moving from `self` to `to` is allowed
    pub fn can_transition_to(self, to: Self) -> bool {
        if to == Self::Failed {
            return !self.is_terminal();
        }
        self.next() == Some(to)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Bootstrapped => "bootstrapped",
            Self::Locked => "locked",
            Self::Staged => "staged",
            Self::Built => "built",
            Self::Unstaged => "unstaged",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Current state plus every state visited
#[derive(Debug, Clone)]
pub struct StateTracker {
    current: PipelineState,
    history: Vec<PipelineState>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self {
            current: PipelineState::Pending,
            history: vec![PipelineState::Pending],
        }
    }
}

impl StateTracker {
    /// Current state
    pub fn current(&self) -> PipelineState {
        self.current
    }

    /// States visited so far, in order
    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Move to `to`, rejecting transitions the pipeline does not allow
    pub fn advance(&mut self, to: PipelineState) -> Result<()> {
        if !self.current.can_transition_to(to) {
            return Err(ReleaseError::InvalidTransition {
                from: self.current,
                to,
            });
        }
        log::debug!("Pipeline {} -> {}", self.current, to);
        self.current = to;
        self.history.push(to);
        Ok(())
    }

    /// Record a failure; a no-op when already terminal
    pub fn fail(&mut self) {
        if self.advance(PipelineState::Failed).is_err() {
            log::debug!("Pipeline already {}, not marking failed", self.current);
        }
    }
}
