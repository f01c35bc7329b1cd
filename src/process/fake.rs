//! Scripted command runner for unit tests.

use super::{CommandRunner, ToolCommand, ToolOutput};
use crate::error::Result;
use std::path::PathBuf;
use std::sync::Mutex;

type Handler = Box<dyn Fn(&ToolCommand) -> ToolOutput + Send + Sync>;

/// Records every command and answers with a test-provided handler
pub(crate) struct FakeRunner {
    tools_installed: bool,
    stall_on: Option<String>,
    handler: Handler,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    /// Every program is installed; `handler` decides each outcome
    pub(crate) fn new(handler: impl Fn(&ToolCommand) -> ToolOutput + Send + Sync + 'static) -> Self {
        Self {
            tools_installed: true,
            stall_on: None,
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every program succeeds with empty output
    pub(crate) fn succeeding() -> Self {
        Self::new(|_| ToolOutput::success(""))
    }

    /// No program can be located
    pub(crate) fn without_tools() -> Self {
        Self {
            tools_installed: false,
            ..Self::succeeding()
        }
    }

    /// Commands containing `needle` never finish
    pub(crate) fn stalling_on(mut self, needle: &str) -> Self {
        self.stall_on = Some(needle.to_string());
        self
    }

    /// Commands run so far, rendered with [`ToolCommand::display`]
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl CommandRunner for FakeRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.tools_installed
            .then(|| PathBuf::from("/usr/bin").join(program))
    }

    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.display());
        }
        if let Some(needle) = &self.stall_on
            && command.display().contains(needle.as_str())
        {
            std::future::pending::<()>().await;
        }
        Ok((self.handler)(command))
    }
}
