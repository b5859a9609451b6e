//! Command runners - hand a step's command to a process launcher

use crate::core::{EnvironmentSet, Step, StepExit};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Error types for command launching
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for command: {0}")]
    Wait(#[source] std::io::Error),
}

/// Trait for command execution - allows for different implementations
///
/// A runner owns stdout/stderr handling; the executor only sees the exit.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the step's command to completion
    ///
    /// `env` is this step's own copy of the run environment.
    async fn run(
        &self,
        step: &Step,
        env: EnvironmentSet,
        working_dir: &Path,
    ) -> Result<StepExit, CommandError>;
}

/// Runs commands through a shell with inherited stdio
#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    /// Shell executable
    shell: String,

    /// Arguments placed before the command line
    shell_args: Vec<String>,
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        if cfg!(windows) {
            Self::with_shell("cmd", ["/C"])
        } else {
            Self::with_shell("sh", ["-c"])
        }
    }
}

impl ShellCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific shell, e.g. `with_shell("bash", ["-eo", "pipefail", "-c"])`
    pub fn with_shell<I, S>(shell: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            shell: shell.into(),
            shell_args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(
        &self,
        step: &Step,
        env: EnvironmentSet,
        working_dir: &Path,
    ) -> Result<StepExit, CommandError> {
        debug!(
            "Spawning {} for step '{}' in {} with {} variables",
            self.shell,
            step.name,
            working_dir.display(),
            env.len()
        );

        let mut child = Command::new(&self.shell)
            .args(&self.shell_args)
            .arg(&step.run)
            .envs(env.iter())
            .current_dir(working_dir)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: self.shell.clone(),
                source,
            })?;

        let status = child.wait().await.map_err(CommandError::Wait)?;

        match status.code() {
            Some(code) => {
                if code != 0 {
                    warn!("Step '{}' exited with code {}", step.name, code);
                }
                Ok(StepExit::Code(code))
            }
            None => {
                warn!("Step '{}' was terminated without an exit code", step.name);
                Ok(StepExit::Terminated)
            }
        }
    }
}
