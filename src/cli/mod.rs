//! Command-line interface

pub mod commands;
pub mod output;

use crate::core::RunStatus;
use clap::{Parser, Subcommand};
use commands::{FmtCommand, HistoryCommand, ListCommand, RunCommand, TriggerCommand, ValidateCommand};
use std::ffi::OsString;

/// Exit code for configuration and environment errors
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Sequential CI pipeline runner
#[derive(Debug, Parser, Clone)]
#[command(name = "stepline")]
#[command(version)]
#[command(about = "Run CI pipelines step by step, stopping at the first failure", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a pipeline for an event
    Run(RunCommand),

    /// Validate a pipeline definition
    Validate(ValidateCommand),

    /// Check whether an event would start a pipeline
    Trigger(TriggerCommand),

    /// Print a pipeline definition in canonical form
    Fmt(FmtCommand),

    /// List pipelines with recorded runs
    List(ListCommand),

    /// Show run history
    History(HistoryCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

/// How a `run` invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The event doesn't start the pipeline; nothing ran
    NotTriggered,
    /// The pipeline ran to a terminal status
    Finished(RunStatus),
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::NotTriggered => 0,
            RunOutcome::Finished(status) => status.exit_code(),
        }
    }
}

/// Process exit code for a subcommand result
///
/// Any error that escapes a subcommand (bad definition, missing secret,
/// unreadable file) maps to [`EXIT_CONFIG_ERROR`].
pub fn exit_code(result: &anyhow::Result<i32>) -> i32 {
    match result {
        Ok(code) => *code,
        Err(_) => EXIT_CONFIG_ERROR,
    }
}
