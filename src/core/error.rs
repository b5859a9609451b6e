//! Error types for pipeline loading and run preparation

use std::path::PathBuf;
use thiserror::Error;

/// Structurally invalid pipeline definition
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("pipeline has no steps")]
    EmptyPipeline,

    #[error("step {index} ('{name}') has no command")]
    MissingCommand { index: usize, name: String },

    #[error("unknown event kind in trigger rule: '{0}'")]
    UnknownEventKind(String),

    #[error("invalid environment variable name: '{0}'")]
    InvalidVariableName(String),

    #[error("variable '{variable}' has a malformed secret reference")]
    InvalidSecretReference { variable: String },

    #[error("variable '{variable}' must be a string, number, boolean or secret reference")]
    InvalidVariableValue { variable: String },

    #[error("failed to parse pipeline definition: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A declared variable could not be resolved at run start
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("secret '{secret}' for variable '{variable}' is not available")]
    MissingSecret { variable: String, secret: String },
}

/// Errors raised before any step of a run executes
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("environment resolution error: {0}")]
    Environment(#[from] EnvironmentError),
}
