//! Step domain model

use crate::core::{config::StepConfig, error::ConfigError};

/// A single step in a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Human-readable step name
    pub name: String,

    /// Command line handed to the shell
    pub run: String,

    /// Optional display note
    pub note: Option<String>,
}

impl Step {
    /// Create a step; the command is checked when the pipeline is built
    pub fn new(name: impl Into<String>, run: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run: run.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Create a step from a step config; `index` is the 1-based position
    pub fn from_config(config: &StepConfig, index: usize) -> Result<Self, ConfigError> {
        let run = config
            .run
            .as_deref()
            .filter(|run| !run.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingCommand {
                index,
                name: config.name.clone(),
            })?;

        Ok(Step {
            name: config.name.clone(),
            run: run.to_string(),
            note: config.note.clone(),
        })
    }

    /// Name with the note appended, for display
    pub fn label(&self) -> String {
        match &self.note {
            Some(note) => format!("{} ({})", self.name, note),
            None => self.name.clone(),
        }
    }
}
