//! Run context - everything a single run owns

use crate::core::{
    env::{EnvironmentSet, SecretStore},
    error::PipelineError,
    trigger::Event,
    Pipeline,
};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Execution context for a pipeline run
///
/// Built once per run and never shared between runs.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// The event that started the run
    pub event: Event,

    /// Resolved variables handed to every step
    pub environment: EnvironmentSet,

    /// Directory commands run in
    pub working_dir: PathBuf,
}

impl RunContext {
    /// Create a context with an already-resolved environment
    pub fn new(event: Event, environment: EnvironmentSet, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            event,
            environment,
            working_dir: working_dir.into(),
        }
    }

    /// Resolve the pipeline's declarations against a secret store
    pub fn prepare(
        pipeline: &Pipeline,
        event: Event,
        secrets: &dyn SecretStore,
        working_dir: impl Into<PathBuf>,
    ) -> Result<Self, PipelineError> {
        let environment = EnvironmentSet::resolve(&pipeline.env, secrets)?;
        Ok(Self::new(event, environment, working_dir))
    }

    /// Override or add a plain variable
    pub fn set_variable(&mut self, key: String, value: String) {
        self.environment.insert(key, value);
    }

    pub fn get_variable(&self, key: &str) -> Option<&str> {
        self.environment.get(key)
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Environment copy for one step
    pub fn snapshot(&self) -> EnvironmentSet {
        self.environment.clone()
    }
}
