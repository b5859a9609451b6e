//! Pipeline domain model

use crate::core::{
    config::{PipelineConfig, VariableDefinition},
    error::ConfigError,
    step::Step,
    trigger::TriggerRule,
};
use std::collections::BTreeMap;

/// A pipeline definition
///
/// The step list is never empty and its order is the execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Event kinds that start a run
    pub trigger: TriggerRule,

    /// Environment declarations, resolved at run start
    pub env: BTreeMap<String, VariableDefinition>,

    steps: Vec<Step>,
}

impl Pipeline {
    /// Create a pipeline; an empty step list is a configuration error
    pub fn new(
        name: impl Into<String>,
        trigger: TriggerRule,
        steps: Vec<Step>,
    ) -> Result<Self, ConfigError> {
        if steps.is_empty() {
            return Err(ConfigError::EmptyPipeline);
        }
        for (i, step) in steps.iter().enumerate() {
            if step.run.trim().is_empty() {
                return Err(ConfigError::MissingCommand {
                    index: i + 1,
                    name: step.name.clone(),
                });
            }
        }

        Ok(Pipeline {
            name: name.into(),
            trigger,
            env: BTreeMap::new(),
            steps,
        })
    }

    /// Create a pipeline from configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let steps = config
            .steps
            .iter()
            .enumerate()
            .map(|(i, step_config)| Step::from_config(step_config, i + 1))
            .collect::<Result<Vec<_>, _>>()?;

        let mut pipeline = Self::new(config.name.clone(), config.trigger_rule()?, steps)?;
        pipeline.env = config.get_variables()?;
        Ok(pipeline)
    }

    pub fn with_env(mut self, name: impl Into<String>, definition: VariableDefinition) -> Self {
        self.env.insert(name.into(), definition);
        self
    }

    /// Steps in execution order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Get a step by 1-based position
    pub fn step(&self, number: usize) -> Option<&Step> {
        number.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a constructed pipeline
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the secrets this pipeline needs
    pub fn required_secrets(&self) -> Vec<&str> {
        self.env
            .values()
            .filter_map(|definition| match definition {
                VariableDefinition::Secret { secret } => Some(secret.as_str()),
                VariableDefinition::Literal(_) => None,
            })
            .collect()
    }
}
