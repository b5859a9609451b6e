//! Pipeline configuration from YAML

use crate::core::{error::ConfigError, trigger::TriggerRule, Pipeline};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;

const SECRET_MARKER: &str = "${{";

/// Variable definition - a literal value or a reference to a secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableDefinition {
    /// Literal value
    Literal(String),
    /// Value looked up in the secret store at run start
    Secret { secret: String },
}

impl VariableDefinition {
    /// YAML form written back by `fmt`
    ///
    /// Literals containing `${{` use the `{ value: ... }` form so they are not
    /// read back as secret references.
    pub fn to_value(&self) -> Value {
        match self {
            VariableDefinition::Literal(s) if s.contains(SECRET_MARKER) => {
                let mut map = Mapping::new();
                map.insert(Value::String("value".to_string()), Value::String(s.clone()));
                Value::Mapping(map)
            }
            VariableDefinition::Literal(s) => Value::String(s.clone()),
            VariableDefinition::Secret { secret } => {
                Value::String(format!("${{{{ secrets.{} }}}}", secret))
            }
        }
    }
}

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Accepted event kinds: a string, a list, or a mapping keyed by kind
    #[serde(default, rename = "on", skip_serializing_if = "Option::is_none")]
    on: Option<Value>,

    /// Environment declarations shared by all steps
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<String, Value>,

    /// Pipeline steps, in execution order
    pub steps: Vec<StepConfig>,
}

/// Step configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Human-readable step name
    pub name: String,

    /// Command line handed to the shell
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,

    /// Optional note shown next to the step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to YAML
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::EmptyPipeline);
        }

        for (index, step) in self.steps.iter().enumerate() {
            let has_command = step.run.as_deref().is_some_and(|run| !run.trim().is_empty());
            if !has_command {
                return Err(ConfigError::MissingCommand {
                    index: index + 1,
                    name: step.name.clone(),
                });
            }
        }

        self.trigger_rule()?;
        self.get_variables()?;

        Ok(())
    }

    /// Parse the `on` block into a trigger rule
    ///
    /// A missing block accepts every known event kind.
    pub fn trigger_rule(&self) -> Result<TriggerRule, ConfigError> {
        let names: Vec<String> = match &self.on {
            None | Some(Value::Null) => return Ok(TriggerRule::any()),
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Sequence(items)) => items
                .iter()
                .map(event_name)
                .collect::<Result<_, _>>()?,
            Some(Value::Mapping(map)) => map
                .keys()
                .map(event_name)
                .collect::<Result<_, _>>()?,
            Some(other) => return Err(ConfigError::UnknownEventKind(render_value(other))),
        };

        TriggerRule::from_names(names)
    }

    /// Get environment declarations as parsed VariableDefinition values
    pub fn get_variables(&self) -> Result<BTreeMap<String, VariableDefinition>, ConfigError> {
        let name_pattern = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid variable name regex");
        let secret_pattern = Regex::new(r"^\$\{\{\s*secrets\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}$")
            .expect("valid secret reference regex");

        let mut vars = BTreeMap::new();

        for (key, value) in &self.env {
            if !name_pattern.is_match(key) {
                return Err(ConfigError::InvalidVariableName(key.clone()));
            }

            let var_def = match value {
                Value::String(s) if s.contains(SECRET_MARKER) => {
                    let secret = secret_pattern
                        .captures(s.trim())
                        .and_then(|caps| caps.get(1))
                        .ok_or_else(|| ConfigError::InvalidSecretReference {
                            variable: key.clone(),
                        })?;
                    VariableDefinition::Secret {
                        secret: secret.as_str().to_string(),
                    }
                }
                Value::String(s) => VariableDefinition::Literal(s.clone()),
                Value::Bool(b) => VariableDefinition::Literal(b.to_string()),
                Value::Number(n) => VariableDefinition::Literal(n.to_string()),
                Value::Null => VariableDefinition::Literal(String::new()),
                Value::Mapping(map) if map.contains_key("value") => {
                    // { value: LITERAL }
                    let value = map
                        .get("value")
                        .and_then(scalar_string)
                        .ok_or_else(|| ConfigError::InvalidVariableValue {
                            variable: key.clone(),
                        })?;
                    VariableDefinition::Literal(value)
                }
                Value::Mapping(map) => {
                    // { secret: NAME }
                    let secret = map
                        .get("secret")
                        .and_then(|v| v.as_str())
                        .filter(|name| name_pattern.is_match(name))
                        .ok_or_else(|| ConfigError::InvalidSecretReference {
                            variable: key.clone(),
                        })?;
                    VariableDefinition::Secret {
                        secret: secret.to_string(),
                    }
                }
                _ => {
                    return Err(ConfigError::InvalidVariableValue {
                        variable: key.clone(),
                    })
                }
            };
            vars.insert(key.clone(), var_def);
        }

        Ok(vars)
    }

    /// Convert config to a Pipeline domain model
    pub fn to_pipeline(&self) -> Result<Pipeline, ConfigError> {
        Pipeline::from_config(self)
    }

    /// Build the canonical configuration for a pipeline
    pub fn from_pipeline(pipeline: &Pipeline) -> Self {
        let on = Value::Sequence(
            pipeline
                .trigger
                .names()
                .into_iter()
                .map(Value::String)
                .collect(),
        );

        let env = pipeline
            .env
            .iter()
            .map(|(name, definition)| (name.clone(), definition.to_value()))
            .collect();

        let steps = pipeline
            .steps()
            .iter()
            .map(|step| StepConfig {
                name: step.name.clone(),
                run: Some(step.run.clone()),
                note: step.note.clone(),
            })
            .collect();

        Self {
            name: pipeline.name.clone(),
            on: Some(on),
            env,
            steps,
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn event_name(value: &Value) -> Result<String, ConfigError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConfigError::UnknownEventKind(render_value(value)))
}

fn render_value(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
