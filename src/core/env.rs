//! Run environment - resolved variables handed to every step

use crate::core::{config::VariableDefinition, error::EnvironmentError};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

const MASK: &str = "***";

/// Source of secret values, consulted once at run start
pub trait SecretStore: Send + Sync {
    /// Look up a secret by name
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads secrets from the process environment
///
/// With a prefix, secret `API_KEY` is looked up as `<prefix>API_KEY`.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore {
    prefix: Option<String>,
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

impl SecretStore for EnvSecretStore {
    fn get(&self, name: &str) -> Option<String> {
        let key = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, name),
            None => name.to_string(),
        };
        std::env::var(key).ok()
    }
}

/// Fixed in-memory secrets
#[derive(Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

impl SecretStore for StaticSecretStore {
    fn get(&self, name: &str) -> Option<String> {
        self.secrets.get(name).cloned()
    }
}

/// Resolved variables for one run
///
/// Keys holding secret values are remembered so they never show up in
/// `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSet {
    vars: BTreeMap<String, String>,
    secret_keys: BTreeSet<String>,
}

impl EnvironmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve declarations against a secret store
    pub fn resolve(
        declarations: &BTreeMap<String, VariableDefinition>,
        store: &dyn SecretStore,
    ) -> Result<Self, EnvironmentError> {
        let mut env = Self::new();

        for (name, definition) in declarations {
            match definition {
                VariableDefinition::Literal(value) => env.insert(name.clone(), value.clone()),
                VariableDefinition::Secret { secret } => {
                    let value = store.get(secret).ok_or_else(|| EnvironmentError::MissingSecret {
                        variable: name.clone(),
                        secret: secret.clone(),
                    })?;
                    env.insert_secret(name.clone(), value);
                }
            }
        }

        debug!("Resolved environment: {:?}", env.names().collect::<Vec<_>>());
        Ok(env)
    }

    /// Set a plain variable, replacing any previous value
    pub fn insert(&mut self, key: String, value: String) {
        self.secret_keys.remove(&key);
        self.vars.insert(key, value);
    }

    /// Set a variable whose value must stay masked
    pub fn insert_secret(&mut self, key: String, value: String) {
        self.secret_keys.insert(key.clone());
        self.vars.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.secret_keys.remove(key);
        self.vars.remove(key)
    }

    pub fn is_secret(&self, key: &str) -> bool {
        self.secret_keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Value suitable for display: secrets are masked
    pub fn display_value(&self, key: &str) -> Option<&str> {
        if self.is_secret(key) {
            self.vars.get(key).map(|_| MASK)
        } else {
            self.get(key)
        }
    }
}

impl fmt::Debug for EnvironmentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.vars
                    .keys()
                    .map(|k| (k, self.display_value(k).unwrap_or_default())),
            )
            .finish()
    }
}
