//! Trigger rules - decide whether an incoming event starts a run

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Event kinds a trigger rule can accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Push,
    PullRequest,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::Push, EventKind::PullRequest];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Push => "push",
            EventKind::PullRequest => "pull_request",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(EventKind::Push),
            "pull_request" => Ok(EventKind::PullRequest),
            other => Err(ConfigError::UnknownEventKind(other.to_string())),
        }
    }
}

/// An event delivered by the version-control host
///
/// The raw kind name is kept as delivered; hosts may send kinds this crate
/// doesn't know about, which simply never match a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Kind name as delivered (e.g. "push", "pull_request")
    pub name: String,

    /// Target branch, if the host supplied one
    #[serde(default)]
    pub branch: Option<String>,

    /// Free-form metadata from the host
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            branch: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn push() -> Self {
        Self::new(EventKind::Push.as_str())
    }

    pub fn pull_request() -> Self {
        Self::new(EventKind::PullRequest.as_str())
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The recognized kind, or `None` for kinds this crate doesn't know
    pub fn kind(&self) -> Option<EventKind> {
        self.name.parse().ok()
    }
}

/// Set of event kinds that start a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerRule {
    kinds: BTreeSet<EventKind>,
}

impl TriggerRule {
    pub fn new(kinds: impl IntoIterator<Item = EventKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// Rule accepting every known kind
    pub fn any() -> Self {
        Self::new(EventKind::ALL)
    }

    /// Build a rule from kind names; any unknown name is a configuration error
    pub fn from_names<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let kinds = names
            .into_iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<BTreeSet<EventKind>, _>>()?;
        Ok(Self { kinds })
    }

    pub fn accepts(&self, kind: EventKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Kind names in a stable order, for serialization
    pub fn names(&self) -> Vec<String> {
        self.kinds.iter().map(|k| k.as_str().to_string()).collect()
    }
}

/// True iff the event's kind is one the rule accepts
pub fn should_run(event: &Event, rule: &TriggerRule) -> bool {
    event.kind().is_some_and(|kind| rule.accepts(kind))
}
