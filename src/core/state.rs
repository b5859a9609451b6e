//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Position of a run in its linear state machine
///
/// Step numbers are 1-based. `Pending(n)` means step `n` is next to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending(usize),
    Succeeded,
    Failed(usize),
    Cancelled(usize),
}

impl RunState {
    /// Initial state of every run
    pub fn start() -> Self {
        RunState::Pending(1)
    }

    /// Transition after the pending step finished
    ///
    /// Terminal states are returned unchanged.
    pub fn advance(self, step_succeeded: bool, total_steps: usize) -> Self {
        match self {
            RunState::Pending(n) if !step_succeeded => RunState::Failed(n),
            RunState::Pending(n) if n >= total_steps => RunState::Succeeded,
            RunState::Pending(n) => RunState::Pending(n + 1),
            terminal => terminal,
        }
    }

    /// Transition on a cancellation request
    pub fn cancel(self) -> Self {
        match self {
            RunState::Pending(n) => RunState::Cancelled(n),
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::Pending(_))
    }

    /// The final status, if the state is terminal
    pub fn status(&self) -> Option<RunStatus> {
        match *self {
            RunState::Pending(_) => None,
            RunState::Succeeded => Some(RunStatus::Success),
            RunState::Failed(step) => Some(RunStatus::Failed { step }),
            RunState::Cancelled(before_step) => Some(RunStatus::Cancelled { before_step }),
        }
    }
}

/// Terminal status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Every step succeeded
    Success,
    /// Step `step` (1-based) failed; later steps were skipped
    Failed { step: usize },
    /// Cancelled before step `before_step` (1-based) started
    Cancelled { before_step: usize },
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Success)
    }

    /// Process exit code reported for this status
    pub fn exit_code(&self) -> i32 {
        match self {
            RunStatus::Success => 0,
            RunStatus::Failed { .. } => 1,
            RunStatus::Cancelled { .. } => 130,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Success => "Success",
            RunStatus::Failed { .. } => "Failed",
            RunStatus::Cancelled { .. } => "Cancelled",
        }
    }
}

/// How a step's command ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StepExit {
    /// Exited with a status code
    Code(i32),
    /// Killed without an exit code (e.g. by a signal)
    Terminated,
    /// The command could not be started
    SpawnError(String),
    /// The command started but waiting for it failed
    WaitError(String),
}

impl StepExit {
    pub fn success(&self) -> bool {
        matches!(self, StepExit::Code(0))
    }
}

impl fmt::Display for StepExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepExit::Code(code) => write!(f, "exit code {}", code),
            StepExit::Terminated => f.write_str("terminated"),
            StepExit::SpawnError(e) => write!(f, "failed to start: {}", e),
            StepExit::WaitError(e) => write!(f, "lost track of command: {}", e),
        }
    }
}

/// Outcome of one attempted step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step_name: String,
    pub exit: StepExit,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
}

impl StepOutcome {
    pub fn success(&self) -> bool {
        self.exit.success()
    }
}

/// Terminal record of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(flatten)]
    pub status: RunStatus,

    /// One entry per attempted step, in step order
    pub outcomes: Vec<StepOutcome>,
}

impl RunResult {
    /// Finalize a run from its terminal state
    ///
    /// Returns `None` if the state is still pending.
    pub fn from_state(state: RunState, outcomes: Vec<StepOutcome>) -> Option<Self> {
        state.status().map(|status| RunResult { status, outcomes })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// The outcome of the failing step, if the run failed
    pub fn failed_outcome(&self) -> Option<&StepOutcome> {
        match self.status {
            RunStatus::Failed { step } => step.checked_sub(1).and_then(|i| self.outcomes.get(i)),
            _ => None,
        }
    }

    pub fn total_duration(&self) -> Duration {
        self.outcomes.iter().map(|o| o.duration).sum()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
