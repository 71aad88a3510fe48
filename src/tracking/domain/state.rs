//! Task lifecycle states and the state filters built on them.

use super::UnknownLifecycleState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Last-known lifecycle state of a tracked task.
///
/// `Pending`, `Started` and `Retry` are running states; `Failure`,
/// `Success` and `Rejected` are terminal. Lifecycle notifications may move
/// a record between any two states because delivery is unordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Task has been submitted but no worker has picked it up.
    Pending,
    /// A worker has begun executing the task.
    Started,
    /// The task failed and is waiting to be retried.
    Retry,
    /// The task failed for good.
    Failure,
    /// The task completed successfully.
    Success,
    /// The broker or a worker refused the task.
    Rejected,
}

impl TaskState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Started,
        Self::Retry,
        Self::Failure,
        Self::Success,
        Self::Rejected,
    ];

    /// Returns the canonical storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Started => "STARTED",
            Self::Retry => "RETRY",
            Self::Failure => "FAILURE",
            Self::Success => "SUCCESS",
            Self::Rejected => "REJECTED",
        }
    }

    /// Maps an outcome code reported by a worker to a state.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownLifecycleState`] when the code names no state.
    pub fn lookup(code: &str) -> Result<Self, UnknownLifecycleState> {
        Self::try_from(code)
    }

    /// Returns `true` when no further lifecycle transition is expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failure | Self::Success | Self::Rejected)
    }

    /// Returns `true` while the task may still make progress.
    #[must_use]
    pub const fn is_running(self) -> bool {
        !self.is_terminal()
    }
}

impl TryFrom<&str> for TaskState {
    type Error = UnknownLifecycleState;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "PENDING" => Ok(Self::Pending),
            "STARTED" => Ok(Self::Started),
            "RETRY" => Ok(Self::Retry),
            "FAILURE" => Ok(Self::Failure),
            "SUCCESS" => Ok(Self::Success),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(UnknownLifecycleState(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate over task states shared by record and owner queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateFilter {
    /// Any tracked task, whatever its state.
    Any,
    /// Exactly one state.
    Only(TaskState),
    /// `Pending`, `Started` or `Retry`.
    Running,
    /// `Failure`, `Success` or `Rejected`.
    Ready,
}

impl StateFilter {
    /// Returns `true` when `state` satisfies the filter.
    #[must_use]
    pub const fn matches(self, state: TaskState) -> bool {
        match self {
            Self::Any => true,
            Self::Only(expected) => expected as u8 == state as u8,
            Self::Running => state.is_running(),
            Self::Ready => state.is_terminal(),
        }
    }

    /// Returns the states accepted by the filter, in declaration order.
    #[must_use]
    pub fn states(self) -> Vec<TaskState> {
        TaskState::ALL
            .into_iter()
            .filter(|state| self.matches(*state))
            .collect()
    }
}

impl From<TaskState> for StateFilter {
    fn from(value: TaskState) -> Self {
        Self::Only(value)
    }
}
