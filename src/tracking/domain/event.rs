//! Lifecycle notifications delivered by the broker and its workers.

use super::TaskId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of lifecycle notification, used as the handler registration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEventKind {
    /// The task was handed to the broker.
    Submitted,
    /// A worker began executing the task.
    Started,
    /// A worker reported an outcome state code.
    OutcomeReported,
    /// Execution raised an unrecoverable error.
    Failed,
    /// The task was cancelled or terminated.
    Revoked,
}

impl LifecycleEventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Submitted,
        Self::Started,
        Self::OutcomeReported,
        Self::Failed,
        Self::Revoked,
    ];

    /// Returns the canonical name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::Started => "started",
            Self::OutcomeReported => "outcome_reported",
            Self::Failed => "failed",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for LifecycleEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleNotification {
    /// The task was handed to the broker.
    Submitted,
    /// A worker began executing the task.
    Started,
    /// A worker reported an outcome, e.g. `RETRY` or `SUCCESS`.
    OutcomeReported {
        /// Raw outcome state code as sent by the worker.
        outcome: String,
    },
    /// Execution raised an unrecoverable error.
    Failed {
        /// Optional error description from the worker.
        reason: Option<String>,
    },
    /// The task was cancelled or terminated.
    Revoked,
}

impl LifecycleNotification {
    /// Returns the notification kind.
    #[must_use]
    pub const fn kind(&self) -> LifecycleEventKind {
        match self {
            Self::Submitted => LifecycleEventKind::Submitted,
            Self::Started => LifecycleEventKind::Started,
            Self::OutcomeReported { .. } => LifecycleEventKind::OutcomeReported,
            Self::Failed { .. } => LifecycleEventKind::Failed,
            Self::Revoked => LifecycleEventKind::Revoked,
        }
    }
}

/// Ephemeral lifecycle message for one task identifier.
///
/// Events are applied, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    task_id: TaskId,
    notification: LifecycleNotification,
    occurred_at: DateTime<Utc>,
}

impl LifecycleEvent {
    /// Creates an event with an explicit occurrence timestamp.
    #[must_use]
    pub const fn new(
        task_id: TaskId,
        notification: LifecycleNotification,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            notification,
            occurred_at,
        }
    }

    /// Creates an event stamped with the current clock time.
    #[must_use]
    pub fn now(task_id: TaskId, notification: LifecycleNotification, clock: &impl Clock) -> Self {
        Self::new(task_id, notification, clock.utc())
    }

    /// Returns the task identifier the event refers to.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the notification payload.
    #[must_use]
    pub const fn notification(&self) -> &LifecycleNotification {
        &self.notification
    }

    /// Returns the notification kind.
    #[must_use]
    pub const fn kind(&self) -> LifecycleEventKind {
        self.notification.kind()
    }

    /// Returns when the broker observed the event.
    #[must_use]
    pub const fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
