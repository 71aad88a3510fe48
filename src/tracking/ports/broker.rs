//! Broker port: the external task-execution subsystem.

use crate::tracking::domain::{TaskId, TaskState};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Description of the work to hand to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    name: String,
    args: serde_json::Value,
}

impl TaskSpec {
    /// Creates a task specification with no arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: serde_json::Value::Null,
        }
    }

    /// Sets the task arguments.
    #[must_use]
    pub fn with_args(mut self, args: serde_json::Value) -> Self {
        self.args = args;
        self
    }

    /// Returns the registered task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the task arguments.
    #[must_use]
    pub const fn args(&self) -> &serde_json::Value {
        &self.args
    }
}

/// Handle returned by the broker once a task is queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingResult {
    task_id: TaskId,
}

impl PendingResult {
    /// Creates a handle for a queued task.
    #[must_use]
    pub const fn new(task_id: TaskId) -> Self {
        Self { task_id }
    }

    /// Returns the queued task identifier.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }
}

/// Task broker contract.
///
/// The broker owns queueing, execution and result storage. It reports
/// lifecycle notifications through a
/// [`LifecycleDispatcher`](crate::tracking::services::LifecycleDispatcher)
/// that the integration is handed at construction time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskBroker: Send + Sync {
    /// Queues a task under the given identifier.
    async fn submit(&self, spec: &TaskSpec, task_id: &TaskId) -> BrokerResult<PendingResult>;

    /// Returns the broker-side state of a task.
    ///
    /// Unknown identifiers report [`TaskState::Pending`], matching brokers
    /// that cannot distinguish "never seen" from "not started".
    async fn result_state(&self, task_id: &TaskId) -> BrokerResult<TaskState>;

    /// Clears broker-side result storage for a task.
    async fn forget(&self, task_id: &TaskId) -> BrokerResult<()>;

    /// Cancels a task before or during execution.
    async fn revoke(&self, task_id: &TaskId) -> BrokerResult<()>;
}

/// Errors returned by broker implementations.
#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    /// The broker could not be reached.
    #[error("broker unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),

    /// The broker refused the request.
    #[error("broker rejected task {task_id}: {reason}")]
    Rejected {
        /// Task the broker refused.
        task_id: TaskId,
        /// Broker-supplied explanation.
        reason: String,
    },
}

impl BrokerError {
    /// Wraps a transport or backend error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
