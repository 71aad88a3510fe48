//! Broker result handle with task-record cleanup.

use super::TrackingError;
use crate::tracking::{
    domain::{TaskId, TaskRecords, TaskState},
    ports::{TaskBroker, TaskRecordRepository},
};
use std::sync::Arc;

/// Handle over the broker result of one task that also owns the cleanup
/// of its task records.
pub struct TrackedResult<R, B>
where
    R: TaskRecordRepository,
    B: TaskBroker,
{
    task_id: TaskId,
    repository: Arc<R>,
    broker: Arc<B>,
}

impl<R, B> Clone for TrackedResult<R, B>
where
    R: TaskRecordRepository,
    B: TaskBroker,
{
    fn clone(&self) -> Self {
        Self {
            task_id: self.task_id.clone(),
            repository: Arc::clone(&self.repository),
            broker: Arc::clone(&self.broker),
        }
    }
}

impl<R, B> std::fmt::Debug for TrackedResult<R, B>
where
    R: TaskRecordRepository,
    B: TaskBroker,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedResult")
            .field("task_id", &self.task_id)
            .finish_non_exhaustive()
    }
}

impl<R, B> TrackedResult<R, B>
where
    R: TaskRecordRepository,
    B: TaskBroker,
{
    /// Creates a handle for `task_id`.
    #[must_use]
    pub const fn new(task_id: TaskId, repository: Arc<R>, broker: Arc<B>) -> Self {
        Self {
            task_id,
            repository,
            broker,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the broker-side state.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Broker`] when the broker cannot be queried.
    pub async fn state(&self) -> Result<TaskState, TrackingError> {
        Ok(self.broker.result_state(&self.task_id).await?)
    }

    /// Returns `true` when the broker reports a terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Broker`] when the broker cannot be queried.
    pub async fn is_ready(&self) -> Result<bool, TrackingError> {
        Ok(self.state().await?.is_terminal())
    }

    /// Returns `true` when the broker reports success.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Broker`] when the broker cannot be queried.
    pub async fn is_successful(&self) -> Result<bool, TrackingError> {
        Ok(self.state().await? == TaskState::Success)
    }

    /// Returns every task record tracking this task.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Repository`] when the store fails.
    pub async fn records(&self) -> Result<TaskRecords, TrackingError> {
        Ok(self.repository.find_by_task_id(&self.task_id).await?)
    }

    /// Deletes every task record for this task, then clears the broker
    /// result.
    ///
    /// Calling this with no records present is a no-op on the store side.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Repository`] when the records cannot be
    /// deleted, in which case the broker result is left untouched, or
    /// [`TrackingError::Broker`] when the broker fails afterwards.
    pub async fn forget(&self) -> Result<(), TrackingError> {
        let removed = self.repository.delete_by_task_id(&self.task_id).await?;
        tracing::debug!(task_id = %self.task_id, removed, "forgot task records");
        self.broker.forget(&self.task_id).await?;
        Ok(())
    }

    /// Clears only the broker-side result, keeping task records.
    pub(crate) async fn forget_broker_result(&self) -> Result<(), TrackingError> {
        self.broker.forget(&self.task_id).await?;
        Ok(())
    }
}

/// Forgets `result` when the broker reports it finished.
///
/// Returns `true` when the result was forgotten.
///
/// # Errors
///
/// Propagates the errors of [`TrackedResult::is_ready`] and
/// [`TrackedResult::forget`].
pub async fn forget_if_ready<R, B>(result: &TrackedResult<R, B>) -> Result<bool, TrackingError>
where
    R: TaskRecordRepository,
    B: TaskBroker,
{
    if !result.is_ready().await? {
        return Ok(false);
    }
    result.forget().await?;
    Ok(true)
}
