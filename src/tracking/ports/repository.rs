//! Repository port for task-record persistence and lookup.

use crate::tracking::domain::{
    OwnerId, OwnerKind, OwnerRef, StateFilter, TaskId, TaskRecord, TaskRecords, TaskState,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task-record repository operations.
pub type TaskRecordRepositoryResult<T> = Result<T, TaskRecordRepositoryError>;

/// Bulk state overwrite applied to every record of one task identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateUpdate {
    task_id: TaskId,
    state: TaskState,
    at: DateTime<Utc>,
    ordered: bool,
}

impl StateUpdate {
    /// Overwrites every matching record regardless of its current
    /// timestamp.
    #[must_use]
    pub const fn unconditional(task_id: TaskId, state: TaskState, at: DateTime<Utc>) -> Self {
        Self {
            task_id,
            state,
            at,
            ordered: false,
        }
    }

    /// Overwrites only records whose stored `updated_at` is not newer than
    /// `at`, so a late-delivered older event cannot clobber a newer state.
    #[must_use]
    pub const fn ordered(task_id: TaskId, state: TaskState, at: DateTime<Utc>) -> Self {
        Self {
            task_id,
            state,
            at,
            ordered: true,
        }
    }

    /// Returns the task identifier the update is scoped to.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the state to write.
    #[must_use]
    pub const fn state(&self) -> TaskState {
        self.state
    }

    /// Returns the timestamp written to `updated_at`.
    #[must_use]
    pub const fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// Returns `true` when the stale-event guard applies.
    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Returns `true` when a record last updated at `updated_at` should
    /// receive this update.
    #[must_use]
    pub fn applies_to(&self, updated_at: DateTime<Utc>) -> bool {
        !self.ordered || updated_at <= self.at
    }
}

/// Task-record persistence contract.
///
/// Every mutation is a single atomic store operation; implementations must
/// enforce the `(task_id, owner)` uniqueness themselves rather than rely on
/// callers checking first.
#[async_trait]
pub trait TaskRecordRepository: Send + Sync {
    /// Stores a new record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRecordRepositoryError::UniquenessViolation`] when the
    /// owner already tracks the task identifier.
    async fn insert(&self, record: &TaskRecord) -> TaskRecordRepositoryResult<()>;

    /// Finds the record for an `(owner, task_id)` pair.
    ///
    /// Returns `None` when the owner does not track the task.
    async fn find(
        &self,
        owner: &OwnerRef,
        task_id: &TaskId,
    ) -> TaskRecordRepositoryResult<Option<TaskRecord>>;

    /// Returns the owner's records whose state satisfies `filter`, oldest
    /// first.
    async fn find_by_owner(
        &self,
        owner: &OwnerRef,
        filter: StateFilter,
    ) -> TaskRecordRepositoryResult<TaskRecords>;

    /// Returns every record tracking `task_id`, across all owners.
    async fn find_by_task_id(&self, task_id: &TaskId) -> TaskRecordRepositoryResult<TaskRecords>;

    /// Returns the subset of `candidates` (owners of `kind`) that track at
    /// least one task whose state satisfies `filter`.
    async fn find_owners_with_tasks(
        &self,
        kind: &OwnerKind,
        candidates: &[OwnerId],
        filter: StateFilter,
    ) -> TaskRecordRepositoryResult<Vec<OwnerId>>;

    /// Applies a bulk state update and returns the number of records
    /// changed.
    async fn update_state(&self, update: &StateUpdate) -> TaskRecordRepositoryResult<u64>;

    /// Deletes every record tracking `task_id` and returns how many were
    /// removed.
    async fn delete_by_task_id(&self, task_id: &TaskId) -> TaskRecordRepositoryResult<u64>;

    /// Returns the record for `(owner, task_id)`, creating a `Pending` one
    /// when absent.
    ///
    /// An existing record keeps its state.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRecordRepositoryError::UniquenessViolation`] when a
    /// concurrent caller created the record between lookup and insert.
    async fn upsert(&self, candidate: &TaskRecord) -> TaskRecordRepositoryResult<TaskRecord> {
        if let Some(existing) = self.find(candidate.owner(), candidate.task_id()).await? {
            return Ok(existing);
        }
        self.insert(candidate).await?;
        Ok(candidate.clone())
    }
}

/// Errors returned by task-record repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRecordRepositoryError {
    /// The owner already tracks the task identifier.
    #[error("task {task_id} is already tracked for {owner}")]
    UniquenessViolation {
        /// Duplicated task identifier.
        task_id: TaskId,
        /// Owner that already tracks it.
        owner: OwnerRef,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRecordRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Builds a uniqueness violation for `record`.
    #[must_use]
    pub fn duplicate(record: &TaskRecord) -> Self {
        Self::UniquenessViolation {
            task_id: record.task_id().clone(),
            owner: record.owner().clone(),
        }
    }
}
