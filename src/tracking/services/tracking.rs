//! Service layer for submitting tasks on behalf of owners and reading
//! their tracked state.

use super::{OwnerQuery, OwnerRegistry, TrackedResult, TrackingConfig, forget_if_ready};
use crate::tracking::{
    domain::{
        OwnerKind, OwnerRef, StateFilter, TaskId, TaskRecord, TaskRecords, Trackable,
        TrackingDomainError,
    },
    ports::{
        BrokerError, PendingResult, TaskBroker, TaskRecordRepository, TaskRecordRepositoryError,
        TaskSpec,
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for submitting a tracked task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTaskRequest {
    spec: TaskSpec,
    task_id: Option<TaskId>,
}

impl SubmitTaskRequest {
    /// Creates a request that lets the service generate the task id.
    #[must_use]
    pub const fn new(spec: TaskSpec) -> Self {
        Self {
            spec,
            task_id: None,
        }
    }

    /// Submits under an explicit, possibly reused, task id.
    #[must_use]
    pub fn with_task_id(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Returns the task specification.
    #[must_use]
    pub const fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    /// Returns the explicit task id, if any.
    #[must_use]
    pub const fn task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }
}

/// Service-level errors for task tracking operations.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TrackingDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRecordRepositoryError),
    /// Broker operation failed.
    #[error(transparent)]
    Broker(#[from] BrokerError),
    /// The owner's kind has no registered resolver.
    #[error("owner kind {0} is not registered")]
    UnknownOwnerKind(OwnerKind),
}

/// Result type for task tracking service operations.
pub type TrackingResult<T> = Result<T, TrackingError>;

/// Task tracking orchestration service.
///
/// Owners are anything implementing [`Trackable`]; every operation takes
/// the owner by reference instead of living on the owner type.
#[derive(Clone)]
pub struct TaskTrackingService<R, B, C>
where
    R: TaskRecordRepository,
    B: TaskBroker,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    broker: Arc<B>,
    clock: Arc<C>,
    registry: Arc<OwnerRegistry>,
    config: TrackingConfig,
}

impl<R, B, C> TaskTrackingService<R, B, C>
where
    R: TaskRecordRepository,
    B: TaskBroker,
    C: Clock + Send + Sync,
{
    /// Creates a service with an empty owner registry and default
    /// configuration.
    #[must_use]
    pub fn new(repository: Arc<R>, broker: Arc<B>, clock: Arc<C>) -> Self {
        Self {
            repository,
            broker,
            clock,
            registry: Arc::new(OwnerRegistry::new()),
            config: TrackingConfig::default(),
        }
    }

    /// Replaces the owner registry.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<OwnerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the service configuration.
    #[must_use]
    pub const fn with_config(mut self, config: TrackingConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the owner registry.
    #[must_use]
    pub fn registry(&self) -> &OwnerRegistry {
        &self.registry
    }

    /// Returns an owner-collection query bound to the same store.
    #[must_use]
    pub fn owner_query(&self) -> OwnerQuery<R> {
        OwnerQuery::new(Arc::clone(&self.repository))
    }

    /// Submits a task on behalf of `owner`.
    ///
    /// The tracking record is in place before the broker sees the task, so
    /// no lifecycle event can arrive for an untracked task. When the task
    /// id is already tracked and the broker holds a finished result for
    /// it, that stale broker result is forgotten first.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::UnknownOwnerKind`] when strict owner kinds
    /// are configured and the owner's kind is unregistered,
    /// [`TrackingError::Repository`] when the record cannot be stored (a
    /// concurrent duplicate surfaces as
    /// [`TaskRecordRepositoryError::UniquenessViolation`]), or
    /// [`TrackingError::Broker`] when the broker fails.
    pub async fn submit(
        &self,
        owner: &impl Trackable,
        request: SubmitTaskRequest,
    ) -> TrackingResult<PendingResult> {
        let owner_ref = owner.owner_ref();
        if self.config.require_registered_owner_kinds
            && !self.registry.is_registered(owner_ref.kind())
        {
            return Err(TrackingError::UnknownOwnerKind(owner_ref.kind().clone()));
        }

        let SubmitTaskRequest {
            spec,
            task_id: explicit_id,
        } = request;
        let task_id = explicit_id.unwrap_or_else(TaskId::generate);

        if self.repository.find_by_task_id(&task_id).await?.exists() {
            let prior = self.result(task_id.clone());
            if prior.is_ready().await? {
                prior.forget_broker_result().await?;
                tracing::debug!(%task_id, "forgot finished broker result before reuse");
            }
        }

        let candidate = TaskRecord::new(task_id.clone(), owner_ref, &*self.clock);
        self.repository.upsert(&candidate).await?;
        Ok(self.broker.submit(&spec, &task_id).await?)
    }

    /// Returns every record tracked by `owner`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Repository`] when the store fails.
    pub async fn task_records(&self, owner: &impl Trackable) -> TrackingResult<TaskRecords> {
        self.task_records_matching(owner, StateFilter::Any).await
    }

    /// Returns the owner's records whose state satisfies `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Repository`] when the store fails.
    pub async fn task_records_matching(
        &self,
        owner: &impl Trackable,
        filter: StateFilter,
    ) -> TrackingResult<TaskRecords> {
        Ok(self
            .repository
            .find_by_owner(&owner.owner_ref(), filter)
            .await?)
    }

    /// Returns the owner's record for `task_id`.
    ///
    /// Returns `Ok(None)` when the owner does not track the task.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Repository`] when the store fails.
    pub async fn task_record(
        &self,
        owner: &impl Trackable,
        task_id: &TaskId,
    ) -> TrackingResult<Option<TaskRecord>> {
        Ok(self.repository.find(&owner.owner_ref(), task_id).await?)
    }

    /// Returns `true` when any of the owner's tasks is still running.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Repository`] when the store fails.
    pub async fn has_running_task(&self, owner: &impl Trackable) -> TrackingResult<bool> {
        Ok(self
            .task_records_matching(owner, StateFilter::Running)
            .await?
            .exists())
    }

    /// Returns `true` when any of the owner's tasks has finished.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Repository`] when the store fails.
    pub async fn has_ready_task(&self, owner: &impl Trackable) -> TrackingResult<bool> {
        Ok(self
            .task_records_matching(owner, StateFilter::Ready)
            .await?
            .exists())
    }

    /// Returns the result handle for a task id.
    #[must_use]
    pub fn result(&self, task_id: TaskId) -> TrackedResult<R, B> {
        TrackedResult::new(task_id, Arc::clone(&self.repository), Arc::clone(&self.broker))
    }

    /// Returns a result handle for each task the owner tracks.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Repository`] when the store fails.
    pub async fn task_results(
        &self,
        owner: &impl Trackable,
    ) -> TrackingResult<Vec<TrackedResult<R, B>>> {
        let records = self.task_records(owner).await?;
        Ok(records
            .task_ids()
            .into_iter()
            .map(|task_id| self.result(task_id))
            .collect())
    }

    /// Returns the result handle for one of the owner's tasks.
    ///
    /// Returns `Ok(None)` when the owner does not track the task.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Repository`] when the store fails.
    pub async fn task_result(
        &self,
        owner: &impl Trackable,
        task_id: &TaskId,
    ) -> TrackingResult<Option<TrackedResult<R, B>>> {
        let record = self.task_record(owner, task_id).await?;
        Ok(record.map(|found| self.result(found.task_id().clone())))
    }

    /// Forgets every finished task the owner tracks and returns how many
    /// were forgotten.
    ///
    /// Running tasks are left untouched. Forgetting a task removes its
    /// records for every owner, not just this one.
    ///
    /// # Errors
    ///
    /// Returns the first repository or broker error encountered; tasks
    /// forgotten before the failure stay forgotten.
    pub async fn clear_task_results(&self, owner: &impl Trackable) -> TrackingResult<usize> {
        let mut forgotten = 0;
        for result in self.task_results(owner).await? {
            if forget_if_ready(&result).await? {
                forgotten += 1;
            }
        }
        Ok(forgotten)
    }

    /// Forgets one of the owner's tasks if it has finished.
    ///
    /// Returns `false` when the owner does not track the task or the task
    /// is still running.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError`] when the store or broker fails.
    pub async fn clear_task_result(
        &self,
        owner: &impl Trackable,
        task_id: &TaskId,
    ) -> TrackingResult<bool> {
        let Some(result) = self.task_result(owner, task_id).await? else {
            return Ok(false);
        };
        forget_if_ready(&result).await
    }

    /// Asks the broker to cancel a task.
    ///
    /// Records are purged when the broker reports the revocation back
    /// through the lifecycle dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Broker`] when the broker fails.
    pub async fn revoke(&self, task_id: &TaskId) -> TrackingResult<()> {
        self.broker.revoke(task_id).await?;
        tracing::debug!(%task_id, "requested task revocation");
        Ok(())
    }

    /// Returns every owner tracking `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Repository`] when the store fails.
    pub async fn owners_of(&self, task_id: &TaskId) -> TrackingResult<Vec<OwnerRef>> {
        let records = self.repository.find_by_task_id(task_id).await?;
        Ok(records
            .into_iter()
            .map(|record| record.owner().clone())
            .collect())
    }
}
