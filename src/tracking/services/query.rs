//! Owner-collection filters joined through tracked task records.

use super::TrackingResult;
use crate::tracking::{
    domain::{OwnerId, OwnerKind, OwnerRef, StateFilter, TaskState, Trackable},
    ports::TaskRecordRepository,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Filters collections of owners by the state of the tasks they track.
///
/// Owners of different kinds may be mixed in one collection. Results keep
/// the input order.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), taskmeta::tracking::services::TrackingError> {
/// use std::sync::Arc;
/// use taskmeta::tracking::{
///     adapters::memory::InMemoryTaskRecordRepository,
///     domain::OwnerRef,
///     services::OwnerQuery,
/// };
///
/// let query = OwnerQuery::new(Arc::new(InMemoryTaskRecordRepository::new()));
/// let owners = vec![OwnerRef::from_parts("jpeg_file", "1")?];
/// let busy = query.with_running_tasks(owners).await?;
/// assert!(busy.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OwnerQuery<R>
where
    R: TaskRecordRepository,
{
    repository: Arc<R>,
}

impl<R> OwnerQuery<R>
where
    R: TaskRecordRepository,
{
    /// Creates a query over `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Keeps owners tracking at least one task matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn filter<T>(
        &self,
        owners: impl IntoIterator<Item = T>,
        filter: StateFilter,
    ) -> TrackingResult<Vec<T>>
    where
        T: Trackable,
    {
        self.partition(owners, filter, true).await
    }

    /// Keeps owners tracking no task matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn exclude<T>(
        &self,
        owners: impl IntoIterator<Item = T>,
        filter: StateFilter,
    ) -> TrackingResult<Vec<T>>
    where
        T: Trackable,
    {
        self.partition(owners, filter, false).await
    }

    async fn partition<T>(
        &self,
        owners: impl IntoIterator<Item = T>,
        filter: StateFilter,
        keep_matching: bool,
    ) -> TrackingResult<Vec<T>>
    where
        T: Trackable,
    {
        let tagged: Vec<(OwnerRef, T)> = owners
            .into_iter()
            .map(|owner| (owner.owner_ref(), owner))
            .collect();

        let mut candidates: BTreeMap<OwnerKind, Vec<OwnerId>> = BTreeMap::new();
        for (owner_ref, _) in &tagged {
            candidates
                .entry(owner_ref.kind().clone())
                .or_default()
                .push(owner_ref.id().clone());
        }

        let mut matched = HashSet::new();
        for (kind, ids) in candidates {
            let hits = self
                .repository
                .find_owners_with_tasks(&kind, &ids, filter)
                .await?;
            matched.extend(hits.into_iter().map(|id| OwnerRef::new(kind.clone(), id)));
        }

        Ok(tagged
            .into_iter()
            .filter(|(owner_ref, _)| matched.contains(owner_ref) == keep_matching)
            .map(|(_, owner)| owner)
            .collect())
    }

    /// Keeps owners tracking any task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn with_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.filter(owners, StateFilter::Any).await
    }

    /// Keeps owners tracking no task at all.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn without_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.exclude(owners, StateFilter::Any).await
    }

    /// Keeps owners with a pending task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn with_pending_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.filter(owners, TaskState::Pending.into()).await
    }

    /// Keeps owners without a pending task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn without_pending_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.exclude(owners, TaskState::Pending.into()).await
    }

    /// Keeps owners with a started task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn with_started_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.filter(owners, TaskState::Started.into()).await
    }

    /// Keeps owners without a started task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn without_started_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.exclude(owners, TaskState::Started.into()).await
    }

    /// Keeps owners with a task awaiting retry.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn with_retrying_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.filter(owners, TaskState::Retry.into()).await
    }

    /// Keeps owners without a task awaiting retry.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn without_retrying_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.exclude(owners, TaskState::Retry.into()).await
    }

    /// Keeps owners with a failed task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn with_failed_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.filter(owners, TaskState::Failure.into()).await
    }

    /// Keeps owners without a failed task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn without_failed_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.exclude(owners, TaskState::Failure.into()).await
    }

    /// Keeps owners with a successful task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn with_successful_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.filter(owners, TaskState::Success.into()).await
    }

    /// Keeps owners without a successful task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn without_successful_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.exclude(owners, TaskState::Success.into()).await
    }

    /// Keeps owners with a rejected task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn with_rejected_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.filter(owners, TaskState::Rejected.into()).await
    }

    /// Keeps owners without a rejected task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn without_rejected_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.exclude(owners, TaskState::Rejected.into()).await
    }

    /// Keeps owners with a task that has not finished.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn with_running_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.filter(owners, StateFilter::Running).await
    }

    /// Keeps owners whose tasks have all finished, or who track none.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn without_running_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.exclude(owners, StateFilter::Running).await
    }

    /// Keeps owners with a finished task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn with_ready_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.filter(owners, StateFilter::Ready).await
    }

    /// Keeps owners with no finished task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TrackingError::Repository`] when the store fails.
    pub async fn without_ready_tasks<T: Trackable>(
        &self,
        owners: impl IntoIterator<Item = T>,
    ) -> TrackingResult<Vec<T>> {
        self.exclude(owners, StateFilter::Ready).await
    }
}
