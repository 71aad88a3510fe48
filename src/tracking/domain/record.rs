//! Task-tracking rows and the record-collection filter vocabulary.

use super::{OwnerRef, StateFilter, TaskId, TaskState};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Persisted association between one task identifier and one owner.
///
/// The pair `(task_id, owner)` is unique across the store. `state` is only
/// ever changed by lifecycle notifications, never by owners directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    task_id: TaskId,
    owner: OwnerRef,
    state: TaskState,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskRecordData {
    /// Persisted task identifier.
    pub task_id: TaskId,
    /// Persisted owner reference.
    pub owner: OwnerRef,
    /// Persisted lifecycle state.
    pub state: TaskState,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// Creates a new `Pending` record for a task submitted on behalf of
    /// `owner`.
    #[must_use]
    pub fn new(task_id: TaskId, owner: OwnerRef, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            task_id,
            owner,
            state: TaskState::Pending,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskRecordData) -> Self {
        Self {
            task_id: data.task_id,
            owner: data.owner,
            state: data.state,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the tracked task identifier.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the owning record reference.
    #[must_use]
    pub const fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    /// Returns the last-known lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TaskState {
        self.state
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the tracked task reached a terminal state.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.state.is_terminal()
    }

    /// Overwrites the state and refreshes `updated_at`.
    ///
    /// Storage adapters call this when applying a bulk state update; the
    /// creation timestamp is never touched.
    pub const fn apply_state(&mut self, state: TaskState, at: DateTime<Utc>) {
        self.state = state;
        self.updated_at = at;
    }
}

impl fmt::Display for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.task_id, self.state)
    }
}

/// Ordered collection of task records with state filters.
///
/// Every filter returns a new collection, so filters chain the same way a
/// query would.
///
/// # Examples
///
/// ```
/// use taskmeta::tracking::domain::{OwnerRef, TaskId, TaskRecord, TaskRecords};
/// use mockable::DefaultClock;
///
/// let owner = OwnerRef::from_parts("media.jpeg_file", "1").expect("valid owner");
/// let task_id = TaskId::new("etag-1").expect("valid task id");
/// let records = TaskRecords::from(vec![TaskRecord::new(task_id, owner, &DefaultClock)]);
///
/// assert_eq!(records.running().len(), 1);
/// assert!(!records.ready().exists());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskRecords(Vec<TaskRecord>);

impl TaskRecords {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Keeps the records whose state satisfies `filter`.
    #[must_use]
    pub fn matching(&self, filter: StateFilter) -> Self {
        self.0
            .iter()
            .filter(|record| filter.matches(record.state()))
            .cloned()
            .collect()
    }

    /// Records in [`TaskState::Pending`].
    #[must_use]
    pub fn pending(&self) -> Self {
        self.matching(StateFilter::Only(TaskState::Pending))
    }

    /// Records in [`TaskState::Started`].
    #[must_use]
    pub fn started(&self) -> Self {
        self.matching(StateFilter::Only(TaskState::Started))
    }

    /// Records in [`TaskState::Retry`].
    #[must_use]
    pub fn retrying(&self) -> Self {
        self.matching(StateFilter::Only(TaskState::Retry))
    }

    /// Records in [`TaskState::Failure`].
    #[must_use]
    pub fn failed(&self) -> Self {
        self.matching(StateFilter::Only(TaskState::Failure))
    }

    /// Records in [`TaskState::Success`].
    #[must_use]
    pub fn successful(&self) -> Self {
        self.matching(StateFilter::Only(TaskState::Success))
    }

    /// Records in [`TaskState::Rejected`].
    #[must_use]
    pub fn rejected(&self) -> Self {
        self.matching(StateFilter::Only(TaskState::Rejected))
    }

    /// Records in any running state.
    #[must_use]
    pub fn running(&self) -> Self {
        self.matching(StateFilter::Running)
    }

    /// Records in any terminal state.
    #[must_use]
    pub fn ready(&self) -> Self {
        self.matching(StateFilter::Ready)
    }

    /// Returns the record tracking `task_id`, if present.
    #[must_use]
    pub fn get(&self, task_id: &TaskId) -> Option<&TaskRecord> {
        self.0.iter().find(|record| record.task_id() == task_id)
    }

    /// Returns `true` when the collection holds at least one record.
    #[must_use]
    pub fn exists(&self) -> bool {
        !self.0.is_empty()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, TaskRecord> {
        self.0.iter()
    }

    /// Returns the task identifiers in collection order.
    #[must_use]
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.0.iter().map(|record| record.task_id().clone()).collect()
    }

    /// Consumes the collection and returns the records.
    #[must_use]
    pub fn into_inner(self) -> Vec<TaskRecord> {
        self.0
    }
}

impl From<Vec<TaskRecord>> for TaskRecords {
    fn from(value: Vec<TaskRecord>) -> Self {
        Self(value)
    }
}

impl FromIterator<TaskRecord> for TaskRecords {
    fn from_iter<I: IntoIterator<Item = TaskRecord>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for TaskRecords {
    type Item = TaskRecord;
    type IntoIter = std::vec::IntoIter<TaskRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TaskRecords {
    type Item = &'a TaskRecord;
    type IntoIter = std::slice::Iter<'a, TaskRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
