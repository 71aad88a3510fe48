//! In-memory task-record repository for tests and embedded use.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::tracking::{
    domain::{OwnerId, OwnerKind, OwnerRef, StateFilter, TaskId, TaskRecord, TaskRecords},
    ports::{
        StateUpdate, TaskRecordRepository, TaskRecordRepositoryError, TaskRecordRepositoryResult,
    },
};

/// Thread-safe in-memory task-record repository.
///
/// Each operation runs under a single lock acquisition, which gives the
/// same atomicity a single SQL statement would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRecordRepository {
    state: Arc<RwLock<InMemoryRecordState>>,
}

type RecordKey = (TaskId, OwnerRef);

#[derive(Debug, Default)]
struct InMemoryRecordState {
    records: HashMap<RecordKey, TaskRecord>,
    task_index: HashMap<TaskId, Vec<OwnerRef>>,
    owner_index: HashMap<OwnerRef, Vec<TaskId>>,
}

impl InMemoryTaskRecordRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRecordRepositoryError::Persistence`] when the lock is
    /// poisoned.
    pub fn len(&self) -> TaskRecordRepositoryResult<usize> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.records.len())
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> TaskRecordRepositoryError {
    TaskRecordRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Removes `value` from a keyed index, cleaning up the entry if empty.
fn remove_from_index<K, V>(index: &mut HashMap<K, Vec<V>>, key: &K, value: &V)
where
    K: std::hash::Hash + Eq,
    V: PartialEq,
{
    if let Some(values) = index.get_mut(key) {
        values.retain(|existing| existing != value);
        if values.is_empty() {
            index.remove(key);
        }
    }
}

#[async_trait]
impl TaskRecordRepository for InMemoryTaskRecordRepository {
    async fn insert(&self, record: &TaskRecord) -> TaskRecordRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let key = (record.task_id().clone(), record.owner().clone());
        if state.records.contains_key(&key) {
            return Err(TaskRecordRepositoryError::duplicate(record));
        }

        state
            .task_index
            .entry(record.task_id().clone())
            .or_default()
            .push(record.owner().clone());
        state
            .owner_index
            .entry(record.owner().clone())
            .or_default()
            .push(record.task_id().clone());
        state.records.insert(key, record.clone());
        Ok(())
    }

    async fn find(
        &self,
        owner: &OwnerRef,
        task_id: &TaskId,
    ) -> TaskRecordRepositoryResult<Option<TaskRecord>> {
        let state = self.state.read().map_err(poisoned)?;
        let key = (task_id.clone(), owner.clone());
        Ok(state.records.get(&key).cloned())
    }

    async fn find_by_owner(
        &self,
        owner: &OwnerRef,
        filter: StateFilter,
    ) -> TaskRecordRepositoryResult<TaskRecords> {
        let state = self.state.read().map_err(poisoned)?;
        let records = state
            .owner_index
            .get(owner)
            .map(|task_ids| {
                task_ids
                    .iter()
                    .filter_map(|task_id| state.records.get(&(task_id.clone(), owner.clone())))
                    .filter(|record| filter.matches(record.state()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }

    async fn find_by_task_id(&self, task_id: &TaskId) -> TaskRecordRepositoryResult<TaskRecords> {
        let state = self.state.read().map_err(poisoned)?;
        let records = state
            .task_index
            .get(task_id)
            .map(|owners| {
                owners
                    .iter()
                    .filter_map(|owner| state.records.get(&(task_id.clone(), owner.clone())))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }

    async fn find_owners_with_tasks(
        &self,
        kind: &OwnerKind,
        candidates: &[OwnerId],
        filter: StateFilter,
    ) -> TaskRecordRepositoryResult<Vec<OwnerId>> {
        let state = self.state.read().map_err(poisoned)?;
        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        for id in candidates {
            if !seen.insert(id) {
                continue;
            }
            let owner = OwnerRef::new(kind.clone(), id.clone());
            let has_match = state.owner_index.get(&owner).is_some_and(|task_ids| {
                task_ids.iter().any(|task_id| {
                    state
                        .records
                        .get(&(task_id.clone(), owner.clone()))
                        .is_some_and(|record| filter.matches(record.state()))
                })
            });
            if has_match {
                matched.push(id.clone());
            }
        }
        Ok(matched)
    }

    async fn update_state(&self, update: &StateUpdate) -> TaskRecordRepositoryResult<u64> {
        let mut guard = self.state.write().map_err(poisoned)?;
        let state = &mut *guard;
        let Some(owners) = state.task_index.get(update.task_id()) else {
            return Ok(0);
        };

        let mut affected = 0_u64;
        for owner in owners {
            let key = (update.task_id().clone(), owner.clone());
            if let Some(record) = state.records.get_mut(&key)
                && update.applies_to(record.updated_at())
            {
                record.apply_state(update.state(), update.at());
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn delete_by_task_id(&self, task_id: &TaskId) -> TaskRecordRepositoryResult<u64> {
        let mut guard = self.state.write().map_err(poisoned)?;
        let state = &mut *guard;
        let Some(owners) = state.task_index.remove(task_id) else {
            return Ok(0);
        };

        let mut removed = 0_u64;
        for owner in owners {
            if state.records.remove(&(task_id.clone(), owner.clone())).is_some() {
                removed += 1;
            }
            remove_from_index(&mut state.owner_index, &owner, task_id);
        }
        Ok(removed)
    }
}
