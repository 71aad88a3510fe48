//! `PostgreSQL` repository implementation for task-record storage.

use super::{
    models::{NewTaskRecordRow, TaskRecordRow},
    schema::task_records,
};
use crate::tracking::{
    domain::{
        OwnerId, OwnerKind, OwnerRef, PersistedTaskRecordData, StateFilter, TaskId, TaskRecord,
        TaskRecords, TaskState,
    },
    ports::{
        StateUpdate, TaskRecordRepository, TaskRecordRepositoryError, TaskRecordRepositoryResult,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use std::collections::HashSet;

/// `PostgreSQL` connection pool type used by tracking adapters.
pub type TrackingPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task-record repository.
///
/// Uniqueness of `(task_id, owner_kind, owner_id)` is enforced by the
/// `idx_task_records_task_owner_unique` index; bulk state changes and
/// deletions are single statements.
#[derive(Debug, Clone)]
pub struct PostgresTaskRecordRepository {
    pool: TrackingPgPool,
}

impl PostgresTaskRecordRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TrackingPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRecordRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRecordRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRecordRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRecordRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskRecordRepository for PostgresTaskRecordRepository {
    async fn insert(&self, record: &TaskRecord) -> TaskRecordRepositoryResult<()> {
        let new_row = to_new_row(record);
        let duplicate = TaskRecordRepositoryError::duplicate(record);

        self.run_blocking(move |connection| {
            diesel::insert_into(task_records::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_task_owner_unique_violation(info.as_ref()) =>
                    {
                        duplicate
                    }
                    _ => TaskRecordRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find(
        &self,
        owner: &OwnerRef,
        task_id: &TaskId,
    ) -> TaskRecordRepositoryResult<Option<TaskRecord>> {
        let lookup_owner = owner.clone();
        let lookup_task_id = task_id.clone();
        self.run_blocking(move |connection| {
            find_row(connection, &lookup_owner, &lookup_task_id)?
                .map(row_to_record)
                .transpose()
        })
        .await
    }

    async fn find_by_owner(
        &self,
        owner: &OwnerRef,
        filter: StateFilter,
    ) -> TaskRecordRepositoryResult<TaskRecords> {
        let owner_kind = owner.kind().as_str().to_owned();
        let owner_id = owner.id().as_str().to_owned();
        let states = state_names(filter);
        self.run_blocking(move |connection| {
            let rows = task_records::table
                .filter(task_records::owner_kind.eq(owner_kind))
                .filter(task_records::owner_id.eq(owner_id))
                .filter(task_records::state.eq_any(states))
                .order((task_records::created_at.asc(), task_records::task_id.asc()))
                .select(TaskRecordRow::as_select())
                .load::<TaskRecordRow>(connection)
                .map_err(TaskRecordRepositoryError::persistence)?;
            rows.into_iter().map(row_to_record).collect()
        })
        .await
    }

    async fn find_by_task_id(&self, task_id: &TaskId) -> TaskRecordRepositoryResult<TaskRecords> {
        let lookup_task_id = task_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = task_records::table
                .filter(task_records::task_id.eq(lookup_task_id))
                .order((
                    task_records::created_at.asc(),
                    task_records::owner_kind.asc(),
                    task_records::owner_id.asc(),
                ))
                .select(TaskRecordRow::as_select())
                .load::<TaskRecordRow>(connection)
                .map_err(TaskRecordRepositoryError::persistence)?;
            rows.into_iter().map(row_to_record).collect()
        })
        .await
    }

    async fn find_owners_with_tasks(
        &self,
        kind: &OwnerKind,
        candidates: &[OwnerId],
        filter: StateFilter,
    ) -> TaskRecordRepositoryResult<Vec<OwnerId>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let owner_kind = kind.as_str().to_owned();
        let candidate_ids: Vec<String> = candidates
            .iter()
            .map(|id| id.as_str().to_owned())
            .collect();
        let states = state_names(filter);
        let matched = self
            .run_blocking(move |connection| {
                task_records::table
                    .filter(task_records::owner_kind.eq(owner_kind))
                    .filter(task_records::owner_id.eq_any(candidate_ids))
                    .filter(task_records::state.eq_any(states))
                    .select(task_records::owner_id)
                    .distinct()
                    .load::<String>(connection)
                    .map_err(TaskRecordRepositoryError::persistence)
            })
            .await?;

        let matched: HashSet<String> = matched.into_iter().collect();
        let mut seen = HashSet::new();
        Ok(candidates
            .iter()
            .filter(|id| matched.contains(id.as_str()) && seen.insert(*id))
            .cloned()
            .collect())
    }

    async fn update_state(&self, update: &StateUpdate) -> TaskRecordRepositoryResult<u64> {
        let task_id = update.task_id().as_str().to_owned();
        let state = update.state().as_str().to_owned();
        let at = update.at();
        let ordered = update.is_ordered();
        self.run_blocking(move |connection| {
            let matching = task_records::table.filter(task_records::task_id.eq(task_id));
            let changes = (
                task_records::state.eq(state),
                task_records::updated_at.eq(at),
            );
            let affected = if ordered {
                diesel::update(matching.filter(task_records::updated_at.le(at)))
                    .set(changes)
                    .execute(connection)
            } else {
                diesel::update(matching).set(changes).execute(connection)
            }
            .map_err(TaskRecordRepositoryError::persistence)?;
            u64::try_from(affected).map_err(TaskRecordRepositoryError::persistence)
        })
        .await
    }

    async fn delete_by_task_id(&self, task_id: &TaskId) -> TaskRecordRepositoryResult<u64> {
        let lookup_task_id = task_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let removed = diesel::delete(
                task_records::table.filter(task_records::task_id.eq(lookup_task_id)),
            )
            .execute(connection)
            .map_err(TaskRecordRepositoryError::persistence)?;
            u64::try_from(removed).map_err(TaskRecordRepositoryError::persistence)
        })
        .await
    }

    async fn upsert(&self, candidate: &TaskRecord) -> TaskRecordRepositoryResult<TaskRecord> {
        let new_row = to_new_row(candidate);
        let owner = candidate.owner().clone();
        let task_id = candidate.task_id().clone();
        let duplicate = TaskRecordRepositoryError::duplicate(candidate);

        self.run_blocking(move |connection| {
            connection
                .transaction::<_, DieselError, _>(|tx| {
                    diesel::insert_into(task_records::table)
                        .values(&new_row)
                        .on_conflict((
                            task_records::task_id,
                            task_records::owner_kind,
                            task_records::owner_id,
                        ))
                        .do_nothing()
                        .execute(tx)?;
                    task_records::table
                        .filter(task_records::task_id.eq(task_id.as_str()))
                        .filter(task_records::owner_kind.eq(owner.kind().as_str()))
                        .filter(task_records::owner_id.eq(owner.id().as_str()))
                        .select(TaskRecordRow::as_select())
                        .first::<TaskRecordRow>(tx)
                        .optional()
                })
                .map_err(TaskRecordRepositoryError::persistence)?
                .ok_or(duplicate)
                .and_then(row_to_record)
        })
        .await
    }
}

fn find_row(
    connection: &mut PgConnection,
    owner: &OwnerRef,
    task_id: &TaskId,
) -> TaskRecordRepositoryResult<Option<TaskRecordRow>> {
    task_records::table
        .filter(task_records::task_id.eq(task_id.as_str()))
        .filter(task_records::owner_kind.eq(owner.kind().as_str()))
        .filter(task_records::owner_id.eq(owner.id().as_str()))
        .select(TaskRecordRow::as_select())
        .first::<TaskRecordRow>(connection)
        .optional()
        .map_err(TaskRecordRepositoryError::persistence)
}

fn state_names(filter: StateFilter) -> Vec<&'static str> {
    filter.states().into_iter().map(TaskState::as_str).collect()
}

fn to_new_row(record: &TaskRecord) -> NewTaskRecordRow {
    NewTaskRecordRow {
        id: uuid::Uuid::new_v4(),
        task_id: record.task_id().as_str().to_owned(),
        owner_kind: record.owner().kind().as_str().to_owned(),
        owner_id: record.owner().id().as_str().to_owned(),
        state: record.state().as_str().to_owned(),
        created_at: record.created_at(),
        updated_at: record.updated_at(),
    }
}

fn row_to_record(row: TaskRecordRow) -> TaskRecordRepositoryResult<TaskRecord> {
    let TaskRecordRow {
        task_id: persisted_task_id,
        owner_kind,
        owner_id,
        state: persisted_state,
        created_at,
        updated_at,
        ..
    } = row;

    let task_id = TaskId::new(persisted_task_id).map_err(TaskRecordRepositoryError::persistence)?;
    let owner =
        OwnerRef::from_parts(owner_kind, owner_id).map_err(TaskRecordRepositoryError::persistence)?;
    let state =
        TaskState::try_from(persisted_state.as_str()).map_err(TaskRecordRepositoryError::persistence)?;

    Ok(TaskRecord::from_persisted(PersistedTaskRecordData {
        task_id,
        owner,
        state,
        created_at,
        updated_at,
    }))
}

fn is_task_owner_unique_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == "idx_task_records_task_owner_unique")
}
