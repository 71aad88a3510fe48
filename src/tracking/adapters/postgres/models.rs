//! Diesel row models for task-record persistence.

use super::schema::task_records;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRecordRow {
    /// Surrogate row identifier.
    pub id: uuid::Uuid,
    /// Broker task identifier.
    pub task_id: String,
    /// Owning record kind.
    pub owner_kind: String,
    /// Owning record identifier.
    pub owner_id: String,
    /// Lifecycle state name.
    pub state: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last state change timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_records)]
pub struct NewTaskRecordRow {
    /// Surrogate row identifier.
    pub id: uuid::Uuid,
    /// Broker task identifier.
    pub task_id: String,
    /// Owning record kind.
    pub owner_kind: String,
    /// Owning record identifier.
    pub owner_id: String,
    /// Lifecycle state name.
    pub state: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last state change timestamp.
    pub updated_at: DateTime<Utc>,
}
