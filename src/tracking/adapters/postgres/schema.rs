//! Diesel schema for task-record persistence.

diesel::table! {
    /// One row per tracked `(task_id, owner)` pair.
    task_records (id) {
        /// Surrogate row identifier.
        id -> Uuid,
        /// Broker task identifier.
        #[max_length = 255]
        task_id -> Varchar,
        /// Owning record kind.
        owner_kind -> Text,
        /// Owning record identifier.
        owner_id -> Text,
        /// Lifecycle state name.
        #[max_length = 50]
        state -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last state change timestamp.
        updated_at -> Timestamptz,
    }
}
