//! Uniqueness and state constraint enforcement in `PostgreSQL`.

use crate::postgres::helpers::{PreparedRepo, owner, pending_record, prepared, task_id};
use chrono::Utc;
use diesel::RunQueryDsl;
use rstest::rstest;
use taskmeta::tracking::{
    domain::TaskState,
    ports::{StateUpdate, TaskRecordRepository, TaskRecordRepositoryError},
};

#[rstest]
fn insert_rejects_duplicate_task_for_owner(#[from(prepared)] ctx: PreparedRepo) {
    let file = owner("media.jpeg_file", "1");
    let record = pending_record("etag-dup", &file);
    ctx.runtime
        .block_on(ctx.repo.insert(&record))
        .expect("first insert");

    let result = ctx.runtime.block_on(ctx.repo.insert(&record));

    assert!(
        matches!(
            &result,
            Err(TaskRecordRepositoryError::UniquenessViolation { task_id: id, owner: dup })
                if id == record.task_id() && dup == &file
        ),
        "Expected UniquenessViolation error, got: {result:?}"
    );
}

#[rstest]
fn same_task_may_be_tracked_by_other_owners(#[from(prepared)] ctx: PreparedRepo) {
    for tracked_by in [
        owner("media.jpeg_file", "2"),
        owner("media.jpeg_file", "3"),
        owner("media.png_file", "2"),
    ] {
        ctx.runtime
            .block_on(ctx.repo.insert(&pending_record("etag-shared", &tracked_by)))
            .expect("insert record");
    }

    let shared = ctx
        .runtime
        .block_on(ctx.repo.find_by_task_id(&task_id("etag-shared")))
        .expect("shared records");

    assert_eq!(shared.len(), 3);
}

#[rstest]
fn upsert_returns_existing_record_untouched(#[from(prepared)] ctx: PreparedRepo) {
    let file = owner("media.jpeg_file", "4");
    let first = pending_record("etag-upsert", &file);
    let created = ctx
        .runtime
        .block_on(ctx.repo.upsert(&first))
        .expect("first upsert");
    ctx.runtime
        .block_on(ctx.repo.update_state(&StateUpdate::unconditional(
            task_id("etag-upsert"),
            TaskState::Success,
            Utc::now(),
        )))
        .expect("update state");

    let again = ctx
        .runtime
        .block_on(ctx.repo.upsert(&pending_record("etag-upsert", &file)))
        .expect("second upsert");

    assert_eq!(created.state(), TaskState::Pending);
    assert_eq!(again.state(), TaskState::Success);
    let records = ctx
        .runtime
        .block_on(ctx.repo.find_by_task_id(&task_id("etag-upsert")))
        .expect("records");
    assert_eq!(records.len(), 1);
}

#[rstest]
fn unknown_state_is_rejected_by_schema(#[from(prepared)] ctx: PreparedRepo) {
    let mut conn = ctx.connection();

    let result = diesel::sql_query(concat!(
        "INSERT INTO task_records (id, task_id, owner_kind, owner_id, state) ",
        "VALUES (gen_random_uuid(), 'etag-bad', 'media.jpeg_file', '5', 'EXPLODED')",
    ))
    .execute(&mut conn);

    assert!(result.is_err(), "Expected check constraint violation");
}
