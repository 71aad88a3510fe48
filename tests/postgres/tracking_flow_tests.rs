//! Tracking service and in-memory broker running against `PostgreSQL`.

use crate::postgres::helpers::{PreparedRepo, owner, prepared, task_id};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use taskmeta::tracking::{
    adapters::memory::InMemoryBroker,
    ports::TaskSpec,
    services::{DispatcherConfig, LifecycleDispatcher, SubmitTaskRequest, TaskTrackingService},
};

#[rstest]
fn lifecycle_reaches_every_owner_then_forget_purges(#[from(prepared)] ctx: PreparedRepo) {
    let repository = Arc::new(ctx.repo.clone());
    let clock = Arc::new(DefaultClock);
    let dispatcher = Arc::new(LifecycleDispatcher::tracking(
        Arc::clone(&repository),
        Arc::clone(&clock),
        DispatcherConfig::ordered(),
    ));
    let broker = Arc::new(InMemoryBroker::new(dispatcher, Arc::clone(&clock)));
    let service = TaskTrackingService::new(repository, Arc::clone(&broker), clock);
    let first = owner("media.jpeg_file", "1");
    let second = owner("media.jpeg_file", "2");
    let shared = task_id("etag-pg");

    ctx.runtime.block_on(async {
        for file in [&first, &second] {
            service
                .submit(
                    file,
                    SubmitTaskRequest::new(TaskSpec::new("media.generate_thumbnail"))
                        .with_task_id(shared.clone()),
                )
                .await
                .expect("submit task");
        }
        broker.start(&shared).await.expect("start task");
        assert!(service.has_running_task(&first).await.expect("running"));

        broker.succeed(&shared).await.expect("finish task");
        for file in [&first, &second] {
            assert!(service.has_ready_task(file).await.expect("ready"));
        }
        let with_ready = service
            .owner_query()
            .with_successful_tasks(vec![first.clone(), second.clone()])
            .await
            .expect("owner query");
        assert_eq!(with_ready.len(), 2);

        service
            .result(shared.clone())
            .forget()
            .await
            .expect("forget result");
        assert!(
            service
                .owners_of(&shared)
                .await
                .expect("owners")
                .is_empty()
        );
    });
}

#[rstest]
fn revocation_purges_postgres_rows(#[from(prepared)] ctx: PreparedRepo) {
    let repository = Arc::new(ctx.repo.clone());
    let clock = Arc::new(DefaultClock);
    let dispatcher = Arc::new(LifecycleDispatcher::tracking(
        Arc::clone(&repository),
        Arc::clone(&clock),
        DispatcherConfig::default(),
    ));
    let broker = Arc::new(InMemoryBroker::new(dispatcher, Arc::clone(&clock)));
    let service = TaskTrackingService::new(repository, broker, clock);
    let file = owner("media.png_file", "9");

    ctx.runtime.block_on(async {
        let pending = service
            .submit(
                &file,
                SubmitTaskRequest::new(TaskSpec::new("media.generate_thumbnail")),
            )
            .await
            .expect("submit task");
        service
            .revoke(pending.task_id())
            .await
            .expect("revoke task");

        assert!(
            service
                .task_records(&file)
                .await
                .expect("records")
                .is_empty()
        );
    });
}
