//! Uniqueness and owner-kind registration constraints.

use super::helpers::{JpegFile, PngFile, TrackingHarness, harness, task_id, thumbnail};
use async_trait::async_trait;
use eyre::ensure;
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use taskmeta::tracking::{
    domain::{OwnerId, OwnerKind, TaskRecord, Trackable},
    ports::{OwnerResolver, OwnerResolverError, TaskRecordRepository, TaskRecordRepositoryError},
    services::{OwnerRegistry, SubmitTaskRequest, TrackingConfig, TrackingError},
};

struct AllJpegsExist;

#[async_trait]
impl OwnerResolver for AllJpegsExist {
    async fn exists(&self, _id: &OwnerId) -> Result<bool, OwnerResolverError> {
        Ok(true)
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_insert_is_rejected(harness: TrackingHarness) -> eyre::Result<()> {
    let record = TaskRecord::new(task_id("etag-1"), JpegFile { id: 1 }.owner_ref(), &DefaultClock);
    harness.repository.insert(&record).await?;

    let result = harness.repository.insert(&record).await;

    ensure!(matches!(
        result,
        Err(TaskRecordRepositoryError::UniquenessViolation { .. })
    ));
    ensure!(harness.repository.len()? == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_submission_keeps_one_record_per_owner(
    harness: TrackingHarness,
) -> eyre::Result<()> {
    let file = JpegFile { id: 2 };
    let request = SubmitTaskRequest::new(thumbnail()).with_task_id(task_id("etag-2"));

    harness.service.submit(&file, request.clone()).await?;
    harness.service.submit(&file, request).await?;

    ensure!(harness.service.task_records(&file).await?.len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn same_task_for_two_owner_kinds_is_two_records(
    harness: TrackingHarness,
) -> eyre::Result<()> {
    let shared = task_id("etag-3");
    let jpeg = JpegFile { id: 3 };
    let png = PngFile { id: 3 };
    let request = SubmitTaskRequest::new(thumbnail()).with_task_id(shared.clone());

    harness.service.submit(&jpeg, request.clone()).await?;
    harness.service.submit(&png, request).await?;

    ensure!(harness.service.owners_of(&shared).await?.len() == 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strict_tracking_only_accepts_registered_kinds(
    harness: TrackingHarness,
) -> eyre::Result<()> {
    let mut registry = OwnerRegistry::new();
    registry.register(OwnerKind::new("media.jpeg_file")?, Arc::new(AllJpegsExist))?;
    let service = harness
        .service
        .with_registry(Arc::new(registry))
        .with_config(TrackingConfig::strict());

    let jpeg = JpegFile { id: 4 };
    service
        .submit(&jpeg, SubmitTaskRequest::new(thumbnail()))
        .await?;
    let rejected = service
        .submit(&PngFile { id: 4 }, SubmitTaskRequest::new(thumbnail()))
        .await;

    ensure!(matches!(rejected, Err(TrackingError::UnknownOwnerKind(_))));
    ensure!(service.registry().resolve(&jpeg.owner_ref()).await?);
    ensure!(harness.repository.len()? == 1);
    Ok(())
}
