//! Shared test helpers for in-memory tracking integration tests.

use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;
use taskmeta::tracking::{
    adapters::memory::{InMemoryBroker, InMemoryTaskRecordRepository},
    domain::{OwnerId, OwnerKind, OwnerRef, TaskId, Trackable},
    ports::TaskSpec,
    services::{DispatcherConfig, LifecycleDispatcher, TaskTrackingService},
};

/// Service type wired to the in-memory adapters.
pub type TestService =
    TaskTrackingService<InMemoryTaskRecordRepository, InMemoryBroker<DefaultClock>, DefaultClock>;

/// An application record owning thumbnail tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegFile {
    pub id: u64,
}

impl Trackable for JpegFile {
    fn owner_ref(&self) -> OwnerRef {
        OwnerRef::new(
            OwnerKind::new("media.jpeg_file").expect("valid owner kind"),
            OwnerId::from(self.id),
        )
    }
}

/// A second owner kind sharing the same task store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngFile {
    pub id: u64,
}

impl Trackable for PngFile {
    fn owner_ref(&self) -> OwnerRef {
        OwnerRef::new(
            OwnerKind::new("media.png_file").expect("valid owner kind"),
            OwnerId::from(self.id),
        )
    }
}

/// Repository, broker, and service sharing one dispatcher.
pub struct TrackingHarness {
    pub repository: Arc<InMemoryTaskRecordRepository>,
    pub broker: Arc<InMemoryBroker<DefaultClock>>,
    pub service: TestService,
}

impl TrackingHarness {
    /// Wires the adapters with the given dispatcher configuration.
    #[must_use]
    pub fn with_config(config: DispatcherConfig) -> Self {
        let repository = Arc::new(InMemoryTaskRecordRepository::new());
        let clock = Arc::new(DefaultClock);
        let dispatcher = Arc::new(LifecycleDispatcher::tracking(
            Arc::clone(&repository),
            Arc::clone(&clock),
            config,
        ));
        let broker = Arc::new(InMemoryBroker::new(dispatcher, Arc::clone(&clock)));
        let service =
            TaskTrackingService::new(Arc::clone(&repository), Arc::clone(&broker), clock);
        Self {
            repository,
            broker,
            service,
        }
    }
}

/// Provides a harness with the default dispatcher configuration.
#[fixture]
pub fn harness() -> TrackingHarness {
    TrackingHarness::with_config(DispatcherConfig::default())
}

/// Builds a task id from a literal.
#[must_use]
pub fn task_id(value: &str) -> TaskId {
    TaskId::new(value).expect("valid task id")
}

/// The task specification used throughout the suite.
#[must_use]
pub fn thumbnail() -> TaskSpec {
    TaskSpec::new("media.generate_thumbnail")
}
