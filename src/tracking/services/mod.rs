//! Application services for task tracking.

mod config;
mod dispatcher;
mod query;
mod registry;
mod result;
mod tracking;

pub use config::{DispatcherConfig, TrackingConfig};
pub use dispatcher::{
    DispatchError, LifecycleDispatcher, LifecycleHandler, TaskRecordStateHandler, target_state,
};
pub use query::OwnerQuery;
pub use registry::{OwnerRegistry, OwnerRegistryError};
pub use result::{TrackedResult, forget_if_ready};
pub use tracking::{SubmitTaskRequest, TaskTrackingService, TrackingError, TrackingResult};
