//! Domain model for task-state tracking.
//!
//! The tracking domain models the association between task identifiers and
//! owning records, the lifecycle states those tasks move through, and the
//! notifications that drive them. Persistence and broker concerns stay
//! outside of the domain boundary.

mod error;
mod event;
mod ids;
mod owner;
mod record;
mod state;

pub use error::{TrackingDomainError, UnknownLifecycleState};
pub use event::{LifecycleEvent, LifecycleEventKind, LifecycleNotification};
pub use ids::{OwnerId, OwnerKind, TaskId};
pub use owner::{OwnerRef, Trackable};
pub use record::{PersistedTaskRecordData, TaskRecord, TaskRecords};
pub use state::{StateFilter, TaskState};
