//! Port contracts for task-state tracking.
//!
//! Ports define infrastructure-agnostic interfaces used by tracking
//! services: the task-record store, the task broker, and per-kind owner
//! resolvers.

pub mod broker;
pub mod owner;
pub mod repository;

pub use broker::{BrokerError, BrokerResult, PendingResult, TaskBroker, TaskSpec};
pub use owner::{OwnerResolver, OwnerResolverError};
pub use repository::{
    StateUpdate, TaskRecordRepository, TaskRecordRepositoryError, TaskRecordRepositoryResult,
};
