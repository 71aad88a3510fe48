//! Task-state tracking for owning application records.
//!
//! Each tracked task id is bound to one or more owners through task
//! records. Lifecycle notifications published by the broker integration
//! move every record of a task id through the lifecycle states at once,
//! and owners can then be filtered by the state of their tasks. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
