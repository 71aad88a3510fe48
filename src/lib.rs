//! Taskmeta: background task tracking for application records.
//!
//! This crate binds task identifiers handed to an external task broker to
//! the application records that own them, keeps each binding's lifecycle
//! state current from broker notifications, and lets records answer which
//! of their tasks are still running or already finished.
//!
//! # Architecture
//!
//! Taskmeta follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for the store and the broker
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`tracking`]: Task records, lifecycle dispatch, owner queries and
//!   result cleanup

pub mod tracking;
