//! Adapter implementations for task-record persistence and broker ports.

pub mod memory;
pub mod postgres;
