//! In-memory adapters for tests and embedded use.

mod broker;
mod repository;

pub use broker::InMemoryBroker;
pub use repository::InMemoryTaskRecordRepository;
