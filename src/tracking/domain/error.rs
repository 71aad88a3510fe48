//! Error types for tracking domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing domain tracking values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackingDomainError {
    /// The task identifier is empty after trimming.
    #[error("task identifier must not be empty")]
    EmptyTaskId,

    /// The task identifier exceeds the persisted column width.
    #[error("task identifier is {0} characters long, expected at most 255")]
    TaskIdTooLong(usize),

    /// The owner kind is empty or contains whitespace.
    #[error("invalid owner kind '{0}', expected a non-empty token without whitespace")]
    InvalidOwnerKind(String),

    /// The owner identifier is empty or contains whitespace.
    #[error("invalid owner identifier '{0}', expected a non-empty token without whitespace")]
    InvalidOwnerId(String),
}

/// Error returned when a lifecycle outcome code does not name a known
/// task state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown lifecycle state: {0}")]
pub struct UnknownLifecycleState(pub String);
