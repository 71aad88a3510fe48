//! Identifier and validated scalar types for the tracking domain.

use super::TrackingDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier assigned to a task by the submitting caller or the
/// broker.
///
/// A task identifier is not unique on its own: the same identifier may be
/// tracked against several owners.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Largest identifier length representable in the persisted schema.
    pub const MAX_LEN: usize = 255;

    /// Creates a validated task identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingDomainError::EmptyTaskId`] when the value is blank
    /// and [`TrackingDomainError::TaskIdTooLong`] when it exceeds
    /// [`TaskId::MAX_LEN`] characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TrackingDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TrackingDomainError::EmptyTaskId);
        }
        let length = trimmed.chars().count();
        if length > Self::MAX_LEN {
            return Err(TrackingDomainError::TaskIdTooLong(length));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Generates a fresh random task identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TaskId {
    type Error = TrackingDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskId> for String {
    fn from(value: TaskId) -> Self {
        value.0
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind tag of an owning record, e.g. `media.jpeg_file`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerKind(String);

impl OwnerKind {
    /// Creates a validated owner kind.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingDomainError::InvalidOwnerKind`] when the value is
    /// empty or contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TrackingDomainError> {
        let raw = value.into();
        match normalize_token(&raw) {
            Some(token) => Ok(Self(token)),
            None => Err(TrackingDomainError::InvalidOwnerKind(raw)),
        }
    }

    /// Returns the kind as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OwnerKind {
    type Error = TrackingDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerKind> for String {
    fn from(value: OwnerKind) -> Self {
        value.0
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier of an owning record within its kind, usually the
/// record's primary key rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Creates a validated owner identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingDomainError::InvalidOwnerId`] when the value is
    /// empty or contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TrackingDomainError> {
        let raw = value.into();
        match normalize_token(&raw) {
            Some(token) => Ok(Self(token)),
            None => Err(TrackingDomainError::InvalidOwnerId(raw)),
        }
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for OwnerId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<Uuid> for OwnerId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

impl TryFrom<String> for OwnerId {
    type Error = TrackingDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(value: OwnerId) -> Self {
        value.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return None;
    }
    Some(trimmed.to_owned())
}
