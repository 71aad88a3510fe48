//! Polymorphic references to owning records.

use super::{OwnerId, OwnerKind, TrackingDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to an owning record as a `(kind, identifier)` pair.
///
/// The tracking core never owns the referenced record; it only stores this
/// back-reference next to each tracked task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerRef {
    kind: OwnerKind,
    id: OwnerId,
}

impl OwnerRef {
    /// Creates an owner reference from validated parts.
    #[must_use]
    pub const fn new(kind: OwnerKind, id: OwnerId) -> Self {
        Self { kind, id }
    }

    /// Creates an owner reference from raw string parts.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingDomainError`] when either part fails validation.
    pub fn from_parts(
        kind: impl Into<String>,
        id: impl Into<String>,
    ) -> Result<Self, TrackingDomainError> {
        Ok(Self::new(OwnerKind::new(kind)?, OwnerId::new(id)?))
    }

    /// Returns the owner kind.
    #[must_use]
    pub const fn kind(&self) -> &OwnerKind {
        &self.kind
    }

    /// Returns the owner identifier.
    #[must_use]
    pub const fn id(&self) -> &OwnerId {
        &self.id
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Capability implemented by any application record that can own tracked
/// tasks.
///
/// Implementors only need a stable `(kind, identifier)` pair; every
/// tracking operation is offered by the services and takes a `Trackable`.
///
/// # Examples
///
/// ```
/// use taskmeta::tracking::domain::{OwnerId, OwnerKind, OwnerRef, Trackable};
///
/// struct JpegFile {
///     pk: u64,
/// }
///
/// impl Trackable for JpegFile {
///     fn owner_ref(&self) -> OwnerRef {
///         let kind = OwnerKind::new("media.jpeg_file").expect("valid kind");
///         OwnerRef::new(kind, OwnerId::from(self.pk))
///     }
/// }
///
/// let file = JpegFile { pk: 7 };
/// assert_eq!(file.owner_ref().to_string(), "media.jpeg_file:7");
/// ```
pub trait Trackable {
    /// Returns the reference under which this record's tasks are tracked.
    fn owner_ref(&self) -> OwnerRef;
}

impl Trackable for OwnerRef {
    fn owner_ref(&self) -> OwnerRef {
        self.clone()
    }
}

impl<T: Trackable + ?Sized> Trackable for &T {
    fn owner_ref(&self) -> OwnerRef {
        (**self).owner_ref()
    }
}
