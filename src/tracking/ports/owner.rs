//! Resolver port for owning-record kinds.

use crate::tracking::domain::OwnerId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Looks up owning records of one kind in the host application.
#[async_trait]
pub trait OwnerResolver: Send + Sync {
    /// Returns `true` when the owning record still exists.
    async fn exists(&self, id: &OwnerId) -> Result<bool, OwnerResolverError>;
}

/// Failure raised by an owner resolver.
#[derive(Debug, Clone, Error)]
#[error("owner lookup failed: {0}")]
pub struct OwnerResolverError(pub Arc<dyn std::error::Error + Send + Sync>);

impl OwnerResolverError {
    /// Wraps a host-application lookup error.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(err))
    }
}
