//! Per-kind owner resolver map.

use crate::tracking::{
    domain::{OwnerKind, OwnerRef},
    ports::{OwnerResolver, OwnerResolverError},
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by the owner registry.
#[derive(Debug, Clone, Error)]
pub enum OwnerRegistryError {
    /// A resolver is already registered for the kind.
    #[error("duplicate resolver for owner kind {0}")]
    DuplicateKind(OwnerKind),

    /// No resolver is registered for the kind.
    #[error("unknown owner kind {0}")]
    UnknownKind(OwnerKind),

    /// The resolver failed.
    #[error(transparent)]
    Resolver(#[from] OwnerResolverError),
}

/// Registry of owner kinds and the resolvers that look them up.
///
/// Built during initialization and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct OwnerRegistry {
    resolvers: HashMap<OwnerKind, Arc<dyn OwnerResolver>>,
}

impl std::fmt::Debug for OwnerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl OwnerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the resolver for an owner kind.
    ///
    /// # Errors
    ///
    /// Returns [`OwnerRegistryError::DuplicateKind`] when the kind already
    /// has a resolver.
    pub fn register(
        &mut self,
        kind: OwnerKind,
        resolver: Arc<dyn OwnerResolver>,
    ) -> Result<(), OwnerRegistryError> {
        if self.resolvers.contains_key(&kind) {
            return Err(OwnerRegistryError::DuplicateKind(kind));
        }
        self.resolvers.insert(kind, resolver);
        Ok(())
    }

    /// Returns `true` when the kind has a resolver.
    #[must_use]
    pub fn is_registered(&self, kind: &OwnerKind) -> bool {
        self.resolvers.contains_key(kind)
    }

    /// Returns the registered kinds in sorted order.
    #[must_use]
    pub fn kinds(&self) -> Vec<OwnerKind> {
        let mut kinds: Vec<_> = self.resolvers.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Returns `true` when the referenced owning record still exists.
    ///
    /// # Errors
    ///
    /// Returns [`OwnerRegistryError::UnknownKind`] when the kind has no
    /// resolver, or [`OwnerRegistryError::Resolver`] when the lookup fails.
    pub async fn resolve(&self, owner: &OwnerRef) -> Result<bool, OwnerRegistryError> {
        let resolver = self
            .resolvers
            .get(owner.kind())
            .ok_or_else(|| OwnerRegistryError::UnknownKind(owner.kind().clone()))?;
        Ok(resolver.exists(owner.id()).await?)
    }
}
